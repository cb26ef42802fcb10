use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An action tag no reducer knows about. Always a programming mistake.
    #[error("unhandled action type: {0}")]
    UnhandledAction(String),

    #[error("{status} requires `{field}`")]
    MissingPayload {
        status: &'static str,
        field: &'static str,
    },

    #[error("`{field}` is not allowed while {status}")]
    UnexpectedPayload {
        status: &'static str,
        field: &'static str,
    },

    #[error("unknown status: {0}")]
    UnknownStatus(String),
}
