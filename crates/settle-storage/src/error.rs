use thiserror::Error;

pub type Result<T, E = StorageError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for key `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode or decode value for key `{key}`: {message}")]
    Codec { key: String, message: String },

    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
}
