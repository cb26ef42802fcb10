use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, StorageError};

/// Turns a value into the string kept in a [`KeyValueStore`](crate::KeyValueStore)
/// and back. `key` is only used for error reporting.
pub trait Codec<T>: 'static {
    fn encode(&self, key: &str, value: &T) -> Result<String>;
    fn decode(&self, key: &str, raw: &str) -> Result<T>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl<T: Serialize + DeserializeOwned> Codec<T> for JsonCodec {
    fn encode(&self, key: &str, value: &T) -> Result<String> {
        serde_json::to_string(value).map_err(|e| StorageError::Codec {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    fn decode(&self, key: &str, raw: &str) -> Result<T> {
        serde_json::from_str(raw).map_err(|e| StorageError::Codec {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}

/// Stores the value's plain text form, for values that are already strings
/// or have a lossless `Display`/`FromStr` pair.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextCodec;

impl<T> Codec<T> for TextCodec
where
    T: std::fmt::Display + std::str::FromStr,
    T::Err: std::fmt::Display,
{
    fn encode(&self, _key: &str, value: &T) -> Result<String> {
        Ok(value.to_string())
    }

    fn decode(&self, key: &str, raw: &str) -> Result<T> {
        raw.parse().map_err(|e: T::Err| StorageError::Codec {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}
