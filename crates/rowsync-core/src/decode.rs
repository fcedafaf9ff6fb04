//! Model coercion for raw child snapshots
//!
//! The reconciler stores values of a single model type `V`. A [`ModelDecoder`]
//! is chosen once, when the binding is configured, and turns every incoming
//! raw snapshot into a `V` (or a [`DecodeError`], which drops the event).
//!
//! - [`RawDecoder`] keeps snapshots as raw JSON values
//! - [`JsonModel<T>`] deserializes snapshots into any serde model type
//! - any `Fn(&str, &RawValue) -> Result<V, DecodeError>` closure works too

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::DecodeError;
use crate::event::RawValue;

/// Coerces raw child snapshots into the stored model type.
pub trait ModelDecoder<V> {
    /// Decode the value of child `key`.
    fn decode(&self, key: &str, raw: &RawValue) -> Result<V, DecodeError>;
}

impl<V, F> ModelDecoder<V> for F
where
    F: Fn(&str, &RawValue) -> Result<V, DecodeError>,
{
    fn decode(&self, key: &str, raw: &RawValue) -> Result<V, DecodeError> {
        self(key, raw)
    }
}

/// Identity decoder: stores the raw snapshot unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDecoder;

impl ModelDecoder<RawValue> for RawDecoder {
    fn decode(&self, _key: &str, raw: &RawValue) -> Result<RawValue, DecodeError> {
        Ok(raw.clone())
    }
}

/// Decoder that deserializes snapshots into `T` with serde.
pub struct JsonModel<T> {
    _model: PhantomData<fn() -> T>,
}

impl<T> JsonModel<T> {
    /// Create a decoder for `T`.
    pub fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<T> Default for JsonModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonModel<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonModel")
            .field("model", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned> ModelDecoder<T> for JsonModel<T> {
    fn decode(&self, key: &str, raw: &RawValue) -> Result<T, DecodeError> {
        T::deserialize(raw).map_err(|e| DecodeError::new(key, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Message {
        text: String,
        author: String,
    }

    #[test]
    fn test_raw_decoder_is_identity() {
        let raw = json!({"text": "hello"});
        assert_eq!(RawDecoder.decode("a", &raw), Ok(raw.clone()));
    }

    #[test]
    fn test_json_model_decodes() {
        let decoder = JsonModel::<Message>::new();
        let message = decoder
            .decode("m1", &json!({"text": "hi", "author": "ann"}))
            .unwrap();
        assert_eq!(
            message,
            Message {
                text: "hi".into(),
                author: "ann".into()
            }
        );
    }

    #[test]
    fn test_json_model_reports_key_on_failure() {
        let decoder = JsonModel::<Message>::new();
        let err = decoder.decode("m2", &json!(42)).unwrap_err();
        assert_eq!(err.key, "m2");
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_closure_decoder() {
        let decoder = |key: &str, raw: &RawValue| {
            raw.as_i64()
                .ok_or_else(|| DecodeError::new(key, "expected integer"))
        };
        assert_eq!(decoder.decode("n", &json!(7)), Ok(7));
        assert!(decoder.decode("n", &json!("x")).is_err());
    }
}
