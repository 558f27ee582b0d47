//! # objutil
//!
//! Small object utilities over JSON-like values: deep-merge extension of a
//! mapping, key enumeration, and predicate filtering of a mapping's values.
//!
//! - `value` - the `JValue` type the utilities operate over
//! - `object` - `extend`, `keys`, `filter` and their variants
//!
//! The typed operations never fail. The string-level helpers in this module
//! (`extend_json`, `keys_json`) parse their input and report malformed JSON
//! or non-object documents through [`ObjectError`].

use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

pub mod object;
pub mod value;

pub use object::{
    extend, extend_value, filter, filter_truthy, keys, merged, try_filter, Extender,
    MergeOptions, NullPolicy,
};
pub use value::{Callable, JValue, Map};

/// Errors at the JSON string boundary
#[derive(Error, Debug)]
pub enum ObjectError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("{what} must be an object, got {found}")]
    NotAnObject {
        what: &'static str,
        found: &'static str,
    },

    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Deep-merge two JSON documents and return the merged document as a JSON
/// string.
///
/// # Errors
///
/// Returns `InvalidJson` if either input fails to parse and `NotAnObject` if
/// either top-level value is not an object.
///
/// # Examples
///
/// ```
/// let out = objutil::extend_json(r#"{"a":{"x":1}}"#, r#"{"a":{"y":2}}"#).unwrap();
/// assert_eq!(out, r#"{"a":{"x":1,"y":2}}"#);
/// ```
pub fn extend_json(target: &str, source: &str) -> Result<String, ObjectError> {
    extend_json_with(&Extender::new(), target, source)
}

/// [`extend_json`] with an explicitly configured [`Extender`].
pub fn extend_json_with(
    extender: &Extender,
    target: &str,
    source: &str,
) -> Result<String, ObjectError> {
    let mut target = parse_object("target", target)?;
    let source = parse_object("source", source)?;
    extender.extend(&mut target, &source);
    serde_json::to_string(&target).map_err(|e| ObjectError::Serialize(e.to_string()))
}

/// Keys of a JSON object document, in document order.
///
/// # Errors
///
/// Returns `InvalidJson` for malformed input and `NotAnObject` when the
/// top-level value is not an object.
pub fn keys_json(obj: &str) -> Result<Vec<String>, ObjectError> {
    let obj = parse_object("input", obj)?;
    Ok(keys(&obj))
}

fn parse_object(what: &'static str, json: &str) -> Result<Map, ObjectError> {
    let value = JValue::from_json_str(json).map_err(|e| {
        debug!(what, error = %e, "rejecting malformed JSON");
        ObjectError::InvalidJson(e.to_string())
    })?;
    match value {
        JValue::Object(map) => Ok(Rc::try_unwrap(map).unwrap_or_else(|rc| (*rc).clone())),
        other => {
            debug!(what, found = other.type_name(), "rejecting non-object JSON");
            Err(ObjectError::NotAnObject {
                what,
                found: other.type_name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_json() {
        let out = extend_json(
            r#"{"a":{"x":1},"b":[1,2]}"#,
            r#"{"a":{"y":2},"b":[3,4,5],"c":"new"}"#,
        )
        .unwrap();
        assert_eq!(out, r#"{"a":{"x":1,"y":2},"b":[3,4,5],"c":"new"}"#);
    }

    #[test]
    fn test_extend_json_null_keeps_target_object() {
        let out = extend_json(r#"{"a":{"x":1}}"#, r#"{"a":null,"b":null}"#).unwrap();
        assert_eq!(out, r#"{"a":{"x":1},"b":{}}"#);
    }

    #[test]
    fn test_extend_json_with_options() {
        let extender = Extender::with_options(MergeOptions {
            null_policy: NullPolicy::Assign,
        });
        let out = extend_json_with(&extender, r#"{"a":{"x":1}}"#, r#"{"a":null,"b":null}"#)
            .unwrap();
        assert_eq!(out, r#"{"a":null,"b":null}"#);
    }

    #[test]
    fn test_invalid_json() {
        let err = extend_json("{", "{}").unwrap_err();
        assert!(matches!(err, ObjectError::InvalidJson(_)));
        assert!(err.to_string().starts_with("Invalid JSON"));
    }

    #[test]
    fn test_not_an_object() {
        let err = extend_json("{}", "[1,2]").unwrap_err();
        assert_eq!(err.to_string(), "source must be an object, got array");

        let err = keys_json("null").unwrap_err();
        assert_eq!(err.to_string(), "input must be an object, got null");
    }

    #[test]
    fn test_keys_json() {
        assert_eq!(keys_json(r#"{"b":1,"a":2}"#).unwrap(), vec!["b", "a"]);
        assert!(keys_json("{}").unwrap().is_empty());
    }
}
