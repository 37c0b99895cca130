//! Sub-document parsers: generic JSON nodes to typed configuration values.
//!
//! A [`ValueParser`] converts one node of a generically-structured
//! configuration document into a strongly-typed value, or fails with a
//! [`ConfigValidationError`]. Parsers are pure with respect to their input
//! and safe to invoke concurrently.

use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::validation::{ConfigValidationError, ValidationError, ValidationErrors};

/// Capability contract for converting a document node into a typed value.
pub trait ValueParser: Send + Sync {
    type Output;

    fn parse(&self, node: &Value) -> Result<Self::Output, ConfigValidationError>;

    /// Human-readable description of the expected shape, for error
    /// messages and documentation.
    fn expected_value(&self) -> Option<String> {
        None
    }
}

/// Display name of a JSON node's type, for mismatch messages.
fn node_type(node: &Value) -> &'static str {
    match node {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parses a JSON string node.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringParser;

impl ValueParser for StringParser {
    type Output = String;

    fn parse(&self, node: &Value) -> Result<String, ConfigValidationError> {
        node.as_str().map(str::to_owned).ok_or_else(|| {
            ValidationError::whole_document(format!("expected a string; got {}", node_type(node)))
                .into()
        })
    }

    fn expected_value(&self) -> Option<String> {
        Some("string".to_string())
    }
}

/// Parses a JSON boolean node.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolParser;

impl ValueParser for BoolParser {
    type Output = bool;

    fn parse(&self, node: &Value) -> Result<bool, ConfigValidationError> {
        node.as_bool().ok_or_else(|| {
            ValidationError::whole_document(format!("expected a boolean; got {}", node_type(node)))
                .into()
        })
    }

    fn expected_value(&self) -> Option<String> {
        Some("boolean".to_string())
    }
}

/// Parses a non-negative JSON integer node.
#[derive(Debug, Clone, Copy, Default)]
pub struct U64Parser;

impl ValueParser for U64Parser {
    type Output = u64;

    fn parse(&self, node: &Value) -> Result<u64, ConfigValidationError> {
        node.as_u64().ok_or_else(|| {
            ValidationError::whole_document(format!(
                "expected a non-negative integer; got {}",
                node_type(node)
            ))
            .into()
        })
    }

    fn expected_value(&self) -> Option<String> {
        Some("non-negative integer".to_string())
    }
}

/// Parses an integer number of milliseconds into a [`Duration`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationMillisParser;

impl ValueParser for DurationMillisParser {
    type Output = Duration;

    fn parse(&self, node: &Value) -> Result<Duration, ConfigValidationError> {
        U64Parser
            .parse(node)
            .map(Duration::from_millis)
            .map_err(|_| {
                ValidationError::whole_document(format!(
                    "expected a duration in milliseconds; got {}",
                    node_type(node)
                ))
                .into()
            })
    }

    fn expected_value(&self) -> Option<String> {
        Some("duration in milliseconds".to_string())
    }
}

/// Parses an array of strings, reporting every offending element.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringListParser;

impl ValueParser for StringListParser {
    type Output = Vec<String>;

    fn parse(&self, node: &Value) -> Result<Vec<String>, ConfigValidationError> {
        let Some(elements) = node.as_array() else {
            return Err(ValidationError::whole_document(format!(
                "expected an array of strings; got {}",
                node_type(node)
            ))
            .into());
        };

        let mut errors = ValidationErrors::new();
        let mut values = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            match element.as_str() {
                Some(value) => values.push(value.to_owned()),
                None => errors.add(ValidationError::new(
                    index.to_string(),
                    format!("expected a string; got {}", node_type(element)),
                )),
            }
        }
        errors.into_result()?;
        Ok(values)
    }

    fn expected_value(&self) -> Option<String> {
        Some("array of strings".to_string())
    }
}

/// Deserializes a node into any [`DeserializeOwned`] type via serde.
///
/// Deserialization failures surface as a single whole-document error
/// carrying serde's message.
pub struct FromJson<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> FromJson<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for FromJson<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> ValueParser for FromJson<T> {
    type Output = T;

    fn parse(&self, node: &Value) -> Result<T, ConfigValidationError> {
        serde_json::from_value(node.clone())
            .map_err(|err| ValidationError::whole_document(err.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_string_parser() {
        assert_eq!(StringParser.parse(&json!("audit")).unwrap(), "audit");

        let err = StringParser.parse(&json!(42)).unwrap_err();
        assert_eq!(err.to_string(), "expected a string; got a number");
    }

    #[test]
    fn test_bool_parser() {
        assert!(BoolParser.parse(&json!(true)).unwrap());
        assert!(BoolParser.parse(&json!("true")).is_err());
    }

    #[test]
    fn test_u64_parser_rejects_negative() {
        assert_eq!(U64Parser.parse(&json!(17)).unwrap(), 17);
        assert!(U64Parser.parse(&json!(-1)).is_err());
    }

    #[test]
    fn test_duration_millis_parser() {
        assert_eq!(
            DurationMillisParser.parse(&json!(1500)).unwrap(),
            Duration::from_millis(1500)
        );

        let err = DurationMillisParser.parse(&json!("soon")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected a duration in milliseconds; got a string"
        );
    }

    #[test]
    fn test_string_list_parser_reports_every_bad_element() {
        let err = StringListParser
            .parse(&json!(["ok", 1, "fine", null]))
            .unwrap_err();

        assert_eq!(err.errors().size(), 2);
        assert_eq!(err.to_string(), "2 errors; see detail.");
        let attributes: Vec<&str> = err.errors().iter().map(|e| e.attribute()).collect();
        assert_eq!(attributes, vec!["1", "3"]);
    }

    #[test]
    fn test_from_json_parser() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct AuditSettings {
            enabled: bool,
            category: String,
        }

        let parsed: AuditSettings = FromJson::new()
            .parse(&json!({"enabled": true, "category": "authn"}))
            .unwrap();
        assert_eq!(
            parsed,
            AuditSettings {
                enabled: true,
                category: "authn".to_string()
            }
        );

        let err = FromJson::<AuditSettings>::new()
            .parse(&json!({"enabled": true}))
            .unwrap_err();
        assert_eq!(err.errors().only_error().attribute(), "_");
    }

    #[test]
    fn test_expected_value_defaults_to_none() {
        struct Opaque;
        impl ValueParser for Opaque {
            type Output = ();
            fn parse(&self, _node: &Value) -> Result<(), ConfigValidationError> {
                Ok(())
            }
        }

        assert_eq!(Opaque.expected_value(), None);
        assert_eq!(StringParser.expected_value().as_deref(), Some("string"));
    }
}
