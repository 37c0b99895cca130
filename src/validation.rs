//! Structured validation errors for security configuration parsing.
//!
//! Parsers accumulate any number of [`ValidationError`]s in a
//! [`ValidationErrors`] collection and surface them as a single
//! [`ConfigValidationError`] whose display message is derived from the
//! collection contents. The collection serializes to a structured report
//! (one entry per error) for API callers.

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Attribute sentinel meaning "the whole document" rather than a named field.
pub const WHOLE_DOCUMENT: &str = "_";

type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// One recorded validation failure.
///
/// Every error is attributed to a named attribute of the document being
/// validated; an absent or empty attribute collapses to the
/// [`WHOLE_DOCUMENT`] sentinel.
#[derive(Debug, Clone)]
pub struct ValidationError {
    attribute: String,
    message: String,
    cause: Option<Cause>,
}

impl ValidationError {
    pub fn new(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        let attribute = attribute.into();
        Self {
            attribute: if attribute.is_empty() {
                WHOLE_DOCUMENT.to_string()
            } else {
                attribute
            },
            message: message.into(),
            cause: None,
        }
    }

    /// An error that is not attributable to a single attribute.
    pub fn whole_document(message: impl Into<String>) -> Self {
        Self::new(WHOLE_DOCUMENT, message)
    }

    /// Replaces the message, keeping attribute and cause.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attaches an underlying cause for exception chaining.
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| -> &(dyn std::error::Error + 'static) { cause.as_ref() })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attribute == WHOLE_DOCUMENT {
            write!(f, "{}", self.message)
        } else {
            write!(f, "'{}': {}", self.attribute, self.message)
        }
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Report entries carry at least the message; the attribute is
        // informational and omitted for whole-document errors.
        let named = self.attribute != WHOLE_DOCUMENT;
        let mut map = serializer.serialize_map(Some(if named { 2 } else { 1 }))?;
        map.serialize_entry("error", &self.message)?;
        if named {
            map.serialize_entry("attribute", &self.attribute)?;
        }
        map.end()
    }
}

/// Ordered accumulator of validation errors across attributes.
///
/// One attribute may accumulate multiple errors. Insertion order is
/// preserved both within an attribute and across attributes, so reports
/// are deterministic.
#[derive(Debug, Clone, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A collection holding exactly one error.
    pub fn single(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Appends one error, preserving insertion order.
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Appends all of `other`'s errors after the ones already recorded.
    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    /// Total error count, summed over attributes.
    pub fn size(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The only recorded error.
    ///
    /// # Panics
    ///
    /// Calling this with anything but exactly one recorded error is a
    /// programming error and panics.
    pub fn only_error(&self) -> &ValidationError {
        match self.errors.as_slice() {
            [error] => error,
            _ => panic!("only_error() called on a collection of {} errors", self.size()),
        }
    }

    /// First recorded underlying cause, if any error carries one.
    pub fn cause(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors.iter().find_map(|error| error.cause())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Errors recorded for one attribute, in insertion order.
    pub fn errors_for<'a>(
        &'a self,
        attribute: &'a str,
    ) -> impl Iterator<Item = &'a ValidationError> {
        self.errors
            .iter()
            .filter(move |error| error.attribute() == attribute)
    }

    /// Derived summary message.
    ///
    /// A single error keeps its own message, prefixed with `'<attribute>':`
    /// unless it concerns the whole document. Multiple errors collapse to a
    /// count, with the detail left to the serialized report.
    pub fn message(&self) -> String {
        if self.size() == 1 {
            self.only_error().to_string()
        } else {
            format!("{} errors; see detail.", self.size())
        }
    }

    /// `Err` with all recorded errors when any were recorded.
    pub fn into_result(self) -> Result<(), ConfigValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ConfigValidationError::new(self))
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self::single(error)
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.errors.iter())
    }
}

/// Failure of a parse or validate step, carrying one or more
/// [`ValidationError`]s.
///
/// Always constructed from a non-empty collection; handing it zero errors
/// is a contract violation on the caller's side. The display message is
/// derived from the collection on demand, never stored.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    errors: ValidationErrors,
}

impl ConfigValidationError {
    pub fn new(errors: ValidationErrors) -> Self {
        debug_assert!(!errors.is_empty(), "constructed without any validation error");
        Self { errors }
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }
}

impl From<ValidationError> for ConfigValidationError {
    fn from(error: ValidationError) -> Self {
        Self::new(ValidationErrors::single(error))
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errors.message())
    }
}

impl std::error::Error for ConfigValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors.cause()
    }
}

impl Serialize for ConfigValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.errors.serialize(serializer)
    }
}
