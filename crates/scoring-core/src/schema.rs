//! Ordered request schemas.
//!
//! A [`Schema`] is a fixed, ordered list of named [`FieldSpec`]s declared as
//! `const` data. Validation walks the fields in declaration order and stops
//! at the first failure, so a caller only ever sees one error per call.
//! Input keys the schema does not declare are ignored.

use chrono::{Local, NaiveDate};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::field::{FieldError, FieldSpec};

/// The first field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {error}")]
pub struct SchemaError {
    field: &'static str,
    #[source]
    error: FieldError,
}

impl SchemaError {
    /// Creates a schema error for a field.
    #[must_use]
    pub const fn new(field: &'static str, error: FieldError) -> Self {
        Self { field, error }
    }

    /// Returns the failing field name.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    /// Returns the validator error.
    #[must_use]
    pub const fn error(&self) -> &FieldError {
        &self.error
    }
}

/// A named, ordered set of field declarations.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    name: &'static str,
    fields: &'static [(&'static str, FieldSpec)],
}

impl Schema {
    /// Declares a schema.
    #[must_use]
    pub const fn new(name: &'static str, fields: &'static [(&'static str, FieldSpec)]) -> Self {
        Self { name, fields }
    }

    /// Returns the schema name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the field declarations in validation order.
    #[must_use]
    pub const fn fields(&self) -> &'static [(&'static str, FieldSpec)] {
        self.fields
    }

    /// Returns the field names in validation order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|(name, _)| *name)
    }

    /// Validates an input map using the local calendar date.
    pub fn validate(&self, input: &Map<String, Value>) -> Result<ValidatedRequest, SchemaError> {
        self.validate_on(input, Local::now().date_naive())
    }

    /// Validates an input map with an explicit "today".
    pub fn validate_on(
        &self,
        input: &Map<String, Value>,
        today: NaiveDate,
    ) -> Result<ValidatedRequest, SchemaError> {
        let mut values = IndexMap::with_capacity(self.fields.len());

        for &(name, spec) in self.fields {
            let value = input.get(name);
            spec.validate_on(value, today)
                .map_err(|error| SchemaError::new(name, error))?;

            if let Some(value) = value.filter(|v| !v.is_null()) {
                values.insert(name, value.clone());
            }
        }

        Ok(ValidatedRequest {
            schema: self.name,
            values,
        })
    }
}

/// Schema fields of one input that passed validation.
///
/// Holds only the declared fields that were supplied with a non-null value,
/// in declaration order. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    schema: &'static str,
    values: IndexMap<&'static str, Value>,
}

impl ValidatedRequest {
    /// Returns the name of the schema that produced this request.
    #[must_use]
    pub const fn schema(&self) -> &'static str {
        self.schema
    }

    /// Returns a validated value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns a string value, or `None` if absent or empty.
    #[must_use]
    pub fn non_empty_str(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Returns the names of supplied fields in declaration order.
    pub fn present(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    /// Removes and returns a value.
    pub(crate) fn take(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }
}

/// A typed request built from a [`Schema`].
///
/// Implementors declare their schema as a constant and convert the
/// validated values into plain named fields.
pub trait RequestSchema: Sized {
    /// The schema validating this request.
    const SCHEMA: Schema;

    /// Builds the typed request from already validated values.
    fn from_validated(validated: ValidatedRequest) -> Self;

    /// Validates an input map and builds the typed request.
    fn parse(input: &Map<String, Value>) -> Result<Self, SchemaError> {
        Self::SCHEMA.validate(input).map(Self::from_validated)
    }

    /// Like [`parse`](Self::parse) with an explicit "today".
    fn parse_on(input: &Map<String, Value>, today: NaiveDate) -> Result<Self, SchemaError> {
        Self::SCHEMA.validate_on(input, today).map(Self::from_validated)
    }
}
