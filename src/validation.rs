//! Validation Support
//!
//! Declarative checks on a [`TableQuery`] meant to run at the HTTP boundary,
//! before the compiler is invoked. They reject what the compiler would
//! otherwise clamp or silently skip, so clients get a precise 422 instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use tablequery::{QueryOptions, TableQuery};
//!
//! async fn list(Query(params): Query<TableQuery>) -> Result<impl IntoResponse, ApiError> {
//!     params.validate(&QueryOptions::default())?;
//!     // ...
//! }
//! ```

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::filtering::{parse_filters, parse_field_list};
use crate::models::TableQuery;
use crate::options::QueryOptions;

/// Validation error with field name and message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The request parameter that failed validation
    pub field: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Record the error of a failed check, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(error) = result {
            self.add(error);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Convert to Result
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} error(s):", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Helper validators for request parameters
pub mod validators {
    use super::ValidationError;
    use std::fmt;

    /// Validate string length in characters
    pub fn validate_length(
        field: &str,
        value: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Result<(), ValidationError> {
        let len = value.chars().count();

        if let Some(min_len) = min {
            if len < min_len {
                return Err(ValidationError::new(
                    field,
                    format!("Must be at least {min_len} characters"),
                ));
            }
        }

        if let Some(max_len) = max {
            if len > max_len {
                return Err(ValidationError::new(
                    field,
                    format!("Must be at most {max_len} characters"),
                ));
            }
        }

        Ok(())
    }

    /// Validate number is within range
    pub fn validate_range<T: PartialOrd + fmt::Display>(
        field: &str,
        value: T,
        min: Option<T>,
        max: Option<T>,
    ) -> Result<(), ValidationError> {
        if let Some(min_val) = min {
            if value < min_val {
                return Err(ValidationError::new(field, format!("Must be at least {min_val}")));
            }
        }

        if let Some(max_val) = max {
            if value > max_val {
                return Err(ValidationError::new(field, format!("Must be at most {max_val}")));
            }
        }

        Ok(())
    }

    /// Validate value is one of a fixed set, ignoring ASCII case
    pub fn validate_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), ValidationError> {
        if allowed.iter().any(|candidate| candidate.eq_ignore_ascii_case(value.trim())) {
            Ok(())
        } else {
            Err(ValidationError::new(
                field,
                format!("Must be one of: {}", allowed.join(", ")),
            ))
        }
    }
}

const SORT_ORDERS: [&str; 4] = ["asc", "desc", "1", "-1"];

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn validate_sort_order(raw: &Value) -> Result<(), ValidationError> {
    match raw {
        Value::Number(n) if matches!(n.as_i64(), Some(1 | -1)) => Ok(()),
        Value::String(s) => validators::validate_one_of("sortOrder", s, &SORT_ORDERS),
        _ => Err(ValidationError::new(
            "sortOrder",
            format!("Must be one of: {}", SORT_ORDERS.join(", ")),
        )),
    }
}

fn validate_field_list(raw: &Value) -> Result<(), ValidationError> {
    let well_formed = match raw {
        Value::Array(items) => items.iter().all(Value::is_string),
        Value::String(_) => true,
        _ => false,
    };
    if well_formed && !parse_field_list(raw).is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(
            "globalFilterFields",
            "Must be a list of field names",
        ))
    }
}

impl TableQuery {
    /// Check every parameter against the rule set, collecting all failures.
    pub fn validate(&self, options: &QueryOptions) -> Result<(), ValidationErrors> {
        use validators::{validate_length, validate_range};

        let mut errors = ValidationErrors::new();

        if let Some(Err(err)) = self.filters.as_ref().map(parse_filters) {
            errors.add(ValidationError::new("filters", err.to_string()));
        }
        if let Some(order) = &self.sort_order {
            errors.check(validate_sort_order(order));
        }
        if let Some(term) = &self.global_filter {
            errors.check(validate_length("globalFilter", term, None, Some(options.max_global_filter_len)));
        }
        if let Some(fields) = &self.global_filter_fields {
            errors.check(validate_field_list(fields));
        }
        if let Some(page) = self.page {
            errors.check(validate_range("page", page, Some(1), None));
        }
        if let Some(per_page) = self.per_page {
            errors.check(validate_range("per_page", per_page, Some(1), Some(to_i64(options.max_per_page))));
        }
        if let Some(first) = self.first {
            errors.check(validate_range("first", first, Some(0), None));
        }
        if let Some(rows) = self.rows {
            errors.check(validate_range("rows", rows, Some(1), Some(to_i64(options.max_rows))));
        }

        if !errors.is_empty() {
            tracing::debug!(errors = %errors, "Table query failed validation");
        }
        errors.result()
    }
}
