//! Form field coercion.
//!
//! The admin panel posts every field as text. Handlers read them through
//! [`Fields`], which turns missing or malformed values into
//! [`Error::Validation`] naming the field.

use crate::{
    entities::{Category, IncidentOrigin, IncidentStatus, LoanStatus},
    errors::{Error, Result},
};
use axum::{
    Form,
    extract::rejection::{FormRejection, QueryRejection},
    extract::Query,
};
use std::collections::HashMap;
use std::str::FromStr;

/// Raw form or query fields.
#[derive(Debug, Clone, Default)]
pub struct Fields(HashMap<String, String>);

/// Form extractor that never rejects on its own.
pub type FormInput = std::result::Result<Form<HashMap<String, String>>, FormRejection>;

/// Query extractor that never rejects on its own.
pub type QueryInput = std::result::Result<Query<HashMap<String, String>>, QueryRejection>;

impl Fields {
    /// Unwraps a submitted form.
    pub fn from_form(input: FormInput) -> Result<Self> {
        input
            .map(|Form(values)| Self(values))
            .map_err(|e| Error::validation(format!("Unreadable form: {e}")))
    }

    /// Unwraps a query string.
    pub fn from_query(input: QueryInput) -> Result<Self> {
        input
            .map(|Query(values)| Self(values))
            .map_err(|e| Error::validation(format!("Unreadable query string: {e}")))
    }

    /// Trimmed value, `None` when absent or blank.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.as_str().trim())
            .filter(|v| !v.is_empty())
    }

    /// Trimmed value that must be present.
    pub fn required(&self, name: &str) -> Result<&str> {
        self.text(name)
            .ok_or_else(|| Error::validation(format!("Field '{name}' is required")))
    }

    /// Optional number.
    pub fn number<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        self.text(name)
            .map(|raw| {
                raw.parse().map_err(|_| {
                    Error::validation(format!("Field '{name}' must be a whole number, got '{raw}'"))
                })
            })
            .transpose()
    }

    /// Number that must be present.
    pub fn required_number<T: FromStr>(&self, name: &str) -> Result<T> {
        self.number(name)?
            .ok_or_else(|| Error::validation(format!("Field '{name}' is required")))
    }

    /// Product category by label.
    pub fn category(&self, name: &str) -> Result<Category> {
        let raw = self.required(name)?;
        Category::from_label(raw)
            .ok_or_else(|| Error::validation(format!("Unknown category '{raw}'")))
    }

    /// Optional loan status filter.
    pub fn loan_status(&self, name: &str) -> Result<Option<LoanStatus>> {
        self.text(name)
            .map(|raw| {
                LoanStatus::parse(raw)
                    .ok_or_else(|| Error::validation(format!("Unknown loan status '{raw}'")))
            })
            .transpose()
    }

    /// Incident origin, `directo` or `prestamo`.
    pub fn origin(&self, name: &str) -> Result<IncidentOrigin> {
        let raw = self.required(name)?;
        IncidentOrigin::parse(raw)
            .ok_or_else(|| Error::validation(format!("Unknown incident origin '{raw}'")))
    }

    /// Incident status; blank means `dañado`.
    pub fn incident_status(&self, name: &str) -> Result<IncidentStatus> {
        let raw = self.0.get(name).map_or("", String::as_str);
        IncidentStatus::parse(raw)
            .ok_or_else(|| Error::validation(format!("Unknown incident status '{raw}'")))
    }
}

/// Parses a numeric path segment.
pub fn parse_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::validation(format!("Invalid id '{raw}'")))
}

#[cfg(test)]
impl From<&[(&str, &str)]> for Fields {
    fn from(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }
}
