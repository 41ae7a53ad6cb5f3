//! Parsed invoice documents.
//!
//! The admin panel extracts the issuer and the concepts from the CFDI XML and
//! submits them as text, together with one operator decision per concept. The
//! text is validated strictly here: any malformed concept rejects the invoice.

use super::parse_whole_number;
use crate::{
    core::import::{InvoiceImport, InvoiceItem, ItemAction},
    errors::{Error, Result},
};
use serde::Deserialize;

/// Invoice header and concepts as extracted from the document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedInvoice {
    /// Issuer (`Emisor`) name
    #[serde(default)]
    pub issuer: Option<String>,
    /// Invoice lines (`Conceptos`)
    #[serde(default)]
    pub concepts: Vec<Concept>,
}

/// One invoice line as text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Concept {
    /// Provider's product identifier (`NoIdentificacion`)
    #[serde(default)]
    pub identifier: Option<String>,
    /// Line description (`Descripcion`)
    #[serde(default)]
    pub description: Option<String>,
    /// Quantity (`Cantidad`), e.g. `"2.000000"`
    #[serde(default)]
    pub quantity: String,
    /// Unit price (`ValorUnitario`)
    #[serde(default)]
    pub unit_price: Option<String>,
}

/// Body of an invoice import: the document plus one decision per concept.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceRequest {
    /// Extracted document
    pub invoice: ParsedInvoice,
    /// Operator decisions, in concept order
    pub decisions: Vec<ItemAction>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Concept {
    fn quantity(&self, line: usize) -> Result<i32> {
        parse_whole_number(&self.quantity)
            .and_then(|n| i32::try_from(n).ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                Error::parse(format!(
                    "Concept {line}: quantity '{}' is not a positive whole number",
                    self.quantity.trim()
                ))
            })
    }
}

impl ParsedInvoice {
    /// Checks the document and returns the issuer name.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] for a missing issuer, no concepts, a concept
    /// without description, a fractional or non-positive quantity, or an
    /// unreadable unit price.
    pub fn validate(&self) -> Result<&str> {
        let issuer = present(self.issuer.as_deref())
            .ok_or_else(|| Error::parse("Invoice has no issuer name"))?;
        if self.concepts.is_empty() {
            return Err(Error::parse("Invoice has no concepts"));
        }

        for (index, concept) in self.concepts.iter().enumerate() {
            let line = index + 1;
            if present(concept.description.as_deref()).is_none() {
                return Err(Error::parse(format!("Concept {line} has no description")));
            }
            concept.quantity(line)?;
            if let Some(price) = present(concept.unit_price.as_deref()) {
                if price.parse::<f64>().is_err() {
                    return Err(Error::parse(format!(
                        "Concept {line}: unit price '{price}' is not a number"
                    )));
                }
            }
        }
        Ok(issuer)
    }
}

impl InvoiceRequest {
    /// Pairs each concept with its decision and produces a typed import.
    ///
    /// # Errors
    /// - [`Error::Parse`] if the document is malformed
    /// - [`Error::Validation`] if the number of decisions differs from the concepts
    pub fn into_import(self) -> Result<InvoiceImport> {
        let provider = self.invoice.validate()?.to_string();
        if self.decisions.len() != self.invoice.concepts.len() {
            return Err(Error::validation(format!(
                "Invoice has {} concept(s) but {} decision(s) were given",
                self.invoice.concepts.len(),
                self.decisions.len()
            )));
        }

        let items = self
            .invoice
            .concepts
            .iter()
            .zip(self.decisions)
            .enumerate()
            .map(|(index, (concept, action))| {
                Ok(InvoiceItem {
                    supplier_code: present(concept.identifier.as_deref()).map(str::to_string),
                    description: present(concept.description.as_deref())
                        .unwrap_or_default()
                        .to_string(),
                    quantity: concept.quantity(index + 1)?,
                    action,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(InvoiceImport { provider, items })
    }
}
