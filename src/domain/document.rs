//! Document creation request schema.
//!
//! Field names on the wire are fixed by the registration service and mostly
//! snake_case, with two camelCase exceptions (`importRequests` and
//! `description.participantInn`). Every date is a calendar date rendered as
//! `YYYY-MM-DD`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Nested description block of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    /// Participant tax identifier
    #[serde(rename = "participantInn")]
    pub participant_inn: String,
}

impl Description {
    pub fn new(participant_inn: impl Into<String>) -> Self {
        Self {
            participant_inn: participant_inn.into(),
        }
    }
}

/// One line item of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub certificate_document: String,
    #[serde(with = "crate::domain::date_format")]
    pub certificate_document_date: NaiveDate,
    pub certificate_document_number: String,
    pub owner_inn: String,
    pub producer_inn: String,
    #[serde(with = "crate::domain::date_format")]
    pub production_date: NaiveDate,
    /// Harmonized tariff code
    pub tnved_code: String,
    /// Unit identification code
    pub uit_code: String,
    /// Unit identification code, group form
    pub uitu_code: String,
}

/// A document to register.
///
/// Built by the caller and only borrowed by the gateway for the duration of
/// one submission.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use document_gateway::{Description, Document};
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let document = Document {
///     description: Description::new("7700000000"),
///     doc_id: "1".into(),
///     doc_status: "NEW".into(),
///     doc_type: "LP_INTRODUCE_GOODS".into(),
///     import_request: true,
///     owner_inn: "7700000000".into(),
///     participant_inn: "7700000000".into(),
///     producer_inn: "7700000000".into(),
///     production_date: date,
///     production_type: "OWN_PRODUCTION".into(),
///     products: Vec::new(),
///     reg_date: date,
///     reg_number: "42".into(),
/// };
/// assert_eq!(document.products.len(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub description: Description,
    pub doc_id: String,
    pub doc_status: String,
    pub doc_type: String,
    #[serde(rename = "importRequests")]
    pub import_request: bool,
    pub owner_inn: String,
    pub participant_inn: String,
    pub producer_inn: String,
    #[serde(with = "crate::domain::date_format")]
    pub production_date: NaiveDate,
    pub production_type: String,
    /// Line items, order preserved on the wire
    pub products: Vec<Product>,
    #[serde(with = "crate::domain::date_format")]
    pub reg_date: NaiveDate,
    pub reg_number: String,
}
