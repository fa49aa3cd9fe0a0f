//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use document_gateway::{Description, Document, Product};

pub const ENDPOINT: &str = "https://registry.test/api/v3/lk/documents/create";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
}

pub fn product(uit: &str) -> Product {
    Product {
        certificate_document: "CONFORMITY_DECLARATION".to_string(),
        certificate_document_date: date(2024, 4, 1),
        certificate_document_number: "EAEU-N-0001".to_string(),
        owner_inn: "5000000001".to_string(),
        producer_inn: "5000000002".to_string(),
        production_date: date(2024, 3, 15),
        tnved_code: "6403990000".to_string(),
        uit_code: uit.to_string(),
        uitu_code: format!("box-{}", uit),
    }
}

pub fn document(doc_id: &str) -> Document {
    Document {
        description: Description::new("5000000003"),
        doc_id: doc_id.to_string(),
        doc_status: "NEW".to_string(),
        doc_type: "LP_INTRODUCE_GOODS".to_string(),
        import_request: false,
        owner_inn: "5000000001".to_string(),
        participant_inn: "5000000003".to_string(),
        producer_inn: "5000000002".to_string(),
        production_date: date(2024, 3, 15),
        production_type: "OWN_PRODUCTION".to_string(),
        products: vec![product("010460043993125621JgXJ5.T")],
        reg_date: date(2024, 4, 2),
        reg_number: "0001".to_string(),
    }
}
