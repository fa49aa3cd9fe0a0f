//! Submits a burst of documents through a gateway limited to one request per
//! second, then waits for the window to refill and submits again.
//!
//! Run with `RUST_LOG=document_gateway=debug` to see refills.

use document_gateway::{
    Description, Document, Product, SubmissionGateway, SubmissionOutcome,
    DEFAULT_DOCUMENT_CREATE_URL,
};
use std::time::Duration;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn sample_document(doc_id: &str) -> Document {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default();
    Document {
        description: Description::new("1234567890"),
        doc_id: doc_id.to_string(),
        doc_status: "NEW".to_string(),
        doc_type: "LP_INTRODUCE_GOODS".to_string(),
        import_request: false,
        owner_inn: "1234567890".to_string(),
        participant_inn: "1234567890".to_string(),
        producer_inn: "1234567890".to_string(),
        production_date: date,
        production_type: "OWN_PRODUCTION".to_string(),
        products: vec![Product {
            certificate_document: "CONFORMITY_CERTIFICATE".to_string(),
            certificate_document_date: date,
            certificate_document_number: "CERT-1".to_string(),
            owner_inn: "1234567890".to_string(),
            producer_inn: "1234567890".to_string(),
            production_date: date,
            tnved_code: "6401100000".to_string(),
            uit_code: "010460043993125621JgXJ5.T".to_string(),
            uitu_code: String::new(),
        }],
        reg_date: date,
        reg_number: "REG-1".to_string(),
    }
}

async fn submit(gateway: &SubmissionGateway, doc_id: &str) {
    let document = sample_document(doc_id);
    match gateway.submit_default(&document, "signature").await {
        Ok(SubmissionOutcome::Success { status, .. }) => println!("{}: accepted ({})", doc_id, status),
        Ok(SubmissionOutcome::Failure { status, body }) => {
            println!("{}: rejected ({}) {}", doc_id, status, body)
        }
        Ok(SubmissionOutcome::Throttled) => println!("{}: throttled", doc_id),
        Err(e) => println!("{}: error: {}", doc_id, e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Document Gateway Example ===\n");
    println!("Endpoint: {}", DEFAULT_DOCUMENT_CREATE_URL);
    println!("Limit: 1 submission per second\n");

    let gateway = SubmissionGateway::builder()
        .with_period(Duration::from_secs(1))
        .with_request_limit(1)
        .build()?;

    // Only one of the three is admitted
    tokio::join!(
        submit(&gateway, "doc-1"),
        submit(&gateway, "doc-2"),
        submit(&gateway, "doc-3"),
    );

    println!("\nWaiting for the window to refill...\n");
    tokio::time::sleep(Duration::from_millis(1100)).await;

    submit(&gateway, "doc-4").await;
    submit(&gateway, "doc-5").await;

    println!("\n{:?}", gateway.metrics().snapshot());
    gateway.shutdown().await?;
    Ok(())
}
