use log::*;

use crate::{
    api::ShopifyApi,
    data_objects::ProductPayload,
    mapper::{map_record, MapPolicy, ZERO_PRICE_TAG},
    records::ProductRecord,
};

/// What happened to one record of the batch. `Skipped` is a mapper rejection, `Failed` is an API
/// rejection or an exhausted retry budget. Neither aborts the batch.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    Created { id: i64 },
    Updated { id: i64 },
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct RecordEntry {
    pub ident: String,
    pub outcome: RecordOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub entries: Vec<RecordEntry>,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.entries.len()
    }

    pub fn created(&self) -> usize {
        self.entries.iter().filter(|e| matches!(e.outcome, RecordOutcome::Created { .. })).count()
    }

    pub fn updated(&self) -> usize {
        self.entries.iter().filter(|e| matches!(e.outcome, RecordOutcome::Updated { .. })).count()
    }

    pub fn skipped(&self) -> usize {
        self.entries.iter().filter(|e| matches!(e.outcome, RecordOutcome::Skipped { .. })).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| matches!(e.outcome, RecordOutcome::Failed { .. })).count()
    }

    /// True only when every attempted record was created or updated. Drives the process exit
    /// code: anything less is a partial failure.
    pub fn is_full_success(&self) -> bool {
        self.skipped() == 0 && self.failed() == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} attempted: {} created, {} updated, {} skipped, {} failed",
            self.attempted(),
            self.created(),
            self.updated(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Walks a batch of parsed records and pushes each to the store, strictly one at a time.
///
/// Create-vs-update is decided per record by looking its derived handle up on the store: a hit
/// updates the existing product in place, a miss creates it. Re-running the same source is
/// therefore an update pass, never a duplicator.
pub struct ProductUploader {
    api: ShopifyApi,
    policy: MapPolicy,
}

impl ProductUploader {
    pub fn new(api: ShopifyApi, policy: MapPolicy) -> Self {
        Self { api, policy }
    }

    pub async fn upload_all(&self, records: &[ProductRecord]) -> BatchReport {
        let mut report = BatchReport::default();
        let total = records.len();
        for (i, record) in records.iter().enumerate() {
            debug!("Processing record {}/{total} ({})", i + 1, record.ident());
            let outcome = self.upload_one(record).await;
            match &outcome {
                RecordOutcome::Created { id } => info!("Created '{}' as product {id}", record.ident()),
                RecordOutcome::Updated { id } => info!("Updated '{}' (product {id})", record.ident()),
                RecordOutcome::Skipped { reason } => warn!("Skipped '{}': {reason}", record.ident()),
                RecordOutcome::Failed { reason } => error!("Failed '{}': {reason}", record.ident()),
            }
            report.entries.push(RecordEntry { ident: record.ident().to_string(), outcome });
        }
        info!("Batch done. {}", report.summary());
        report
    }

    async fn upload_one(&self, record: &ProductRecord) -> RecordOutcome {
        let payload = match map_record(record, &self.policy) {
            Ok(payload) => payload,
            Err(e) => return RecordOutcome::Skipped { reason: e.to_string() },
        };
        let existing = match self.api.find_product_by_handle(&payload.handle).await {
            Ok(existing) => existing,
            Err(e) => return RecordOutcome::Failed { reason: format!("handle lookup: {e}") },
        };
        match existing {
            Some(product) => {
                let payload = payload_for_update(payload);
                match self.api.update_product(product.id, &payload).await {
                    Ok(updated) => RecordOutcome::Updated { id: updated.id },
                    Err(e) => RecordOutcome::Failed { reason: e.to_string() },
                }
            },
            None => match self.api.create_product(&payload).await {
                Ok(created) => RecordOutcome::Created { id: created.id },
                Err(e) => RecordOutcome::Failed { reason: e.to_string() },
            },
        }
    }
}

/// An update must not flip a product the merchant has published back to draft, so the status
/// field is dropped. Zero-price flagged records are the exception: they always park in draft.
fn payload_for_update(mut payload: ProductPayload) -> ProductPayload {
    if !payload.tags.split(',').any(|t| t.trim() == ZERO_PRICE_TAG) {
        payload.status = None;
    }
    payload
}
