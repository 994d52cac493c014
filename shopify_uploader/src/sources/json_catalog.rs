use log::*;
use serde::Deserialize;
use sup_common::Cents;

use crate::{
    error::SourceError,
    records::{ProductRecord, VariantRecord},
    sources::{ProductSource, SourceFormat},
};

/// Parses a structured JSON catalog: an array of product objects in the shape the scraped feeds
/// are exported in. A record with an unparseable price is skipped with a warning; input that is
/// not a JSON array of objects fails the whole run.
pub struct JsonCatalog;

#[derive(Deserialize)]
struct RawProduct {
    sku: String,
    #[serde(alias = "title")]
    name: String,
    price: String,
    #[serde(default, alias = "previousPrice", alias = "compare_at_price")]
    previous_price: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default, alias = "vendor")]
    brand: String,
    #[serde(default, alias = "productType", alias = "category")]
    product_type: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    variants: Vec<RawVariant>,
}

#[derive(Deserialize)]
struct RawVariant {
    name: String,
    #[serde(default)]
    sku: String,
    #[serde(default, alias = "barcode")]
    upc: Option<String>,
    #[serde(default)]
    quantity: i64,
    #[serde(default)]
    price: Option<String>,
}

impl ProductSource for JsonCatalog {
    fn format(&self) -> SourceFormat {
        SourceFormat::Json
    }

    fn parse(&self, input: &str) -> Result<Vec<ProductRecord>, SourceError> {
        // Deserialize entry by entry: one bad record must not take the rest of the batch with it.
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(input).map_err(|e| SourceError::Malformed(format!("JSON catalog: {e}")))?;
        let mut records = Vec::with_capacity(raw.len());
        for (i, entry) in raw.into_iter().enumerate() {
            let product = match serde_json::from_value::<RawProduct>(entry) {
                Ok(product) => product,
                Err(e) => {
                    warn!("Skipping malformed catalog entry #{}: {e}", i + 1);
                    continue;
                },
            };
            match convert(product) {
                Ok(record) => records.push(record),
                Err(reason) => warn!("Skipping malformed catalog entry: {reason}"),
            }
        }
        Ok(records)
    }
}

fn convert(raw: RawProduct) -> Result<ProductRecord, String> {
    let price =
        Cents::from_decimal_str(&raw.price).map_err(|e| format!("'{}' (SKU {}): {e}", raw.name, raw.sku))?;
    let compare_at_price = match raw.previous_price.as_deref() {
        None | Some("") => None,
        Some(p) => match Cents::from_decimal_str(p) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("Ignoring bad previous price for '{}': {e}", raw.name);
                None
            },
        },
    };
    let variants = raw
        .variants
        .into_iter()
        .map(|v| {
            let price = v.price.as_deref().and_then(|p| match Cents::from_decimal_str(p) {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!("Ignoring bad variant price for '{}': {e}", v.name);
                    None
                },
            });
            VariantRecord { name: v.name, sku: v.sku, barcode: v.upc, quantity: v.quantity, price }
        })
        .collect();
    Ok(ProductRecord {
        title: raw.name,
        description: raw.description,
        vendor: raw.brand,
        product_type: raw.product_type,
        tags: raw.tags,
        sku: raw.sku,
        price,
        compare_at_price,
        variants,
        images: raw.images,
    })
}
