use std::collections::HashSet;

use serde::Deserialize;

use crate::{
    data_objects::{ImagePayload, ProductOption, ProductPayload, VariantPayload},
    error::MapError,
    helpers::{product_handle, strip_query},
    records::ProductRecord,
};

pub const DRAFT_STATUS: &str = "draft";
pub const ZERO_PRICE_TAG: &str = "zero-price";
pub const DISCOUNTED_TAG: &str = "discounted";

/// What to do with a record whose price is zero. `Reject` drops the record from the batch;
/// `Flag` uploads it as a draft carrying the `zero-price` tag for a human to sort out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroPricePolicy {
    #[default]
    Reject,
    Flag,
}

#[derive(Debug, Clone)]
pub struct MapPolicy {
    pub zero_price: ZeroPricePolicy,
    /// The product option the variants enumerate, "Size" for the apparel feeds.
    pub option_name: String,
    /// Tags applied to every product of the run, ahead of the record's own tags.
    pub base_tags: Vec<String>,
}

impl Default for MapPolicy {
    fn default() -> Self {
        Self { zero_price: ZeroPricePolicy::Reject, option_name: "Size".to_string(), base_tags: Vec::new() }
    }
}

/// Maps one parsed record to the API payload shape. Pure and deterministic: no I/O, no clock,
/// identical input yields an identical payload.
///
/// Edge-case policy, in order of evaluation:
/// - no usable title or SKU: rejected, a handle cannot be derived
/// - duplicate variant SKUs: rejected
/// - zero price: rejected or flagged per [`ZeroPricePolicy`]
/// - no images: the `images` field is omitted entirely
pub fn map_record(record: &ProductRecord, policy: &MapPolicy) -> Result<ProductPayload, MapError> {
    let handle = product_handle(&record.title, &record.sku);
    if handle.is_empty() {
        return Err(MapError::NoHandle { title: record.title.clone() });
    }

    let mut seen = HashSet::new();
    for variant in &record.variants {
        if !variant.sku.is_empty() && !seen.insert(variant.sku.as_str()) {
            return Err(MapError::DuplicateSku { title: record.title.clone(), sku: variant.sku.clone() });
        }
    }

    let zero_priced = record.price.is_zero();
    if zero_priced && policy.zero_price == ZeroPricePolicy::Reject {
        return Err(MapError::ZeroPrice { title: record.title.clone() });
    }

    let mut tags = policy.base_tags.clone();
    tags.extend(record.tags.iter().cloned());
    if !record.sku.is_empty() {
        tags.push(format!("sku:{}", record.sku));
    }
    if record.compare_at_price.is_some_and(|previous| previous > record.price) && !zero_priced {
        tags.push(DISCOUNTED_TAG.to_string());
    }
    if zero_priced {
        tags.push(ZERO_PRICE_TAG.to_string());
    }

    let compare_at = record.compare_at_price.map(|p| p.to_decimal_string());
    let (options, variants) = if record.variants.is_empty() {
        // Shopify's single-variant convention: one "Title" option with the "Default Title" value.
        let variant = VariantPayload {
            option1: "Default Title".to_string(),
            price: record.price.to_decimal_string(),
            sku: record.sku.clone(),
            barcode: None,
            compare_at_price: compare_at,
            inventory_quantity: 0,
            inventory_management: "shopify".to_string(),
        };
        (vec![ProductOption { name: "Title".to_string(), values: vec!["Default Title".to_string()] }], vec![variant])
    } else {
        let values = record.variants.iter().map(|v| v.name.clone()).collect::<Vec<_>>();
        let variants = record
            .variants
            .iter()
            .map(|v| VariantPayload {
                option1: v.name.clone(),
                price: v.price.unwrap_or(record.price).to_decimal_string(),
                sku: v.sku.clone(),
                barcode: v.barcode.clone(),
                compare_at_price: compare_at.clone(),
                inventory_quantity: v.quantity,
                inventory_management: "shopify".to_string(),
            })
            .collect();
        (vec![ProductOption { name: policy.option_name.clone(), values }], variants)
    };

    let images = if record.images.is_empty() {
        None
    } else {
        let images = record
            .images
            .iter()
            .map(|url| ImagePayload {
                src: strip_query(url).to_string(),
                alt: Some(format!("{} image", record.title)),
            })
            .collect();
        Some(images)
    };

    let body_html =
        if record.description.is_empty() { None } else { Some(format!("<p>{}</p>", record.description)) };

    Ok(ProductPayload {
        title: record.title.clone(),
        body_html,
        vendor: record.vendor.clone(),
        product_type: record.product_type.clone(),
        tags: tags.join(", "),
        status: Some(DRAFT_STATUS.to_string()),
        handle,
        options,
        variants,
        images,
    })
}

#[cfg(test)]
mod test {
    use sup_common::Cents;

    use super::*;
    use crate::records::VariantRecord;

    fn sample_record() -> ProductRecord {
        ProductRecord {
            title: "Gazelle Bold Shoes".to_string(),
            description: "Suede upper.".to_string(),
            vendor: "adidas Originals".to_string(),
            product_type: "Trainers".to_string(),
            tags: vec!["new".to_string()],
            sku: "JD-1001".to_string(),
            price: Cents::from_units(180),
            compare_at_price: Some(Cents::from_units(220)),
            variants: vec![
                VariantRecord { name: "7".to_string(), sku: "JD-1001-7".to_string(), quantity: 1, ..Default::default() },
                VariantRecord {
                    name: "8".to_string(),
                    sku: "JD-1001-8".to_string(),
                    quantity: 0,
                    price: Some(Cents::from_units(175)),
                    ..Default::default()
                },
                VariantRecord { name: "9".to_string(), sku: "JD-1001-9".to_string(), quantity: 1, ..Default::default() },
            ],
            images: vec!["https://cdn.example.com/gazelle.jpg?v=9".to_string()],
        }
    }

    #[test]
    fn maps_every_required_field_and_is_deterministic() {
        let policy = MapPolicy { base_tags: vec!["uploaded_by_script".to_string()], ..Default::default() };
        let payload = map_record(&sample_record(), &policy).unwrap();
        assert_eq!(payload.title, "Gazelle Bold Shoes");
        assert_eq!(payload.vendor, "adidas Originals");
        assert_eq!(payload.product_type, "Trainers");
        assert_eq!(payload.handle, "gazelle-bold-shoes-jd-1001");
        assert_eq!(payload.status.as_deref(), Some(DRAFT_STATUS));
        assert_eq!(payload.tags, "uploaded_by_script, new, sku:JD-1001, discounted");
        assert_eq!(payload.body_html.as_deref(), Some("<p>Suede upper.</p>"));
        assert_eq!(payload.images.as_ref().unwrap()[0].src, "https://cdn.example.com/gazelle.jpg");

        let again = map_record(&sample_record(), &policy).unwrap();
        assert_eq!(payload, again);
    }

    #[test]
    fn n_variants_map_to_n_entries_preserving_sku_and_price() {
        let payload = map_record(&sample_record(), &MapPolicy::default()).unwrap();
        assert_eq!(payload.variants.len(), 3);
        assert_eq!(payload.options[0].values, vec!["7", "8", "9"]);
        assert_eq!(payload.variants[0].sku, "JD-1001-7");
        assert_eq!(payload.variants[0].price, "180.00");
        assert_eq!(payload.variants[1].sku, "JD-1001-8");
        assert_eq!(payload.variants[1].price, "175.00");
        assert_eq!(payload.variants[2].price, "180.00");
    }

    #[test]
    fn zero_price_is_rejected_by_default() {
        let mut record = sample_record();
        record.price = Cents::from(0);
        record.variants.iter_mut().for_each(|v| v.price = None);
        assert!(matches!(map_record(&record, &MapPolicy::default()), Err(MapError::ZeroPrice { .. })));
    }

    #[test]
    fn zero_price_can_be_flagged_instead() {
        let mut record = sample_record();
        record.price = Cents::from(0);
        record.variants.iter_mut().for_each(|v| v.price = None);
        let policy = MapPolicy { zero_price: ZeroPricePolicy::Flag, ..Default::default() };
        let payload = map_record(&record, &policy).unwrap();
        assert_eq!(payload.status.as_deref(), Some(DRAFT_STATUS));
        assert!(payload.tags.contains(ZERO_PRICE_TAG));
        // A zero-price record is never advertised as discounted.
        assert!(!payload.tags.contains(DISCOUNTED_TAG));
    }

    #[test]
    fn duplicate_variant_skus_are_rejected() {
        let mut record = sample_record();
        record.variants[2].sku = "JD-1001-7".to_string();
        let err = map_record(&record, &MapPolicy::default()).unwrap_err();
        assert!(matches!(err, MapError::DuplicateSku { ref sku, .. } if sku == "JD-1001-7"));
    }

    #[test]
    fn missing_images_omit_the_field() {
        let mut record = sample_record();
        record.images.clear();
        let payload = map_record(&record, &MapPolicy::default()).unwrap();
        assert!(payload.images.is_none());
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("images").is_none());
    }

    #[test]
    fn records_without_variants_get_the_default_title_variant() {
        let mut record = sample_record();
        record.variants.clear();
        let payload = map_record(&record, &MapPolicy::default()).unwrap();
        assert_eq!(payload.variants.len(), 1);
        assert_eq!(payload.variants[0].option1, "Default Title");
        assert_eq!(payload.variants[0].sku, "JD-1001");
        assert_eq!(payload.options[0].name, "Title");
    }

    #[test]
    fn records_with_no_title_or_sku_cannot_be_mapped() {
        let record = ProductRecord { price: Cents::from_units(10), ..Default::default() };
        assert!(matches!(map_record(&record, &MapPolicy::default()), Err(MapError::NoHandle { .. })));
    }
}
