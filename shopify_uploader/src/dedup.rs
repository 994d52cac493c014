use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::*;

use crate::{api::ShopifyApi, data_objects::Product, error::ShopifyApiError};

pub const SKU_TAG_PREFIX: &str = "sku:";

/// Products sharing one `sku:` tag, oldest first.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub sku: String,
    pub products: Vec<ProductSummary>,
}

#[derive(Debug, Clone)]
pub struct ProductSummary {
    pub id: i64,
    pub title: String,
    pub handle: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DedupReport {
    pub deleted: usize,
    pub failed: usize,
}

/// Pulls the SKU out of a comma-joined tag string, e.g. "new, sku:JD-1001" yields "JD-1001".
pub fn sku_from_tags(tags: &str) -> Option<&str> {
    tags.split(',').map(str::trim).find_map(|tag| tag.strip_prefix(SKU_TAG_PREFIX))
}

/// Groups a catalog by `sku:` tag and keeps only the groups with more than one product.
/// Products without a SKU tag were not uploaded by this tool and are left alone.
pub fn find_duplicates(products: &[Product]) -> Vec<DuplicateGroup> {
    let mut by_sku: BTreeMap<String, Vec<ProductSummary>> = BTreeMap::new();
    let mut untagged = 0usize;
    for product in products {
        match sku_from_tags(&product.tags) {
            Some(sku) => by_sku.entry(sku.to_string()).or_default().push(ProductSummary {
                id: product.id,
                title: product.title.clone(),
                handle: product.handle.clone(),
                created_at: product.created_at,
            }),
            None => untagged += 1,
        }
    }
    if untagged > 0 {
        debug!("{untagged} products carry no {SKU_TAG_PREFIX} tag and were ignored");
    }
    by_sku
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|(sku, mut products)| {
            products.sort_by_key(|p| p.created_at);
            DuplicateGroup { sku, products }
        })
        .collect()
}

/// Everything that should go: all but the newest product of each group. The newest survives
/// because it carries the most recent upload's data.
pub fn deletion_set(groups: &[DuplicateGroup]) -> Vec<ProductSummary> {
    groups.iter().flat_map(|g| g.products[..g.products.len() - 1].iter().cloned()).collect()
}

/// Fetches the whole catalog and reports its duplicate groups.
pub async fn audit(api: &ShopifyApi) -> Result<Vec<DuplicateGroup>, ShopifyApiError> {
    let products = api.fetch_all_products().await?;
    let groups = find_duplicates(&products);
    info!("Duplicate audit: {} products, {} duplicated SKUs", products.len(), groups.len());
    Ok(groups)
}

/// Deletes the doomed products one by one. A failed deletion is logged and counted; the pass
/// continues with the next product.
pub async fn delete_duplicates(api: &ShopifyApi, doomed: &[ProductSummary]) -> DedupReport {
    let mut report = DedupReport::default();
    for product in doomed {
        match api.delete_product(product.id).await {
            Ok(()) => {
                info!("Deleted duplicate '{}' (id {})", product.title, product.id);
                report.deleted += 1;
            },
            Err(e) => {
                error!("Could not delete duplicate '{}' (id {}): {e}", product.title, product.id);
                report.failed += 1;
            },
        }
    }
    info!("Duplicate cleanup: {} deleted, {} failed", report.deleted, report.failed);
    report
}

#[cfg(test)]
mod test {
    use super::*;

    fn product(id: i64, tags: &str, created: &str) -> Product {
        Product {
            id,
            title: format!("Product {id}"),
            handle: format!("product-{id}"),
            status: "active".to_string(),
            tags: tags.to_string(),
            created_at: created.parse().unwrap(),
            variants: vec![],
        }
    }

    #[test]
    fn extracts_sku_from_tag_lists() {
        assert_eq!(sku_from_tags("uploaded_by_script, new, sku:JD-1001"), Some("JD-1001"));
        assert_eq!(sku_from_tags("new, discounted"), None);
        assert_eq!(sku_from_tags(""), None);
    }

    #[test]
    fn groups_duplicates_and_keeps_the_newest() {
        let products = vec![
            product(1, "sku:A", "2025-01-01T00:00:00Z"),
            product(2, "sku:B", "2025-01-02T00:00:00Z"),
            product(3, "new, sku:A", "2025-03-01T00:00:00Z"),
            product(4, "sku:A", "2025-02-01T00:00:00Z"),
            product(5, "no tag here", "2025-01-01T00:00:00Z"),
        ];
        let groups = find_duplicates(&products);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].sku, "A");
        let ids = groups[0].products.iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 4, 3]);

        let doomed = deletion_set(&groups);
        let doomed_ids = doomed.iter().map(|p| p.id).collect::<Vec<_>>();
        // Product 3 is the newest upload for SKU A and survives.
        assert_eq!(doomed_ids, vec![1, 4]);
    }

    #[test]
    fn unique_skus_produce_no_groups() {
        let products =
            vec![product(1, "sku:A", "2025-01-01T00:00:00Z"), product(2, "sku:B", "2025-01-02T00:00:00Z")];
        assert!(find_duplicates(&products).is_empty());
    }
}
