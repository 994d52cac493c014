use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::*;
use shopify_uploader::{
    dedup,
    records::ProductRecord,
    sources::{source_for, ProductSource},
    uploader::{BatchReport, RecordOutcome},
    ProductUploader,
    ShopifyApi,
    UploaderConfig,
};

use crate::{
    command_def::{Command, DuplicatesCommand, ProductsCommand, UploadParams},
    profile::BrandProfile,
};

pub const EXIT_OK: i32 = 0;
pub const EXIT_FATAL: i32 = 1;
pub const EXIT_PARTIAL: i32 = 2;

pub async fn handle_command(command: Command) -> i32 {
    use Command::*;
    match command {
        Test => run_connectivity_test().await,
        Upload(params) => run_upload(params).await,
        Products(products_cmd) => match products_cmd {
            ProductsCommand::Count => count_products().await,
            ProductsCommand::Get { handle } => get_product(handle).await,
            ProductsCommand::Find { sku } => find_product(sku).await,
            ProductsCommand::Delete { id } => delete_product(id).await,
        },
        Duplicates(duplicates_cmd) => match duplicates_cmd {
            DuplicatesCommand::Find => find_duplicates().await,
            DuplicatesCommand::Delete { yes } => delete_duplicates(yes).await,
        },
    }
}

fn new_shopify_api() -> Result<ShopifyApi> {
    let config = UploaderConfig::try_from_env()?;
    let api = ShopifyApi::new(config)?;
    Ok(api)
}

async fn run_connectivity_test() -> i32 {
    let api = match new_shopify_api() {
        Ok(api) => api,
        Err(e) => {
            eprintln!("FAIL: {e}");
            return EXIT_FATAL;
        },
    };
    match api.shop_info().await {
        Ok(shop) => {
            println!("PASS: connected to '{}' ({})", shop.name, shop.myshopify_domain);
            EXIT_OK
        },
        Err(e) => {
            eprintln!("FAIL: {e}");
            EXIT_FATAL
        },
    }
}

async fn run_upload(params: UploadParams) -> i32 {
    let report = match upload(&params).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Upload aborted: {e:#}");
            return EXIT_FATAL;
        },
    };
    println!("{}", report.summary());
    for entry in &report.entries {
        match &entry.outcome {
            RecordOutcome::Skipped { reason } => println!("  skipped {}: {reason}", entry.ident),
            RecordOutcome::Failed { reason } => println!("  failed  {}: {reason}", entry.ident),
            _ => (),
        }
    }
    if report.is_full_success() {
        EXIT_OK
    } else {
        EXIT_PARTIAL
    }
}

async fn upload(params: &UploadParams) -> Result<BatchReport> {
    let profile = BrandProfile::load(&params.profile)?;
    let api = new_shopify_api()?;
    // No bulk run against a store we cannot reach read-only.
    let shop = api.shop_info().await.context("connectivity test failed")?;
    info!("Uploading '{}' to {}", profile.name, shop.myshopify_domain);

    let source = source_for(profile.format);
    let mut records = parse_input(source.as_ref(), &profile.input)?;
    if records.is_empty() {
        warn!("Source {} produced no records", profile.input.display());
    }
    profile.apply_defaults(&mut records);
    profile.price_adjustment().apply_to_records(&mut records);

    let uploader = ProductUploader::new(api, profile.map_policy());
    Ok(uploader.upload_all(&records).await)
}

/// Reads the profile's input file, or every file of its input directory in name order.
fn parse_input(source: &(dyn ProductSource + Send + Sync), path: &Path) -> Result<Vec<ProductRecord>> {
    let files: Vec<PathBuf> = if path.is_dir() {
        let mut files = fs::read_dir(path)
            .with_context(|| format!("Could not read input directory {}", path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect::<Vec<_>>();
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };
    let mut records = vec![];
    for file in files {
        let raw = fs::read_to_string(&file).with_context(|| format!("Could not read {}", file.display()))?;
        let parsed = source.parse(&raw).with_context(|| format!("Could not parse {}", file.display()))?;
        debug!("Parsed {} records from {}", parsed.len(), file.display());
        records.extend(parsed);
    }
    Ok(records)
}

async fn count_products() -> i32 {
    let api = match new_shopify_api() {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_FATAL;
        },
    };
    match api.count_products().await {
        Ok(count) => {
            println!("{count} products");
            EXIT_OK
        },
        Err(e) => {
            eprintln!("Error counting products: {e}");
            EXIT_FATAL
        },
    }
}

async fn get_product(handle: String) -> i32 {
    let api = match new_shopify_api() {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_FATAL;
        },
    };
    match api.find_product_by_handle(&handle).await {
        Ok(Some(product)) => {
            let json = serde_json::to_string_pretty(&product)
                .unwrap_or_else(|e| format!("Could not represent product as JSON. {e}"));
            println!("{json}");
            EXIT_OK
        },
        Ok(None) => {
            println!("No product with handle '{handle}'");
            EXIT_FATAL
        },
        Err(e) => {
            eprintln!("Error fetching product '{handle}': {e}");
            EXIT_FATAL
        },
    }
}

async fn find_product(sku: String) -> i32 {
    let api = match new_shopify_api() {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_FATAL;
        },
    };
    match api.find_product_by_sku_tag(&sku).await {
        Ok(Some(gid)) => {
            println!("{gid}");
            EXIT_OK
        },
        Ok(None) => {
            println!("No product carries the tag sku:{sku}");
            EXIT_FATAL
        },
        Err(e) => {
            eprintln!("Error searching for SKU {sku}: {e}");
            EXIT_FATAL
        },
    }
}

async fn delete_product(id: i64) -> i32 {
    let api = match new_shopify_api() {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_FATAL;
        },
    };
    match api.delete_product(id).await {
        Ok(()) => {
            println!("Deleted product {id}");
            EXIT_OK
        },
        Err(e) => {
            eprintln!("Error deleting product {id}: {e}");
            EXIT_FATAL
        },
    }
}

async fn find_duplicates() -> i32 {
    let api = match new_shopify_api() {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_FATAL;
        },
    };
    match dedup::audit(&api).await {
        Ok(groups) if groups.is_empty() => {
            println!("No duplicate SKUs found");
            EXIT_OK
        },
        Ok(groups) => {
            print_groups(&groups);
            EXIT_OK
        },
        Err(e) => {
            eprintln!("Error auditing duplicates: {e}");
            EXIT_FATAL
        },
    }
}

async fn delete_duplicates(yes: bool) -> i32 {
    let api = match new_shopify_api() {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {e}");
            return EXIT_FATAL;
        },
    };
    let groups = match dedup::audit(&api).await {
        Ok(groups) => groups,
        Err(e) => {
            eprintln!("Error auditing duplicates: {e}");
            return EXIT_FATAL;
        },
    };
    let doomed = dedup::deletion_set(&groups);
    if doomed.is_empty() {
        println!("No duplicate SKUs found");
        return EXIT_OK;
    }
    if !yes {
        print_groups(&groups);
        println!("{} products would be deleted. Re-run with --yes to delete them.", doomed.len());
        return EXIT_OK;
    }
    let report = dedup::delete_duplicates(&api, &doomed).await;
    println!("Deleted {} products, {} failed", report.deleted, report.failed);
    if report.failed == 0 {
        EXIT_OK
    } else {
        EXIT_PARTIAL
    }
}

fn print_groups(groups: &[dedup::DuplicateGroup]) {
    for group in groups {
        println!("SKU {} ({} products):", group.sku, group.products.len());
        for product in &group.products {
            println!("  {} '{}' created {}", product.id, product.title, product.created_at);
        }
    }
}
