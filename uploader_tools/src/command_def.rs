use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Pushes parsed brand catalogs to a Shopify store")]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify credentials and API reachability with one read-only call. Run this before trusting
    /// any bulk upload.
    Test,
    /// Parse a brand source and create or update its products on the store
    Upload(UploadParams),
    #[command(subcommand)]
    /// Retrieve or delete individual products
    Products(ProductsCommand),
    #[command(subcommand)]
    /// Find or remove products that share a SKU tag
    Duplicates(DuplicatesCommand),
}

#[derive(Debug, Args)]
pub struct UploadParams {
    /// Path to the brand profile TOML describing the source and its policies
    #[arg(short, long)]
    pub profile: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum ProductsCommand {
    /// Count the products on the store
    Count,
    /// Fetch the product with the given handle
    Get {
        #[arg(required = true, index = 1)]
        handle: String,
    },
    /// Look a product up by its sku:<SKU> tag and print its GraphQL id
    Find {
        #[arg(required = true, index = 1)]
        sku: String,
    },
    /// Delete the product with the given numeric id
    Delete {
        #[arg(required = true, index = 1)]
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum DuplicatesCommand {
    /// List every group of products sharing a sku:<SKU> tag
    Find,
    /// Delete duplicates, keeping the newest product of each group
    Delete {
        /// Actually delete. Without this flag the doomed products are only listed.
        #[arg(long)]
        yes: bool,
    },
}
