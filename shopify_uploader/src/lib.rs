pub mod api;
pub mod config;
pub mod data_objects;
pub mod dedup;
pub mod error;
pub mod helpers;
pub mod mapper;
pub mod records;
pub mod sources;
pub mod uploader;

pub use api::{RetryPolicy, ShopifyApi};
pub use config::{UploaderConfig, DEFAULT_API_VERSION};
pub use error::{ConfigError, MapError, ShopifyApiError, SourceError};
pub use mapper::{map_record, MapPolicy, ZeroPricePolicy};
pub use records::{PriceAdjustment, ProductRecord, VariantRecord};
pub use uploader::{BatchReport, ProductUploader, RecordOutcome};
