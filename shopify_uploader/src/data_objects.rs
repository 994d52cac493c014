use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//------------------------------------  Request payload shapes  -------------------------------------------------------

/// The `product` body of a REST create or update call. Built fresh from a [`crate::ProductRecord`]
/// for every upload and discarded once the response has been handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    pub vendor: String,
    pub product_type: String,
    /// Comma-joined tag list, the shape the REST API expects.
    pub tags: String,
    /// `Some("draft")` on create; cleared on update so a published product stays published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub handle: String,
    pub options: Vec<ProductOption>,
    pub variants: Vec<VariantPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImagePayload>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductOption {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantPayload {
    pub option1: String,
    pub price: String,
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<String>,
    pub inventory_quantity: i64,
    pub inventory_management: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePayload {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

//------------------------------------  Response shapes  --------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub handle: String,
    pub status: String,
    #[serde(default)]
    pub tags: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: i64,
    pub title: String,
    pub price: String,
    pub sku: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopInfo {
    pub id: i64,
    pub name: String,
    pub myshopify_domain: String,
    pub currency: Option<String>,
    pub plan_name: Option<String>,
}
