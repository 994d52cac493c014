use std::{sync::Arc, time::Duration};

use graphql_parser::parse_query;
use log::*;
use rand::Rng;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::UploaderConfig,
    data_objects::{Product, ProductPayload, ShopInfo},
    error::ShopifyApiError,
};

const PRODUCTS_PAGE_SIZE: u32 = 250;

/// Bounded retry budget for one API call. `max_retries` counts the attempts *after* the first,
/// so the default allows four requests in total.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { max_retries: 0, base_delay: Duration::ZERO }
    }

    /// The wait before retry number `attempt`. A server-supplied `Retry-After` wins outright;
    /// otherwise exponential backoff on `base_delay` with up to 250ms of jitter.
    fn delay_for(&self, attempt: u32, server_retry_after: Option<u64>) -> Duration {
        if let Some(secs) = server_retry_after {
            return Duration::from_secs(secs);
        }
        let backoff = self.base_delay.saturating_mul(1u32 << attempt.min(16));
        if backoff.is_zero() {
            return backoff;
        }
        backoff + Duration::from_millis(rand::thread_rng().gen_range(0..250))
    }
}

#[derive(Clone)]
pub struct ShopifyApi {
    config: UploaderConfig,
    client: Arc<Client>,
    retry: RetryPolicy,
}

impl ShopifyApi {
    pub fn new(config: UploaderConfig) -> Result<Self, ShopifyApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.access_token.reveal().as_str())
            .map_err(|e| ShopifyApiError::Initialization(e.to_string()))?;
        headers.insert("X-Shopify-Access-Token", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ShopifyApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), retry: RetryPolicy::default() })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn url(&self, path: &str) -> String {
        let shop = self.config.shop.trim_end_matches('/');
        if shop.starts_with("http://") || shop.starts_with("https://") {
            format!("{shop}/admin/api/{}{path}", self.config.api_version)
        } else {
            format!("https://{shop}/admin/api/{}{path}", self.config.api_version)
        }
    }

    /// Issues one REST call, retrying transient failures (429, 5xx, transport) within the
    /// configured [`RetryPolicy`]. 4xx responses are returned immediately.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, ShopifyApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut attempt = 0u32;
        loop {
            match self.rest_attempt(method.clone(), &url, params, body.as_ref()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt, e.retry_after());
                    warn!(
                        "Transient error on {url}: {e}. Retry {} of {} in {}ms",
                        attempt + 1,
                        self.retry.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn rest_attempt<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T, ShopifyApiError> {
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await.map_err(|e| ShopifyApiError::Transport(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(ShopifyApiError::RateLimited { retry_after });
        }
        let message = if status.is_success() {
            trace!("REST query successful. {status}");
            return response.json::<T>().await.map_err(|e| ShopifyApiError::JsonError(e.to_string()));
        } else {
            response.text().await.map_err(|e| ShopifyApiError::Transport(e.to_string()))?
        };
        if status.is_server_error() {
            Err(ShopifyApiError::ServerError { status: status.as_u16(), message })
        } else {
            Err(ShopifyApiError::QueryError { status: status.as_u16(), message })
        }
    }

    pub async fn graphql_query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<T, ShopifyApiError> {
        let query = parse_query::<String>(query).map_err(|e| ShopifyApiError::InvalidGraphQL(e.to_string()))?;
        let mut body = serde_json::json!({
            "query": query.to_string(),
        });
        if let Some(vars) = variables {
            body["variables"] = vars;
        }
        trace!("Sending GraphQL query: {body}");
        let result = self.rest_query::<Value, Value>(Method::POST, "/graphql.json", &[], Some(body)).await?;
        if let Some(errors) = result["errors"].as_array() {
            let e = errors.iter().map(|e| e.to_string()).collect::<Vec<String>>().join(", ");
            return Err(ShopifyApiError::GraphQLError(e));
        }
        let data = result["data"].clone();
        trace!("GraphQL response: {data}");
        if data.is_null() {
            return Err(ShopifyApiError::EmptyResponse);
        }
        let result = serde_json::from_value(data).map_err(|e| ShopifyApiError::JsonError(e.to_string()))?;
        Ok(result)
    }

    /// Read-only connectivity probe: confirms the credentials can reach the store before any
    /// bulk run is trusted. No mutation.
    pub async fn shop_info(&self) -> Result<ShopInfo, ShopifyApiError> {
        #[derive(Deserialize)]
        struct ShopResponse {
            shop: ShopInfo,
        }
        debug!("Fetching shop info");
        let result = self.rest_query::<ShopResponse, ()>(Method::GET, "/shop.json", &[], None).await?;
        info!("Connected to shop {} ({})", result.shop.name, result.shop.myshopify_domain);
        Ok(result.shop)
    }

    pub async fn count_products(&self) -> Result<u64, ShopifyApiError> {
        #[derive(Deserialize)]
        struct CountResponse {
            count: u64,
        }
        let result = self.rest_query::<CountResponse, ()>(Method::GET, "/products/count.json", &[], None).await?;
        Ok(result.count)
    }

    pub async fn create_product(&self, payload: &ProductPayload) -> Result<Product, ShopifyApiError> {
        let body = serde_json::json!({ "product": payload });
        debug!("Creating product '{}' ({})", payload.title, payload.handle);
        let result = self.rest_query::<ProductResponse, Value>(Method::POST, "/products.json", &[], Some(body)).await?;
        info!("Created product '{}' with id {}", result.product.title, result.product.id);
        Ok(result.product)
    }

    pub async fn update_product(&self, id: i64, payload: &ProductPayload) -> Result<Product, ShopifyApiError> {
        let body = serde_json::json!({ "product": payload });
        let path = format!("/products/{id}.json");
        debug!("Updating product #{id} ('{}')", payload.title);
        let result = self.rest_query::<ProductResponse, Value>(Method::PUT, &path, &[], Some(body)).await?;
        info!("Updated product '{}' (id {})", result.product.title, result.product.id);
        Ok(result.product)
    }

    /// Looks a product up by its handle. This is the uploader's create-vs-update pivot.
    pub async fn find_product_by_handle(&self, handle: &str) -> Result<Option<Product>, ShopifyApiError> {
        let result = self
            .rest_query::<ProductsResponse, ()>(Method::GET, "/products.json", &[("handle", handle)], None)
            .await?;
        Ok(result.products.into_iter().next())
    }

    pub async fn fetch_products_page(&self, since_id: Option<i64>) -> Result<Vec<Product>, ShopifyApiError> {
        let limit = PRODUCTS_PAGE_SIZE.to_string();
        let since = since_id.map(|id| id.to_string());
        let mut params = vec![("limit", limit.as_str())];
        if let Some(since) = since.as_deref() {
            params.push(("since_id", since));
        }
        let result = self.rest_query::<ProductsResponse, ()>(Method::GET, "/products.json", &params, None).await?;
        debug!("Fetched {} products (since_id: {since_id:?})", result.products.len());
        Ok(result.products)
    }

    /// Walks the whole catalog with `since_id` pagination.
    pub async fn fetch_all_products(&self) -> Result<Vec<Product>, ShopifyApiError> {
        let mut products: Vec<Product> = vec![];
        let mut since_id = None;
        loop {
            let page = self.fetch_products_page(since_id).await?;
            let page_len = page.len();
            since_id = page.last().map(|p| p.id);
            products.extend(page);
            if page_len < PRODUCTS_PAGE_SIZE as usize {
                break;
            }
        }
        info!("Fetched {} products in total", products.len());
        Ok(products)
    }

    /// Finds a product via the `sku:<SKU>` tag the mapper stamps on every upload. Returns the
    /// GraphQL gid of the first match.
    pub async fn find_product_by_sku_tag(&self, sku: &str) -> Result<Option<String>, ShopifyApiError> {
        #[derive(Deserialize)]
        struct Node {
            id: String,
        }
        #[derive(Deserialize)]
        struct Edge {
            node: Node,
        }
        #[derive(Deserialize)]
        struct Products {
            edges: Vec<Edge>,
        }
        #[derive(Deserialize)]
        struct SearchResponse {
            products: Products,
        }
        let query = r#"
        query ProductBySkuTag($query: String!) {
          products(first: 1, query: $query) {
            edges { node { id title tags } }
          }
        }"#;
        let variables = serde_json::json!({ "query": format!("tag:sku\\:{sku}") });
        let result = self.graphql_query::<SearchResponse>(query, Some(variables)).await?;
        Ok(result.products.edges.into_iter().next().map(|e| e.node.id))
    }

    /// Deletes one product through the GraphQL `productDelete` mutation.
    pub async fn delete_product(&self, id: i64) -> Result<(), ShopifyApiError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ProductDelete {
            deleted_product_id: Option<String>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct DeleteResponse {
            product_delete: ProductDelete,
        }
        let mutation = r#"
        mutation productDelete($input: ProductDeleteInput!) {
          productDelete(input: $input) {
            deletedProductId
            userErrors { field message }
          }
        }"#;
        let variables = serde_json::json!({ "input": { "id": format!("gid://shopify/Product/{id}") } });
        debug!("Deleting product #{id}");
        let response = self.graphql_query::<Value>(mutation, Some(variables)).await?;
        if let Some(errors) = response["productDelete"]["userErrors"].as_array() {
            if !errors.is_empty() {
                let e = errors.iter().map(|e| e.to_string()).collect::<Vec<String>>().join(", ");
                return Err(ShopifyApiError::GraphQLError(e));
            }
        }
        let deleted = serde_json::from_value::<DeleteResponse>(response)
            .map_err(|e| ShopifyApiError::JsonError(e.to_string()))?;
        match deleted.product_delete.deleted_product_id {
            Some(gid) => {
                info!("Deleted product {gid}");
                Ok(())
            },
            None => Err(ShopifyApiError::EmptyResponse),
        }
    }
}

#[derive(Deserialize)]
struct ProductResponse {
    product: Product,
}

#[derive(Deserialize)]
struct ProductsResponse {
    products: Vec<Product>,
}
