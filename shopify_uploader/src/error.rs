use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopifyApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the Shopify API: {0}")]
    Transport(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Server error {status}. {message}")]
    ServerError { status: u16, message: String },
    #[error("Rate limited by the Shopify API")]
    RateLimited { retry_after: Option<u64> },
    #[error("Invalid GraphQL query: {0}")]
    InvalidGraphQL(String),
    #[error("GraphQL query failed: {0}")]
    GraphQLError(String),
    #[error("The API returned an empty response")]
    EmptyResponse,
}

impl ShopifyApiError {
    /// Transient errors are worth retrying; everything else fails the call immediately.
    /// 4xx responses are never transient. A rejected payload stays rejected.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::ServerError { .. } | Self::Transport(_))
    }

    /// The server's `Retry-After` value in seconds, when it supplied one.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set. Add it to the environment or the .env file.")]
    MissingVar(&'static str),
    #[error("Invalid value for {name}: {message}")]
    InvalidVar { name: &'static str, message: String },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Could not read source input: {0}")]
    Read(String),
    #[error("Source input is malformed: {0}")]
    Malformed(String),
    #[error("Unknown source format: {0}")]
    UnknownFormat(String),
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("'{title}' has a zero price")]
    ZeroPrice { title: String },
    #[error("'{title}' repeats SKU {sku} across variants")]
    DuplicateSku { title: String, sku: String },
    #[error("'{title}' has no usable title or SKU to derive a handle from")]
    NoHandle { title: String },
}
