use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::{error::SourceError, records::ProductRecord};

mod csv_catalog;
mod html_listing;
mod json_catalog;

pub use csv_catalog::CsvCatalog;
pub use html_listing::HtmlListing;
pub use json_catalog::JsonCatalog;

/// A brand-specific input parser. One parse per run; the returned `Vec` is the finite,
/// restartable record sequence the uploader walks.
///
/// Implementations skip malformed entries with a logged warning and reserve `Err` for input
/// that is unusable as a whole.
pub trait ProductSource {
    fn format(&self) -> SourceFormat;

    fn parse(&self, input: &str) -> Result<Vec<ProductRecord>, SourceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Json,
    Csv,
    Html,
}

impl FromStr for SourceFormat {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "html" | "htm" => Ok(Self::Html),
            other => Err(SourceError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Html => "html",
        };
        f.write_str(s)
    }
}

/// Picks the parser for a format. This is the plugin seam that replaces the per-brand scripts:
/// the workflow is identical for every brand, only the source differs.
pub fn source_for(format: SourceFormat) -> Box<dyn ProductSource + Send + Sync> {
    match format {
        SourceFormat::Json => Box::new(JsonCatalog),
        SourceFormat::Csv => Box::new(CsvCatalog),
        SourceFormat::Html => Box::new(HtmlListing),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formats_parse_from_strings() {
        assert_eq!("json".parse::<SourceFormat>().unwrap(), SourceFormat::Json);
        assert_eq!("CSV".parse::<SourceFormat>().unwrap(), SourceFormat::Csv);
        assert_eq!("htm".parse::<SourceFormat>().unwrap(), SourceFormat::Html);
        assert!(matches!("xml".parse::<SourceFormat>(), Err(SourceError::UnknownFormat(_))));
    }
}
