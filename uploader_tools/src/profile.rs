use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use shopify_uploader::{
    records::ProductRecord,
    sources::SourceFormat,
    MapPolicy,
    PriceAdjustment,
    ZeroPricePolicy,
};

/// A per-brand run profile. One TOML file replaces one of the original per-brand script folders:
/// the workflow is shared, the profile carries everything brand-specific.
///
/// ```toml
/// name = "acme-women"
/// input = "catalog.csv"
/// format = "csv"
/// vendor = "ACME"
/// base_tags = ["uploaded_by_script", "acme"]
/// zero_price = "reject"
///
/// [price]
/// multiplier = 0.92
/// markup_units = 150
/// ```
#[derive(Debug, Deserialize)]
pub struct BrandProfile {
    pub name: String,
    /// Source file or directory, relative to the profile file.
    pub input: PathBuf,
    pub format: SourceFormat,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub option_name: Option<String>,
    #[serde(default)]
    pub base_tags: Vec<String>,
    #[serde(default)]
    pub zero_price: ZeroPricePolicy,
    #[serde(default)]
    pub price: PriceSettings,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PriceSettings {
    pub multiplier: f64,
    pub markup_units: i64,
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self { multiplier: 1.0, markup_units: 0 }
    }
}

impl BrandProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("Could not read profile {}", path.display()))?;
        let mut profile: BrandProfile =
            toml::from_str(&raw).with_context(|| format!("Invalid profile {}", path.display()))?;
        if profile.input.is_relative() {
            if let Some(dir) = path.parent() {
                profile.input = dir.join(&profile.input);
            }
        }
        Ok(profile)
    }

    pub fn map_policy(&self) -> MapPolicy {
        let mut policy = MapPolicy { zero_price: self.zero_price, base_tags: self.base_tags.clone(), ..MapPolicy::default() };
        if let Some(option_name) = &self.option_name {
            policy.option_name = option_name.clone();
        }
        policy
    }

    pub fn price_adjustment(&self) -> PriceAdjustment {
        PriceAdjustment { multiplier: self.price.multiplier, markup_units: self.price.markup_units }
    }

    /// Fills record fields the source left empty from the profile defaults.
    pub fn apply_defaults(&self, records: &mut [ProductRecord]) {
        for record in records.iter_mut() {
            if record.vendor.is_empty() {
                if let Some(vendor) = &self.vendor {
                    record.vendor = vendor.clone();
                }
            }
            if record.product_type.is_empty() {
                if let Some(product_type) = &self.product_type {
                    record.product_type = product_type.clone();
                }
            }
        }
    }
}
