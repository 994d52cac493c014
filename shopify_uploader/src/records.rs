use serde::{Deserialize, Serialize};
use sup_common::Cents;

/// Brand-neutral intermediate representation of one product, as produced by a
/// [`crate::sources::ProductSource`] and consumed by [`crate::mapper::map_record`].
/// Lives for a single run only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    pub description: String,
    pub vendor: String,
    pub product_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// The parent SKU shared by the product's variants.
    pub sku: String,
    pub price: Cents,
    #[serde(default)]
    pub compare_at_price: Option<Cents>,
    #[serde(default)]
    pub variants: Vec<VariantRecord>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantRecord {
    /// The option value, e.g. a size ("8.5") or a colour.
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    /// Overrides the record price for this variant when set.
    #[serde(default)]
    pub price: Option<Cents>,
}

impl ProductRecord {
    /// A short identifier for log lines: the SKU when present, the title otherwise.
    pub fn ident(&self) -> &str {
        if self.sku.is_empty() {
            &self.title
        } else {
            &self.sku
        }
    }
}

/// Per-brand price rewrite applied between parsing and mapping: a currency conversion factor and
/// a flat markup, each price rounded up to a whole currency unit afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceAdjustment {
    pub multiplier: f64,
    /// Markup in whole currency units.
    pub markup_units: i64,
}

impl Default for PriceAdjustment {
    fn default() -> Self {
        Self { multiplier: 1.0, markup_units: 0 }
    }
}

impl PriceAdjustment {
    pub fn is_identity(&self) -> bool {
        self.multiplier == 1.0 && self.markup_units == 0
    }

    pub fn apply(&self, price: Cents) -> Cents {
        if self.is_identity() || price.is_zero() {
            return price;
        }
        price.scale_to_whole_units(self.multiplier) + Cents::from_units(self.markup_units)
    }

    /// Rewrites every price in the batch, compare-at and per-variant overrides included.
    pub fn apply_to_records(&self, records: &mut [ProductRecord]) {
        if self.is_identity() {
            return;
        }
        for record in records.iter_mut() {
            record.price = self.apply(record.price);
            record.compare_at_price = record.compare_at_price.map(|p| self.apply(p));
            for variant in record.variants.iter_mut() {
                variant.price = variant.price.map(|p| self.apply(p));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn adjustment_converts_and_marks_up() {
        // 100.00 NZD at 0.92 -> 92.00, plus 150 markup -> 242.00
        let adj = PriceAdjustment { multiplier: 0.92, markup_units: 150 };
        assert_eq!(adj.apply(Cents::from_units(100)), Cents::from_units(242));
    }

    #[test]
    fn identity_adjustment_leaves_prices_alone() {
        let adj = PriceAdjustment::default();
        assert_eq!(adj.apply(Cents::from(12345)), Cents::from(12345));
    }

    #[test]
    fn zero_prices_stay_zero_so_policy_checks_still_fire() {
        let adj = PriceAdjustment { multiplier: 0.92, markup_units: 150 };
        assert_eq!(adj.apply(Cents::from(0)), Cents::from(0));
    }

    #[test]
    fn adjustment_reaches_variant_overrides() {
        let adj = PriceAdjustment { multiplier: 1.0, markup_units: 10 };
        let mut records = vec![ProductRecord {
            title: "Runner".to_string(),
            sku: "R1".to_string(),
            price: Cents::from_units(90),
            compare_at_price: Some(Cents::from_units(120)),
            variants: vec![VariantRecord {
                name: "8".to_string(),
                sku: "R1-8".to_string(),
                price: Some(Cents::from_units(95)),
                ..Default::default()
            }],
            ..Default::default()
        }];
        adj.apply_to_records(&mut records);
        assert_eq!(records[0].price, Cents::from_units(100));
        assert_eq!(records[0].compare_at_price, Some(Cents::from_units(130)));
        assert_eq!(records[0].variants[0].price, Some(Cents::from_units(105)));
    }
}
