use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Sub},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------       Cents         ---------------------------------------------------------
/// A money amount in minor currency units (cents). Shopify expresses prices as decimal strings
/// ("59.95"), so conversions in both directions live here rather than at every call site.
#[derive(Debug, Clone, Copy, Default, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Cents(i64);

#[derive(Debug, Clone, Error)]
#[error("Invalid currency amount: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Cents {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Cents {}

impl Add for Cents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Cents {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Whole currency units, e.g. `Cents::from_units(150)` is 150.00.
    pub fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// Parses a Shopify decimal price string. The fractional part is interpreted to two places:
    /// "59.9" is 59.90, "59.955" is rejected.
    pub fn from_decimal_str(price: &str) -> Result<Self, CentsConversionError> {
        let price = price.trim();
        let mut parts = price.split('.');
        let whole = parts
            .next()
            .ok_or_else(|| CentsConversionError(price.to_string()))?
            .parse::<i64>()
            .map_err(|e| CentsConversionError(format!("Invalid price value: {price}. {e}.")))?;
        let cents = match parts.next() {
            None | Some("") => 0,
            Some(frac) if frac.len() <= 2 && frac.chars().all(|c| c.is_ascii_digit()) => {
                let padded = format!("{frac:0<2}");
                padded.parse::<i64>().map_err(|e| CentsConversionError(format!("Invalid price value: {price}. {e}.")))?
            },
            Some(_) => return Err(CentsConversionError(format!("Invalid price value: {price}."))),
        };
        if parts.next().is_some() {
            return Err(CentsConversionError(format!("Invalid price value: {price}.")));
        }
        let sign = if whole < 0 { -1 } else { 1 };
        Ok(Self(whole * 100 + sign * cents))
    }

    /// Renders the amount as a Shopify decimal string, always with two fractional digits.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    /// Multiplies by `multiplier` and rounds **up** to the next whole currency unit, which is how
    /// the storefront prices imported catalogs after currency conversion.
    pub fn scale_to_whole_units(self, multiplier: f64) -> Self {
        let units = (self.0 as f64 * multiplier / 100.0).ceil() as i64;
        Self::from_units(units)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_decimal_strings() {
        assert_eq!(Cents::from_decimal_str("59.95").unwrap(), Cents::from(5995));
        assert_eq!(Cents::from_decimal_str("59.9").unwrap(), Cents::from(5990));
        assert_eq!(Cents::from_decimal_str("120").unwrap(), Cents::from(12000));
        assert_eq!(Cents::from_decimal_str("0.05").unwrap(), Cents::from(5));
        assert!(Cents::from_decimal_str("12.345").is_err());
        assert!(Cents::from_decimal_str("twelve").is_err());
        assert!(Cents::from_decimal_str("1.2.3").is_err());
    }

    #[test]
    fn renders_decimal_strings() {
        assert_eq!(Cents::from(5995).to_decimal_string(), "59.95");
        assert_eq!(Cents::from(5990).to_decimal_string(), "59.90");
        assert_eq!(Cents::from(5).to_decimal_string(), "0.05");
        assert_eq!(Cents::from(12000).to_decimal_string(), "120.00");
    }

    #[test]
    fn round_trips_through_decimal_strings() {
        for cents in [0i64, 1, 99, 100, 5995, 123456] {
            let s = Cents::from(cents).to_decimal_string();
            assert_eq!(Cents::from_decimal_str(&s).unwrap(), Cents::from(cents));
        }
    }

    #[test]
    fn scaling_rounds_up_to_whole_units() {
        // 129.99 * 1.08 = 140.39, which rounds up to 141.00
        assert_eq!(Cents::from(12999).scale_to_whole_units(1.08), Cents::from_units(141));
        assert_eq!(Cents::from_units(100).scale_to_whole_units(1.0), Cents::from_units(100));
        assert_eq!(Cents::from(0).scale_to_whole_units(1.5), Cents::from(0));
    }
}
