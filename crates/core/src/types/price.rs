//! Type-safe price representation using decimal arithmetic.
//!
//! The platform sells in Chilean pesos, which have no minor unit. Amounts are
//! carried as [`Decimal`] so sums over cart lines never pick up float error,
//! and are displayed the way the apps show them to customers (`$12.990`).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in Chilean pesos.
    #[must_use]
    pub const fn clp(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::CLP)
    }

    /// Format for display, e.g. `$2.990` for CLP or `$19.99` for USD.
    #[must_use]
    pub fn display(&self) -> String {
        let scale = self.currency_code.minor_digits();
        let rounded = self
            .amount
            .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let abs = rounded.abs();
        let whole = abs.trunc().to_string();
        let grouped = group_thousands(&whole, self.currency_code.group_separator());

        if scale == 0 {
            format!("{sign}{}{grouped}", self.currency_code.symbol())
        } else {
            let fraction = format!("{:.*}", scale as usize, abs.fract());
            let digits = fraction.split('.').nth(1).unwrap_or("00");
            format!(
                "{sign}{}{grouped}{}{digits}",
                self.currency_code.symbol(),
                self.currency_code.decimal_separator()
            )
        }
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Insert a separator every three digits from the right.
fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    CLP,
    USD,
}

impl CurrencyCode {
    /// Currency symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::CLP | Self::USD => "$",
        }
    }

    /// Number of digits after the decimal point.
    #[must_use]
    pub const fn minor_digits(self) -> u32 {
        match self {
            Self::CLP => 0,
            Self::USD => 2,
        }
    }

    const fn group_separator(self) -> char {
        match self {
            Self::CLP => '.',
            Self::USD => ',',
        }
    }

    const fn decimal_separator(self) -> char {
        match self {
            Self::CLP => ',',
            Self::USD => '.',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clp_display_groups_thousands() {
        assert_eq!(Price::clp(Decimal::from(2990)).display(), "$2.990");
        assert_eq!(Price::clp(Decimal::from(2_450_000)).display(), "$2.450.000");
        assert_eq!(Price::clp(Decimal::from(990)).display(), "$990");
        assert_eq!(Price::clp(Decimal::ZERO).display(), "$0");
    }

    #[test]
    fn test_clp_display_rounds_to_whole_pesos() {
        assert_eq!(Price::clp(Decimal::new(29_905, 1)).display(), "$2.991");
    }

    #[test]
    fn test_negative_display() {
        assert_eq!(Price::clp(Decimal::from(-1500)).display(), "-$1.500");
    }

    #[test]
    fn test_usd_display() {
        let price = Price::new(Decimal::new(123_456, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$1,234.56");
    }
}
