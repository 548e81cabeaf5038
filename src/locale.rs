//! Culture-dependent formatting.
//!
//! A [`FormatProvider`] carries the separators, currency pattern and
//! default date format for one culture. The render context holds exactly
//! one provider; the `currency` filter may additionally resolve a second
//! provider from a language tag for output formatting.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatProvider {
    pub decimal_sep: char,
    pub group_sep: char,
    pub currency_symbol: String,
    /// Whether the currency symbol precedes the amount.
    pub symbol_first: bool,
    pub currency_decimals: u32,
    /// strftime format used when the date filter receives no format.
    pub date_format: String,
}

impl Default for FormatProvider {
    fn default() -> Self {
        Self::invariant()
    }
}

impl FormatProvider {
    pub fn invariant() -> Self {
        FormatProvider {
            decimal_sep: '.',
            group_sep: ',',
            currency_symbol: "¤".to_string(),
            symbol_first: true,
            currency_decimals: 2,
            date_format: "%m/%d/%Y %H:%M:%S".to_string(),
        }
    }

    pub fn en_us() -> Self {
        FormatProvider {
            currency_symbol: "$".to_string(),
            ..Self::invariant()
        }
    }

    pub fn fr_fr() -> Self {
        FormatProvider {
            decimal_sep: ',',
            group_sep: '\u{a0}',
            currency_symbol: "€".to_string(),
            symbol_first: false,
            currency_decimals: 2,
            date_format: "%d/%m/%Y %H:%M:%S".to_string(),
        }
    }

    pub fn de_de() -> Self {
        FormatProvider {
            decimal_sep: ',',
            group_sep: '.',
            currency_symbol: "€".to_string(),
            symbol_first: false,
            currency_decimals: 2,
            date_format: "%d.%m.%Y %H:%M:%S".to_string(),
        }
    }

    /// Look up a built-in provider by language tag. Tags are matched
    /// case-insensitively with either separator style (`en-US`, `en_us`).
    pub fn for_tag(tag: &str) -> Option<Self> {
        let normalized = tag.trim().replace('_', "-").to_lowercase();
        match normalized.as_str() {
            "" | "invariant" => Some(Self::invariant()),
            "en" | "en-us" => Some(Self::en_us()),
            "fr" | "fr-fr" => Some(Self::fr_fr()),
            "de" | "de-de" => Some(Self::de_de()),
            _ => None,
        }
    }

    /// Parse a number written with this culture's separators.
    pub fn parse_number(&self, text: &str) -> Option<Decimal> {
        let cleaned: String = text
            .trim()
            .trim_start_matches(self.currency_symbol.as_str())
            .trim_end_matches(self.currency_symbol.as_str())
            .trim()
            .chars()
            .filter(|&c| c != self.group_sep)
            .map(|c| if c == self.decimal_sep { '.' } else { c })
            .collect();
        cleaned.parse().ok()
    }

    /// Render an amount with the culture's currency pattern. Midpoints
    /// round away from zero, the usual convention for money.
    pub fn format_currency(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp_with_strategy(
            self.currency_decimals,
            RoundingStrategy::MidpointAwayFromZero,
        );
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = rounded.abs().to_string();
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (text, String::new()),
        };
        let mut frac = frac_part;
        while (frac.len() as u32) < self.currency_decimals {
            frac.push('0');
        }
        let grouped = group_digits(&int_part, self.group_sep);
        let mut number = grouped;
        if self.currency_decimals > 0 {
            number.push(self.decimal_sep);
            number.push_str(&frac);
        }
        let unsigned = if self.symbol_first {
            format!("{}{}", self.currency_symbol, number)
        } else {
            format!("{}\u{a0}{}", number, self.currency_symbol)
        };
        if negative {
            format!("-{}", unsigned)
        } else {
            unsigned
        }
    }
}

fn group_digits(digits: &str, sep: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}
