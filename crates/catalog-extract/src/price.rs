//! Price normalization.
//!
//! Amounts arrive as JSON numbers or as display strings (`"$140.00"`,
//! `"CHF 1'299.00"`, `"140,00 EUR"`). Anything that does not reduce to a
//! finite non-negative number yields `None`; the caller keeps the entry.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use catalog_core::types::Price;

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([A-Za-z]{3})\s*)?([$€£¥])?\s*(\d[\d.,' ]*?)\s*([A-Za-z]{3})?$").expect("valid regex")
});

static INLINE_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([$€£¥])\s?(\d+(?:[.,]\d{1,2})?)").expect("valid regex")
});

#[derive(Debug, Clone)]
pub struct PriceParser {
    fallback_currency: String,
}

impl PriceParser {
    pub fn new(fallback_currency: &str) -> Self {
        Self { fallback_currency: fallback_currency.trim().to_ascii_uppercase() }
    }

    /// Parse an offer amount with an optional explicit `priceCurrency`.
    pub fn parse(&self, amount: &Value, currency: Option<&str>) -> Option<Price> {
        let (amount, detected) = match amount {
            Value::Number(n) => (n.as_f64()?, None),
            Value::String(s) => parse_display(s)?,
            _ => return None,
        };
        self.finish(amount, currency.and_then(currency_code).or(detected))
    }

    /// First symbol-prefixed amount inside free text, e.g. `"3MD10 · $140"`.
    pub fn find_in_text(&self, text: &str) -> Option<Price> {
        let caps = INLINE_PRICE_RE.captures(text)?;
        let amount = normalize_number(caps.get(2)?.as_str())?;
        self.finish(amount, caps.get(1).and_then(|m| symbol_currency(m.as_str())))
    }

    fn finish(&self, amount: f64, currency: Option<String>) -> Option<Price> {
        if !amount.is_finite() || amount < 0.0 {
            return None;
        }
        Some(Price {
            currency: currency.unwrap_or_else(|| self.fallback_currency.clone()),
            amount,
        })
    }
}

fn parse_display(s: &str) -> Option<(f64, Option<String>)> {
    let caps = PRICE_RE.captures(s.trim())?;
    let amount = normalize_number(caps.get(3)?.as_str())?;
    let currency = caps
        .get(1)
        .or_else(|| caps.get(4))
        .and_then(|m| currency_code(m.as_str()))
        .or_else(|| caps.get(2).and_then(|m| symbol_currency(m.as_str())));
    Some((amount, currency))
}

/// Accepts `1,234.50`, `1'234.50`, `1 234`, `140,00` and `140.5`.
fn normalize_number(raw: &str) -> Option<f64> {
    let compact: String = raw.chars().filter(|c| !matches!(c, ' ' | '\'')).collect();
    let normalized = if compact.contains('.') {
        compact.replace(',', "")
    } else if let Some((_, tail)) = compact.rsplit_once(',') {
        if tail.len() == 3 { compact.replace(',', "") } else { compact.replace(',', ".") }
    } else {
        compact
    };
    normalized.parse::<f64>().ok()
}

fn currency_code(s: &str) -> Option<String> {
    let s = s.trim();
    (s.len() == 3 && s.chars().all(|c| c.is_ascii_alphabetic())).then(|| s.to_ascii_uppercase())
}

fn symbol_currency(symbol: &str) -> Option<String> {
    let code = match symbol {
        "$" => "USD",
        "€" => "EUR",
        "£" => "GBP",
        "¥" => "JPY",
        _ => return None,
    };
    Some(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parser() -> PriceParser {
        PriceParser::new("usd")
    }

    #[test]
    fn numbers_use_explicit_or_fallback_currency() {
        let p = parser().parse(&json!(140), Some("chf")).expect("price");
        assert_eq!(p, Price { currency: "CHF".into(), amount: 140.0 });
        let p = parser().parse(&json!(99.5), None).expect("price");
        assert_eq!(p.currency, "USD");
    }

    #[test]
    fn display_strings() {
        let cases = [
            ("$140.00", "USD", 140.0),
            ("CHF 1'299.00", "CHF", 1299.0),
            ("140,00 EUR", "EUR", 140.0),
            ("1,234.50", "USD", 1234.5),
            ("£ 85", "GBP", 85.0),
            ("1,234", "USD", 1234.0),
        ];
        for (input, currency, amount) in cases {
            let p = parser().parse(&json!(input), None).unwrap_or_else(|| panic!("{input}"));
            assert_eq!(p.currency, currency, "{input}");
            assert!((p.amount - amount).abs() < 1e-9, "{input}");
        }
    }

    #[test]
    fn explicit_currency_beats_detected_symbol() {
        let p = parser().parse(&json!("$20"), Some("CAD")).expect("price");
        assert_eq!(p.currency, "CAD");
    }

    #[test]
    fn non_numeric_and_negative_prices_are_dropped() {
        for bad in [json!("Sold out"), json!("-5"), json!(""), json!(null), json!({"a": 1}), json!("1.2.3")] {
            assert!(parser().parse(&bad, None).is_none(), "{bad}");
        }
    }

    #[test]
    fn finds_inline_price() {
        let p = parser().find_in_text("SKU 3MD10 – $149.99 incl. tax").expect("price");
        assert_eq!(p, Price { currency: "USD".into(), amount: 149.99 });
        assert!(parser().find_in_text("no price here").is_none());
    }
}
