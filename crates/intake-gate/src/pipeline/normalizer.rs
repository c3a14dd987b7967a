use rust_decimal::Decimal;
use std::str::FromStr;

const CURRENCY_SYMBOLS: [char; 8] = ['€', '$', '£', '¥', '₹', '₩', '₽', '₺'];
const CURRENCY_CODES: [&str; 10] = [
    "EUR", "USD", "GBP", "CHF", "JPY", "CAD", "AUD", "SEK", "NOK", "DKK",
];
const LEGAL_SUFFIXES: [&str; 12] = [
    "bv", "nv", "bvba", "srl", "sprl", "sa", "gmbh", "ltd", "llc", "inc", "vof", "cv",
];

/// Canonical, comparable form of a field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedValue {
    Text(String),
    Amount(Decimal),
    Date(chrono::NaiveDate),
}

/// Parse a monetary amount written in European or US notation.
///
/// Currency symbols, ISO codes and every kind of whitespace are ignored. When only commas
/// appear, a trailing comma followed by at most two digits is the decimal separator and any
/// earlier commas group thousands; when both
/// separators appear, the rightmost one is. Unparsable input yields `None`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c) && *c != '\'')
        .collect();
    let cleaned = strip_currency_code(&cleaned);

    let (negative, body) = split_sign(cleaned)?;
    if body.is_empty()
        || !body.chars().any(|c| c.is_ascii_digit())
        || !body.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
    {
        return None;
    }

    let canonical = canonical_decimal(body);
    let canonical = canonical.trim_end_matches('.');
    let canonical = if canonical.starts_with('.') {
        format!("0{canonical}")
    } else {
        canonical.to_string()
    };

    let value = Decimal::from_str(&canonical).ok()?;
    Some(if negative { -value } else { value })
}

fn strip_currency_code(value: &str) -> &str {
    let mut trimmed = value;
    for code in CURRENCY_CODES {
        if trimmed
            .get(..code.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(code))
        {
            trimmed = &trimmed[code.len()..];
        }
        let len = trimmed.len();
        if len >= code.len()
            && trimmed
                .get(len - code.len()..)
                .is_some_and(|suffix| suffix.eq_ignore_ascii_case(code))
        {
            trimmed = &trimmed[..len - code.len()];
        }
    }
    trimmed
}

fn split_sign(value: &str) -> Option<(bool, &str)> {
    if let Some(inner) = value.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return Some((true, inner));
    }
    if let Some(rest) = value.strip_prefix('-') {
        return Some((true, rest));
    }
    if let Some(rest) = value.strip_suffix('-') {
        return Some((true, rest));
    }
    if value.contains(['(', ')', '-']) {
        return None;
    }
    Some((false, value.strip_prefix('+').unwrap_or(value)))
}

fn canonical_decimal(body: &str) -> String {
    let last_comma = body.rfind(',');
    let last_dot = body.rfind('.');

    match (last_comma, last_dot) {
        (None, None) => body.to_string(),
        (Some(comma), None) => {
            let decimals = body.len() - comma - 1;
            if decimals <= 2 {
                format!("{}.{}", body[..comma].replace(',', ""), &body[comma + 1..])
            } else {
                body.replace(',', "")
            }
        }
        (None, Some(_)) => {
            if body.matches('.').count() > 1 {
                body.replace('.', "")
            } else {
                body.to_string()
            }
        }
        (Some(comma), Some(dot)) => {
            if comma > dot {
                body.replace('.', "").replace(',', ".")
            } else {
                body.replace(',', "")
            }
        }
    }
}

/// Trimmed, case-sensitive text equality.
pub fn text_equal(left: &str, right: &str) -> bool {
    left.trim() == right.trim()
}

/// Render an amount with two fractional digits.
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

/// VAT numbers compare without separators and case.
pub fn normalize_vat(value: &str) -> Option<String> {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

pub(crate) fn normalize_party_name(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let lowered = cleaned.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();

    let significant: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|token| !LEGAL_SUFFIXES.contains(token))
        .collect();

    if significant.is_empty() {
        tokens.join(" ")
    } else {
        significant.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(raw: &str) -> Decimal {
        Decimal::from_str(raw).expect("valid decimal literal")
    }

    #[test]
    fn european_and_us_notations_agree() {
        assert_eq!(parse_amount("€ 1.234,56"), Some(amount("1234.56")));
        assert_eq!(parse_amount("$1,234.56"), Some(amount("1234.56")));
        assert_eq!(parse_amount("1234.56"), Some(amount("1234.56")));
        assert_eq!(parse_amount("€ 1.234,56"), parse_amount("1234.56"));
    }

    #[test]
    fn comma_with_two_decimals_is_a_decimal_separator() {
        assert_eq!(parse_amount("12,50"), Some(amount("12.50")));
        assert_eq!(parse_amount("12,5"), Some(amount("12.5")));
        assert_eq!(parse_amount("1,234"), Some(amount("1234")));
        assert_eq!(parse_amount("1,234,567"), Some(amount("1234567")));
        assert_eq!(parse_amount("1,234,56"), Some(amount("1234.56")));
    }

    #[test]
    fn strips_non_breaking_and_thin_spaces() {
        assert_eq!(parse_amount("1\u{00a0}234,56\u{202f}€"), Some(amount("1234.56")));
        assert_eq!(parse_amount("1\u{2009}000"), Some(amount("1000")));
        assert_eq!(parse_amount("EUR 99.90"), Some(amount("99.90")));
        assert_eq!(parse_amount("99,90 eur"), Some(amount("99.90")));
    }

    #[test]
    fn handles_negative_amounts() {
        assert_eq!(parse_amount("-12,00"), Some(amount("-12")));
        assert_eq!(parse_amount("(45.10)"), Some(amount("-45.10")));
    }

    #[test]
    fn unparsable_values_yield_none() {
        for raw in ["N/A", "", "TBD", "   ", "€", "12-34", "1.2.3abc"] {
            assert_eq!(parse_amount(raw), None, "{raw:?} should not parse");
        }
    }

    #[test]
    fn numerically_equal_amounts_compare_equal() {
        assert_eq!(parse_amount("100.00"), parse_amount("100"));
    }

    #[test]
    fn text_equality_trims_but_respects_case() {
        assert!(text_equal("  ACME ", "ACME"));
        assert!(!text_equal("acme", "ACME"));
    }

    #[test]
    fn vat_normalization_drops_separators() {
        assert_eq!(
            normalize_vat("be 0123.456.789"),
            Some("BE0123456789".to_string())
        );
        assert_eq!(normalize_vat(" - "), None);
    }

    #[test]
    fn party_names_ignore_legal_suffixes() {
        assert_eq!(normalize_party_name("Acme Consulting BV"), "acme consulting");
        assert_eq!(normalize_party_name("  ACME   Consulting, Ltd."), "acme consulting");
        assert_eq!(normalize_party_name("NV"), "nv");
    }

    #[test]
    fn formats_two_decimals() {
        assert_eq!(format_amount(amount("121")), "121.00");
        assert_eq!(format_amount(amount("121.005")), "121.00");
    }
}
