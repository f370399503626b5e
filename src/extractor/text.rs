//! Text, URL and price normalization shared by every extraction tier.

use html_escape::decode_html_entities;
use serde_json::Value;
use url::Url;

/// Decode entities, collapse runs of whitespace and trim. Empty results are `None`.
pub fn clean_text(raw: &str) -> Option<String> {
    let decoded = decode_html_entities(raw);
    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Resolve a possibly relative image or link reference against the page URL.
/// Inline `data:` URIs and non-http(s) results are dropped.
pub fn resolve_url(raw: &str, base: &Url) -> Option<String> {
    let decoded = decode_html_entities(raw.trim());
    let candidate = decoded.trim();
    if candidate.is_empty() || candidate.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:")) {
        return None;
    }

    let resolved = base.join(candidate).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Price from a JSON value that may be a number or a formatted string.
pub fn parse_price_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(to_cents),
        Value::String(s) => parse_price_str(s),
        _ => None,
    }
}

/// Price from free text such as `"R$ 1.299,90"` or `"49.99"`, in cents.
///
/// This is not a plain comma-to-dot swap: a lone `.` followed by exactly three
/// digits is a thousands group (`"1.299"` is 1299.00), and negative amounts
/// yield `None`.
pub fn parse_price_str(raw: &str) -> Option<i64> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    normalize_separators(&kept)
        .parse::<f64>()
        .ok()
        .and_then(to_cents)
}

/// Rewrite a digits/comma/period string into `f64` syntax. The last separator
/// present is the decimal one; a lone comma is always decimal.
fn normalize_separators(s: &str) -> String {
    let commas = s.matches(',').count();
    let dots = s.matches('.').count();

    match (s.rfind(','), s.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) if commas == 1 => s.replace(',', "."),
        (Some(_), None) => s.replace(',', ""),
        (None, Some(_)) if dots > 1 => s.replace('.', ""),
        // "1.299" is a thousands group, "12.99" a decimal
        (None, Some(dot)) if s.len() - dot - 1 == 3 => s.replace('.', ""),
        _ => s.to_string(),
    }
}

fn to_cents(value: f64) -> Option<i64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let cents = (value * 100.0).round();
    (cents.abs() < i64::MAX as f64).then_some(cents as i64)
}

pub fn normalize_currency(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    (!code.is_empty()).then_some(code)
}
