/// Currency assumed when a page does not declare one.
pub const DEFAULT_CURRENCY: &str = "BRL";

/// Render minor units for humans, e.g. `R$ 1.299,90`.
pub fn format_price(cents: Option<i64>, currency: &str) -> String {
    let Some(cents) = cents else {
        return "price unknown".to_string();
    };

    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let symbol = match currency {
        "BRL" => "R$",
        "USD" => "US$",
        "EUR" => "€",
        other => other,
    };

    format!("{symbol} {sign}{grouped},{fraction:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_brl() {
        assert_eq!(format_price(Some(129990), "BRL"), "R$ 1.299,90");
        assert_eq!(format_price(Some(5), "BRL"), "R$ 0,05");
        assert_eq!(format_price(Some(100000000), "BRL"), "R$ 1.000.000,00");
    }

    #[test]
    fn test_format_other_currency() {
        assert_eq!(format_price(Some(4999), "USD"), "US$ 49,99");
        assert_eq!(format_price(Some(4999), "GBP"), "GBP 49,99");
    }

    #[test]
    fn test_format_unknown_price() {
        assert_eq!(format_price(None, "BRL"), "price unknown");
    }
}
