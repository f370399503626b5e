//! JSON-LD `Product` blocks.

use scraper::Html;
use serde_json::Value;
use url::Url;

use super::text::parse_price_value;
use super::{selector, ProductDraft};

pub(crate) fn apply(document: &Html, draft: &mut ProductDraft, base: &Url) {
    let Some(product) = find_product(document) else {
        return;
    };

    draft.fill_title(string_field(&product, "name").as_deref());
    draft.fill_description(string_field(&product, "description").as_deref());

    for image in image_candidates(product.get("image")) {
        draft.add_image(&image, base);
    }

    if let Some(offer) = select_offer(product.get("offers")) {
        draft.fill_price(offer_price(offer));
        draft.fill_currency(offer_currency(offer).as_deref());
        draft.fill_attribute("price_valid_until", string_field(offer, "priceValidUntil").as_deref());
        let availability = string_field(offer, "availability");
        draft.fill_attribute("availability", availability.as_deref().map(schema_term));
    }

    draft.fill_attribute("brand", brand(&product).as_deref());
    draft.fill_attribute("sku", string_field(&product, "sku").as_deref());
    draft.fill_attribute("mpn", string_field(&product, "mpn").as_deref());
    let gtin = ["gtin", "gtin13", "gtin14", "gtin12", "gtin8"]
        .iter()
        .find_map(|key| string_field(&product, key));
    draft.fill_attribute("gtin", gtin.as_deref());
}

/// First Product object across all JSON-LD blocks, in document order.
fn find_product(document: &Html) -> Option<Value> {
    let script_sel = selector(r#"script[type="application/ld+json"]"#);

    for script in document.select(&script_sel) {
        let raw: String = script.text().collect();
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(value) => {
                if let Some(product) = find_product_in(&value) {
                    return Some(product.clone());
                }
            }
            Err(e) => tracing::debug!("Skipping malformed JSON-LD block: {}", e),
        }
    }

    None
}

fn find_product_in(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_product_in),
        Value::Object(map) => {
            if is_product_type(map.get("@type")) {
                return Some(value);
            }
            map.get("@graph")
                .and_then(find_product_in)
                .or_else(|| map.get("mainEntity").and_then(find_product_in))
        }
        _ => None,
    }
}

fn is_product_type(ld_type: Option<&Value>) -> bool {
    let matches = |t: &str| t.to_ascii_lowercase().contains("product");
    match ld_type {
        Some(Value::String(t)) => matches(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

/// Strings and numbers both come through as text (SKUs are often numeric).
fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `image` may be a URL, an `ImageObject`, or an array of either.
fn image_candidates(image: Option<&Value>) -> Vec<String> {
    match image {
        Some(Value::String(url)) => vec![url.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .flat_map(|item| image_candidates(Some(item)))
            .collect(),
        Some(obj @ Value::Object(_)) => string_field(obj, "url")
            .or_else(|| string_field(obj, "contentUrl"))
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

/// An `offers` array prefers its first priced entry; an `AggregateOffer`
/// without its own price is searched one level down.
fn select_offer(offers: Option<&Value>) -> Option<&Value> {
    match offers? {
        Value::Array(items) => items
            .iter()
            .find(|o| offer_price(o).is_some())
            .or_else(|| items.first()),
        offer @ Value::Object(_) => {
            if offer_price(offer).is_some() {
                Some(offer)
            } else {
                select_offer(offer.get("offers")).or(Some(offer))
            }
        }
        _ => None,
    }
}

fn offer_price(offer: &Value) -> Option<i64> {
    ["price", "lowPrice"]
        .iter()
        .find_map(|key| offer.get(*key).and_then(parse_price_value))
        .or_else(|| {
            price_specification(offer)
                .and_then(|spec| spec.get("price"))
                .and_then(parse_price_value)
        })
}

fn offer_currency(offer: &Value) -> Option<String> {
    string_field(offer, "priceCurrency")
        .or_else(|| price_specification(offer).and_then(|spec| string_field(spec, "priceCurrency")))
}

fn price_specification(offer: &Value) -> Option<&Value> {
    match offer.get("priceSpecification")? {
        Value::Array(specs) => specs.first(),
        spec => Some(spec),
    }
}

fn brand(product: &Value) -> Option<String> {
    match product.get("brand")? {
        Value::String(name) => Some(name.clone()),
        Value::Array(brands) => brands.first().and_then(|b| match b {
            Value::String(name) => Some(name.clone()),
            other => string_field(other, "name"),
        }),
        other => string_field(other, "name"),
    }
}

/// `https://schema.org/InStock` → `InStock`
fn schema_term(value: &str) -> &str {
    value.rsplit('/').next().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft_from(html: &str) -> ProductDraft {
        let document = Html::parse_document(html);
        let mut draft = ProductDraft::default();
        let base = Url::parse("https://loja.com.br/p/1").unwrap();
        apply(&document, &mut draft, &base);
        draft
    }

    fn ld(json: &str) -> String {
        format!(r#"<html><head><script type="application/ld+json">{json}</script></head></html>"#)
    }

    #[test]
    fn test_product_nested_in_graph() {
        let draft = draft_from(&ld(r#"{"@context":"https://schema.org","@graph":[
            {"@type":"WebSite","name":"Loja"},
            {"@type":"BreadcrumbList","name":"Casa"},
            {"@type":"Product","name":"Jogo de Cama","offers":{"price":199.9,"priceCurrency":"BRL"}}
        ]}"#));
        assert_eq!(draft.title.as_deref(), Some("Jogo de Cama"));
        assert_eq!(draft.price_cents, Some(19990));
    }

    #[test]
    fn test_type_array_and_case_insensitive_match() {
        let draft = draft_from(&ld(r#"{"@type":["Thing","individualPRODUCT"],"name":"Abajur"}"#));
        assert_eq!(draft.title.as_deref(), Some("Abajur"));
    }

    #[test]
    fn test_first_product_block_wins_and_bad_blocks_are_skipped() {
        let html = r#"<html><head>
            <script type="application/ld+json">{ not json</script>
            <script type="application/ld+json">{"@type":"Organization","name":"Loja"}</script>
            <script type="application/ld+json">[{"@type":"Product","name":"Primeiro"}]</script>
            <script type="application/ld+json">{"@type":"Product","name":"Segundo"}</script>
        </head></html>"#;
        let draft = draft_from(html);
        assert_eq!(draft.title.as_deref(), Some("Primeiro"));
    }

    #[test]
    fn test_offers_array_prefers_first_priced_entry() {
        let draft = draft_from(&ld(r#"{"@type":"Product","name":"Sofá","offers":[
            {"@type":"Offer","availability":"OutOfStock"},
            {"@type":"Offer","price":"2.499,00","priceCurrency":"brl"},
            {"@type":"Offer","price":"1999","priceCurrency":"USD"}
        ]}"#));
        assert_eq!(draft.price_cents, Some(249900));
        assert_eq!(draft.currency.as_deref(), Some("BRL"));
    }

    #[test]
    fn test_aggregate_offer_and_price_specification() {
        let draft = draft_from(&ld(
            r#"{"@type":"Product","name":"Mesa","offers":{"@type":"AggregateOffer","lowPrice":"799.00","priceCurrency":"BRL"}}"#,
        ));
        assert_eq!(draft.price_cents, Some(79900));

        let draft = draft_from(&ld(
            r#"{"@type":"Product","name":"Mesa","offers":{"@type":"Offer","priceSpecification":{"price":650,"priceCurrency":"BRL"}}}"#,
        ));
        assert_eq!(draft.price_cents, Some(65000));
        assert_eq!(draft.currency.as_deref(), Some("BRL"));
    }

    #[test]
    fn test_missing_offer_price_stays_absent() {
        let draft = draft_from(&ld(
            r#"{"@type":"Product","name":"Vaso","offers":{"@type":"Offer","price":"","priceCurrency":"BRL"}}"#,
        ));
        assert_eq!(draft.price_cents, None);
        assert_eq!(draft.currency.as_deref(), Some("BRL"));
    }

    #[test]
    fn test_image_shapes() {
        assert_eq!(image_candidates(Some(&json!("/a.jpg"))), vec!["/a.jpg"]);
        assert_eq!(
            image_candidates(Some(&json!(["/a.jpg", {"@type":"ImageObject","url":"/b.jpg"}]))),
            vec!["/a.jpg", "/b.jpg"]
        );
        assert_eq!(
            image_candidates(Some(&json!({"contentUrl":"/c.jpg"}))),
            vec!["/c.jpg"]
        );
        assert!(image_candidates(None).is_empty());
    }

    #[test]
    fn test_numeric_sku_and_brand_string() {
        let draft = draft_from(&ld(
            r#"{"@type":"Product","name":"Ferro","sku":12345,"brand":"Philips","gtin13":"7891234567890"}"#,
        ));
        assert_eq!(draft.attributes.get("sku").map(String::as_str), Some("12345"));
        assert_eq!(draft.attributes.get("brand").map(String::as_str), Some("Philips"));
        assert_eq!(
            draft.attributes.get("gtin").map(String::as_str),
            Some("7891234567890")
        );
    }

    #[test]
    fn test_non_product_blocks_leave_draft_empty() {
        let draft = draft_from(&ld(r#"{"@type":"Article","headline":"Blog"}"#));
        assert!(draft.title.is_none());
        assert!(draft.images.is_empty());
    }
}
