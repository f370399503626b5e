//! Social and SEO `<meta>` tags (OpenGraph, Twitter cards, itemprop).

use scraper::Html;
use url::Url;

use super::text::parse_price_str;
use super::{selector, ProductDraft};

const TITLE_KEYS: &[&str] = &["og:title", "twitter:title"];
const DESCRIPTION_KEYS: &[&str] = &["og:description", "twitter:description", "description"];
const IMAGE_KEYS: &[&str] = &[
    "og:image",
    "og:image:url",
    "og:image:secure_url",
    "twitter:image",
    "twitter:image:src",
];
const PRICE_KEYS: &[&str] = &[
    "product:price:amount",
    "og:price:amount",
    "product:price",
    "price",
];
const CURRENCY_KEYS: &[&str] = &[
    "product:price:currency",
    "og:price:currency",
    "pricecurrency",
];

/// Every `<meta>` with content, keyed by its lower-cased `property`, `name`
/// or `itemprop`, in document order.
pub(crate) struct MetaTags {
    entries: Vec<(String, String)>,
}

impl MetaTags {
    pub(crate) fn collect(document: &Html) -> Self {
        let meta_sel = selector("meta[content]");
        let entries = document
            .select(&meta_sel)
            .filter_map(|el| {
                let attrs = el.value();
                let key = attrs
                    .attr("property")
                    .or_else(|| attrs.attr("name"))
                    .or_else(|| attrs.attr("itemprop"))?;
                let content = attrs.attr("content")?;
                Some((key.trim().to_ascii_lowercase(), content.to_string()))
            })
            .collect();
        Self { entries }
    }

    /// Contents for `keys`, grouped by key in the priority order given.
    pub(crate) fn values<'a>(&'a self, keys: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
        keys.iter().flat_map(move |key| {
            self.entries
                .iter()
                .filter(move |(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        })
    }

    /// Contents for any of `keys`, in document order.
    fn in_document_order<'a>(&'a self, keys: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| keys.contains(&k.as_str()))
            .map(|(_, v)| v.as_str())
    }

    fn first_text<'a>(&'a self, keys: &'a [&'a str]) -> Option<&'a str> {
        self.values(keys).find(|v| !v.trim().is_empty())
    }
}

pub(crate) fn apply(meta: &MetaTags, draft: &mut ProductDraft, base: &Url) {
    draft.fill_title(meta.first_text(TITLE_KEYS));
    draft.fill_description(meta.first_text(DESCRIPTION_KEYS));

    for image in meta.in_document_order(IMAGE_KEYS) {
        draft.add_image(image, base);
    }

    draft.fill_price(meta.values(PRICE_KEYS).find_map(parse_price_str));
    draft.fill_currency(meta.first_text(CURRENCY_KEYS));
}
