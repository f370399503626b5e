//! Raw HTML heuristics used when richer markup is missing.

use scraper::Html;
use url::Url;

use super::{selector, ProductDraft};

pub(crate) fn apply(document: &Html, draft: &mut ProductDraft, base: &Url, max_images: usize) {
    if !draft.has_title() {
        let title_sel = selector("title");
        if let Some(title) = document.select(&title_sel).next() {
            let text: String = title.text().collect();
            draft.fill_title(Some(&text));
        }
    }

    let img_sel = selector("img[src]");
    let sources = document
        .select(&img_sel)
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| !src.trim_start().to_ascii_lowercase().starts_with("data:"))
        .take(max_images);

    for src in sources {
        draft.add_image(src, base);
    }
}
