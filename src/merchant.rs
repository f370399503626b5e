//! Hostname to merchant name resolution.

use serde::{Deserialize, Serialize};
use url::Url;

/// Known retail domains and the name shown to guests.
pub const SUPPORTED_STORES: &[(&str, &str)] = &[
    ("amazon.com.br", "Amazon"),
    ("amazon.com", "Amazon"),
    ("mercadolivre.com.br", "Mercado Livre"),
    ("magazineluiza.com.br", "Magazine Luiza"),
    ("magalu.com.br", "Magazine Luiza"),
    ("americanas.com.br", "Americanas"),
    ("submarino.com.br", "Submarino"),
    ("shoptime.com.br", "Shoptime"),
    ("casasbahia.com.br", "Casas Bahia"),
    ("pontofrio.com.br", "Ponto"),
    ("extra.com.br", "Extra"),
    ("carrefour.com.br", "Carrefour"),
    ("kabum.com.br", "KaBuM!"),
    ("fastshop.com.br", "Fast Shop"),
    ("tokstok.com.br", "Tok&Stok"),
    ("leroymerlin.com.br", "Leroy Merlin"),
    ("camicado.com.br", "Camicado"),
    ("westwing.com.br", "Westwing"),
    ("mobly.com.br", "Mobly"),
    ("etna.com.br", "Etna"),
    ("madeiramadeira.com.br", "MadeiraMadeira"),
    ("netshoes.com.br", "Netshoes"),
    ("centauro.com.br", "Centauro"),
    ("shopee.com.br", "Shopee"),
    ("aliexpress.com", "AliExpress"),
    ("ikea.com", "IKEA"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub domain: String,
    pub store_name: String,
}

/// Map a hostname to a merchant. Unknown hosts fall back to the bare host.
pub fn resolve_store(hostname: &str) -> StoreInfo {
    let host = hostname.trim().trim_end_matches('.').to_ascii_lowercase();

    for (domain, name) in SUPPORTED_STORES {
        if host == *domain || host.ends_with(&format!(".{domain}")) {
            return StoreInfo {
                domain: (*domain).to_string(),
                store_name: (*name).to_string(),
            };
        }
    }

    let bare = host.strip_prefix("www.").unwrap_or(&host).to_string();
    StoreInfo {
        domain: bare.clone(),
        store_name: bare,
    }
}

pub fn resolve_store_for_url(url: &Url) -> StoreInfo {
    resolve_store(url.host_str().unwrap_or_default())
}
