pub mod activity;
pub mod gift;
pub mod money;
pub mod offer;
pub mod product;

pub use activity::{ClickEvent, NewClick, PriceHistoryEntry};
pub use gift::{Gift, GiftPricing, GiftTarget, NewGift};
pub use money::{format_price, DEFAULT_CURRENCY};
pub use offer::{NewOffer, Offer, OfferSnapshot};
pub use product::ExtractedProduct;
