use chrono::{DateTime, Utc};

/// A floor-price quote for a collection, immutable once constructed.
///
/// Not cached: every command triggers a fresh fetch.
#[derive(Debug, Clone)]
pub struct FloorPriceQuote {
    pub collection_slug: String,
    pub floor_price: f64,
    pub currency: String,
    pub fetched_at: DateTime<Utc>,
}

impl FloorPriceQuote {
    pub fn new(
        collection_slug: impl Into<String>,
        floor_price: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            collection_slug: collection_slug.into(),
            floor_price,
            currency: currency.into(),
            fetched_at: Utc::now(),
        }
    }
}
