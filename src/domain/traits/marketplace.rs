use async_trait::async_trait;

use crate::application::errors::LookupError;
use crate::domain::entities::FloorPriceQuote;

/// Source of floor-price quotes for named collections.
#[async_trait]
pub trait FloorPriceSource: Send + Sync {
    /// Fetch the current floor price for a collection slug.
    ///
    /// One outbound call per invocation, no internal retries; retry policy
    /// belongs to the caller.
    async fn fetch_floor_price(&self, slug: &str) -> Result<FloorPriceQuote, LookupError>;
}
