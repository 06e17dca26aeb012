//! Price source with a configured value.

use async_trait::async_trait;
use rest_gateway::ports::PriceSource;
use rest_gateway::UpstreamError;

/// Coin price taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedPrice {
    usd: f64,
}

impl FixedPrice {
    pub fn new(usd: f64) -> Self {
        Self { usd }
    }
}

#[async_trait]
impl PriceSource for FixedPrice {
    async fn usd_price(&self) -> Result<f64, UpstreamError> {
        if self.usd.is_finite() && self.usd >= 0.0 {
            Ok(self.usd)
        } else {
            Err(UpstreamError::Malformed(format!(
                "configured price is not usable: {}",
                self.usd
            )))
        }
    }
}
