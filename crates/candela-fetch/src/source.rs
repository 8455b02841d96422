//! Remote archive sources.

use async_trait::async_trait;
use bytes::Bytes;
use candela_types::PriceType;
use chrono::NaiveDate;

use crate::{DownloadClient, DownloadError, url::candle_url};

/// Something that can produce the compressed archive for one
/// (symbol, quote side, day).
#[async_trait]
pub trait ArchiveSource: Send + Sync + std::fmt::Debug {
    /// Retrieves one day's compressed archive.
    ///
    /// Returns `Ok(None)` when the source has no archive for the day.
    ///
    /// # Errors
    ///
    /// Returns an error if the source could not be reached or answered with a
    /// failure status.
    async fn fetch(
        &self,
        symbol: &str,
        price_type: PriceType,
        day: NaiveDate,
    ) -> Result<Option<Bytes>, DownloadError>;
}

/// The Dukascopy HTTP data feed.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: DownloadClient,
    base_url: String,
}

impl HttpSource {
    /// Creates a source reading from `base_url` through `client`.
    #[must_use]
    pub fn new(client: DownloadClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Returns the URL the source would request for a tuple.
    #[must_use]
    pub fn url_for(&self, symbol: &str, price_type: PriceType, day: NaiveDate) -> String {
        candle_url(&self.base_url, symbol, price_type, day)
    }
}

#[async_trait]
impl ArchiveSource for HttpSource {
    async fn fetch(
        &self,
        symbol: &str,
        price_type: PriceType,
        day: NaiveDate,
    ) -> Result<Option<Bytes>, DownloadError> {
        let url = self.url_for(symbol, price_type, day);
        self.client.download(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::BASE_URL;

    #[test]
    fn test_url_for() {
        let source = HttpSource::new(DownloadClient::with_defaults().unwrap(), BASE_URL);
        let day = NaiveDate::from_ymd_opt(2021, 5, 1).unwrap();
        assert_eq!(
            source.url_for("EURUSD", PriceType::Bid, day),
            "https://datafeed.dukascopy.com/datafeed/EURUSD/2021/04/01/BID_candles_min_1.bi5"
        );
    }
}
