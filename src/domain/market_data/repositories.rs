use crate::domain::errors::ChartError;
use crate::domain::market_data::{Candle, Symbol, TimeInterval, Timestamp};

/// Port to the historical-data store.
///
/// A provider returns candles strictly older than `end_time_exclusive`,
/// newest batch last, at most `limit` rows. An empty batch means the store
/// has no further history before the anchor and is not an error.
pub trait HistoryProvider {
    fn fetch_before(
        &self,
        symbol: &Symbol,
        interval: TimeInterval,
        end_time_exclusive: Timestamp,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Candle>, ChartError>>;
}
