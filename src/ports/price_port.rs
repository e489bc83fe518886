//! Price history port.

use crate::domain::error::DeskError;
use crate::domain::price_bar::PriceBar;

/// Upper bound on how many bars any source hands back for one request.
pub const MAX_HISTORY_DAYS: usize = 10_000;

/// Source of daily bars for a symbol.
///
/// Implementations return bars in strictly increasing date order. An empty
/// vector means the source has nothing for the symbol; an `Err` means the
/// fetch itself failed. `days` above [`MAX_HISTORY_DAYS`] is clamped.
pub trait PricePort: Send + Sync {
    fn fetch(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>, DeskError>;

    /// Short name used in logs and cache keys.
    fn name(&self) -> &'static str;
}
