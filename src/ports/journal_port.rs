//! Trade journal storage port.

use crate::domain::error::DeskError;
use crate::domain::journal::Trade;

pub trait JournalPort: Send + Sync {
    /// Insert a trade, replacing any existing row with the same id.
    fn insert(&self, trade: &Trade) -> Result<(), DeskError>;

    /// Most recent trades first (by date, then insertion order).
    fn list(&self, limit: Option<usize>) -> Result<Vec<Trade>, DeskError>;
}
