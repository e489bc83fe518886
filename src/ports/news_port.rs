//! Market headlines port.

use crate::domain::error::DeskError;
use crate::domain::news::NewsItem;

/// Source of recent headlines, newest feeds first.
///
/// An `Err` means no headlines could be gathered at all; sources that merge
/// several feeds skip the ones that fail.
pub trait NewsPort: Send + Sync {
    fn fetch(&self, limit: usize) -> Result<Vec<NewsItem>, DeskError>;

    fn name(&self) -> &'static str;
}
