//! Port traits: the seams between the domain and the outside world.

pub mod cache_port;
pub mod config_port;
pub mod journal_port;
pub mod news_port;
pub mod price_port;
