//! chartdesk: trading research desk.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], background backtests in [`jobs`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod jobs;
pub mod ports;
