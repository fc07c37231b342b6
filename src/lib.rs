//! Cookie-authenticated scraper for LianJia second-hand housing listings.
//!
//! `lianjia-scout` walks a city's result pages into `<city>_<l>-<r>.csv/.json`;
//! `lianjia-detail` follows each listing's link and joins its detail page on.

pub mod cities;
pub mod config;
mod error;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod scrapers;

pub use error::{Result, ScoutError};

/// Install the fmt subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
