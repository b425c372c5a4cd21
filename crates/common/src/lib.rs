pub mod config;
pub mod error;
pub mod feed;
pub mod network;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use feed::MarketFeed;
pub use network::{Network, ARBITRUM_SEPOLIA, MANTLE_SEPOLIA};
pub use types::*;
