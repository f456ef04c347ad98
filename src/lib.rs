//! Interactive client for the Binance USDT-M futures REST API.
//!
//! [`binance::BinanceClient`] talks to the exchange, [`bot::BasicBot`] turns
//! user intents into single exchange calls, and [`shell::Shell`] is the text
//! loop on top.

pub mod binance;
pub mod bot;
pub mod datastructures;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod shell;

pub use binance::BinanceClient;
pub use bot::BasicBot;
pub use datastructures::{client::TradingClient, config::Config};
pub use error::{BotError, BotResult};
pub use shell::{Profile, Shell};
