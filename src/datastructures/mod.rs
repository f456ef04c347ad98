pub mod account;
pub mod client;
pub mod config;
pub mod market;
pub mod order;
pub mod position;
