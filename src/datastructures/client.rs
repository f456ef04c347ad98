use super::{
    account::AccountInfo,
    market::{ExchangeInfo, ServerTime, TickerPrice},
    order::{OrderRequest, OrderResponse},
    position::{LeverageChange, PositionRisk},
};
use crate::error::BotResult;
use async_trait::async_trait;

/// The exchange-facing seam: one method per REST call the bot makes.
#[async_trait]
pub trait TradingClient: Send + Sync {
    async fn server_time(&self) -> BotResult<ServerTime>;
    async fn exchange_info(&self) -> BotResult<ExchangeInfo>;
    async fn ticker_price(&self, symbol: &str) -> BotResult<TickerPrice>;
    async fn account(&self) -> BotResult<AccountInfo>;
    async fn position_information(&self) -> BotResult<Vec<PositionRisk>>;
    async fn create_order(&self, order: &OrderRequest) -> BotResult<OrderResponse>;
    async fn get_order(&self, symbol: &str, order_id: u64) -> BotResult<OrderResponse>;
    async fn cancel_order(&self, symbol: &str, order_id: u64) -> BotResult<OrderResponse>;
    async fn change_leverage(&self, symbol: &str, leverage: u32) -> BotResult<LeverageChange>;
}
