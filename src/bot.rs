//! Bot facade: one method per user intent, each forwarding to a single
//! exchange call (two for the simulated OCO) and logging the outcome.

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use crate::datastructures::{
    account::BalanceSummary,
    client::TradingClient,
    market::SymbolInfo,
    order::{OcoLeg, OcoOrder, OrderRequest, OrderResponse, Side},
    position::{LeverageChange, Position},
};
use crate::error::{BotError, BotResult};

pub const MAX_LEVERAGE: u32 = 125;

/// What a successful connection check saw.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionReport {
    pub server_time: i64,
    pub total_wallet_balance: f64,
}

pub struct BasicBot<C> {
    client: C,
    testnet: bool,
}

fn check_symbol(symbol: &str) -> BotResult<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(BotError::InvalidInput("symbol is empty".to_string()));
    }
    Ok(symbol.to_ascii_uppercase())
}

fn check_positive(field: &str, value: f64) -> BotResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(BotError::InvalidInput(format!(
            "{field} must be a positive number, got {value}"
        )));
    }
    Ok(())
}

impl<C: TradingClient> BasicBot<C> {
    pub fn new(client: C, testnet: bool) -> Self {
        info!("BasicBot initialized with testnet={}", testnet);
        BasicBot { client, testnet }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn is_testnet(&self) -> bool {
        self.testnet
    }

    /// Checks connectivity and that the credentials can read the futures account.
    pub async fn validate_connection(&self) -> BotResult<ConnectionReport> {
        info!("Validating futures API connection");
        let time = self
            .client
            .server_time()
            .await
            .inspect_err(|e| error!("Connection validation failed: {}", e))?;
        info!("Futures server time: {}", time.server_time);

        let total_wallet_balance = self
            .client
            .account()
            .await
            .and_then(|account| account.wallet_balance())
            .inspect_err(|e| error!("Connection validation failed: {}", e))?;
        info!("Futures API connection validated successfully");
        info!("Total wallet balance: {} USDT", total_wallet_balance);

        Ok(ConnectionReport {
            server_time: time.server_time,
            total_wallet_balance,
        })
    }

    pub async fn futures_balance(&self) -> BotResult<BalanceSummary> {
        info!("Getting futures balance");
        let summary = self
            .client
            .account()
            .await
            .and_then(|account| account.summary())
            .inspect_err(|e| error!("Error getting futures balance: {}", e))?;
        info!(
            "Futures balance retrieved: {} USDT",
            summary.total_wallet_balance
        );
        Ok(summary)
    }

    pub async fn symbol_info(&self, symbol: &str) -> BotResult<SymbolInfo> {
        let symbol = check_symbol(symbol)?;
        info!("Getting futures symbol info: {}", symbol);
        let info = self
            .client
            .exchange_info()
            .await
            .inspect_err(|e| error!("Error getting futures symbol info: {}", e))?;

        match info.find(&symbol) {
            Some(found) => {
                info!("Futures symbol info for {}: {}", symbol, found.status);
                Ok(found.clone())
            }
            None => {
                warn!("Futures symbol {} not found", symbol);
                Err(BotError::SymbolNotFound(symbol))
            }
        }
    }

    async fn submit(&self, label: &str, order: OrderRequest) -> BotResult<OrderResponse> {
        let result = self.client.create_order(&order).await;
        match &result {
            Ok(ack) => info!("Futures {} order placed successfully: {:?}", label, ack),
            Err(e) => error!("Error placing futures {} order: {}", label, e),
        }
        result
    }

    pub async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
        reduce_only: bool,
    ) -> BotResult<OrderResponse> {
        let symbol = check_symbol(symbol)?;
        check_positive("quantity", quantity)?;
        info!("Placing futures market order: {} {} {}", side, quantity, symbol);

        let order = OrderRequest::market(symbol, side, quantity).reduce_only(reduce_only);
        self.submit("market", order).await
    }

    pub async fn place_limit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
        price: f64,
        reduce_only: bool,
    ) -> BotResult<OrderResponse> {
        let symbol = check_symbol(symbol)?;
        check_positive("quantity", quantity)?;
        check_positive("price", price)?;
        info!(
            "Placing futures limit order: {} {} {} at {}",
            side, quantity, symbol, price
        );

        let order = OrderRequest::limit(symbol, side, quantity, price).reduce_only(reduce_only);
        self.submit("limit", order).await
    }

    pub async fn place_stop_limit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
        price: f64,
        stop_price: f64,
        reduce_only: bool,
    ) -> BotResult<OrderResponse> {
        let symbol = check_symbol(symbol)?;
        check_positive("quantity", quantity)?;
        check_positive("price", price)?;
        check_positive("stop price", stop_price)?;
        info!(
            "Placing futures stop-limit order: {} {} {} at {}, stop at {}",
            side, quantity, symbol, price, stop_price
        );

        let order = OrderRequest::stop_limit(symbol, side, quantity, price, stop_price)
            .reduce_only(reduce_only);
        self.submit("stop-limit", order).await
    }

    /// Simulated OCO: a limit leg at `price`, then a stop-limit leg triggered at
    /// `stop_price` resting at `stop_limit_price`.
    ///
    /// The legs are independent. A failed limit leg aborts; a failed stop leg
    /// leaves the limit order working and is reported inside the result.
    pub async fn place_oco_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
        price: f64,
        stop_price: f64,
        stop_limit_price: f64,
    ) -> BotResult<OcoOrder> {
        let symbol = check_symbol(symbol)?;
        check_positive("quantity", quantity)?;
        check_positive("price", price)?;
        check_positive("stop price", stop_price)?;
        check_positive("stop limit price", stop_limit_price)?;
        info!("Placing OCO order: {} {} {}", side, quantity, symbol);

        let limit_order = self
            .place_limit_order(&symbol, side, quantity, price, false)
            .await?;

        let stop_order = match self
            .place_stop_limit_order(&symbol, side, quantity, stop_limit_price, stop_price, false)
            .await
        {
            Ok(order) => OcoLeg::Placed(order),
            Err(e) => {
                warn!(
                    "OCO stop leg failed, limit order {} stays open: {}",
                    limit_order.order_id, e
                );
                OcoLeg::Failed {
                    error: e.to_string(),
                }
            }
        };

        let result = OcoOrder {
            oco_simulation: true,
            limit_order,
            stop_order,
        };
        info!("OCO order simulation completed: {:?}", result);
        Ok(result)
    }

    pub async fn order_status(&self, symbol: &str, order_id: u64) -> BotResult<OrderResponse> {
        let symbol = check_symbol(symbol)?;
        info!("Getting futures order status: {} {}", symbol, order_id);
        let status = self
            .client
            .get_order(&symbol, order_id)
            .await
            .inspect_err(|e| error!("Error getting futures order status: {}", e))?;
        info!("Futures order status retrieved: {:?}", status);
        Ok(status)
    }

    pub async fn cancel_order(&self, symbol: &str, order_id: u64) -> BotResult<OrderResponse> {
        let symbol = check_symbol(symbol)?;
        info!("Cancelling futures order: {} {}", symbol, order_id);
        let ack = self
            .client
            .cancel_order(&symbol, order_id)
            .await
            .inspect_err(|e| error!("Error cancelling futures order: {}", e))?;
        info!("Futures order cancelled successfully: {:?}", ack);
        Ok(ack)
    }

    pub async fn current_price(&self, symbol: &str) -> BotResult<f64> {
        let symbol = check_symbol(symbol)?;
        info!("Getting current futures price: {}", symbol);
        let price = self
            .client
            .ticker_price(&symbol)
            .await
            .and_then(|ticker| ticker.price())
            .inspect_err(|e| error!("Error getting current futures price: {}", e))?;
        info!("Current futures price for {}: {}", symbol, price);
        Ok(price)
    }

    /// Open positions keyed by symbol.
    pub async fn positions(&self) -> BotResult<BTreeMap<String, Position>> {
        info!("Getting futures positions");
        let rows = self
            .client
            .position_information()
            .await
            .inspect_err(|e| error!("Error getting positions: {}", e))?;

        let mut active = BTreeMap::new();
        for risk in rows {
            let converted = risk
                .to_position()
                .inspect_err(|e| error!("Error getting positions: {}", e))?;
            if let Some(position) = converted {
                active.insert(position.symbol.clone(), position);
            }
        }
        info!("Active positions retrieved: {}", active.len());
        Ok(active)
    }

    pub async fn set_leverage(&self, symbol: &str, leverage: u32) -> BotResult<LeverageChange> {
        let symbol = check_symbol(symbol)?;
        if !(1..=MAX_LEVERAGE).contains(&leverage) {
            return Err(BotError::InvalidInput(format!(
                "leverage must be between 1 and {MAX_LEVERAGE}, got {leverage}"
            )));
        }
        info!("Setting leverage for {}: {}x", symbol, leverage);
        let ack = self
            .client
            .change_leverage(&symbol, leverage)
            .await
            .inspect_err(|e| error!("Error setting leverage: {}", e))?;
        info!("Leverage set for {}: {}x", symbol, ack.leverage);
        Ok(ack)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory `TradingClient` shared by the facade, shell and diagnostics tests.

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::datastructures::{
        account::AccountInfo,
        client::TradingClient,
        market::{ExchangeInfo, ServerTime, TickerPrice},
        order::{OrderRequest, OrderResponse, OrderType},
        position::{LeverageChange, PositionRisk},
    };
    use crate::error::{BotError, BotResult};

    #[derive(Default)]
    pub struct MockClient {
        pub calls: Mutex<Vec<String>>,
        pub orders: Mutex<Vec<OrderRequest>>,
        pub reject_stop_orders: bool,
        pub reject_auth: bool,
        pub positions: Vec<PositionRisk>,
    }

    impl MockClient {
        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn ack(symbol: &str, order_id: u64, status: &str) -> OrderResponse {
            let mut extra = serde_json::Map::new();
            extra.insert("origQty".to_string(), "0.010".into());
            OrderResponse {
                symbol: symbol.to_string(),
                order_id,
                client_order_id: Some(format!("mock-{order_id}")),
                status: Some(status.to_string()),
                extra,
            }
        }
    }

    #[async_trait]
    impl TradingClient for MockClient {
        async fn server_time(&self) -> BotResult<ServerTime> {
            self.record("server_time");
            Ok(ServerTime {
                server_time: 1_700_000_000_000,
            })
        }

        async fn exchange_info(&self) -> BotResult<ExchangeInfo> {
            self.record("exchange_info");
            Ok(serde_json::from_str(
                r#"{"symbols":[{"symbol":"BTCUSDT","status":"TRADING","baseAsset":"BTC","quoteAsset":"USDT","filters":[]}]}"#,
            )?)
        }

        async fn ticker_price(&self, symbol: &str) -> BotResult<TickerPrice> {
            self.record("ticker_price");
            Ok(TickerPrice {
                symbol: symbol.to_string(),
                price: "43000.5".to_string(),
            })
        }

        async fn account(&self) -> BotResult<AccountInfo> {
            self.record("account");
            if self.reject_auth {
                return Err(BotError::Api {
                    code: -2015,
                    msg: "Invalid API-key, IP, or permissions for action.".to_string(),
                });
            }
            Ok(AccountInfo {
                total_wallet_balance: Some("1000.5".to_string()),
                available_balance: Some("900".to_string()),
                ..AccountInfo::default()
            })
        }

        async fn position_information(&self) -> BotResult<Vec<PositionRisk>> {
            self.record("position_information");
            Ok(self.positions.clone())
        }

        async fn create_order(&self, order: &OrderRequest) -> BotResult<OrderResponse> {
            self.record("create_order");
            self.orders.lock().unwrap().push(order.clone());
            if self.reject_stop_orders && order.order_type == OrderType::Stop {
                return Err(BotError::Api {
                    code: -2021,
                    msg: "Order would immediately trigger.".to_string(),
                });
            }
            let id = self.orders.lock().unwrap().len() as u64;
            Ok(Self::ack(&order.symbol, id, "NEW"))
        }

        async fn get_order(&self, symbol: &str, order_id: u64) -> BotResult<OrderResponse> {
            self.record("get_order");
            Ok(Self::ack(symbol, order_id, "FILLED"))
        }

        async fn cancel_order(&self, symbol: &str, order_id: u64) -> BotResult<OrderResponse> {
            self.record("cancel_order");
            Ok(Self::ack(symbol, order_id, "CANCELED"))
        }

        async fn change_leverage(&self, symbol: &str, leverage: u32) -> BotResult<LeverageChange> {
            self.record("change_leverage");
            Ok(LeverageChange {
                symbol: symbol.to_string(),
                leverage,
                max_notional_value: "1000000".to_string(),
            })
        }
    }

    pub fn open_position(symbol: &str, amount: &str) -> PositionRisk {
        PositionRisk {
            symbol: symbol.to_string(),
            position_amt: amount.to_string(),
            entry_price: "100".to_string(),
            mark_price: "101".to_string(),
            un_realized_profit: "1".to_string(),
            liquidation_price: None,
            leverage: Some("10".to_string()),
            position_side: None,
        }
    }
}
