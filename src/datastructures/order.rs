use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            _ => Err(BotError::InvalidInput(format!(
                "side must be BUY or SELL, got {s:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    /// Stop-limit: rests as a limit order once `stopPrice` trades.
    Stop,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::Stop => "STOP",
        }
    }
}

/// Resting orders are always sent good-till-cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TimeInForce {
    #[serde(rename = "GTC")]
    Gtc,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Gtc => "GTC",
        }
    }
}

/// A new-order request as sent to `POST /fapi/v1/order`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: f64,
    pub price: Option<f64>,
    pub stop_price: Option<f64>,
    pub time_in_force: Option<TimeInForce>,
    pub reduce_only: bool,
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, side: Side, quantity: f64) -> Self {
        OrderRequest {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            stop_price: None,
            time_in_force: None,
            reduce_only: false,
        }
    }

    pub fn limit(symbol: impl Into<String>, side: Side, quantity: f64, price: f64) -> Self {
        OrderRequest {
            order_type: OrderType::Limit,
            price: Some(price),
            time_in_force: Some(TimeInForce::Gtc),
            ..Self::market(symbol, side, quantity)
        }
    }

    pub fn stop_limit(
        symbol: impl Into<String>,
        side: Side,
        quantity: f64,
        price: f64,
        stop_price: f64,
    ) -> Self {
        OrderRequest {
            order_type: OrderType::Stop,
            stop_price: Some(stop_price),
            ..Self::limit(symbol, side, quantity, price)
        }
    }

    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    /// Request parameters in the order Binance documents them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbol", self.symbol.clone()),
            ("side", self.side.as_str().to_string()),
            ("type", self.order_type.as_str().to_string()),
            ("quantity", self.quantity.to_string()),
        ];
        if let Some(price) = self.price {
            params.push(("price", price.to_string()));
        }
        if let Some(stop_price) = self.stop_price {
            params.push(("stopPrice", stop_price.to_string()));
        }
        if let Some(tif) = self.time_in_force {
            params.push(("timeInForce", tif.as_str().to_string()));
        }
        if self.reduce_only {
            params.push(("reduceOnly", "true".to_string()));
        }
        params
    }
}

/// Order acknowledgement / status as returned by the exchange.
///
/// The common fields are typed; everything else is kept in `extra` so the
/// response can be shown back exactly as received.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub symbol: String,
    pub order_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Result of a simulated OCO: two independent orders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcoOrder {
    pub oco_simulation: bool,
    pub limit_order: OrderResponse,
    pub stop_order: OcoLeg,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OcoLeg {
    Placed(OrderResponse),
    Failed { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn side_parsing_is_case_insensitive() {
        assert_eq!("buy".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!("SELL".parse::<Side>().unwrap(), Side::Sell);
        assert!("hold".parse::<Side>().is_err());
    }

    #[test]
    fn stop_limit_params() {
        let req = OrderRequest::stop_limit("BTCUSDT", Side::Sell, 0.01, 41000.0, 41500.5)
            .reduce_only(true);
        assert_eq!(
            req.params(),
            vec![
                ("symbol", "BTCUSDT".to_string()),
                ("side", "SELL".to_string()),
                ("type", "STOP".to_string()),
                ("quantity", "0.01".to_string()),
                ("price", "41000".to_string()),
                ("stopPrice", "41500.5".to_string()),
                ("timeInForce", "GTC".to_string()),
                ("reduceOnly", "true".to_string()),
            ]
        );
    }

    #[test]
    fn market_params_carry_no_price() {
        let params = OrderRequest::market("ETHUSDT", Side::Buy, 1.5).params();
        assert_eq!(params.len(), 4);
        assert!(params.iter().all(|(k, _)| *k != "price" && *k != "timeInForce"));
    }

    #[test]
    fn order_response_keeps_unknown_fields() {
        let raw = json!({
            "symbol": "BTCUSDT",
            "orderId": 4011,
            "clientOrderId": "abc",
            "status": "NEW",
            "price": "42000",
            "origQty": "0.010",
            "updateTime": 1700000000000u64
        });
        let order: OrderResponse = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(order.order_id, 4011);
        assert_eq!(order.status.as_deref(), Some("NEW"));
        assert_eq!(serde_json::to_value(&order).unwrap(), raw);
    }

    #[test]
    fn failed_oco_leg_renders_as_error_object() {
        let leg = OcoLeg::Failed {
            error: "Binance API error -2021: Order would immediately trigger.".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&leg).unwrap(),
            json!({"error": "Binance API error -2021: Order would immediately trigger."})
        );
    }
}
