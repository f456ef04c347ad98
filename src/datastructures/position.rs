use serde::{Deserialize, Serialize};

use crate::error::{parse_number, parse_number_or_zero, BotResult};

/// One row of `GET /fapi/v2/positionRisk`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRisk {
    pub symbol: String,
    pub position_amt: String,
    pub entry_price: String,
    pub mark_price: String,
    pub un_realized_profit: String,
    #[serde(default)]
    pub liquidation_price: Option<String>,
    #[serde(default)]
    pub leverage: Option<String>,
    #[serde(default)]
    pub position_side: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    pub position_amt: f64,
    pub entry_price: f64,
    pub mark_price: f64,
    pub un_realized_profit: f64,
    pub liquidation_price: f64,
    pub leverage: f64,
    pub position_side: String,
}

impl PositionRisk {
    /// `None` for flat positions.
    pub fn to_position(&self) -> BotResult<Option<Position>> {
        let position_amt = parse_number("positionAmt", &self.position_amt)?;
        if position_amt == 0.0 {
            return Ok(None);
        }

        Ok(Some(Position {
            symbol: self.symbol.clone(),
            position_amt,
            entry_price: parse_number("entryPrice", &self.entry_price)?,
            mark_price: parse_number("markPrice", &self.mark_price)?,
            un_realized_profit: parse_number("unRealizedProfit", &self.un_realized_profit)?,
            liquidation_price: parse_number_or_zero(
                "liquidationPrice",
                self.liquidation_price.as_deref(),
            )?,
            leverage: parse_number_or_zero("leverage", self.leverage.as_deref())?,
            position_side: self
                .position_side
                .clone()
                .unwrap_or_else(|| "BOTH".to_string()),
        }))
    }
}

/// `POST /fapi/v1/leverage` acknowledgement.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageChange {
    pub symbol: String,
    pub leverage: u32,
    pub max_notional_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(amount: &str) -> PositionRisk {
        serde_json::from_str(&format!(
            r#"{{"symbol":"BTCUSDT","positionAmt":"{amount}","entryPrice":"42000.0",
               "markPrice":"42100.5","unRealizedProfit":"1.005","liquidationPrice":"0",
               "leverage":"20","positionSide":"BOTH","marginType":"cross"}}"#
        ))
        .unwrap()
    }

    #[test]
    fn flat_positions_are_skipped() {
        assert_eq!(risk("0.000").to_position().unwrap(), None);
    }

    #[test]
    fn open_position_is_converted() {
        let pos = risk("-0.010").to_position().unwrap().unwrap();
        assert_eq!(pos.position_amt, -0.01);
        assert_eq!(pos.mark_price, 42100.5);
        assert_eq!(pos.leverage, 20.0);
        assert_eq!(pos.position_side, "BOTH");
    }

    #[test]
    fn leverage_ack_decodes() {
        let ack: LeverageChange = serde_json::from_str(
            r#"{"leverage":21,"maxNotionalValue":"1000000","symbol":"BTCUSDT"}"#,
        )
        .unwrap();
        assert_eq!(ack.leverage, 21);
    }
}
