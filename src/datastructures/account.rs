use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{parse_number, parse_number_or_zero, BotResult};

/// Raw `GET /fapi/v2/account` payload. Binance sends decimals as strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub total_wallet_balance: Option<String>,
    pub total_unrealized_profit: Option<String>,
    pub total_margin_balance: Option<String>,
    pub total_position_initial_margin: Option<String>,
    pub total_open_order_initial_margin: Option<String>,
    pub available_balance: Option<String>,
    pub max_withdraw_amount: Option<String>,
    #[serde(default)]
    pub assets: Vec<AccountAsset>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAsset {
    pub asset: String,
    pub wallet_balance: String,
    pub unrealized_profit: String,
    pub margin_balance: String,
    pub maint_margin: String,
    pub initial_margin: String,
    pub position_initial_margin: String,
    pub open_order_initial_margin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    pub total_wallet_balance: f64,
    pub total_unrealized_profit: f64,
    pub total_margin_balance: f64,
    pub total_position_initial_margin: f64,
    pub total_open_order_initial_margin: f64,
    pub available_balance: f64,
    pub max_withdraw_amount: f64,
    pub assets: BTreeMap<String, AssetBalance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetBalance {
    pub wallet_balance: f64,
    pub unrealized_profit: f64,
    pub margin_balance: f64,
    pub maint_margin: f64,
    pub initial_margin: f64,
    pub position_initial_margin: f64,
    pub open_order_initial_margin: f64,
}

impl AccountInfo {
    pub fn wallet_balance(&self) -> BotResult<f64> {
        parse_number_or_zero("totalWalletBalance", self.total_wallet_balance.as_deref())
    }

    /// Converts to floats, keeping only assets that hold a positive wallet balance.
    pub fn summary(&self) -> BotResult<BalanceSummary> {
        let mut assets = BTreeMap::new();
        for asset in &self.assets {
            let wallet_balance = parse_number("walletBalance", &asset.wallet_balance)?;
            if wallet_balance <= 0.0 {
                continue;
            }
            assets.insert(
                asset.asset.clone(),
                AssetBalance {
                    wallet_balance,
                    unrealized_profit: parse_number("unrealizedProfit", &asset.unrealized_profit)?,
                    margin_balance: parse_number("marginBalance", &asset.margin_balance)?,
                    maint_margin: parse_number("maintMargin", &asset.maint_margin)?,
                    initial_margin: parse_number("initialMargin", &asset.initial_margin)?,
                    position_initial_margin: parse_number(
                        "positionInitialMargin",
                        &asset.position_initial_margin,
                    )?,
                    open_order_initial_margin: parse_number(
                        "openOrderInitialMargin",
                        &asset.open_order_initial_margin,
                    )?,
                },
            );
        }

        Ok(BalanceSummary {
            total_wallet_balance: self.wallet_balance()?,
            total_unrealized_profit: parse_number_or_zero(
                "totalUnrealizedProfit",
                self.total_unrealized_profit.as_deref(),
            )?,
            total_margin_balance: parse_number_or_zero(
                "totalMarginBalance",
                self.total_margin_balance.as_deref(),
            )?,
            total_position_initial_margin: parse_number_or_zero(
                "totalPositionInitialMargin",
                self.total_position_initial_margin.as_deref(),
            )?,
            total_open_order_initial_margin: parse_number_or_zero(
                "totalOpenOrderInitialMargin",
                self.total_open_order_initial_margin.as_deref(),
            )?,
            available_balance: parse_number_or_zero(
                "availableBalance",
                self.available_balance.as_deref(),
            )?,
            max_withdraw_amount: parse_number_or_zero(
                "maxWithdrawAmount",
                self.max_withdraw_amount.as_deref(),
            )?,
            assets,
        })
    }
}
