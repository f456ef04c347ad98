use crate::datastructures::{
    account::AccountInfo,
    client::TradingClient,
    config::Config,
    market::{ExchangeInfo, ServerTime, TickerPrice},
    order::{OrderRequest, OrderResponse},
    position::{LeverageChange, PositionRisk},
};
use crate::error::{BotError, BotResult};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client as HttpClient, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, error, info};
use url::{form_urlencoded, Url};

type HmacSha256 = Hmac<Sha256>;

// Docs: https://developers.binance.com/docs/derivatives/usds-margined-futures/general-info
const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Longest slice of a non-JSON error body kept in the error message.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

/// Signs a query string the way Binance expects: hex(HMAC-SHA256(secret, query)).
pub fn sign(secret: &str, query: &str) -> BotResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BotError::Config(format!("unusable API secret: {e}")))?;
    mac.update(query.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn build_query(params: &[(&str, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish()
}

/// USDT-M futures REST adapter.
#[derive(Clone)]
pub struct BinanceClient {
    http_client: HttpClient,
    base_url: Url,
    api_key: String,
    api_secret: String,
    recv_window: u64,
}

impl BinanceClient {
    pub fn new(config: &Config) -> BotResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!(
            base_url = %config.base_url,
            testnet = config.testnet,
            "Binance futures client created"
        );

        Ok(BinanceClient {
            http_client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            recv_window: config.recv_window,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn public<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> BotResult<T> {
        let query = build_query(params);
        let url = if query.is_empty() {
            self.endpoint(path)
        } else {
            format!("{}?{}", self.endpoint(path), query)
        };

        debug!("GET {}", url);
        let response = self.http_client.get(&url).send().await?;
        self.handle_response(Method::GET, path, response).await
    }

    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> BotResult<T> {
        let mut all_params = params.to_vec();
        all_params.push(("timestamp", chrono::Utc::now().timestamp_millis().to_string()));
        all_params.push(("recvWindow", self.recv_window.to_string()));

        let query = build_query(&all_params);
        let signature = sign(&self.api_secret, &query)?;
        let url = format!("{}?{}&signature={}", self.endpoint(path), query, signature);

        debug!("{} (signed) {}?{}", method, path, query);
        let response = self
            .http_client
            .request(method.clone(), &url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        self.handle_response(method, path, response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        response: reqwest::Response,
    ) -> BotResult<T> {
        let status = response.status();
        let body = response.text().await?;
        info!(%method, path, status = status.as_u16(), "Binance response");
        debug!("Response body: {}", body);

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse {} response: {} - Body: {}", path, e, body);
                BotError::Decode(e)
            });
        }

        let err = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(api) => BotError::Api {
                code: api.code,
                msg: api.msg,
            },
            Err(_) => BotError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            },
        };
        error!(%method, path, "Binance request failed: {}", err);
        Err(err)
    }
}

#[async_trait]
impl TradingClient for BinanceClient {
    async fn server_time(&self) -> BotResult<ServerTime> {
        self.public("/fapi/v1/time", &[]).await
    }

    async fn exchange_info(&self) -> BotResult<ExchangeInfo> {
        self.public("/fapi/v1/exchangeInfo", &[]).await
    }

    async fn ticker_price(&self, symbol: &str) -> BotResult<TickerPrice> {
        self.public("/fapi/v1/ticker/price", &[("symbol", symbol.to_string())])
            .await
    }

    async fn account(&self) -> BotResult<AccountInfo> {
        self.signed(Method::GET, "/fapi/v2/account", &[]).await
    }

    async fn position_information(&self) -> BotResult<Vec<PositionRisk>> {
        self.signed(Method::GET, "/fapi/v2/positionRisk", &[]).await
    }

    async fn create_order(&self, order: &OrderRequest) -> BotResult<OrderResponse> {
        self.signed(Method::POST, "/fapi/v1/order", &order.params())
            .await
    }

    async fn get_order(&self, symbol: &str, order_id: u64) -> BotResult<OrderResponse> {
        let params = [
            ("symbol", symbol.to_string()),
            ("orderId", order_id.to_string()),
        ];
        self.signed(Method::GET, "/fapi/v1/order", &params).await
    }

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> BotResult<OrderResponse> {
        let params = [
            ("symbol", symbol.to_string()),
            ("orderId", order_id.to_string()),
        ];
        self.signed(Method::DELETE, "/fapi/v1/order", &params).await
    }

    async fn change_leverage(&self, symbol: &str, leverage: u32) -> BotResult<LeverageChange> {
        let params = [
            ("symbol", symbol.to_string()),
            ("leverage", leverage.to_string()),
        ];
        self.signed(Method::POST, "/fapi/v1/leverage", &params).await
    }
}
