use std::fmt;

use url::Url;

use crate::error::{BotError, BotResult};

pub const LIVE_BASE_URL: &str = "https://fapi.binance.com";
pub const TESTNET_BASE_URL: &str = "https://testnet.binancefuture.com";

/* Immutable configuration object. */
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub api_secret: String,
    pub testnet: bool,
    pub base_url: Url,
    pub recv_window: u64,
    pub timeout_secs: u64,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

// Keep credentials out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &mask_secret(&self.api_key))
            .field("api_secret", &"***REDACTED***")
            .field("testnet", &self.testnet)
            .field("base_url", &self.base_url.as_str())
            .field("recv_window", &self.recv_window)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/* Creates the final config object.  */
pub struct ConfigBuilder {
    api_key: String,
    api_secret: String,
    testnet: bool,
    base_url: Option<String>,
    recv_window: u64,
    timeout_secs: u64,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        ConfigBuilder {
            api_key: String::new(),
            api_secret: String::new(),
            testnet: true,
            base_url: None,
            recv_window: 5000,
            timeout_secs: 10,
        }
    }
}

impl ConfigBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn api_secret(mut self, api_secret: impl Into<String>) -> Self {
        self.api_secret = api_secret.into();
        self
    }

    /// Determines whether orders go to the sandbox or the live exchange.
    pub fn testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// Overrides the REST endpoint picked by [`ConfigBuilder::testnet`].
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = recv_window;
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn build(self) -> BotResult<Config> {
        if self.api_key.trim().is_empty() {
            return Err(BotError::Config("API key is empty".to_string()));
        }
        if self.api_secret.trim().is_empty() {
            return Err(BotError::Config("API secret is empty".to_string()));
        }
        if self.recv_window == 0 || self.recv_window > 60_000 {
            return Err(BotError::Config(format!(
                "recvWindow must be within 1..=60000 ms, got {}",
                self.recv_window
            )));
        }

        let raw = match self.base_url {
            Some(url) => url,
            None if self.testnet => TESTNET_BASE_URL.to_string(),
            None => LIVE_BASE_URL.to_string(),
        };
        let base_url = Url::parse(&raw)
            .map_err(|e| BotError::Config(format!("invalid base URL {raw:?}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(BotError::Config(format!(
                "base URL must be http(s), got {raw:?}"
            )));
        }

        Ok(Config {
            api_key: self.api_key,
            api_secret: self.api_secret,
            testnet: self.testnet,
            base_url,
            recv_window: self.recv_window,
            timeout_secs: self.timeout_secs,
        })
    }
}

/// Shows the first and last eight characters of a long credential.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 16 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***REDACTED***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ConfigBuilder {
        Config::builder().api_key("key").api_secret("secret")
    }

    #[test]
    fn testnet_is_the_default_endpoint() {
        let cfg = builder().build().unwrap();
        assert!(cfg.testnet);
        assert_eq!(cfg.base_url.as_str(), "https://testnet.binancefuture.com/");
    }

    #[test]
    fn live_endpoint_when_testnet_disabled() {
        let cfg = builder().testnet(false).build().unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://fapi.binance.com/");
    }

    #[test]
    fn explicit_base_url_wins() {
        let cfg = builder().base_url("http://127.0.0.1:9000").build().unwrap();
        assert_eq!(cfg.base_url.as_str(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn rejects_missing_credentials_and_bad_urls() {
        assert!(Config::builder().api_secret("s").build().is_err());
        assert!(Config::builder().api_key("k").build().is_err());
        assert!(builder().base_url("not a url").build().is_err());
        assert!(builder().base_url("ftp://example.com").build().is_err());
        assert!(builder().recv_window(0).build().is_err());
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let cfg = Config::builder()
            .api_key("abcdefgh12345678ijklmnop")
            .api_secret("topsecretvalue")
            .build()
            .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(dbg.contains("abcdefgh...ijklmnop"));
        assert!(!dbg.contains("topsecretvalue"));
    }

    #[test]
    fn short_secrets_are_fully_masked() {
        assert_eq!(mask_secret("short"), "***REDACTED***");
    }
}
