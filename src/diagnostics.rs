//! One-shot connection check, run by the `check` subcommand.

use std::io::{self, Write};

use tracing::warn;

use crate::datastructures::{client::TradingClient, config::mask_secret};

const PROBE_SYMBOL: &str = "BTCUSDT";

const AUTH_HINTS: [&str; 4] = [
    "API key permissions not enabled for futures",
    "IP restrictions blocking your connection",
    "API key/secret incorrect",
    "Wrong environment (testnet keys against live or the reverse)",
];

fn step<W: Write>(out: &mut W, ok: bool, text: impl AsRef<str>) -> io::Result<()> {
    let tag = if ok { "[ok]  " } else { "[fail]" };
    writeln!(out, "   {} {}", tag, text.as_ref())
}

/// Walks the public endpoints, then the authenticated account endpoint.
///
/// Every step runs even if an earlier one failed. Returns whether
/// authentication succeeded.
pub async fn run_diagnostics<C, W>(
    client: &C,
    api_key: &str,
    api_secret: &str,
    out: &mut W,
) -> io::Result<bool>
where
    C: TradingClient,
    W: Write,
{
    writeln!(out, "=== Testing Binance Futures API connection ===")?;
    writeln!(out, "API key:    {}", mask_secret(api_key))?;
    writeln!(out, "API secret: {}", mask_secret(api_secret))?;

    writeln!(out, "\n1. Server time")?;
    match client.server_time().await {
        Ok(t) => step(out, true, format!("server time {}", t.server_time))?,
        Err(e) => step(out, false, e.to_string())?,
    }

    writeln!(out, "\n2. Exchange info")?;
    match client.exchange_info().await {
        Ok(info) => step(out, true, format!("{} symbols available", info.symbols.len()))?,
        Err(e) => step(out, false, e.to_string())?,
    }

    writeln!(out, "\n3. {PROBE_SYMBOL} ticker")?;
    match client.ticker_price(PROBE_SYMBOL).await {
        Ok(ticker) => step(out, true, format!("{} {}", ticker.symbol, ticker.price))?,
        Err(e) => step(out, false, e.to_string())?,
    }

    writeln!(out, "\n4. Authenticated account")?;
    let authenticated = match client.account().await {
        Ok(account) => {
            let wallet = account
                .total_wallet_balance
                .as_deref()
                .unwrap_or("0");
            step(out, true, format!("authenticated, wallet balance {wallet} USDT"))?;
            if account.assets.is_empty() {
                writeln!(out, "   No assets found - you may need to get test funds")?;
            }
            true
        }
        Err(e) => {
            warn!("Diagnostics: authentication failed: {}", e);
            step(out, false, e.to_string())?;
            writeln!(out, "\n   Possible issues:")?;
            for hint in AUTH_HINTS {
                writeln!(out, "   - {hint}")?;
            }
            false
        }
    };

    writeln!(out, "\n=== Connection test complete ===")?;
    Ok(authenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::testing::MockClient;

    #[tokio::test]
    async fn reports_every_step() {
        let client = MockClient::default();
        let mut out = Vec::new();
        let ok = run_diagnostics(&client, "abcdefgh0000000012345678", "s", &mut out)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(ok);
        assert!(out.contains("abcdefgh...12345678"));
        assert!(out.contains("[ok]   server time 1700000000000"));
        assert!(out.contains("[ok]   1 symbols available"));
        assert!(out.contains("[ok]   BTCUSDT 43000.5"));
        assert!(out.contains("wallet balance 1000.5 USDT"));
        assert_eq!(
            client.calls(),
            vec!["server_time", "exchange_info", "ticker_price", "account"]
        );
    }

    #[tokio::test]
    async fn auth_failure_lists_hints() {
        let client = MockClient {
            reject_auth: true,
            ..MockClient::default()
        };
        let mut out = Vec::new();
        let ok = run_diagnostics(&client, "k", "s", &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(!ok);
        assert!(out.contains("[fail] Binance API error -2015"));
        assert!(out.contains("Possible issues:"));
        assert!(out.contains("***REDACTED***"));
    }
}
