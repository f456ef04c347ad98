use thiserror::Error;

/// Everything that can go wrong between a typed command and the exchange.
///
/// The shell never branches on the variant; it prints the `Display` text and
/// moves on to the next command.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Binance API error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed numeric field `{field}`: {value:?}")]
    Malformed { field: &'static str, value: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("symbol {0} not found")]
    SymbolNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type BotResult<T> = Result<T, BotError>;

/// Parses one of the exchange's string-encoded decimals.
pub(crate) fn parse_number(field: &'static str, value: &str) -> BotResult<f64> {
    value.trim().parse::<f64>().map_err(|_| BotError::Malformed {
        field,
        value: value.to_string(),
    })
}

/// Same as [`parse_number`] but an empty or missing value counts as zero.
pub(crate) fn parse_number_or_zero(field: &'static str, value: Option<&str>) -> BotResult<f64> {
    match value {
        None => Ok(0.0),
        Some(v) if v.trim().is_empty() => Ok(0.0),
        Some(v) => parse_number(field, v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exchange_decimals() {
        assert_eq!(parse_number("price", "43250.10").unwrap(), 43250.10);
        assert_eq!(parse_number("price", " 1 ").unwrap(), 1.0);
    }

    #[test]
    fn rejects_garbage_with_field_name() {
        let err = parse_number("markPrice", "n/a").unwrap_err();
        assert_eq!(err.to_string(), "malformed numeric field `markPrice`: \"n/a\"");
    }

    #[test]
    fn missing_counts_as_zero() {
        assert_eq!(parse_number_or_zero("x", None).unwrap(), 0.0);
        assert_eq!(parse_number_or_zero("x", Some("")).unwrap(), 0.0);
        assert_eq!(parse_number_or_zero("x", Some("2.5")).unwrap(), 2.5);
    }
}
