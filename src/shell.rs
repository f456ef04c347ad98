//! Interactive command loop.
//!
//! Reads one line at a time, turns it into a [`Command`] and runs exactly one
//! facade call per line. Bad input is reported locally and never reaches the
//! exchange.

use std::future::Future;
use std::io::{self, Write};

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::bot::BasicBot;
use crate::datastructures::{client::TradingClient, order::Side};

const PROMPT: &str = "Enter command: ";
const GOODBYE: &str = "Goodbye!";

const USAGE_PRICE: &str = "price <symbol>";
const USAGE_SYMBOL: &str = "symbol <symbol>";
const USAGE_MARKET: &str = "market <symbol> <side> <quantity> [reduce]";
const USAGE_LIMIT: &str = "limit <symbol> <side> <quantity> <price> [reduce]";
const USAGE_STOP: &str = "stop <symbol> <side> <quantity> <price> <stop_price> [reduce]";
const USAGE_OCO: &str = "oco <symbol> <side> <quantity> <price> <stop_price> <stop_limit_price>";
const USAGE_STATUS: &str = "status <symbol> <order_id>";
const USAGE_CANCEL: &str = "cancel <symbol> <order_id>";
const USAGE_LEVERAGE: &str = "leverage <symbol> <leverage>";

/// Which command set the shell offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Profile {
    /// Orders, status and cancellation only.
    Basic,
    /// Adds simulated OCO orders and leverage control.
    #[default]
    Advanced,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Balance,
    Positions,
    Price {
        symbol: String,
    },
    Symbol {
        symbol: String,
    },
    Market {
        symbol: String,
        side: Side,
        quantity: f64,
        reduce_only: bool,
    },
    Limit {
        symbol: String,
        side: Side,
        quantity: f64,
        price: f64,
        reduce_only: bool,
    },
    Stop {
        symbol: String,
        side: Side,
        quantity: f64,
        price: f64,
        stop_price: f64,
        reduce_only: bool,
    },
    Oco {
        symbol: String,
        side: Side,
        quantity: f64,
        price: f64,
        stop_price: f64,
        stop_limit_price: f64,
    },
    Status {
        symbol: String,
        order_id: u64,
    },
    Cancel {
        symbol: String,
        order_id: u64,
    },
    Leverage {
        symbol: String,
        leverage: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Error: invalid {field} {value:?}, expected a number")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Error: invalid {field} {value:?}, expected a whole number")]
    InvalidInteger { field: &'static str, value: String },

    #[error("Error: invalid side {0:?}, expected BUY or SELL")]
    InvalidSide(String),

    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),

    #[error("Error: '{0}' is not available in the basic profile")]
    Unavailable(&'static str),
}

struct Args<'a> {
    tokens: Vec<&'a str>,
}

impl<'a> Args<'a> {
    fn require(tokens: &[&'a str], count: usize, usage: &'static str) -> Result<Self, CommandError> {
        // tokens[0] is the command word
        if tokens.len() < count + 1 {
            return Err(CommandError::Usage(usage));
        }
        Ok(Args {
            tokens: tokens[1..].to_vec(),
        })
    }

    fn symbol(&self) -> String {
        self.tokens[0].to_ascii_uppercase()
    }

    fn side(&self, index: usize) -> Result<Side, CommandError> {
        let raw = self.tokens[index];
        raw.parse::<Side>()
            .map_err(|_| CommandError::InvalidSide(raw.to_string()))
    }

    fn number(&self, index: usize, field: &'static str) -> Result<f64, CommandError> {
        let raw = self.tokens[index];
        raw.parse::<f64>().map_err(|_| CommandError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
    }

    fn integer<T: std::str::FromStr>(
        &self,
        index: usize,
        field: &'static str,
    ) -> Result<T, CommandError> {
        let raw = self.tokens[index];
        raw.parse::<T>().map_err(|_| CommandError::InvalidInteger {
            field,
            value: raw.to_string(),
        })
    }

    /// Optional `reduce` flag right after the required arguments.
    fn reduce_flag(&self, index: usize) -> bool {
        self.tokens
            .get(index)
            .map(|t| matches!(t.to_ascii_lowercase().as_str(), "reduce" | "reduce-only"))
            .unwrap_or(false)
    }
}

impl Command {
    /// Parses one input line. `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(word) = tokens.first() else {
            return Ok(None);
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "balance" => Command::Balance,
            "positions" => Command::Positions,
            "price" => {
                let args = Args::require(&tokens, 1, USAGE_PRICE)?;
                Command::Price {
                    symbol: args.symbol(),
                }
            }
            "symbol" => {
                let args = Args::require(&tokens, 1, USAGE_SYMBOL)?;
                Command::Symbol {
                    symbol: args.symbol(),
                }
            }
            "market" => {
                let args = Args::require(&tokens, 3, USAGE_MARKET)?;
                Command::Market {
                    symbol: args.symbol(),
                    side: args.side(1)?,
                    quantity: args.number(2, "quantity")?,
                    reduce_only: args.reduce_flag(3),
                }
            }
            "limit" => {
                let args = Args::require(&tokens, 4, USAGE_LIMIT)?;
                Command::Limit {
                    symbol: args.symbol(),
                    side: args.side(1)?,
                    quantity: args.number(2, "quantity")?,
                    price: args.number(3, "price")?,
                    reduce_only: args.reduce_flag(4),
                }
            }
            "stop" => {
                let args = Args::require(&tokens, 5, USAGE_STOP)?;
                Command::Stop {
                    symbol: args.symbol(),
                    side: args.side(1)?,
                    quantity: args.number(2, "quantity")?,
                    price: args.number(3, "price")?,
                    stop_price: args.number(4, "stop_price")?,
                    reduce_only: args.reduce_flag(5),
                }
            }
            "oco" => {
                let args = Args::require(&tokens, 6, USAGE_OCO)?;
                Command::Oco {
                    symbol: args.symbol(),
                    side: args.side(1)?,
                    quantity: args.number(2, "quantity")?,
                    price: args.number(3, "price")?,
                    stop_price: args.number(4, "stop_price")?,
                    stop_limit_price: args.number(5, "stop_limit_price")?,
                }
            }
            "status" => {
                let args = Args::require(&tokens, 2, USAGE_STATUS)?;
                Command::Status {
                    symbol: args.symbol(),
                    order_id: args.integer(1, "order_id")?,
                }
            }
            "cancel" => {
                let args = Args::require(&tokens, 2, USAGE_CANCEL)?;
                Command::Cancel {
                    symbol: args.symbol(),
                    order_id: args.integer(1, "order_id")?,
                }
            }
            "leverage" => {
                let args = Args::require(&tokens, 2, USAGE_LEVERAGE)?;
                Command::Leverage {
                    symbol: args.symbol(),
                    leverage: args.integer(1, "leverage")?,
                }
            }
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }

    fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Quit => "quit",
            Command::Balance => "balance",
            Command::Positions => "positions",
            Command::Price { .. } => "price",
            Command::Symbol { .. } => "symbol",
            Command::Market { .. } => "market",
            Command::Limit { .. } => "limit",
            Command::Stop { .. } => "stop",
            Command::Oco { .. } => "oco",
            Command::Status { .. } => "status",
            Command::Cancel { .. } => "cancel",
            Command::Leverage { .. } => "leverage",
        }
    }

    fn allowed_in(&self, profile: Profile) -> bool {
        match self {
            Command::Oco { .. } | Command::Leverage { .. } => profile == Profile::Advanced,
            _ => true,
        }
    }
}

/// What the loop should do after a line.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Continue(String),
    Quit(String),
}

fn render<T: Serialize>(label: &str, value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(json) => format!("{label}: {json}"),
        Err(e) => format!("{label}: <unrenderable result: {e}>"),
    }
}

fn outcome<T: Serialize, E: std::fmt::Display>(
    ok_label: &str,
    failed_label: &str,
    result: Result<T, E>,
) -> String {
    match result {
        Ok(value) => render(ok_label, &value),
        Err(e) => format!("{failed_label} failed: {e}"),
    }
}

pub struct Shell<C> {
    bot: BasicBot<C>,
    profile: Profile,
}

impl<C: TradingClient> Shell<C> {
    pub fn new(bot: BasicBot<C>, profile: Profile) -> Self {
        Shell { bot, profile }
    }

    pub fn bot(&self) -> &BasicBot<C> {
        &self.bot
    }

    pub fn banner(&self) -> String {
        let env = if self.bot.is_testnet() { "TESTNET" } else { "LIVE" };
        let profile = match self.profile {
            Profile::Basic => "basic",
            Profile::Advanced => "advanced",
        };
        format!(
            "=== Binance Futures Trading Bot ===\nEnvironment: {env} ({profile} profile)\n\n{}",
            self.help()
        )
    }

    pub fn help(&self) -> String {
        let mut lines = vec![
            "balance - Show futures account balance".to_string(),
            "positions - Show current positions".to_string(),
            format!("{USAGE_PRICE} - Get current price"),
            format!("{USAGE_SYMBOL} - Show contract metadata"),
            format!("{USAGE_MARKET} - Place market order"),
            format!("{USAGE_LIMIT} - Place limit order"),
            format!("{USAGE_STOP} - Place stop-limit order"),
        ];
        if self.profile == Profile::Advanced {
            lines.push(format!("{USAGE_OCO} - Place simulated OCO order"));
        }
        lines.push(format!("{USAGE_STATUS} - Get order status"));
        lines.push(format!("{USAGE_CANCEL} - Cancel order"));
        if self.profile == Profile::Advanced {
            lines.push(format!("{USAGE_LEVERAGE} - Set leverage"));
        }
        lines.push("help - Show this list".to_string());
        lines.push("quit - Exit bot".to_string());

        let numbered: Vec<String> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{}. {}", i + 1, line))
            .collect();
        format!("Commands:\n{}", numbered.join("\n"))
    }

    /// Handles one input line. `None` for blank input.
    pub async fn execute(&self, line: &str) -> Option<Reply> {
        match Command::parse(line) {
            Ok(None) => None,
            Ok(Some(command)) => Some(self.dispatch(command).await),
            Err(e) => Some(Reply::Continue(e.to_string())),
        }
    }

    async fn dispatch(&self, command: Command) -> Reply {
        if !command.allowed_in(self.profile) {
            return Reply::Continue(CommandError::Unavailable(command.name()).to_string());
        }

        let bot = &self.bot;
        let text = match command {
            Command::Quit => return Reply::Quit(GOODBYE.to_string()),
            Command::Help => self.help(),
            Command::Balance => outcome("Futures Balance", "Balance", bot.futures_balance().await),
            Command::Positions => match bot.positions().await {
                Ok(positions) if positions.is_empty() => "No active positions".to_string(),
                result => outcome("Positions", "Positions", result),
            },
            Command::Price { symbol } => match bot.current_price(&symbol).await {
                Ok(price) => format!("Current price for {symbol}: {price}"),
                Err(e) => format!("Price failed: {e}"),
            },
            Command::Symbol { symbol } => {
                outcome("Symbol info", "Symbol info", bot.symbol_info(&symbol).await)
            }
            Command::Market {
                symbol,
                side,
                quantity,
                reduce_only,
            } => outcome(
                "Market order result",
                "Market order",
                bot.place_market_order(&symbol, side, quantity, reduce_only)
                    .await,
            ),
            Command::Limit {
                symbol,
                side,
                quantity,
                price,
                reduce_only,
            } => outcome(
                "Limit order result",
                "Limit order",
                bot.place_limit_order(&symbol, side, quantity, price, reduce_only)
                    .await,
            ),
            Command::Stop {
                symbol,
                side,
                quantity,
                price,
                stop_price,
                reduce_only,
            } => outcome(
                "Stop-limit order result",
                "Stop-limit order",
                bot.place_stop_limit_order(&symbol, side, quantity, price, stop_price, reduce_only)
                    .await,
            ),
            Command::Oco {
                symbol,
                side,
                quantity,
                price,
                stop_price,
                stop_limit_price,
            } => outcome(
                "OCO order result",
                "OCO order",
                bot.place_oco_order(&symbol, side, quantity, price, stop_price, stop_limit_price)
                    .await,
            ),
            Command::Status { symbol, order_id } => outcome(
                "Order status",
                "Order status",
                bot.order_status(&symbol, order_id).await,
            ),
            Command::Cancel { symbol, order_id } => outcome(
                "Cancel result",
                "Cancel",
                bot.cancel_order(&symbol, order_id).await,
            ),
            Command::Leverage { symbol, leverage } => outcome(
                "Leverage set",
                "Leverage setting",
                bot.set_leverage(&symbol, leverage).await,
            ),
        };
        Reply::Continue(text)
    }

    /// Runs until `quit`, end of input or Ctrl-C.
    ///
    /// A Ctrl-C pressed while a command is in flight lets that request finish
    /// and ends the loop at the next prompt.
    pub async fn run<R, W>(&self, input: R, out: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        self.run_until(input, out, tokio::signal::ctrl_c()).await
    }

    /// Like [`Shell::run`], but stops once `shutdown` resolves.
    pub async fn run_until<R, W, S>(&self, input: R, out: &mut W, shutdown: S) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
        S: Future,
    {
        // polled once per prompt; keeps its registration across commands
        tokio::pin!(shutdown);
        let mut lines = input.lines();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            let line = tokio::select! {
                biased;
                _ = &mut shutdown => None,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                writeln!(out, "\n{GOODBYE}")?;
                return Ok(());
            };

            match self.execute(&line).await {
                None => continue,
                Some(Reply::Continue(text)) => writeln!(out, "{text}")?,
                Some(Reply::Quit(text)) => {
                    writeln!(out, "{text}")?;
                    return Ok(());
                }
            }
        }
    }
}
