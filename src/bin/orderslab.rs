//! orderslab command-line decoder
//!
//! Decodes account dumps saved from an RPC node and prints JSON.
//!
//! # Examples
//!
//! ```bash
//! # Order book, best prices first
//! orderslab book orders.bin --sorted
//!
//! # Account data copied out of a getAccountInfo response
//! orderslab --base64 book orders.b64
//!
//! # One settlement log, filtered to a wallet
//! orderslab settlement settle0.bin --owner <ADDRESS>
//!
//! # Walk a settlement chain from a directory of dumps named by address
//! orderslab chain --dir dumps/ <FIRST_LOG_ADDRESS>
//!
//! # Market state, whose settle_a heads the live settlement chain
//! orderslab market-state state.bin
//!
//! # Order id conversions
//! orderslab order-id decode 00000000000000000000000000
//! ```

use anyhow::{anyhow, Context};
use base64::Engine;
use clap::{Parser, Subcommand};
use orderslab::market::OrderBookSlab;
use orderslab::{
    order_id, Address, DecoderConfig, LogSource, MarketAccount, MarketState, SettlementChain,
    SettlementLog,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Decoder for paged slab order books and settlement logs
#[derive(Parser, Debug)]
#[command(name = "orderslab")]
#[command(version = orderslab::VERSION)]
#[command(about = "Decode slab order book and settlement log accounts", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Input files hold base64 text instead of raw bytes
    #[arg(long, global = true)]
    base64: bool,

    /// Decoder configuration file (TOML)
    #[arg(long, global = true, env = "ORDERSLAB_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    /// Also write daily rolling logs to this directory
    #[arg(long, global = true, env = "ORDERSLAB_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit stderr logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode an order book account
    Book {
        /// Account dump
        file: PathBuf,
        /// Sort bids and asks best price first
        #[arg(long)]
        sorted: bool,
        /// Print raw collections instead of joined orders
        #[arg(long)]
        raw: bool,
    },

    /// Decode one settlement log account
    Settlement {
        /// Account dump
        file: PathBuf,
        /// Only entries owned by this address (base58)
        #[arg(long)]
        owner: Option<Address>,
    },

    /// Walk a settlement log chain through a directory of dumps
    Chain {
        /// Directory holding one dump per account, named by base58 address
        #[arg(long)]
        dir: PathBuf,
        /// First settlement log address
        first: Address,
        /// Only entries owned by this address (base58)
        #[arg(long)]
        owner: Option<Address>,
    },

    /// Decode a market account
    Market {
        /// Account dump
        file: PathBuf,
    },

    /// Decode a market state account
    MarketState {
        /// Account dump
        file: PathBuf,
    },

    /// Convert order ids
    OrderId {
        #[command(subcommand)]
        command: OrderIdCommands,
    },

    /// Show version
    Version,
}

#[derive(Subcommand, Debug)]
enum OrderIdCommands {
    /// Encode a 16-byte key given as 32 hex digits in account byte order
    Encode { key: String },
    /// Decode an order id to its key as hex
    Decode { id: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli)?;

    let config = DecoderConfig::load(cli.config.as_deref())?;
    debug!(?config, "Decoder configuration");

    match &cli.command {
        Commands::Book { file, sorted, raw } => {
            let blob = read_input(file, cli.base64)?;
            let slab = OrderBookSlab::decode(&blob, &config)?;
            if *raw {
                return print_json(&RawBook::from(&slab));
            }
            let mut book = slab.assemble()?;
            if *sorted {
                book = book.sorted();
            }
            info!(bids = book.bids.len(), asks = book.asks.len(), "Decoded order book");
            print_json(&book)
        }
        Commands::Settlement { file, owner } => {
            let blob = read_input(file, cli.base64)?;
            let log = match owner {
                Some(owner) => SettlementLog::decode_for_owner(&blob, &config, owner)?,
                None => SettlementLog::decode(&blob, &config)?,
            };
            print_json(&log)
        }
        Commands::Chain { dir, first, owner } => {
            let source = DirectorySource {
                dir: dir.clone(),
                base64: cli.base64,
            };
            let mut chain = SettlementChain::new(source, *first, config);
            if let Some(owner) = owner {
                chain = chain.with_owner(*owner);
            }
            let entries = chain.by_ref().collect::<orderslab::error::Result<Vec<_>>>()?;
            info!(logs = chain.logs_visited(), entries = entries.len(), "Walked settlement chain");
            print_json(&entries)
        }
        Commands::Market { file } => {
            let blob = read_input(file, cli.base64)?;
            print_json(&MarketAccount::decode(&blob)?)
        }
        Commands::MarketState { file } => {
            let blob = read_input(file, cli.base64)?;
            let state = MarketState::decode(&blob)?;
            info!(settle_a = %state.settle_a, settle_b = %state.settle_b, "Decoded market state");
            print_json(&state)
        }
        Commands::OrderId { command } => order_id_command(command),
        Commands::Version => {
            println!("orderslab {}", orderslab::VERSION);
            Ok(())
        }
    }
}

/// Setup logging to stderr, plus rolling files when a log directory is set
fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);

    let file_layer = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "orderslab.log");
            Some(fmt::layer().with_writer(appender).with_ansi(false))
        }
        None => None,
    };

    let (json_layer, text_layer) = if cli.log_json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(!cli.no_color);
        (None, Some(layer))
    };

    tracing_subscriber::registry()
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(())
}

fn read_input(path: &Path, base64: bool) -> anyhow::Result<Vec<u8>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if !base64 {
        return Ok(bytes);
    }
    let text = String::from_utf8(bytes).context("base64 input is not UTF-8")?;
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .with_context(|| format!("Failed to decode base64 in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn order_id_command(command: &OrderIdCommands) -> anyhow::Result<()> {
    println!("{}", convert_order_id(command)?);
    Ok(())
}

fn convert_order_id(command: &OrderIdCommands) -> anyhow::Result<String> {
    match command {
        OrderIdCommands::Encode { key } => Ok(order_id::encode(&parse_key_hex(key)?)),
        OrderIdCommands::Decode { id } => Ok(hex::encode(order_id::decode(id)?)),
    }
}

fn parse_key_hex(text: &str) -> anyhow::Result<[u8; 16]> {
    let text = text.trim_start_matches("0x");
    let bytes = hex::decode(text).with_context(|| format!("invalid hex key {:?}", text))?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow!("key must be 16 bytes, got {}", bytes.len()))
}

/// Reads settlement log dumps from `<dir>/<address>` or `<dir>/<address>.bin`
struct DirectorySource {
    dir: PathBuf,
    base64: bool,
}

impl LogSource for DirectorySource {
    fn fetch(&mut self, address: &Address) -> orderslab::error::Result<Vec<u8>> {
        let name = address.to_string();
        let path = [self.dir.join(&name), self.dir.join(format!("{}.bin", name))]
            .into_iter()
            .find(|p| p.exists())
            .ok_or_else(|| {
                orderslab::error::Error::Source(format!(
                    "no dump for {} in {}",
                    name,
                    self.dir.display()
                ))
            })?;
        read_input(&path, self.base64)
            .map_err(|e| orderslab::error::Error::Source(format!("{:#}", e)))
    }
}

/// Collection-level view of an order book for `book --raw`
#[derive(Serialize)]
struct RawBook<'a> {
    version: u16,
    headers: &'a [orderslab::CollectionHeader],
    bid_tree: &'a orderslab::SlabTree,
    ask_tree: &'a orderslab::SlabTree,
    bid_orders: &'a orderslab::SlotVector<orderslab::slab::OrderSlot>,
    ask_orders: &'a orderslab::SlotVector<orderslab::slab::OrderSlot>,
}

impl<'a> From<&'a OrderBookSlab> for RawBook<'a> {
    fn from(slab: &'a OrderBookSlab) -> Self {
        Self {
            version: slab.version,
            headers: &slab.headers,
            bid_tree: &slab.bid_tree,
            ask_tree: &slab.ask_tree,
            bid_orders: &slab.bid_orders,
            ask_orders: &slab.ask_orders,
        }
    }
}
