mod config;
mod main_lib;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use config::Config;
use main_lib::{build_context, init_tracing, AppContext};
use moexfolio_core::instruments::InstrumentKind;
use moexfolio_core::ledger::{
    normalize_ticker, InstrumentKey, NewTransaction, RecalculationOutcome, TransactionFilter,
    TransactionSide, TransactionUpdate,
};
use moexfolio_core::utils::time_utils::{parse_date, parse_trade_date};

#[derive(Parser)]
#[command(name = "moexfolio", version, about = "MOEX portfolio ledger and valuation")]
struct Cli {
    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value current holdings at market prices.
    Portfolio {
        #[arg(long)]
        account: Option<String>,
        /// Measure change against the oldest sample within this many days.
        #[arg(long)]
        days: Option<i64>,
    },
    /// Record a trade.
    Add {
        ticker: String,
        side: TransactionSide,
        quantity: Decimal,
        price: Decimal,
        /// YYYY-MM-DD or YYYY-MM-DD HH:MM[:SS], Moscow time. Defaults to now.
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "equity")]
        kind: InstrumentKind,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        account: Option<String>,
    },
    /// Change fields of an existing trade.
    Edit {
        id: i64,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        side: Option<TransactionSide>,
        #[arg(long)]
        quantity: Option<Decimal>,
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        kind: Option<InstrumentKind>,
        #[arg(long)]
        name: Option<String>,
        /// Pass an empty string to clear.
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        account: Option<String>,
    },
    /// Remove a trade.
    Delete { id: i64 },
    /// Show trades, newest first.
    List {
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        side: Option<TransactionSide>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        account: Option<String>,
    },
    /// Rebuild positions from the ledger.
    Recalculate {
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        account: Option<String>,
    },
    /// Record the current price of every held ticker.
    LogPrices,
    /// Show logged prices.
    PriceHistory {
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long, default_value_t = 7)]
        days: i64,
        /// Group by Moscow calendar day.
        #[arg(long)]
        grouped: bool,
    },
    /// Fetch a live quote.
    Quote {
        ticker: String,
        #[arg(long, default_value = "equity")]
        kind: InstrumentKind,
    },
    /// Check that a ticker trades on the exchange.
    Validate { ticker: String },
    /// Central bank exchange rates.
    Rates { codes: Vec<String> },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(ctx: &AppContext, command: Commands, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Portfolio { account, days } => {
            let valuation = ctx
                .valuation_service
                .get_portfolio_valuation(account.as_deref(), days)
                .await?;
            if json {
                print_json(&valuation)?;
            } else {
                print!("{}", output::render_portfolio(&valuation));
            }
        }
        Commands::Add {
            ticker,
            side,
            quantity,
            price,
            date,
            kind,
            name,
            notes,
            account,
        } => {
            let trade_date = date.as_deref().map(parse_trade_date).transpose()?;
            let result = ctx
                .ledger_service
                .add_transaction(NewTransaction {
                    account_id: account.unwrap_or_else(|| ctx.config.account_id.clone()),
                    ticker,
                    company_name: name,
                    side,
                    unit_price: price,
                    quantity,
                    instrument_kind: kind,
                    notes,
                    trade_date,
                })
                .await?;
            if json {
                print_json(&result)?;
            } else {
                if let Some(transaction) = &result.transaction {
                    println!("Added transaction {}", transaction.id);
                }
                print!("{}", output::render_recalculations(&result.recalculations));
            }
        }
        Commands::Edit {
            id,
            ticker,
            side,
            quantity,
            price,
            date,
            kind,
            name,
            notes,
            account,
        } => {
            let trade_date = date.as_deref().map(parse_trade_date).transpose()?;
            let result = ctx
                .ledger_service
                .update_transaction(TransactionUpdate {
                    id,
                    account_id: account,
                    ticker,
                    company_name: name,
                    side,
                    unit_price: price,
                    quantity,
                    instrument_kind: kind,
                    notes,
                    trade_date,
                })
                .await?;
            if json {
                print_json(&result)?;
            } else {
                println!("Updated transaction {}", id);
                print!("{}", output::render_recalculations(&result.recalculations));
            }
        }
        Commands::Delete { id } => {
            let result = ctx.ledger_service.delete_transaction(id).await?;
            if json {
                print_json(&result)?;
            } else {
                println!("Deleted transaction {}", id);
                print!("{}", output::render_recalculations(&result.recalculations));
            }
        }
        Commands::List {
            ticker,
            side,
            from,
            to,
            account,
        } => {
            let filter = TransactionFilter {
                account_id: account,
                ticker,
                side,
                date_from: from.as_deref().map(parse_date).transpose()?,
                date_to: to.as_deref().map(parse_date).transpose()?,
            };
            let transactions = ctx.ledger_service.list_transactions(&filter)?;
            if json {
                print_json(&transactions)?;
            } else {
                print!("{}", output::render_transactions(&transactions));
            }
        }
        Commands::Recalculate { ticker, account } => {
            let outcomes = match ticker {
                Some(ticker) => {
                    let account_id = account.unwrap_or_else(|| ctx.config.account_id.clone());
                    let position = ctx.ledger_service.recalculate(&account_id, &ticker).await?;
                    vec![RecalculationOutcome {
                        key: InstrumentKey::new(&account_id, &normalize_ticker(&ticker)),
                        position,
                    }]
                }
                None => ctx.ledger_service.recalculate_all().await?,
            };
            if json {
                print_json(&outcomes)?;
            } else {
                print!("{}", output::render_recalculations(&outcomes));
            }
        }
        Commands::LogPrices => {
            let result = ctx.price_logger_service.log_all_prices().await?;
            if json {
                print_json(&result)?;
            } else {
                println!("Logged {} of {} prices", result.logged, result.total);
            }
        }
        Commands::PriceHistory {
            ticker,
            days,
            grouped,
        } => {
            if grouped {
                let history = ctx.price_logger_service.get_price_history_grouped(days)?;
                if json {
                    print_json(&history)?;
                } else {
                    print!("{}", output::render_grouped_samples(&history));
                }
            } else {
                let samples = ctx
                    .price_logger_service
                    .get_price_history(ticker.as_deref(), days)?;
                if json {
                    print_json(&samples)?;
                } else {
                    print!("{}", output::render_samples(&samples));
                }
            }
        }
        Commands::Quote { ticker, kind } => {
            let quote = ctx.quote_service.get_quote(&ticker, kind).await?;
            if json {
                print_json(&quote)?;
            } else {
                println!(
                    "{} {} ({} / {}%) volume {}",
                    quote.ticker,
                    quote.price.normalize(),
                    quote.change.normalize(),
                    quote.change_percent.round_dp(2),
                    quote.volume
                );
            }
        }
        Commands::Validate { ticker } => {
            let validation = ctx.quote_service.validate_ticker(&ticker).await?;
            if json {
                print_json(&validation)?;
            } else if validation.exists {
                println!(
                    "{} is listed: {}",
                    validation.ticker,
                    validation.company_name.as_deref().unwrap_or("-")
                );
            } else {
                println!("{} was not found", validation.ticker);
            }
        }
        Commands::Rates { codes } => {
            let codes = (!codes.is_empty()).then_some(codes);
            let rates = ctx.fx_service.rates_info(codes.as_deref()).await?;
            if json {
                print_json(&rates)?;
            } else {
                print!("{}", output::render_rates(&rates, &ctx.config.home_currency));
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;
    init_tracing();

    let ctx = build_context(config)?;
    run(&ctx, cli.command, cli.json).await
}
