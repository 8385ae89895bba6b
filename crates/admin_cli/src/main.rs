use std::{collections::HashMap, error::Error, io::Write};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{CalculateMethod, CategoryKind, Engine, Money, TransactionListFilter};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use uuid::Uuid;

const EXPORT_PAGE: u64 = 500;

#[derive(Parser, Debug)]
#[command(name = "bursary_admin")]
#[command(about = "Admin utilities for Bursary (registries, balance audit, export)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./bursary.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Category(Category),
    Bank(Bank),
    Balances(Balances),
    Transactions(Transactions),
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create(CategoryCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct CategoryCreateArgs {
    #[arg(long)]
    name: String,
    /// `income` or `expense`.
    #[arg(long, value_parser = parse_kind)]
    kind: CategoryKind,
    /// `add` or `subtract`.
    #[arg(long, value_parser = parse_method)]
    method: CalculateMethod,
}

#[derive(Args, Debug)]
struct Bank {
    #[command(subcommand)]
    command: BankCommand,
}

#[derive(Subcommand, Debug)]
enum BankCommand {
    Create(BankCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct BankCreateArgs {
    #[arg(long)]
    name: String,
    /// Opening balance, e.g. `1250.00`.
    #[arg(long, default_value = "0", value_parser = parse_money)]
    initial_balance: Money,
}

#[derive(Args, Debug)]
struct Balances {
    #[command(subcommand)]
    command: BalancesCommand,
}

#[derive(Subcommand, Debug)]
enum BalancesCommand {
    /// Report banks whose stored balance disagrees with their transactions.
    Verify,
    /// Rewrite drifted balances from the transaction history.
    Recompute,
}

#[derive(Args, Debug)]
struct Transactions {
    #[command(subcommand)]
    command: TransactionsCommand,
}

#[derive(Subcommand, Debug)]
enum TransactionsCommand {
    /// Write transactions as CSV, newest first.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long)]
    bank: Option<Uuid>,
    /// Inclusive start date (`YYYY-MM-DD`).
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Exclusive end date (`YYYY-MM-DD`).
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Output file; stdout when omitted.
    #[arg(long)]
    output: Option<std::path::PathBuf>,
}

#[derive(Serialize)]
struct ExportRow<'a> {
    id: Uuid,
    date: NaiveDate,
    bank: &'a str,
    category: &'a str,
    calculate_method: &'static str,
    amount: String,
    note: &'a str,
    created_by: &'a str,
}

fn parse_kind(raw: &str) -> Result<CategoryKind, String> {
    CategoryKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_method(raw: &str) -> Result<CalculateMethod, String> {
    CalculateMethod::try_from(raw).map_err(|err| err.to_string())
}

fn parse_money(raw: &str) -> Result<Money, String> {
    raw.parse::<Money>().map_err(|err| err.to_string())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn export(
    engine: &Engine,
    args: ExportArgs,
) -> Result<usize, Box<dyn Error + Send + Sync>> {
    let banks: HashMap<Uuid, String> = engine
        .banks()
        .await?
        .into_iter()
        .map(|bank| (bank.id, bank.name))
        .collect();
    let categories: HashMap<Uuid, engine::Category> = engine
        .categories()
        .await?
        .into_iter()
        .map(|category| (category.id, category))
        .collect();

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = csv::Writer::from_writer(out);

    let filter = TransactionListFilter {
        bank_id: args.bank,
        from: args.from,
        to: args.to,
        ..Default::default()
    };
    let mut cursor: Option<String> = None;
    let mut written = 0;
    loop {
        let (page, next) = engine
            .list_transactions_page(&filter, EXPORT_PAGE, cursor.as_deref())
            .await?;
        for tx in &page {
            let category = categories.get(&tx.category_id);
            writer.serialize(ExportRow {
                id: tx.id,
                date: tx.date,
                bank: banks.get(&tx.bank_id).map(String::as_str).unwrap_or(""),
                category: category.map(|c| c.name.as_str()).unwrap_or(""),
                calculate_method: category
                    .map(|c| c.calculate_method.as_str())
                    .unwrap_or(""),
                amount: tx.amount.to_string(),
                note: tx.note.as_deref().unwrap_or(""),
                created_by: &tx.created_by,
            })?;
            written += 1;
        }
        match next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    writer.flush()?;
    Ok(written)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Category(Category {
            command: CategoryCommand::Create(args),
        }) => {
            let category = engine
                .create_category(&args.name, args.kind, args.method)
                .await?;
            println!("created category: {} ({})", category.name, category.id);
        }
        Command::Category(Category {
            command: CategoryCommand::List,
        }) => {
            for category in engine.categories().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    category.id,
                    category.name,
                    category.kind.as_str(),
                    category.calculate_method.as_str()
                );
            }
        }
        Command::Bank(Bank {
            command: BankCommand::Create(args),
        }) => {
            let bank = engine.create_bank(&args.name, args.initial_balance).await?;
            println!("created bank: {} ({}) {}", bank.name, bank.id, bank.balance);
        }
        Command::Bank(Bank {
            command: BankCommand::List,
        }) => {
            for bank in engine.banks().await? {
                println!("{}\t{}\t{}", bank.id, bank.name, bank.balance);
            }
        }
        Command::Balances(Balances {
            command: BalancesCommand::Verify,
        }) => {
            let drifts = engine.verify_balances().await?;
            if drifts.is_empty() {
                println!("all balances match");
                return Ok(());
            }
            for drift in &drifts {
                println!(
                    "{}\t{}\tstored {}\texpected {}",
                    drift.bank_id, drift.name, drift.stored, drift.expected
                );
            }
            std::process::exit(1);
        }
        Command::Balances(Balances {
            command: BalancesCommand::Recompute,
        }) => {
            let fixed = engine.recompute_balances().await?;
            for drift in &fixed {
                println!("{}: {} -> {}", drift.name, drift.stored, drift.expected);
            }
            println!("corrected {} bank(s)", fixed.len());
        }
        Command::Transactions(Transactions {
            command: TransactionsCommand::Export(args),
        }) => {
            let written = export(&engine, args).await?;
            eprintln!("exported {written} transaction(s)");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_registry_flags() {
        assert_eq!(parse_kind("income").unwrap(), CategoryKind::Income);
        assert_eq!(parse_method("subtract").unwrap(), CalculateMethod::Debit);
        assert!(parse_method("divide").is_err());
        assert_eq!(parse_money("12.50").unwrap(), Money::new(1250));
    }

    #[test]
    fn cli_shape_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
