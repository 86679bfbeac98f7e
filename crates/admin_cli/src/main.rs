use std::error::Error;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{
    AllocationInput, Amount, CreateBudgetCmd, CreateTransactionCmd, Engine, TransactionKind,
    TransactionListFilter,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "bilancio_admin")]
#[command(about = "Admin utilities for Bilancio (inspect and seed a ledger)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./bilancio.db?mode=rwc"
    )]
    database_url: String,

    /// User the commands act for (also read from `BILANCIO_USER`).
    #[arg(long, env = "BILANCIO_USER")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Wallet(Wallet),
    Category(Category),
    Budget(Budget),
    Tx(Tx),
    /// Rebuild wallet balances and budget spending from the stored ledger.
    Recompute,
}

#[derive(Args, Debug)]
struct Wallet {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    Create(WalletCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct WalletCreateArgs {
    #[arg(long)]
    title: String,
    /// Opening balance, e.g. "120.50".
    #[arg(long, default_value = "0")]
    balance: String,
    #[arg(long)]
    description: Option<String>,
    /// Mark this wallet as the default one.
    #[arg(long)]
    default: bool,
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
    title: String,
    #[arg(long)]
    icon: Option<String>,
}

#[derive(Args, Debug)]
struct Budget {
    #[command(subcommand)]
    command: BudgetCommand,
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    Create(BudgetCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct BudgetCreateArgs {
    #[arg(long)]
    name: String,
    /// Budget total, e.g. "500".
    #[arg(long)]
    total: String,
    /// First day of the window (YYYY-MM-DD).
    #[arg(long)]
    start: String,
    /// Last day of the window (YYYY-MM-DD).
    #[arg(long)]
    end: String,
    /// Allocation as CATEGORY_ID=AMOUNT; repeat for more categories.
    #[arg(long = "alloc")]
    allocations: Vec<String>,
}

#[derive(Args, Debug)]
struct Tx {
    #[command(subcommand)]
    command: TxCommand,
}

#[derive(Subcommand, Debug)]
enum TxCommand {
    Record(TxRecordArgs),
    List(TxListArgs),
    Delete(TxDeleteArgs),
}

#[derive(Args, Debug)]
struct TxRecordArgs {
    #[arg(long)]
    wallet: Uuid,
    #[arg(long)]
    category: Uuid,
    /// "expense" or "income".
    #[arg(long)]
    kind: String,
    /// Amount, e.g. "12.30".
    #[arg(long)]
    amount: String,
    #[arg(long)]
    note: Option<String>,
    /// Day the transaction occurred (YYYY-MM-DD); defaults to now.
    #[arg(long)]
    date: Option<String>,
}

#[derive(Args, Debug)]
struct TxListArgs {
    #[arg(long, default_value_t = 20)]
    limit: u64,
}

#[derive(Args, Debug)]
struct TxDeleteArgs {
    #[arg(long)]
    id: Uuid,
}

fn parse_minor(raw: &str) -> Result<i64, Box<dyn Error + Send + Sync>> {
    Ok(raw.parse::<Amount>()?.minor())
}

fn parse_day(raw: &str) -> Result<DateTime<Utc>, Box<dyn Error + Send + Sync>> {
    let day: NaiveDate = raw.parse()?;
    Ok(day.and_time(NaiveTime::MIN).and_utc())
}

fn parse_allocation(raw: &str) -> Result<AllocationInput, Box<dyn Error + Send + Sync>> {
    let Some((category, amount)) = raw.split_once('=') else {
        return Err(format!("invalid allocation '{raw}': expected CATEGORY_ID=AMOUNT").into());
    };
    let category_id = Uuid::parse_str(category.trim())?;
    let limit_minor = parse_minor(amount)?;
    Ok(AllocationInput::new(category_id, limit_minor))
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "bilancio_admin=info,engine=info".to_string()),
        )
        .init();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    if let Err(err) = run(&engine, &cli.user, cli.command).await {
        tracing::error!("command failed for user {}: {err}", cli.user);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(
    engine: &Engine,
    user: &str,
    command: Command,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        Command::Wallet(Wallet {
            command: WalletCommand::Create(args),
        }) => {
            let balance = parse_minor(&args.balance)?;
            let wallet = engine
                .create_wallet(
                    user,
                    &args.title,
                    balance,
                    args.description.as_deref(),
                    args.default,
                )
                .await?;
            println!("created wallet: {} ({})", wallet.title, wallet.id);
        }
        Command::Wallet(Wallet {
            command: WalletCommand::List,
        }) => {
            for wallet in engine.wallets(user).await? {
                let mark = if wallet.is_default { " *" } else { "" };
                println!(
                    "{}  {}  {}{mark}",
                    wallet.id,
                    Amount::new(wallet.balance),
                    wallet.title
                );
            }
        }
        Command::Category(Category {
            command: CategoryCommand::Create(args),
        }) => {
            let category = engine
                .create_category(user, &args.title, args.icon.as_deref())
                .await?;
            println!("created category: {} ({})", category.title, category.id);
        }
        Command::Category(Category {
            command: CategoryCommand::List,
        }) => {
            for category in engine.categories(user).await? {
                let icon = category.icon.unwrap_or_default();
                println!("{}  {}  {icon}", category.id, category.title);
            }
        }
        Command::Budget(Budget {
            command: BudgetCommand::Create(args),
        }) => {
            let mut allocations = Vec::with_capacity(args.allocations.len());
            for raw in &args.allocations {
                allocations.push(parse_allocation(raw)?);
            }
            let cmd = CreateBudgetCmd::new(
                user,
                &args.name,
                parse_minor(&args.total)?,
                parse_day(&args.start)?,
                parse_day(&args.end)?,
            )
            .allocations(allocations);
            let budget = engine.create_budget(cmd).await?;
            println!("created budget: {} ({})", budget.name, budget.id);
        }
        Command::Budget(Budget {
            command: BudgetCommand::List,
        }) => {
            for budget in engine.list_budgets(user).await? {
                let state = if budget.is_active { "active" } else { "inactive" };
                println!(
                    "{}  {}  {} .. {}  total {}  spent {}  ({state})",
                    budget.id,
                    budget.name,
                    budget.start_date.date_naive(),
                    budget.end_date.date_naive(),
                    Amount::new(budget.total_minor),
                    Amount::new(budget.total_spent_minor()),
                );
                for allocation in &budget.allocations {
                    println!(
                        "    {}  limit {}  spent {}",
                        allocation.category_id,
                        Amount::new(allocation.limit_minor),
                        Amount::new(allocation.spent_minor),
                    );
                }
            }
        }
        Command::Tx(Tx {
            command: TxCommand::Record(args),
        }) => {
            let kind = TransactionKind::try_from(args.kind.as_str())?;
            let mut cmd = CreateTransactionCmd::new(
                user,
                args.wallet,
                args.category,
                kind,
                parse_minor(&args.amount)?,
            );
            if let Some(note) = &args.note {
                cmd = cmd.note(note);
            }
            if let Some(date) = &args.date {
                cmd = cmd.occurred_at(parse_day(date)?);
            }
            let tx = engine.create_transaction(cmd).await?;
            println!(
                "recorded {} {}: {}",
                tx.kind.as_str(),
                Amount::new(tx.amount_minor),
                tx.id
            );
        }
        Command::Tx(Tx {
            command: TxCommand::List(args),
        }) => {
            let filter = TransactionListFilter::default();
            for tx in engine.list_transactions(user, args.limit, &filter).await? {
                let note = tx.note.unwrap_or_default();
                println!(
                    "{}  {}  {:7}  {}  {note}",
                    tx.id,
                    tx.occurred_at.date_naive(),
                    tx.kind.as_str(),
                    Amount::new(tx.amount_minor),
                );
            }
        }
        Command::Tx(Tx {
            command: TxCommand::Delete(args),
        }) => {
            engine.delete_transaction(user, args.id).await?;
            println!("deleted transaction: {}", args.id);
        }
        Command::Recompute => {
            engine.recompute_derived(user).await?;
            println!("recomputed derived state for user {user}");
        }
    }

    Ok(())
}
