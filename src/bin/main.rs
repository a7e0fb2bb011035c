use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{ArgEnum, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use polarity_ledger::{
    poll_until_populated, read_path, reconcile_filtered, sync_and_fetch, Amount, ApiClient,
    CategoryFilter, InvalidAmountPolicy, LoginCredentials, Money, PollConfig, ReconcileOptions,
    Reconciliation, SortField, SortOrder, Transaction, TransactionFilter, TransactionQuery,
    TransactionSource, TransactionType, TransactionUpdate,
};

/// A cli interface to the Polarity transaction ledger
#[derive(Debug, Parser)]
#[clap(version)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile a local CSV or JSON transaction export
    Reconcile {
        /// The path to the transaction file
        filename: PathBuf,
        #[clap(flatten)]
        filter: FilterArgs,
        #[clap(flatten)]
        settings: ReconcileArgs,
    },
    /// Fetch a page of transactions from the backend and reconcile it
    Fetch {
        #[clap(flatten)]
        remote: RemoteArgs,
        #[clap(flatten)]
        page: PageArgs,
        #[clap(flatten)]
        filter: FilterArgs,
        #[clap(flatten)]
        settings: ReconcileArgs,
        /// Sync with the bank before fetching
        #[clap(long)]
        sync: bool,
        /// Keep polling until the backend has transactions
        #[clap(long, conflicts_with = "sync")]
        wait: bool,
    },
    /// Change the category or the notes of a transaction
    Update {
        #[clap(flatten)]
        remote: RemoteArgs,
        /// The id of the transaction
        id: String,
        #[clap(long)]
        category: Option<String>,
        #[clap(long)]
        notes: Option<String>,
    },
    /// Pull the latest transactions from the bank
    Sync {
        #[clap(flatten)]
        remote: RemoteArgs,
    },
    /// List the categories in use
    Categories {
        #[clap(flatten)]
        remote: RemoteArgs,
    },
}

#[derive(Debug, clap::Args)]
struct RemoteArgs {
    /// The base url of the backend
    #[clap(long, env = "POLARITY_API_URL")]
    api_url: String,
    /// An access token, instead of logging in
    #[clap(long, env = "POLARITY_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// The email address or username to log in with
    #[clap(long, env = "POLARITY_EMAIL")]
    email: Option<String>,
    #[clap(long, env = "POLARITY_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Debug, clap::Args)]
struct FilterArgs {
    /// Only keep transactions whose name or category contains this text
    #[clap(long)]
    search: Option<String>,
    /// Only keep transactions of this category
    #[clap(long)]
    category: Option<String>,
}

#[derive(Debug, clap::Args)]
struct ReconcileArgs {
    /// The current account balance
    #[clap(long, allow_hyphen_values = true)]
    balance: Option<Money>,
    /// The day to reconcile for, defaults to today
    #[clap(long)]
    as_of: Option<NaiveDate>,
    /// Fail on amounts that are not numbers instead of counting them as zero
    #[clap(long)]
    strict: bool,
    #[clap(long, arg_enum, default_value = "csv")]
    format: OutputFormat,
}

#[derive(Debug, clap::Args)]
struct PageArgs {
    #[clap(long)]
    page: Option<u32>,
    #[clap(long)]
    per_page: Option<u32>,
    #[clap(long, arg_enum)]
    sort_by: Option<SortArg>,
    /// Sort ascending instead of newest first
    #[clap(long)]
    ascending: bool,
    #[clap(long = "type", arg_enum)]
    kind: Option<KindArg>,
    #[clap(long)]
    start_date: Option<NaiveDate>,
    #[clap(long)]
    end_date: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, ArgEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Clone, Copy, Debug, ArgEnum)]
enum SortArg {
    Date,
    Amount,
    Name,
    Type,
    Category,
}

#[derive(Clone, Copy, Debug, ArgEnum)]
enum KindArg {
    Income,
    Expense,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let args = Args::parse();

    match args.command {
        Command::Reconcile { filename, filter, settings } => {
            let transactions = read_path(&filename)
                .with_context(|| format!("Could not read {}", filename.display()))?;
            let balance = settings.balance.unwrap_or(Money::ZERO);

            reconcile_and_print(transactions, &filter.into_filter(), balance, &settings)?;
        }
        Command::Fetch { remote, page, filter, settings, sync, wait } => {
            let client = connect(&remote).await?;
            let query = page.into_query(&filter);

            let page = match (sync, wait) {
                (true, _) => sync_and_fetch(&client, &query).await?,
                (false, true) => poll_until_populated(&client, &query, PollConfig::default()).await?,
                (false, false) => client.fetch_page(&query).await?,
            };
            tracing::info!(
                page = page.pagination.page,
                pages = page.pagination.pages,
                total = page.pagination.total,
                "Fetched transactions"
            );

            let balance = match settings.balance {
                Some(balance) => balance,
                None => current_balance(&client).await?,
            };

            // the backend already applied search and category
            reconcile_and_print(page.transactions, &TransactionFilter::default(), balance, &settings)?;
        }
        Command::Update { remote, id, category, notes } => {
            let update = TransactionUpdate { user_category: category, notes };
            if update.is_empty() {
                bail!("Nothing to update, pass --category and/or --notes");
            }

            let client = connect(&remote).await?;
            let updated = client.update_transaction(&id.as_str().into(), &update).await?;
            println!("{}", updated.message.as_deref().unwrap_or("Transaction updated"));
        }
        Command::Sync { remote } => {
            let client = connect(&remote).await?;
            let status = client.sync_transactions().await?;
            println!("{}", status.message.as_deref().unwrap_or("Sync complete"));
        }
        Command::Categories { remote } => {
            let client = connect(&remote).await?;
            for category in client.get_categories().await?.categories {
                println!("{category}");
            }
        }
    }

    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("polarity=info,polarity_ledger=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn connect(remote: &RemoteArgs) -> anyhow::Result<ApiClient> {
    let client = ApiClient::new(remote.api_url.as_str())?;

    match (&remote.token, &remote.email, &remote.password) {
        (Some(token), _, _) => Ok(client.with_token(token.as_str())),
        (None, Some(email), Some(password)) => {
            client
                .login(&LoginCredentials::new(email, password.as_str()))
                .await
                .context("Log in failed")?;
            Ok(client)
        }
        _ => bail!("Either --token, or --email and --password are required"),
    }
}

/// The balance from the user's profile, zero if there is none yet
async fn current_balance(client: &ApiClient) -> anyhow::Result<Money> {
    let profile = client.profile().await.context("Could not load the profile")?;

    match profile.budget_profile.total_balance {
        Some(Amount::Valid(balance)) => Ok(balance),
        Some(Amount::Invalid(raw)) => {
            tracing::warn!("The profile balance {raw:?} is not a number, using 0");
            Ok(Money::ZERO)
        }
        None => Ok(Money::ZERO),
    }
}

fn reconcile_and_print(
    transactions: Vec<Transaction>,
    filter: &TransactionFilter,
    balance: Money,
    args: &ReconcileArgs,
) -> anyhow::Result<()> {
    let mut options = match args.as_of {
        Some(as_of) => ReconcileOptions::as_of(as_of),
        None => ReconcileOptions::today(),
    };
    if args.strict {
        options = options.with_invalid_amounts(InvalidAmountPolicy::Reject);
    }

    let reconciliation = reconcile_filtered(transactions, filter, balance, &options)?;

    match args.format {
        OutputFormat::Csv => write_csv(&reconciliation)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout(), &reconciliation)?;
            println!();
        }
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    date: Option<NaiveDate>,
    name: Option<&'a str>,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    category: Option<&'a str>,
    amount: &'a Amount,
    balance: Money,
    is_recurring: bool,
    notes: Option<&'a str>,
}

fn write_csv(reconciliation: &Reconciliation) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(std::io::stdout());

    for reconciled in &reconciliation.transactions {
        let transaction = reconciled.transaction();
        writer.serialize(CsvRow {
            id: transaction.id().as_str(),
            date: transaction.effective_date(),
            name: transaction.name(),
            transaction_type: transaction.transaction_type(),
            category: transaction.display_category(),
            amount: transaction.amount(),
            balance: reconciled.balance(),
            is_recurring: transaction.is_recurring(),
            notes: transaction.notes(),
        })?;
    }
    writer.flush()?;

    eprintln!("spent this month: {}", reconciliation.monthly_spent);
    eprintln!("opening balance: {}", reconciliation.opening_balance);

    Ok(())
}

impl FilterArgs {
    fn into_filter(self) -> TransactionFilter {
        let category = self
            .category
            .as_deref()
            .map_or(CategoryFilter::All, CategoryFilter::from);

        TransactionFilter::new(self.search, category)
    }
}

impl PageArgs {
    fn into_query(self, filter: &FilterArgs) -> TransactionQuery {
        let mut query = TransactionQuery::new();

        if let Some(page) = self.page {
            query = query.page(page);
        }
        if let Some(per_page) = self.per_page {
            query = query.per_page(per_page);
        }
        if let Some(sort_by) = self.sort_by {
            let order = match self.ascending {
                true => SortOrder::Asc,
                false => SortOrder::Desc,
            };
            query = query.sort(sort_by.into(), order);
        }
        if let Some(kind) = self.kind {
            query = query.kind(match kind {
                KindArg::Income => TransactionType::Income,
                KindArg::Expense => TransactionType::Expense,
            });
        }
        if let Some(category) = &filter.category {
            query = query.category(category.as_str());
        }
        if let Some(search) = &filter.search {
            query = query.search(search.as_str());
        }

        query.between(self.start_date, self.end_date)
    }
}

impl From<SortArg> for SortField {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Date => SortField::Date,
            SortArg::Amount => SortField::Amount,
            SortArg::Name => SortField::Name,
            SortArg::Type => SortField::Type,
            SortArg::Category => SortField::Category,
        }
    }
}
