pub use self::{
    amount::{Amount, Money},
    client::{ApiClient, ClientError},
    filter::{CategoryFilter, TransactionFilter},
    input::{read_csv, read_json, read_path, InputError, InputFormat},
    query::{SortField, SortOrder, TransactionQuery, MAX_PER_PAGE},
    reconcile::{
        reconcile, reconcile_filtered, reconcile_today, DataQualityWarning, InvalidAmountPolicy,
        ReconcileError, ReconcileOptions, ReconciledTransaction, Reconciliation,
    },
    requests::LoginCredentials,
    source::{poll_until_populated, sync_and_fetch, PollConfig, TransactionSource},
    transaction::{Transaction, TransactionId, TransactionType, TransactionUpdate},
};

pub mod responses;

mod amount;
mod client;
mod date;
mod filter;
mod input;
mod query;
mod reconcile;
mod requests;
mod source;
mod transaction;

pub use self::date::parse_date;
