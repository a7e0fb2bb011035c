use std::cmp::Reverse;
use std::fmt;

use chrono::{Local, NaiveDate};

use crate::{
    amount::{Amount, Money},
    date::same_month,
    filter::TransactionFilter,
    transaction::{Transaction, TransactionId},
};

/// Possible errors to occur while reconciling a list of transactions
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Transaction {id} has an invalid amount: {raw:?}")]
    InvalidAmount { id: TransactionId, raw: String },
    #[error("The running balance overflowed at transaction {id}")]
    BalanceOverflow { id: TransactionId },
}

/// What to do with transactions whose amount could not be parsed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InvalidAmountPolicy {
    /// Count the amount as zero, and report a [`DataQualityWarning`]
    #[default]
    Zero,
    /// Fail the whole reconciliation
    Reject,
}

/// The parameters of a reconciliation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// The day the reconciliation is done for
    ///
    /// Monthly spending is summed over the calendar month of this date.
    pub as_of: NaiveDate,
    pub invalid_amounts: InvalidAmountPolicy,
}

impl ReconcileOptions {
    pub fn as_of(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            invalid_amounts: InvalidAmountPolicy::default(),
        }
    }

    /// Options for the current local date
    pub fn today() -> Self {
        Self::as_of(Local::now().date_naive())
    }

    pub fn with_invalid_amounts(mut self, policy: InvalidAmountPolicy) -> Self {
        self.invalid_amounts = policy;
        self
    }
}

/// A problem with the input data that did not stop the reconciliation
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// The amount did not parse and was counted as zero
    InvalidAmount { id: TransactionId, raw: String },
    /// The effective date did not parse, the transaction was sorted last
    InvalidDate { id: TransactionId, raw: String },
    /// The transaction has no date at all, it was sorted last
    MissingDate { id: TransactionId },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAmount { id, raw } => {
                write!(f, "transaction {id}: invalid amount {raw:?}, counted as 0")
            }
            Self::InvalidDate { id, raw } => {
                write!(f, "transaction {id}: invalid date {raw:?}")
            }
            Self::MissingDate { id } => write!(f, "transaction {id}: no date"),
        }
    }
}

/// A transaction together with the account balance right after it
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ReconciledTransaction {
    #[serde(flatten)]
    transaction: Transaction,
    balance: Money,
}

impl ReconciledTransaction {
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// The balance immediately after this transaction took effect
    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn into_transaction(self) -> Transaction {
        self.transaction
    }
}

/// The result of [`reconcile`]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Reconciliation {
    /// Newest first
    pub transactions: Vec<ReconciledTransaction>,
    /// The sum of all expenses in the month of [`ReconcileOptions::as_of`]
    pub monthly_spent: Money,
    /// The balance before the oldest transaction
    pub opening_balance: Money,
    pub warnings: Vec<DataQualityWarning>,
}

/// Annotates transactions with the running balance of the account
///
/// `current_balance` is the balance after all `transactions` took effect.
/// Starting from it, the transactions are walked from newest to oldest and
/// each one is undone to find the balance before it. Transactions with the
/// same date keep their input order; transactions without a usable date are
/// placed after all dated ones.
///
/// This is a pure function of its arguments.
pub fn reconcile<I>(
    transactions: I,
    current_balance: Money,
    options: &ReconcileOptions,
) -> Result<Reconciliation, ReconcileError>
    where I: IntoIterator<Item = Transaction>
{
    let mut dated = transactions
        .into_iter()
        .map(|transaction| (transaction.effective_date(), transaction))
        .collect::<Vec<_>>();
    // stable, newest first, `None` sorts after every date
    dated.sort_by_key(|(date, _)| Reverse(*date));

    let mut running_balance = current_balance;
    let mut monthly_spent = Money::ZERO;
    let mut warnings = Vec::new();
    let mut reconciled = Vec::with_capacity(dated.len());

    for (date, transaction) in dated {
        if date.is_none() {
            warnings.push(match transaction.effective_date_text() {
                Some(raw) => DataQualityWarning::InvalidDate {
                    id: transaction.id().clone(),
                    raw: raw.to_owned(),
                },
                None => DataQualityWarning::MissingDate { id: transaction.id().clone() },
            });
        }

        let amount = match transaction.amount() {
            Amount::Valid(amount) => *amount,
            Amount::Invalid(raw) => match options.invalid_amounts {
                InvalidAmountPolicy::Zero => {
                    warnings.push(DataQualityWarning::InvalidAmount {
                        id: transaction.id().clone(),
                        raw: raw.clone(),
                    });
                    Money::ZERO
                }
                InvalidAmountPolicy::Reject => {
                    return Err(ReconcileError::InvalidAmount {
                        id: transaction.id().clone(),
                        raw: raw.clone(),
                    });
                }
            },
        };

        let balance = running_balance;
        let is_expense = transaction.transaction_type().is_expense();

        if is_expense && date.map_or(false, |date| same_month(date, options.as_of)) {
            monthly_spent = monthly_spent
                .checked_add(amount)
                .ok_or_else(|| overflow(&transaction))?;
        }

        // going backwards in time: expenses are added back, everything else
        // is taken out again
        running_balance = match is_expense {
            true => running_balance.checked_add(amount),
            false => running_balance.checked_sub(amount),
        }
        .ok_or_else(|| overflow(&transaction))?;

        reconciled.push(ReconciledTransaction { transaction, balance });
    }

    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    tracing::debug!(
        transactions = reconciled.len(),
        %monthly_spent,
        warnings = warnings.len(),
        "Reconciled transactions"
    );

    Ok(Reconciliation {
        transactions: reconciled,
        monthly_spent,
        opening_balance: running_balance,
        warnings,
    })
}

/// [`reconcile`] for the current local date, counting invalid amounts as zero
pub fn reconcile_today<I>(
    transactions: I,
    current_balance: Money,
) -> Result<Reconciliation, ReconcileError>
    where I: IntoIterator<Item = Transaction>
{
    reconcile(transactions, current_balance, &ReconcileOptions::today())
}

/// [`reconcile`] for the rows a filter keeps
///
/// The running balances are walked over the matching rows only, starting
/// from the full `current_balance`. The monthly spend always covers every
/// transaction, so it does not change with the filter.
pub fn reconcile_filtered(
    transactions: Vec<Transaction>,
    filter: &TransactionFilter,
    current_balance: Money,
    options: &ReconcileOptions,
) -> Result<Reconciliation, ReconcileError> {
    if filter.is_empty() {
        return reconcile(transactions, current_balance, options);
    }

    let shown = filter.apply(transactions.iter().cloned());
    let monthly_spent = reconcile(transactions, current_balance, options)?.monthly_spent;

    Ok(Reconciliation {
        monthly_spent,
        ..reconcile(shown, current_balance, options)?
    })
}

fn overflow(transaction: &Transaction) -> ReconcileError {
    ReconcileError::BalanceOverflow { id: transaction.id().clone() }
}
