use std::io::Read;
use std::path::Path;

use crate::transaction::{Transaction, TransactionRecord};

/// Possible errors to occur while reading a transaction export
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Cannot tell the format of {0:?}, expected a .csv or .json file")]
    UnknownFormat(std::path::PathBuf),
}

/// The formats transaction exports can be read from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Picks the format by file extension
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            _ => Err(InputError::UnknownFormat(path.to_owned())),
        }
    }
}

/// Reads transactions from a CSV file with a header row
///
/// Every field is read as text: ids stay opaque, amounts are parsed from
/// their decimal text and an empty recurring flag is `false`.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Transaction>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let transactions = reader
        .deserialize::<TransactionRecord>()
        .map(|record| record.map(Transaction::from))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transactions)
}

/// Reads transactions from JSON
///
/// Both a plain array of transactions and a saved transaction page (an
/// object with a `transactions` field) are accepted.
pub fn read_json<R: Read>(reader: R) -> Result<Vec<Transaction>, InputError> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Export {
        List(Vec<Transaction>),
        Page { transactions: Vec<Transaction> },
    }

    let transactions = match serde_json::from_reader(reader)? {
        Export::List(transactions) => transactions,
        Export::Page { transactions } => transactions,
    };

    Ok(transactions)
}

/// Reads a transaction export, picking the format from the file extension
pub fn read_path(path: &Path) -> Result<Vec<Transaction>, InputError> {
    let format = InputFormat::from_path(path)?;
    let file = std::io::BufReader::new(std::fs::File::open(path)?);

    let transactions = match format {
        InputFormat::Csv => read_csv(file)?,
        InputFormat::Json => read_json(file)?,
    };
    tracing::debug!(path = %path.display(), count = transactions.len(), "Read transactions");

    Ok(transactions)
}
