use std::time::Duration;

use crate::{
    client::{ApiClient, ClientError},
    query::TransactionQuery,
    responses::{SyncStatus, TransactionPage},
};

/// Something that serves pages of transactions
#[allow(async_fn_in_trait)]
pub trait TransactionSource {
    async fn fetch_page(&self, query: &TransactionQuery) -> Result<TransactionPage, ClientError>;

    /// Pulls the latest transactions from the bank
    async fn sync(&self) -> Result<SyncStatus, ClientError>;
}

impl TransactionSource for ApiClient {
    async fn fetch_page(&self, query: &TransactionQuery) -> Result<TransactionPage, ClientError> {
        self.get_transactions(query).await
    }

    async fn sync(&self) -> Result<SyncStatus, ClientError> {
        self.sync_transactions().await
    }
}

/// How often and how long to wait for the first transactions to show up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 5,
        }
    }
}

/// Fetches the page until it has transactions, or the attempts are used up
///
/// Right after a bank account is connected the backend may not have
/// imported anything yet. The last, possibly empty, page is returned once
/// `max_attempts` fetches were made. Errors are returned immediately.
pub async fn poll_until_populated<S>(
    source: &S,
    query: &TransactionQuery,
    config: PollConfig,
) -> Result<TransactionPage, ClientError>
    where S: TransactionSource
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let page = source.fetch_page(query).await?;
        if !page.is_empty() || attempt >= max_attempts {
            return Ok(page);
        }

        tracing::debug!(attempt, max_attempts, "No transactions yet, retrying in {:?}", config.interval);
        tokio::time::sleep(config.interval).await;
        attempt += 1;
    }
}

/// Syncs with the bank, then fetches the page
pub async fn sync_and_fetch<S>(
    source: &S,
    query: &TransactionQuery,
) -> Result<TransactionPage, ClientError>
    where S: TransactionSource
{
    let status = source.sync().await?;
    if let Some(message) = &status.message {
        tracing::info!("Sync finished: {message}");
    }

    source.fetch_page(query).await
}
