use std::sync::RwLock;

use reqwest::{RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    query::TransactionQuery,
    requests::LoginCredentials,
    responses::{
        CategoryList, ErrorBody, LoginResponse, MonthlyIncome, ProfileData, RefreshResponse,
        SyncStatus, TransactionPage, TransactionSummary, UpdatedTransaction,
    },
    transaction::{TransactionId, TransactionUpdate},
};

const LOGIN_PATH: &str = "auth/login";
const REFRESH_PATH: &str = "auth/refresh";

/// An API client for the Polarity backend
///
/// Requests are authorised with the bearer token the client holds. When the
/// backend rejects a token, the client refreshes it once using the refresh
/// cookie it got on log in and repeats the request.
pub struct ApiClient {
    pub address: String,
    pub inner_client: reqwest::Client,
    token: RwLock<Option<String>>,
}

/// Helper methods for http actions
impl ApiClient {
    pub fn new(address: impl Into<String>) -> Result<Self, ClientError> {
        let inner_client = reqwest::Client::builder()
            .cookie_store(true)
            .build()?;

        Ok(Self {
            address: address.into().trim_end_matches('/').to_owned(),
            inner_client,
            token: RwLock::new(None),
        })
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    /// The current access token
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_token(&self, token: Option<String>) {
        *self.token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    fn format_url(&self, path: &str) -> String {
        format!("{}/{}", self.address, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request built by `build`, refreshing the token once on `401`
    async fn send<F>(&self, path: &str, build: F) -> Result<reqwest::Response, ClientError>
        where F: Fn(&reqwest::Client, String) -> RequestBuilder
    {
        tracing::debug!(path, "Sending request");
        let response = self
            .authorize(build(&self.inner_client, self.format_url(path)))
            .send()
            .await?;
        tracing::debug!(path, status = %response.status(), "Received response");

        if response.status() != StatusCode::UNAUTHORIZED || !refreshes_on_unauthorized(path) {
            return Ok(response);
        }

        tracing::info!("Access token was rejected, attempting token refresh");
        self.refresh_token().await?;

        let response = self
            .authorize(build(&self.inner_client, self.format_url(path)))
            .send()
            .await?;
        tracing::debug!(path, status = %response.status(), "Received response after refresh");

        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(path, |client, url| client.get(url)).await?;
        ok_body(response).await
    }

    async fn empty_post<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(path, |client, url| client.post(url)).await?;
        ok_body(response).await
    }

    async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let response = self.send(path, |client, url| client.put(url).json(body)).await?;
        ok_body(response).await
    }
}

/// Methods on the backend API
impl ApiClient {
    /// Logs in and keeps the access token for later requests
    pub async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<LoginResponse, ClientError> {
        let response = self.inner_client
            .post(self.format_url(LOGIN_PATH))
            .json(credentials)
            .send()
            .await?;
        let login: LoginResponse = ok_body(response).await?;

        let token = login.access_token.clone().ok_or(ClientError::MissingToken)?;
        self.set_token(Some(token));
        tracing::info!("Logged in");

        Ok(login)
    }

    /// Exchanges the refresh cookie for a new access token
    ///
    /// A failed refresh also drops the current token.
    pub async fn refresh_token(&self) -> Result<(), ClientError> {
        let refreshed = async {
            let response = self.inner_client
                .post(self.format_url(REFRESH_PATH))
                .send()
                .await?;
            let refreshed: RefreshResponse = ok_body(response).await?;
            refreshed.access_token.ok_or(ClientError::MissingToken)
        };

        match refreshed.await {
            Ok(token) => {
                self.set_token(Some(token));
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Token refresh failed: {err}");
                self.set_token(None);
                Err(err)
            }
        }
    }

    /// The user's profile, including the current account balance
    pub async fn profile(&self) -> Result<ProfileData, ClientError> {
        self.get("profile/data").await
    }

    /// Get one page of the user's transactions
    pub async fn get_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, ClientError> {
        let response = self
            .send("transactions", |client, url| client.get(url).query(query))
            .await?;
        ok_body(response).await
    }

    /// Get all categories used by the user's transactions
    pub async fn get_categories(&self) -> Result<CategoryList, ClientError> {
        self.get("transactions/categories").await
    }

    pub async fn get_summary(&self) -> Result<TransactionSummary, ClientError> {
        self.get("transactions/summary").await
    }

    /// The monthly income the backend derives from income transactions
    pub async fn get_monthly_income(&self) -> Result<MonthlyIncome, ClientError> {
        self.get("transactions/monthly-income").await
    }

    /// Update the category or notes of a transaction
    pub async fn update_transaction(
        &self,
        id: &TransactionId,
        update: &TransactionUpdate,
    ) -> Result<UpdatedTransaction, ClientError> {
        self.put(&format!("transactions/{id}"), update).await
    }

    /// Pull the latest transactions from the bank, waits until the sync is done
    pub async fn sync_transactions(&self) -> Result<SyncStatus, ClientError> {
        self.empty_post("transactions/sync").await
    }
}

fn refreshes_on_unauthorized(path: &str) -> bool {
    let path = path.trim_start_matches('/');
    path != LOGIN_PATH && path != REFRESH_PATH
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An unhandled API error to display, containing the backend's message.
    #[error("{1}")]
    Api(StatusCode, String),
    #[error("Network error. Please check your connection.")]
    Network(#[from] reqwest::Error),
    #[error("The backend did not return an access token")]
    MissingToken,
}

/// Deserialize a successful request into the desired type, or return an
/// appropriate error.
pub async fn ok_body<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await?;
        return Err(ClientError::Api(status, error_message(status, &text)));
    }
    Ok(response.json::<T>().await?)
}

fn error_message(status: StatusCode, text: &str) -> String {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) => body.error,
        Err(_) if text.trim().is_empty() => format!("HTTP error! status: {status}"),
        Err(_) => text.to_owned(),
    }
}
