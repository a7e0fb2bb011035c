//! Bodies returned by the backend.
//!
//! The backend is loose about its shapes, every field that can go missing
//! has a default.

use serde::Deserialize;

use crate::{amount::Amount, transaction::Transaction};

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of the user's transactions
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionPage {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl TransactionPage {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CategoryList {
    pub categories: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransactionSummary {
    pub total_income: Amount,
    pub total_expenses: Amount,
    pub net: Amount,
    pub transaction_count: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonthlyIncome {
    pub monthly_income: Amount,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncStatus {
    pub message: Option<String>,
    pub added: Option<u64>,
    pub modified: Option<u64>,
    pub removed: Option<u64>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdatedTransaction {
    pub message: Option<String>,
    pub transaction: Option<Transaction>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoginResponse {
    pub access_token: Option<String>,
    pub message: Option<String>,
    pub onboarding_completed: bool,
    pub onboarding_step: u32,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RefreshResponse {
    pub access_token: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BudgetProfile {
    pub salary_monthly: Option<i64>,
    pub monthly_spending_goal: Option<i64>,
    /// `null` until a bank account is connected
    pub total_balance: Option<Amount>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProfileData {
    pub user_id: Option<u64>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub budget_profile: BudgetProfile,
    pub has_bank_connection: bool,
}

/// The `{"error": "..."}` body of a failed request
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
