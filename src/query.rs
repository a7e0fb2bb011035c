use chrono::{Duration, NaiveDate};

use crate::{date::first_of_month, transaction::TransactionType};

/// The most transactions the backend returns per page
pub const MAX_PER_PAGE: u32 = 100;

/// The fields the backend can sort transactions by
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Date,
    Amount,
    Name,
    Type,
    Category,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// The query parameters of a transaction page request
///
/// Unset fields are left out of the request, so the backend defaults apply:
/// page 1, 50 transactions per page, newest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct TransactionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort_by: Option<SortField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort_order: Option<SortOrder>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_date")]
    start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_date")]
    end_date: Option<NaiveDate>,
}

impl TransactionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transactions of the last 30 days, newest first
    pub fn recent(today: NaiveDate, limit: u32) -> Self {
        Self::new()
            .between(Some(today - Duration::days(30)), None)
            .per_page(limit)
            .sort(SortField::Date, SortOrder::Desc)
    }

    /// Transactions from the first of the month up to today, newest first
    pub fn current_month(today: NaiveDate) -> Self {
        Self::new()
            .between(Some(first_of_month(today)), Some(today))
            .sort(SortField::Date, SortOrder::Desc)
    }

    /// The 1-based page number, `0` is treated as the first page
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page.max(1));
        self
    }

    /// The page size, clamped to `1..=MAX_PER_PAGE`
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page.clamp(1, MAX_PER_PAGE));
        self
    }

    pub fn sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = Some(field);
        self.sort_order = Some(order);
        self
    }

    pub fn kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = non_empty(category.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = non_empty(search.into());
        self
    }

    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn page_number(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}

fn non_empty(value: String) -> Option<String> {
    match value.trim().is_empty() {
        true => None,
        false => Some(value),
    }
}

fn serialize_date<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where S: serde::Serializer
{
    match date {
        Some(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
        None => serializer.serialize_none(),
    }
}
