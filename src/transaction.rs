use std::fmt;

use chrono::NaiveDate;

use crate::{amount::{Amount, Money}, date::parse_date};

/// The unique identifier of a transaction
///
/// The backend hands out integers, exports sometimes use strings, so the id
/// is kept as opaque text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for TransactionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for TransactionId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl serde::Serialize for TransactionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: serde::Serializer
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for TransactionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: serde::Deserializer<'de>
    {
        struct IdVisitor;

        impl<'de> serde::de::Visitor<'de> for IdVisitor {
            type Value = TransactionId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or string transaction id")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<TransactionId, E> {
                Ok(TransactionId(v.to_string()))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<TransactionId, E> {
                Ok(TransactionId(v.to_string()))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<TransactionId, E> {
                Ok(TransactionId(v.to_owned()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// The kinds of transactions known to the ledger
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming into the account
    Income,
    /// Money leaving the account
    Expense,
    /// Anything else the backend may send; treated like income
    #[serde(other)]
    Other,
}

impl TransactionType {
    pub fn is_expense(self) -> bool {
        self == Self::Expense
    }
}

/// A partial update of the client-editable fields of a transaction
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct TransactionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        self.user_category.is_none() && self.notes.is_none()
    }
}

/// A transaction record
///
/// Transactions are owned by the backend. Apart from the user category and
/// the notes, the client only ever reads them.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    id: TransactionId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    date_posted: Option<String>,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    #[serde(default)]
    amount: Amount,
    #[serde(default, alias = "paymentType")]
    payment_source: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plaid_category: Option<String>,
    #[serde(default)]
    user_category: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default, alias = "isRecurring", deserialize_with = "empty_as_false")]
    is_recurring: bool,
}

/// A transaction row where every field is kept as the text it was written as
///
/// CSV fields are untyped, so reading a [`Transaction`] straight from one
/// would guess numbers for ids and amounts. Going through the text first
/// keeps ids opaque and amounts exact.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct TransactionRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    date_posted: Option<String>,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    #[serde(default)]
    amount: String,
    #[serde(default, alias = "paymentType")]
    payment_source: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    plaid_category: Option<String>,
    #[serde(default)]
    user_category: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default, alias = "isRecurring", deserialize_with = "empty_as_false")]
    is_recurring: bool,
}

impl From<TransactionRecord> for Transaction {
    fn from(record: TransactionRecord) -> Self {
        Self {
            id: TransactionId(record.id),
            name: record.name,
            date: record.date,
            date_posted: record.date_posted,
            transaction_type: record.transaction_type,
            amount: Amount::parse(&record.amount),
            payment_source: record.payment_source,
            category: record.category,
            plaid_category: record.plaid_category,
            user_category: record.user_category,
            notes: record.notes,
            is_recurring: record.is_recurring,
        }
    }
}

/// Reads a flag that may also be left empty or `null`, both meaning `false`
fn empty_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where D: serde::Deserializer<'de>
{
    let flag: Option<bool> = serde::Deserialize::deserialize(deserializer)?;
    Ok(flag.unwrap_or(false))
}

impl Transaction {
    /// Creates a transaction with only the fields the ledger needs
    pub fn new(
        id: impl Into<TransactionId>,
        transaction_type: TransactionType,
        amount: impl Into<Amount>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            date: Some(date.format("%Y-%m-%d").to_string()),
            date_posted: None,
            transaction_type,
            amount: amount.into(),
            payment_source: None,
            category: None,
            plaid_category: None,
            user_category: None,
            notes: None,
            is_recurring: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_date_posted(mut self, date_posted: impl Into<String>) -> Self {
        self.date_posted = Some(date_posted.into());
        self
    }

    /// The unique id of the transaction
    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The type of the transaction
    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// The amount as received, see [`Amount`]
    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    pub fn payment_source(&self) -> Option<&str> {
        self.payment_source.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn is_recurring(&self) -> bool {
        self.is_recurring
    }

    /// The raw text the effective date is read from
    ///
    /// The posted date wins over the nominal date when it is present.
    pub fn effective_date_text(&self) -> Option<&str> {
        non_blank(&self.date_posted).or_else(|| non_blank(&self.date))
    }

    /// The date the transaction is ordered and bucketed by
    ///
    /// `None` if neither date is present, or the chosen one does not parse.
    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.effective_date_text().and_then(parse_date)
    }

    /// The category shown to the user
    ///
    /// A category set by the user overrides the one from the backend.
    pub fn display_category(&self) -> Option<&str> {
        non_blank(&self.user_category)
            .or_else(|| non_blank(&self.category))
            .or_else(|| non_blank(&self.plaid_category))
    }

    /// The effect of the transaction on the balance, `None` for invalid amounts
    pub fn signed_effect(&self) -> Option<Money> {
        let amount = self.amount.valid()?;
        match self.transaction_type {
            TransactionType::Expense => Some(-amount),
            TransactionType::Income | TransactionType::Other => Some(amount),
        }
    }

    /// Applies an edit locally, mirroring what the backend does with it
    pub fn apply_update(&mut self, update: &TransactionUpdate) {
        if let Some(user_category) = &update.user_category {
            self.user_category = Some(user_category.clone());
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
        }
    }
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn deserializes_backend_json() {
        let transaction: Transaction = serde_json::from_str(r#"{
            "id": 17,
            "name": "Part-time Job",
            "date_posted": "Sun, 14 Jan 2024 00:00:00 GMT",
            "type": "income",
            "amount": "450.00",
            "payment_source": "direct deposit",
            "plaid_category": "Transfer",
            "user_category": "Income",
            "notes": null,
            "is_recurring": true,
            "new_balance_after_transaction": "1200.00"
        }"#).unwrap();

        assert_eq!(transaction.id().as_str(), "17");
        assert_eq!(transaction.transaction_type(), TransactionType::Income);
        assert_eq!(transaction.amount().valid(), Some(Money::from_num(450)));
        assert_eq!(transaction.effective_date(), Some(ymd(2024, 1, 14)));
        assert_eq!(transaction.display_category(), Some("Income"));
        assert!(transaction.is_recurring());
    }

    #[test]
    fn deserializes_camel_case_flags() {
        let transaction: Transaction = serde_json::from_str(r#"{
            "id": "a1",
            "date": "2024-01-15",
            "type": "expense",
            "paymentType": "Credit Card",
            "amount": 85.5,
            "isRecurring": true
        }"#).unwrap();

        assert_eq!(transaction.payment_source(), Some("Credit Card"));
        assert!(transaction.is_recurring());
    }

    #[test]
    fn null_flags_are_false() {
        let transaction: Transaction = serde_json::from_str(
            r#"{"id": 1, "type": "expense", "amount": 5, "is_recurring": null}"#,
        ).unwrap();

        assert!(!transaction.is_recurring());
    }

    #[test]
    fn unknown_types_are_other() {
        let transaction: Transaction =
            serde_json::from_str(r#"{"id": 1, "type": "transfer", "amount": 5}"#).unwrap();

        assert_eq!(transaction.transaction_type(), TransactionType::Other);
        assert_eq!(transaction.signed_effect(), Some(Money::from_num(5)));
    }

    #[test]
    fn posted_date_takes_precedence() {
        let transaction = Transaction::new(1u64, TransactionType::Expense, Money::from_num(1), ymd(2024, 1, 10))
            .with_date_posted("2024-01-12");
        assert_eq!(transaction.effective_date(), Some(ymd(2024, 1, 12)));

        let blank_posted = Transaction::new(2u64, TransactionType::Expense, Money::from_num(1), ymd(2024, 1, 10))
            .with_date_posted("  ");
        assert_eq!(blank_posted.effective_date(), Some(ymd(2024, 1, 10)));
    }

    #[test]
    fn user_category_overrides_category() {
        let mut transaction = Transaction::new(1u64, TransactionType::Expense, Money::from_num(1), ymd(2024, 1, 10))
            .with_category("Shopping");
        assert_eq!(transaction.display_category(), Some("Shopping"));

        transaction.apply_update(&TransactionUpdate {
            user_category: Some("Food".to_owned()),
            notes: None,
        });
        assert_eq!(transaction.display_category(), Some("Food"));
        assert_eq!(transaction.notes(), None);
    }

    #[test]
    fn expenses_have_negative_effect() {
        let expense = Transaction::new(1u64, TransactionType::Expense, Money::from_num(200), ymd(2024, 1, 10));
        let invalid = Transaction::new(2u64, TransactionType::Expense, Amount::parse("x"), ymd(2024, 1, 10));

        assert_eq!(expense.signed_effect(), Some(Money::from_num(-200)));
        assert_eq!(invalid.signed_effect(), None);
    }

    #[test]
    fn update_skips_unset_fields() {
        let update = TransactionUpdate {
            user_category: None,
            notes: Some("split with Sam".to_owned()),
        };

        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"notes":"split with Sam"}"#);
        assert!(TransactionUpdate::default().is_empty());
    }
}
