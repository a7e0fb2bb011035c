use crate::transaction::Transaction;

/// Restricts the transactions to a single category
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl From<&str> for CategoryFilter {
    /// `"all"` in any case, or blank text, selects every category
    fn from(name: &str) -> Self {
        let name = name.trim();
        match name.is_empty() || name.eq_ignore_ascii_case("all") {
            true => Self::All,
            false => Self::Named(name.to_owned()),
        }
    }
}

/// The search and category filter of the transaction table
///
/// The search term matches case-insensitively anywhere in the name or the
/// displayed category. The category has to match the displayed category
/// exactly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub search: Option<String>,
    pub category: CategoryFilter,
}

impl TransactionFilter {
    pub fn new(search: Option<String>, category: CategoryFilter) -> Self {
        Self { search, category }
    }

    pub fn is_empty(&self) -> bool {
        self.search_term().is_none() && self.category == CategoryFilter::All
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        let category = transaction.display_category();

        let matches_search = match self.search_term() {
            None => true,
            Some(term) => [transaction.name(), category]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&term)),
        };
        let matches_category = match &self.category {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => category == Some(name.as_str()),
        };

        matches_search && matches_category
    }

    /// Keeps the matching transactions, in their original order
    pub fn apply<I>(&self, transactions: I) -> Vec<Transaction>
        where I: IntoIterator<Item = Transaction>
    {
        transactions
            .into_iter()
            .filter(|transaction| self.matches(transaction))
            .collect()
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }
}
