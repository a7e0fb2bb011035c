use chrono::NaiveDate;

use polarity_ledger::{
    read_json, reconcile, reconcile_filtered, CategoryFilter, DataQualityWarning, Money,
    ReconcileOptions, TransactionFilter,
};

const PAGE: &str = r#"{
    "transactions": [
        {"id": 41, "name": "Coffee", "date_posted": "Tue, 05 Mar 2024 00:00:00 GMT",
         "type": "expense", "amount": "4.50", "user_category": "Food", "is_recurring": false},
        {"id": 40, "name": "Paycheck", "date_posted": "2024-03-01",
         "type": "income", "amount": "1500.00", "plaid_category": "Payroll", "is_recurring": true},
        {"id": 39, "name": "Rent", "date_posted": "2024-02-28",
         "type": "expense", "amount": 900, "plaid_category": "Rent", "is_recurring": true},
        {"id": 42, "name": "Refund?", "date_posted": "2024-03-06",
         "type": "income", "amount": "pending", "plaid_category": "Shopping"}
    ],
    "pagination": {"page": 1, "per_page": 50, "total": 4, "pages": 1,
                   "has_next": false, "has_prev": false}
}"#;

fn as_of() -> ReconcileOptions {
    ReconcileOptions::as_of(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
}

#[test]
fn reconciles_a_saved_page() {
    let transactions = read_json(PAGE.as_bytes()).unwrap();

    let reconciliation = reconcile(transactions, Money::from_num(2000), &as_of()).unwrap();

    let rows = reconciliation.transactions
        .iter()
        .map(|reconciled| (reconciled.transaction().id().to_string(), reconciled.balance()))
        .collect::<Vec<_>>();
    assert_eq!(
        rows,
        vec![
            ("42".to_owned(), Money::from_num(2000)),
            ("41".to_owned(), Money::from_num(2000)),
            ("40".to_owned(), Money::from_num(2004.5)),
            ("39".to_owned(), Money::from_num(504.5)),
        ],
    );
    assert_eq!(reconciliation.opening_balance, Money::from_num(1404.5));
    // rent was paid in february
    assert_eq!(reconciliation.monthly_spent, Money::from_num(4.5));
    assert_eq!(
        reconciliation.warnings,
        vec![DataQualityWarning::InvalidAmount { id: 42u64.into(), raw: "pending".to_owned() }],
    );
}

#[test]
fn filtered_pages_start_from_the_same_balance() {
    let transactions = read_json(PAGE.as_bytes()).unwrap();
    let filter = TransactionFilter::new(None, CategoryFilter::from("Rent"));

    let reconciliation =
        reconcile_filtered(transactions, &filter, Money::from_num(2000), &as_of()).unwrap();

    assert_eq!(reconciliation.transactions.len(), 1);
    assert_eq!(reconciliation.transactions[0].balance(), Money::from_num(2000));
    assert_eq!(reconciliation.opening_balance, Money::from_num(2900));
    // the coffee is hidden but still spent this month
    assert_eq!(reconciliation.monthly_spent, Money::from_num(4.5));
}
