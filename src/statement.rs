// 🧾 Statement Assembler - Customer account statement in one pass
//
// Pipeline (strictly downstream, no call-backs):
//   customer lookup -> date normalizer -> opening balance -> ledger walk
//                   -> aging summary -> assembled Statement
//
// The customer is resolved before any ledger query so an unknown identifier
// fails fast with CustomerNotFound. Any error aborts the whole statement.

use crate::aging::AgingSummarizer;
use crate::config::StatementConfig;
use crate::dates::normalize_range;
use crate::error::{Result, StatementError};
use crate::ledger::{opening_balance, walk_ledger};
use crate::model::{Statement, StatementRow};
use crate::repository::StatementSource;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Invocation inputs, as a report filter or API query supplies them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRequest {
    pub customer: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl StatementRequest {
    pub fn new(customer: impl Into<String>) -> Self {
        StatementRequest {
            customer: customer.into(),
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_range(mut self, start_date: Option<&str>, end_date: Option<&str>) -> Self {
        self.start_date = start_date.map(str::to_string);
        self.end_date = end_date.map(str::to_string);
        self
    }
}

pub struct StatementEngine {
    config: StatementConfig,
    aging: AgingSummarizer,
}

impl StatementEngine {
    pub fn new() -> Self {
        Self::from_parts(StatementConfig::default())
    }

    /// Engine with a custom configuration; the configuration is validated first
    pub fn with_config(config: StatementConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: StatementConfig) -> Self {
        let aging = AgingSummarizer::with_thresholds(config.aging.clone());
        StatementEngine { config, aging }
    }

    pub fn config(&self) -> &StatementConfig {
        &self.config
    }

    /// Build the statement for `request`.
    ///
    /// `today` stands in for the invocation time: it defaults the end date and
    /// stamps `statement_date`, so identical inputs yield identical statements
    /// apart from `statement_id`.
    #[instrument(
        skip(self, source, request),
        fields(customer = %request.customer, start = ?request.start_date, end = ?request.end_date)
    )]
    pub fn generate<S: StatementSource + ?Sized>(
        &self,
        source: &S,
        request: &StatementRequest,
        today: NaiveDate,
    ) -> Result<Statement> {
        let customer_id = request.customer.trim();

        let customer = source
            .find_customer(customer_id)?
            .ok_or_else(|| StatementError::CustomerNotFound(customer_id.to_string()))?;
        if customer.address.is_none() {
            warn!(customer = customer_id, "customer has no linked address");
        }

        let range = normalize_range(
            request.start_date.as_deref(),
            request.end_date.as_deref(),
            today,
            self.config.epoch_floor,
        )?;
        debug!(%range, "normalized date range");

        let opening = opening_balance(source, customer_id, range.start)?;
        let walk = walk_ledger(source, customer_id, &range, opening)?;
        let aging = self.aging.summarize_customer(source, customer_id, range.end)?;

        let mut rows = Vec::with_capacity(walk.rows.len() + 1);
        rows.push(StatementRow::balance_forward(
            range.start,
            &self.config.balance_forward_label,
            opening,
        ));
        rows.extend(walk.rows);

        let statement = Statement {
            customer,
            rows,
            opening_balance: opening,
            ending_balance: walk.ending_balance,
            aging,
            statement_id: self.next_statement_id(),
            statement_date: today,
            date_range: range,
        };

        info!(
            statement_id = %statement.statement_id,
            rows = statement.rows.len(),
            ending_balance = %statement.ending_balance,
            "statement generated"
        );

        Ok(statement)
    }

    /// Short opaque identifier; unique enough to tell printed statements apart
    fn next_statement_id(&self) -> String {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        hex[..self.config.statement_id_length.min(hex.len())].to_string()
    }
}

impl Default for StatementEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Address, AgingBuckets, Category, CustomerInfo, LedgerMovement, OutstandingInvoice, RowKind,
    };
    use crate::repository::{CustomerDirectory, InMemoryStore, InvoiceRepository, LedgerRepository};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::cell::Cell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_movement(
        posting_date: NaiveDate,
        category: Category,
        reference: &str,
        debit: Decimal,
        credit: Decimal,
        seq: i64,
    ) -> LedgerMovement {
        LedgerMovement {
            posting_date,
            category,
            reference_id: reference.to_string(),
            debit_amount: debit,
            credit_amount: credit,
            remarks: String::new(),
            sequence_key: seq,
        }
    }

    fn acme_store() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.add_customer(CustomerInfo {
            identifier: "ACME".to_string(),
            display_name: "Acme Corporation".to_string(),
            address: Some(Address {
                address_line1: "1 Road Runner Way".to_string(),
                city: "Phoenix".to_string(),
                country: "US".to_string(),
                ..Address::default()
            }),
        });
        store.add_movement(
            "ACME",
            create_test_movement(date(2024, 12, 10), Category::Invoice, "INV-1", dec!(100), dec!(0), 1),
        );
        store.add_movement(
            "ACME",
            create_test_movement(date(2025, 1, 15), Category::Payment, "PAY-1", dec!(0), dec!(40), 2),
        );
        store
    }

    #[test]
    fn test_acme_scenario() {
        let store = acme_store();
        let engine = StatementEngine::new();
        let request = StatementRequest::new("ACME").with_range(Some("2025-01-01"), Some("2025-01-31"));

        let statement = engine.generate(&store, &request, date(2025, 2, 1)).unwrap();

        assert_eq!(statement.opening_balance, dec!(100));
        assert_eq!(statement.rows.len(), 2);

        let forward = &statement.rows[0];
        assert_eq!(forward.kind, RowKind::BalanceForward);
        assert_eq!(forward.description, "Balance Forward");
        assert_eq!(forward.date, date(2025, 1, 1));
        assert_eq!(forward.amount, dec!(0));
        assert_eq!(forward.running_balance, dec!(100));

        let payment = &statement.rows[1];
        assert_eq!(payment.description, "Payment #PAY-1");
        assert_eq!(payment.amount, dec!(-40));
        assert_eq!(payment.running_balance, dec!(60));

        assert_eq!(statement.ending_balance, dec!(60));
        assert_eq!(statement.statement_date, date(2025, 2, 1));
        assert_eq!(statement.statement_id.len(), 6);

        println!("✅ {}", statement.summary());
    }

    #[test]
    fn test_customer_without_history() {
        let mut store = InMemoryStore::new();
        store.add_customer(CustomerInfo {
            identifier: "NEW".to_string(),
            display_name: "New Customer".to_string(),
            address: None,
        });

        let statement = StatementEngine::new()
            .generate(&store, &StatementRequest::new("NEW"), date(2025, 6, 30))
            .unwrap();

        assert_eq!(statement.rows.len(), 1);
        assert!(statement.rows[0].is_balance_forward());
        assert_eq!(statement.opening_balance, dec!(0));
        assert_eq!(statement.ending_balance, dec!(0));
        assert_eq!(statement.aging, AgingBuckets::default());
        assert_eq!(statement.date_range.start, date(2000, 1, 1));
        assert_eq!(statement.date_range.end, date(2025, 6, 30));
    }

    #[test]
    fn test_idempotent_apart_from_id() {
        let store = acme_store();
        let engine = StatementEngine::new();
        let request = StatementRequest::new("ACME").with_range(Some("2025-01-01"), None);

        let first = engine.generate(&store, &request, date(2025, 3, 1)).unwrap();
        let second = engine.generate(&store, &request, date(2025, 3, 1)).unwrap();

        assert_eq!(first.rows, second.rows);
        assert_eq!(first.opening_balance, second.opening_balance);
        assert_eq!(first.ending_balance, second.ending_balance);
        assert_eq!(first.aging, second.aging);
    }

    #[test]
    fn test_aging_uses_end_date() {
        let mut store = acme_store();
        store.add_invoice(
            "ACME",
            OutstandingInvoice { posting_date: date(2025, 1, 31), outstanding_amount: dec!(60) },
        );

        let request = StatementRequest::new("ACME").with_range(Some("2025-01-01"), Some("2025-01-31"));
        let statement = StatementEngine::new().generate(&store, &request, date(2025, 6, 1)).unwrap();

        assert_eq!(statement.aging.current, dec!(60));
        assert_eq!(statement.aging.total_due, dec!(60));
    }

    #[test]
    fn test_custom_config() {
        let config = StatementConfig {
            statement_id_length: 12,
            balance_forward_label: "Opening Balance".to_string(),
            ..StatementConfig::default()
        };
        let engine = StatementEngine::with_config(config).unwrap();

        let statement = engine
            .generate(&acme_store(), &StatementRequest::new("ACME"), date(2025, 2, 1))
            .unwrap();

        assert_eq!(statement.statement_id.len(), 12);
        assert_eq!(statement.rows[0].description, "Opening Balance");
        assert_eq!(statement.opening_balance, dec!(0));
        assert_eq!(statement.ending_balance, dec!(60));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = StatementConfig { statement_id_length: 0, ..StatementConfig::default() };
        assert!(StatementEngine::with_config(config).is_err());
    }

    /// Store that counts ledger queries and fails any it receives
    struct CountingStore {
        ledger_queries: Cell<usize>,
    }

    impl LedgerRepository for CountingStore {
        fn balance_before(&self, _customer: &str, _before: NaiveDate) -> anyhow::Result<Decimal> {
            self.ledger_queries.set(self.ledger_queries.get() + 1);
            Err(anyhow::anyhow!("ledger should not be queried"))
        }

        fn movements_between(
            &self,
            _customer: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> anyhow::Result<Vec<LedgerMovement>> {
            self.ledger_queries.set(self.ledger_queries.get() + 1);
            Err(anyhow::anyhow!("ledger should not be queried"))
        }
    }

    impl InvoiceRepository for CountingStore {
        fn outstanding_invoices(&self, _customer: &str) -> anyhow::Result<Vec<OutstandingInvoice>> {
            self.ledger_queries.set(self.ledger_queries.get() + 1);
            Ok(Vec::new())
        }
    }

    impl CustomerDirectory for CountingStore {
        fn find_customer(&self, _customer: &str) -> anyhow::Result<Option<CustomerInfo>> {
            Ok(None)
        }
    }

    #[test]
    fn test_unknown_customer_fails_before_ledger_query() {
        let store = CountingStore { ledger_queries: Cell::new(0) };

        let err = StatementEngine::new()
            .generate(&store, &StatementRequest::new("GHOST"), date(2025, 1, 1))
            .unwrap_err();

        assert!(matches!(err, StatementError::CustomerNotFound(ref id) if id == "GHOST"));
        assert_eq!(store.ledger_queries.get(), 0);
    }

    #[test]
    fn test_store_failure_is_data_access() {
        struct BrokenLedger;

        impl LedgerRepository for BrokenLedger {
            fn balance_before(&self, _customer: &str, _before: NaiveDate) -> anyhow::Result<Decimal> {
                Err(anyhow::anyhow!("connection reset"))
            }

            fn movements_between(
                &self,
                _customer: &str,
                _start: NaiveDate,
                _end: NaiveDate,
            ) -> anyhow::Result<Vec<LedgerMovement>> {
                Ok(Vec::new())
            }
        }

        impl InvoiceRepository for BrokenLedger {
            fn outstanding_invoices(&self, _customer: &str) -> anyhow::Result<Vec<OutstandingInvoice>> {
                Ok(Vec::new())
            }
        }

        impl CustomerDirectory for BrokenLedger {
            fn find_customer(&self, customer: &str) -> anyhow::Result<Option<CustomerInfo>> {
                Ok(Some(CustomerInfo {
                    identifier: customer.to_string(),
                    display_name: customer.to_string(),
                    address: None,
                }))
            }
        }

        let err = StatementEngine::new()
            .generate(&BrokenLedger, &StatementRequest::new("ACME"), date(2025, 1, 1))
            .unwrap_err();

        assert_eq!(err.kind(), "data_access");
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_invalid_dates_surface_unmodified() {
        let store = acme_store();
        let engine = StatementEngine::new();

        let bad_date = StatementRequest::new("ACME").with_range(Some("yesterday"), None);
        assert_eq!(
            engine.generate(&store, &bad_date, date(2025, 1, 1)).unwrap_err().kind(),
            "invalid_date"
        );

        let reversed = StatementRequest::new("ACME").with_range(Some("2025-02-01"), Some("2025-01-01"));
        assert_eq!(
            engine.generate(&store, &reversed, date(2025, 3, 1)).unwrap_err().kind(),
            "invalid_range"
        );
    }
}
