// 🔌 Repository Interfaces - Read-only access to the external ledger
//
// The statement core depends only on these traits, never on a concrete store.
// Adapters (SQLite in `db`, the in-memory store below, anything else) own the
// query details: party scoping, cancelled-entry filtering, shape validation.

use crate::model::{add_amount, CustomerInfo, LedgerMovement, OutstandingInvoice};
use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

pub trait LedgerRepository {
    /// Sum of (debit - credit) over every movement strictly before `before`.
    /// Returns zero when there is no such movement.
    fn balance_before(&self, customer: &str, before: NaiveDate) -> Result<Decimal>;

    /// Movements with `start <= posting_date <= end`, ordered by
    /// (posting_date, sequence_key) ascending.
    fn movements_between(
        &self,
        customer: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LedgerMovement>>;
}

pub trait InvoiceRepository {
    /// Invoices with an outstanding amount strictly greater than zero
    fn outstanding_invoices(&self, customer: &str) -> Result<Vec<OutstandingInvoice>>;
}

pub trait CustomerDirectory {
    /// Resolve a customer identifier; `Ok(None)` means not found
    fn find_customer(&self, customer: &str) -> Result<Option<CustomerInfo>>;
}

/// Everything statement generation reads from.
pub trait StatementSource: LedgerRepository + InvoiceRepository + CustomerDirectory {}
impl<T: LedgerRepository + InvoiceRepository + CustomerDirectory> StatementSource for T {}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Debug, Clone, Default)]
struct CustomerLedger {
    movements: Vec<LedgerMovement>,
    invoices: Vec<OutstandingInvoice>,
}

/// Store backed by plain vectors; handy for embedding callers and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    customers: HashMap<String, CustomerInfo>,
    ledgers: HashMap<String, CustomerLedger>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_customer(&mut self, customer: CustomerInfo) {
        self.customers.insert(customer.identifier.clone(), customer);
    }

    pub fn add_movement(&mut self, customer: &str, movement: LedgerMovement) {
        self.ledgers
            .entry(customer.to_string())
            .or_default()
            .movements
            .push(movement);
    }

    pub fn add_invoice(&mut self, customer: &str, invoice: OutstandingInvoice) {
        self.ledgers
            .entry(customer.to_string())
            .or_default()
            .invoices
            .push(invoice);
    }

    fn movements(&self, customer: &str) -> &[LedgerMovement] {
        self.ledgers
            .get(customer)
            .map(|ledger| ledger.movements.as_slice())
            .unwrap_or(&[])
    }
}

impl LedgerRepository for InMemoryStore {
    fn balance_before(&self, customer: &str, before: NaiveDate) -> Result<Decimal> {
        self.movements(customer)
            .iter()
            .filter(|m| m.posting_date < before)
            .try_fold(Decimal::ZERO, |balance, m| add_amount(balance, m.signed_amount()?))
    }

    fn movements_between(
        &self,
        customer: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LedgerMovement>> {
        let mut movements: Vec<LedgerMovement> = self
            .movements(customer)
            .iter()
            .filter(|m| start <= m.posting_date && m.posting_date <= end)
            .cloned()
            .collect();
        movements.sort_by_key(LedgerMovement::order_key);
        Ok(movements)
    }
}

impl InvoiceRepository for InMemoryStore {
    fn outstanding_invoices(&self, customer: &str) -> Result<Vec<OutstandingInvoice>> {
        Ok(self
            .ledgers
            .get(customer)
            .map(|ledger| {
                ledger
                    .invoices
                    .iter()
                    .filter(|inv| inv.outstanding_amount > Decimal::ZERO)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl CustomerDirectory for InMemoryStore {
    fn find_customer(&self, customer: &str) -> Result<Option<CustomerInfo>> {
        Ok(self.customers.get(customer).cloned())
    }
}
