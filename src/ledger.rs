// 📜 Ledger Walker - Opening balance and chronological running balance
//
//   opening_balance = Σ (debit - credit) before start
//   balance_n       = balance_(n-1) + (debit_n - credit_n)
//
// The running balance is path-dependent, so movements are always folded in
// (posting_date, sequence_key) order.

use crate::description::describe;
use crate::error::Result;
use crate::model::{add_amount, DateRange, LedgerMovement, RowKind, StatementRow};
use crate::repository::LedgerRepository;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

/// Result of folding the in-range movements
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerWalk {
    /// One row per movement; the Balance Forward row is not included
    pub rows: Vec<StatementRow>,
    /// Balance after the last movement, or the opening balance when empty
    pub ending_balance: Decimal,
}

/// Balance carried into the statement from everything posted before `start`
pub fn opening_balance<L: LedgerRepository + ?Sized>(
    ledger: &L,
    customer: &str,
    start: NaiveDate,
) -> Result<Decimal> {
    let balance = ledger.balance_before(customer, start)?;
    debug!(customer, %start, %balance, "opening balance");
    Ok(balance)
}

/// Fetch the in-range movements and fold them into statement rows
pub fn walk_ledger<L: LedgerRepository + ?Sized>(
    ledger: &L,
    customer: &str,
    range: &DateRange,
    opening_balance: Decimal,
) -> Result<LedgerWalk> {
    let movements = ledger.movements_between(customer, range.start, range.end)?;
    debug!(customer, count = movements.len(), "fetched ledger movements");

    fold_movements(movements, opening_balance)
}

/// Fold movements into rows, starting from `opening_balance`.
///
/// Sorting is stable, so movements sharing a full key keep the store's order.
/// A total outside Decimal's range fails as a data-access error.
pub fn fold_movements(mut movements: Vec<LedgerMovement>, opening_balance: Decimal) -> Result<LedgerWalk> {
    movements.sort_by_key(LedgerMovement::order_key);

    let mut running_balance = opening_balance;
    let mut rows = Vec::with_capacity(movements.len());
    for movement in &movements {
        let amount = movement.signed_amount()?;
        running_balance = add_amount(running_balance, amount)?;

        rows.push(StatementRow {
            date: movement.posting_date,
            description: describe(movement),
            amount,
            running_balance,
            kind: RowKind::Movement,
        });
    }

    Ok(LedgerWalk {
        rows,
        ending_balance: running_balance,
    })
}
