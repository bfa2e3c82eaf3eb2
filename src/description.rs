// 🏷️ Description Classifier - Human-readable label per ledger movement
//
// Precedence (first match wins):
//   1. Invoice                                     -> "Invoice #<ref>"
//   2. Payment                                     -> "Payment #<ref>"
//   3. CreditMemo, or JournalEntry with credit > debit -> "Credit Memo #<ref>"
//   4. JournalEntry with non-empty remarks         -> remarks verbatim
//   5. anything else                               -> "<category> #<ref>"

use crate::model::{Category, LedgerMovement};

pub fn describe(movement: &LedgerMovement) -> String {
    let reference = &movement.reference_id;

    match &movement.category {
        Category::Invoice => format!("Invoice #{}", reference),
        Category::Payment => format!("Payment #{}", reference),
        Category::CreditMemo => format!("Credit Memo #{}", reference),
        Category::JournalEntry if movement.credit_amount > movement.debit_amount => {
            format!("Credit Memo #{}", reference)
        }
        Category::JournalEntry if !movement.remarks.trim().is_empty() => movement.remarks.clone(),
        other => format!("{} #{}", other, reference),
    }
}
