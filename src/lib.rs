// Customer Statement - Core Library
// Opening balance, running-balance ledger and receivables aging for one customer.
// Exposes all modules for use in the CLI, the API server and tests.

pub mod model;
pub mod error;
pub mod config;
pub mod dates;
pub mod repository;
pub mod db;
pub mod description;
pub mod ledger;
pub mod aging;
pub mod statement;
pub mod report;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use model::{
    add_amount, Address, AgingBuckets, Category, CustomerInfo, DateRange, LedgerMovement,
    OutstandingInvoice, RowKind, Statement, StatementRow,
};
pub use error::{Result, StatementError};
pub use config::{AgingThresholds, StatementConfig};
pub use dates::{normalize_range, parse_date};
pub use repository::{
    CustomerDirectory, InMemoryStore, InvoiceRepository, LedgerRepository, StatementSource,
};
pub use db::{
    setup_database, load_ledger_csv, load_customers_csv, load_invoices_csv,
    insert_movements, insert_customers, insert_invoices, verify_count,
    ImportStats, InvoiceRecord, LedgerRecord, SqliteLedger,
};
pub use description::describe;
pub use ledger::{fold_movements, opening_balance, walk_ledger, LedgerWalk};
pub use aging::{AgingBucket, AgingSummarizer};
pub use statement::{StatementEngine, StatementRequest};
pub use report::{
    statement_columns, statement_columns_with, write_report_csv, ColumnLabels, FieldType, ReportColumn,
    ReportRow, ReportTable,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
