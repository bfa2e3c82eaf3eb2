// 🗄️ SQLite Ledger Store - General-ledger tables plus CSV fixture import
//
// Implements the repository traits over a local SQLite database shaped like a
// general ledger (gl_entries, customers, addresses, sales_invoices).
// Statement generation only ever reads through `SqliteLedger`; the insert
// functions exist to load a ledger from CSV exports.

use crate::model::{add_amount, Address, Category, CustomerInfo, LedgerMovement, OutstandingInvoice};
use crate::repository::{CustomerDirectory, InvoiceRepository, LedgerRepository};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Only customer parties appear on customer statements
const CUSTOMER_PARTY: &str = "Customer";

// ============================================================================
// RECORDS
// ============================================================================

/// A ledger movement as stored, with its owning customer and cancel flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub customer: String,
    pub movement: LedgerMovement,
    pub is_cancelled: bool,
}

impl LedgerRecord {
    /// Hash identifying the ledger entry across imports.
    ///
    /// Identity = customer + voucher type + voucher number + `occurrence`, the
    /// index of this line among the same voucher's lines in one import. Amounts,
    /// remarks, the cancel flag and file position are mutable state, not identity.
    pub fn compute_idempotency_hash(&self, occurrence: usize) -> String {
        let m = &self.movement;
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}",
            self.customer,
            m.category,
            m.reference_id,
            occurrence
        ));
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub invoice_no: String,
    pub customer: String,
    pub posting_date: NaiveDate,
    pub outstanding_amount: Decimal,
    pub is_cancelled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub inserted: usize,
    /// Known entries whose amounts, remarks or cancel flag changed
    pub updated: usize,
    /// Known entries imported again unchanged
    pub duplicates: usize,
}

// ============================================================================
// CSV ROWS
// ============================================================================

// Amounts and flags are read as text: parsing them here keeps full decimal
// precision and gives errors that name the offending column.
#[derive(Debug, Deserialize)]
struct LedgerCsvRow {
    customer: String,
    posting_date: NaiveDate,
    voucher_type: String,
    voucher_no: String,
    #[serde(default)]
    debit: Option<String>,
    #[serde(default)]
    credit: Option<String>,
    #[serde(default)]
    remarks: Option<String>,
    #[serde(default)]
    sequence_key: Option<i64>,
    #[serde(default)]
    is_cancelled: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerCsvRow {
    customer: String,
    customer_name: String,
    #[serde(default)]
    address_line1: Option<String>,
    #[serde(default)]
    address_line2: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    pincode: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvoiceCsvRow {
    invoice_no: String,
    customer: String,
    posting_date: NaiveDate,
    outstanding_amount: String,
    #[serde(default)]
    is_cancelled: Option<String>,
}

/// Empty amount cells count as zero
fn parse_amount(column: &str, raw: Option<&str>) -> Result<Decimal> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => Decimal::from_str(value)
            .with_context(|| format!("Invalid {} amount: {:?}", column, value)),
        None => Ok(Decimal::ZERO),
    }
}

fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

fn read_csv<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    rdr.deserialize::<T>()
        .enumerate()
        .map(|(i, result)| result.with_context(|| format!("Failed to deserialize CSV record {}", i + 1)))
        .collect()
}

fn open_csv(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))
}

/// Parse a ledger export. Rows without `sequence_key` keep their file order.
pub fn load_ledger_reader<R: Read>(reader: R) -> Result<Vec<LedgerRecord>> {
    let rows: Vec<LedgerCsvRow> = read_csv(reader)?;

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| -> Result<LedgerRecord> {
            let line = i + 1;
            Ok(LedgerRecord {
                movement: LedgerMovement {
                    posting_date: row.posting_date,
                    category: Category::parse(&row.voucher_type),
                    debit_amount: parse_amount("debit", row.debit.as_deref())
                        .with_context(|| format!("CSV record {}", line))?,
                    credit_amount: parse_amount("credit", row.credit.as_deref())
                        .with_context(|| format!("CSV record {}", line))?,
                    reference_id: row.voucher_no,
                    remarks: row.remarks.unwrap_or_default(),
                    sequence_key: row.sequence_key.unwrap_or(line as i64),
                },
                is_cancelled: parse_flag(row.is_cancelled.as_deref()),
                customer: row.customer,
            })
        })
        .collect()
}

pub fn load_ledger_csv(path: &Path) -> Result<Vec<LedgerRecord>> {
    load_ledger_reader(open_csv(path)?)
}

pub fn load_customers_reader<R: Read>(reader: R) -> Result<Vec<CustomerInfo>> {
    let rows: Vec<CustomerCsvRow> = read_csv(reader)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let address = row
                .address_line1
                .filter(|line| !line.is_empty())
                .map(|address_line1| Address {
                    address_line1,
                    address_line2: row.address_line2.filter(|s| !s.is_empty()),
                    city: row.city.unwrap_or_default(),
                    state: row.state.filter(|s| !s.is_empty()),
                    pincode: row.pincode.filter(|s| !s.is_empty()),
                    country: row.country.unwrap_or_default(),
                });

            CustomerInfo {
                identifier: row.customer,
                display_name: row.customer_name,
                address,
            }
        })
        .collect())
}

pub fn load_customers_csv(path: &Path) -> Result<Vec<CustomerInfo>> {
    load_customers_reader(open_csv(path)?)
}

pub fn load_invoices_reader<R: Read>(reader: R) -> Result<Vec<InvoiceRecord>> {
    let rows: Vec<InvoiceCsvRow> = read_csv(reader)?;

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| -> Result<InvoiceRecord> {
            Ok(InvoiceRecord {
                outstanding_amount: parse_amount("outstanding", Some(row.outstanding_amount.as_str()))
                    .with_context(|| format!("CSV record {}", i + 1))?,
                is_cancelled: parse_flag(row.is_cancelled.as_deref()),
                invoice_no: row.invoice_no,
                customer: row.customer,
                posting_date: row.posting_date,
            })
        })
        .collect()
}

pub fn load_invoices_csv(path: &Path) -> Result<Vec<InvoiceRecord>> {
    load_invoices_reader(open_csv(path)?)
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL keeps readers (statement generation) off the writer's back
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // Amounts are stored as decimal TEXT and summed in Rust to avoid REAL drift
    conn.execute(
        "CREATE TABLE IF NOT EXISTS gl_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            idempotency_hash TEXT UNIQUE NOT NULL,
            party_type TEXT NOT NULL,
            party TEXT NOT NULL,
            posting_date TEXT NOT NULL,
            voucher_type TEXT NOT NULL,
            voucher_no TEXT NOT NULL,
            debit TEXT NOT NULL,
            credit TEXT NOT NULL,
            remarks TEXT NOT NULL DEFAULT '',
            sequence_key INTEGER NOT NULL,
            is_cancelled INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            customer_name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS addresses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id TEXT NOT NULL,
            link_order INTEGER NOT NULL DEFAULT 0,
            address_line1 TEXT NOT NULL,
            address_line2 TEXT,
            city TEXT NOT NULL,
            state TEXT,
            pincode TEXT,
            country TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sales_invoices (
            invoice_no TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            posting_date TEXT NOT NULL,
            outstanding_amount TEXT NOT NULL,
            is_cancelled INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_gl_party_date
         ON gl_entries(party_type, party, posting_date, sequence_key)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_addresses_customer ON addresses(customer_id, link_order)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_invoices_customer ON sales_invoices(customer_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// IMPORT
// ============================================================================

/// Import ledger movements.
///
/// New entries are inserted. Known entries take the imported amounts, remarks
/// and cancel flag but keep their original `sequence_key`, so a re-export that
/// shifts line numbers does not reorder or duplicate anything.
pub fn insert_movements(conn: &Connection, records: &[LedgerRecord]) -> Result<ImportStats> {
    let tx = conn.unchecked_transaction()?;
    let mut stats = ImportStats::default();
    let mut occurrences: HashMap<(&str, &str, &str), usize> = HashMap::new();

    for record in records {
        let m = &record.movement;
        let occurrence = occurrences
            .entry((record.customer.as_str(), m.category.as_str(), m.reference_id.as_str()))
            .or_insert(0);
        let hash = record.compute_idempotency_hash(*occurrence);
        *occurrence += 1;

        let debit = m.debit_amount.normalize().to_string();
        let credit = m.credit_amount.normalize().to_string();

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM gl_entries WHERE idempotency_hash = ?1",
                params![hash],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            None => {
                tx.execute(
                    "INSERT INTO gl_entries (
                        idempotency_hash, party_type, party, posting_date, voucher_type, voucher_no,
                        debit, credit, remarks, sequence_key, is_cancelled
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    params![
                        hash,
                        CUSTOMER_PARTY,
                        record.customer,
                        m.posting_date,
                        m.category.as_str(),
                        m.reference_id,
                        debit,
                        credit,
                        m.remarks,
                        m.sequence_key,
                        record.is_cancelled,
                    ],
                )?;
                stats.inserted += 1;
            }
            Some(id) => {
                let changed = tx.execute(
                    "UPDATE gl_entries
                     SET posting_date = ?2, debit = ?3, credit = ?4, remarks = ?5, is_cancelled = ?6
                     WHERE id = ?1
                       AND (posting_date != ?2 OR debit != ?3 OR credit != ?4
                            OR remarks != ?5 OR is_cancelled != ?6)",
                    params![id, m.posting_date, debit, credit, m.remarks, record.is_cancelled],
                )?;

                if changed > 0 {
                    debug!(voucher = %m.reference_id, "ledger entry updated on re-import");
                    stats.updated += 1;
                } else {
                    stats.duplicates += 1;
                }
            }
        }
    }

    tx.commit()?;
    info!(
        inserted = stats.inserted,
        updated = stats.updated,
        duplicates = stats.duplicates,
        "imported ledger movements"
    );

    Ok(stats)
}

/// Upsert customers; an imported address replaces the customer's previous ones
pub fn insert_customers(conn: &Connection, customers: &[CustomerInfo]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;

    for customer in customers {
        tx.execute(
            "INSERT INTO customers (id, customer_name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET customer_name = excluded.customer_name",
            params![customer.identifier, customer.display_name],
        )?;

        if let Some(address) = &customer.address {
            tx.execute(
                "DELETE FROM addresses WHERE customer_id = ?1",
                params![customer.identifier],
            )?;
            tx.execute(
                "INSERT INTO addresses (
                    customer_id, link_order, address_line1, address_line2, city, state, pincode, country
                ) VALUES (?1, 0, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    customer.identifier,
                    address.address_line1,
                    address.address_line2,
                    address.city,
                    address.state,
                    address.pincode,
                    address.country,
                ],
            )?;
        }
    }

    tx.commit()?;
    info!(count = customers.len(), "imported customers");

    Ok(customers.len())
}

/// Upsert invoices; outstanding amounts are refreshed on re-import
pub fn insert_invoices(conn: &Connection, invoices: &[InvoiceRecord]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;

    for invoice in invoices {
        tx.execute(
            "INSERT INTO sales_invoices (invoice_no, customer_id, posting_date, outstanding_amount, is_cancelled)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(invoice_no) DO UPDATE SET
                customer_id = excluded.customer_id,
                posting_date = excluded.posting_date,
                outstanding_amount = excluded.outstanding_amount,
                is_cancelled = excluded.is_cancelled",
            params![
                invoice.invoice_no,
                invoice.customer,
                invoice.posting_date,
                invoice.outstanding_amount.to_string(),
                invoice.is_cancelled,
            ],
        )?;
    }

    tx.commit()?;
    info!(count = invoices.len(), "imported invoices");

    Ok(invoices.len())
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM gl_entries", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// READ SIDE
// ============================================================================

/// Decimal stored as TEXT; bad values surface as conversion errors
fn decimal_column(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(raw.trim())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read-only view of a ledger database
pub struct SqliteLedger<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteLedger<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        SqliteLedger { conn }
    }
}

impl LedgerRepository for SqliteLedger<'_> {
    fn balance_before(&self, customer: &str, before: NaiveDate) -> Result<Decimal> {
        let mut stmt = self.conn.prepare(
            "SELECT debit, credit
             FROM gl_entries
             WHERE party_type = ?1 AND party = ?2 AND posting_date < ?3 AND is_cancelled = 0",
        )?;

        let mut balance = Decimal::ZERO;
        let mut rows = stmt.query(params![CUSTOMER_PARTY, customer, before])?;
        while let Some(row) = rows.next()? {
            let signed = decimal_column(row, 0)?
                .checked_sub(decimal_column(row, 1)?)
                .ok_or_else(|| anyhow!("amount overflow in ledger entry for {}", customer))?;
            balance = add_amount(balance, signed)?;
        }

        Ok(balance)
    }

    fn movements_between(
        &self,
        customer: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LedgerMovement>> {
        let mut stmt = self.conn.prepare(
            "SELECT posting_date, voucher_type, voucher_no, debit, credit, remarks, sequence_key
             FROM gl_entries
             WHERE party_type = ?1 AND party = ?2
               AND posting_date BETWEEN ?3 AND ?4
               AND is_cancelled = 0
             ORDER BY posting_date ASC, sequence_key ASC, id ASC",
        )?;

        let movements = stmt
            .query_map(params![CUSTOMER_PARTY, customer, start, end], |row| {
                let voucher_type: String = row.get(1)?;
                Ok(LedgerMovement {
                    posting_date: row.get(0)?,
                    category: Category::parse(&voucher_type),
                    reference_id: row.get(2)?,
                    debit_amount: decimal_column(row, 3)?,
                    credit_amount: decimal_column(row, 4)?,
                    remarks: row.get(5)?,
                    sequence_key: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read ledger movements for {}", customer))?;

        debug!(customer, count = movements.len(), "loaded movements from sqlite");
        Ok(movements)
    }
}

impl InvoiceRepository for SqliteLedger<'_> {
    fn outstanding_invoices(&self, customer: &str) -> Result<Vec<OutstandingInvoice>> {
        let mut stmt = self.conn.prepare(
            "SELECT posting_date, outstanding_amount
             FROM sales_invoices
             WHERE customer_id = ?1 AND is_cancelled = 0
             ORDER BY posting_date ASC, invoice_no ASC",
        )?;

        let invoices = stmt
            .query_map(params![customer], |row| {
                Ok(OutstandingInvoice {
                    posting_date: row.get(0)?,
                    outstanding_amount: decimal_column(row, 1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read invoices for {}", customer))?;

        // TEXT amounts cannot be compared in SQL, so the > 0 filter runs here
        Ok(invoices
            .into_iter()
            .filter(|inv| inv.outstanding_amount > Decimal::ZERO)
            .collect())
    }
}

impl CustomerDirectory for SqliteLedger<'_> {
    fn find_customer(&self, customer: &str) -> Result<Option<CustomerInfo>> {
        let display_name: Option<String> = self
            .conn
            .query_row(
                "SELECT customer_name FROM customers WHERE id = ?1",
                params![customer],
                |row| row.get(0),
            )
            .optional()?;

        let Some(display_name) = display_name else {
            return Ok(None);
        };

        let address = self
            .conn
            .query_row(
                "SELECT address_line1, address_line2, city, state, pincode, country
                 FROM addresses
                 WHERE customer_id = ?1
                 ORDER BY link_order ASC, id ASC
                 LIMIT 1",
                params![customer],
                |row| {
                    Ok(Address {
                        address_line1: row.get(0)?,
                        address_line2: row.get(1)?,
                        city: row.get(2)?,
                        state: row.get(3)?,
                        pincode: row.get(4)?,
                        country: row.get(5)?,
                    })
                },
            )
            .optional()?;

        Ok(Some(CustomerInfo {
            identifier: customer.to_string(),
            display_name,
            address,
        }))
    }
}
