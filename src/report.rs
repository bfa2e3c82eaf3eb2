// 📊 Report View - Grid projection of a statement (Date / Description / Amount / Balance)
// A projection of `Statement::rows`, not a separate computation.

use crate::model::{Statement, StatementRow};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Date,
    Data,
    Currency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportColumn {
    pub label: String,
    pub fieldname: String,
    pub fieldtype: FieldType,
    pub width: u16,
}

impl ReportColumn {
    fn new(label: &str, fieldname: &str, fieldtype: FieldType, width: u16) -> Self {
        ReportColumn {
            label: label.to_string(),
            fieldname: fieldname.to_string(),
            fieldtype,
            width,
        }
    }
}

/// One grid row; field names match the column `fieldname`s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub balance: Decimal,
}

impl From<&StatementRow> for ReportRow {
    fn from(row: &StatementRow) -> Self {
        ReportRow {
            date: row.date,
            description: row.description.clone(),
            amount: row.amount,
            balance: row.running_balance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTable {
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<ReportRow>,
}

/// Display labels of the grid columns; the caller supplies translated text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLabels {
    pub date: String,
    pub description: String,
    pub amount: String,
    pub balance: String,
}

impl Default for ColumnLabels {
    fn default() -> Self {
        ColumnLabels {
            date: "Date".to_string(),
            description: "Description".to_string(),
            amount: "Amount".to_string(),
            balance: "Balance".to_string(),
        }
    }
}

impl ColumnLabels {
    pub(crate) fn is_complete(&self) -> bool {
        [&self.date, &self.description, &self.amount, &self.balance]
            .iter()
            .all(|label| !label.trim().is_empty())
    }
}

pub fn statement_columns() -> Vec<ReportColumn> {
    statement_columns_with(&ColumnLabels::default())
}

pub fn statement_columns_with(labels: &ColumnLabels) -> Vec<ReportColumn> {
    vec![
        ReportColumn::new(&labels.date, "date", FieldType::Date, 100),
        ReportColumn::new(&labels.description, "description", FieldType::Data, 250),
        ReportColumn::new(&labels.amount, "amount", FieldType::Currency, 120),
        ReportColumn::new(&labels.balance, "balance", FieldType::Currency, 120),
    ]
}

impl Statement {
    /// Tabular view of the statement rows
    pub fn report(&self) -> ReportTable {
        self.report_with(&ColumnLabels::default())
    }

    /// Tabular view with caller-supplied column labels
    pub fn report_with(&self, labels: &ColumnLabels) -> ReportTable {
        ReportTable {
            columns: statement_columns_with(labels),
            rows: self.rows.iter().map(ReportRow::from).collect(),
        }
    }
}

/// Write the grid as CSV, headed by the column labels
pub fn write_report_csv<W: Write>(table: &ReportTable, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(table.columns.iter().map(|c| c.label.as_str()))
        .context("Failed to write CSV header")?;

    for row in &table.rows {
        wtr.write_record([
            row.date.to_string(),
            row.description.clone(),
            format!("{:.2}", row.amount),
            format!("{:.2}", row.balance),
        ])
        .context("Failed to write CSV row")?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgingBuckets, CustomerInfo, DateRange, RowKind};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_statement() -> Statement {
        Statement {
            customer: CustomerInfo {
                identifier: "ACME".to_string(),
                display_name: "Acme Corporation".to_string(),
                address: None,
            },
            rows: vec![
                StatementRow::balance_forward(date(2025, 1, 1), "Balance Forward", dec!(100)),
                StatementRow {
                    date: date(2025, 1, 15),
                    description: "Payment #PAY-1, final".to_string(),
                    amount: dec!(-40),
                    running_balance: dec!(60),
                    kind: RowKind::Movement,
                },
            ],
            opening_balance: dec!(100),
            ending_balance: dec!(60),
            aging: AgingBuckets::default(),
            statement_id: "abc123".to_string(),
            statement_date: date(2025, 2, 1),
            date_range: DateRange { start: date(2025, 1, 1), end: date(2025, 1, 31) },
        }
    }

    #[test]
    fn test_report_projection() {
        let table = create_test_statement().report();

        let labels: Vec<&str> = table.columns.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Date", "Description", "Amount", "Balance"]);
        assert_eq!(table.columns[1].width, 250);
        assert_eq!(table.columns[2].fieldtype, FieldType::Currency);

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].balance, dec!(100));
        assert_eq!(table.rows[1].amount, dec!(-40));
    }

    #[test]
    fn test_report_with_translated_labels() {
        let labels = ColumnLabels {
            date: "Fecha".to_string(),
            description: "Descripción".to_string(),
            amount: "Importe".to_string(),
            balance: "Saldo".to_string(),
        };
        let table = create_test_statement().report_with(&labels);

        let labels: Vec<&str> = table.columns.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Fecha", "Descripción", "Importe", "Saldo"]);
        // Field names stay stable for consumers
        assert_eq!(table.columns[3].fieldname, "balance");
        assert_eq!(table.rows.len(), 2);

        let mut out = Vec::new();
        write_report_csv(&table, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("Fecha,Descripción,Importe,Saldo"));
    }

    #[test]
    fn test_write_report_csv() {
        let table = create_test_statement().report();
        let mut out = Vec::new();

        write_report_csv(&table, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Date,Description,Amount,Balance");
        assert_eq!(lines[1], "2025-01-01,Balance Forward,0.00,100.00");
        assert_eq!(lines[2], "2025-01-15,\"Payment #PAY-1, final\",-40.00,60.00");

        println!("✅ Report CSV test passed");
    }
}
