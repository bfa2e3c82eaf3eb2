// ⏳ Aging Summarizer - Bucket outstanding invoices by age
//
// age_days = reference_date - posting_date
// Each invoice lands in exactly one bucket; total_due accumulates every
// bucketed amount, so total_due == sum of buckets for any input.

use crate::config::AgingThresholds;
use crate::error::Result;
use crate::model::{add_amount, AgingBuckets, OutstandingInvoice};
use crate::repository::InvoiceRepository;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingBucket {
    Current,
    Days1To30,
    Days31To60,
    Days61To90,
    Over90,
}

impl AgingBucket {
    pub fn label(&self) -> &'static str {
        match self {
            AgingBucket::Current => "Current",
            AgingBucket::Days1To30 => "1-30 Days",
            AgingBucket::Days31To60 => "31-60 Days",
            AgingBucket::Days61To90 => "61-90 Days",
            AgingBucket::Over90 => "Over 90 Days",
        }
    }
}

pub struct AgingSummarizer {
    thresholds: AgingThresholds,
}

impl AgingSummarizer {
    pub fn new() -> Self {
        AgingSummarizer {
            thresholds: AgingThresholds::default(),
        }
    }

    pub fn with_thresholds(thresholds: AgingThresholds) -> Self {
        AgingSummarizer { thresholds }
    }

    /// Bucket for an invoice `age_days` old; negative ages count as current
    pub fn bucket_for(&self, age_days: i64) -> AgingBucket {
        let t = &self.thresholds;
        if age_days <= t.current_max_days {
            AgingBucket::Current
        } else if age_days <= t.days_1_30_max {
            AgingBucket::Days1To30
        } else if age_days <= t.days_31_60_max {
            AgingBucket::Days31To60
        } else if age_days <= t.days_61_90_max {
            AgingBucket::Days61To90
        } else {
            AgingBucket::Over90
        }
    }

    pub fn summarize(&self, invoices: &[OutstandingInvoice], reference_date: NaiveDate) -> Result<AgingBuckets> {
        let mut buckets = AgingBuckets::default();

        for invoice in invoices {
            let age_days = (reference_date - invoice.posting_date).num_days();
            let amount = invoice.outstanding_amount;

            let slot = match self.bucket_for(age_days) {
                AgingBucket::Current => &mut buckets.current,
                AgingBucket::Days1To30 => &mut buckets.days_1_30,
                AgingBucket::Days31To60 => &mut buckets.days_31_60,
                AgingBucket::Days61To90 => &mut buckets.days_61_90,
                AgingBucket::Over90 => &mut buckets.over_90,
            };
            *slot = add_amount(*slot, amount)?;
            buckets.total_due = add_amount(buckets.total_due, amount)?;
        }

        Ok(buckets)
    }

    /// Fetch the customer's outstanding invoices and summarize them
    pub fn summarize_customer<R: InvoiceRepository + ?Sized>(
        &self,
        invoices: &R,
        customer: &str,
        reference_date: NaiveDate,
    ) -> Result<AgingBuckets> {
        let outstanding = invoices.outstanding_invoices(customer)?;
        debug!(customer, count = outstanding.len(), %reference_date, "aging outstanding invoices");

        self.summarize(&outstanding, reference_date)
    }
}

impl Default for AgingSummarizer {
    fn default() -> Self {
        Self::new()
    }
}
