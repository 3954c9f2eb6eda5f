//! The admin dashboard payload returned by the payments backend, and the
//! summary cards derived from it.

use serde::{Deserialize, Serialize};

use crate::{
    amount::{format_amount, parse_amount},
    transaction::{DisplayTransaction, RawTransaction, transform},
};

/// The response envelope of the backend's admin dashboard endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardEnvelope {
    /// The dashboard data, absent when the backend has nothing to report.
    #[serde(default)]
    pub data: Option<DashboardData>,
}

/// The dashboard data for one date interval.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardData {
    /// The most recent transactions in the interval, newest first.
    #[serde(rename = "latestTransactions", default)]
    pub latest_transactions: Option<Vec<RawTransaction>>,
    /// The totals for the interval.
    #[serde(flatten)]
    pub aggregates: DashboardAggregates,
}

impl DashboardData {
    /// The most recent transactions, or an empty slice if the backend sent none.
    pub fn transactions(&self) -> &[RawTransaction] {
        self.latest_transactions.as_deref().unwrap_or(&[])
    }
}

/// The display rows for the transactions in `envelope`, or none if the
/// envelope has no data.
pub fn transform_envelope(envelope: &DashboardEnvelope) -> Vec<DisplayTransaction> {
    envelope
        .data
        .as_ref()
        .map(|data| transform(data.transactions()))
        .unwrap_or_default()
}

/// A total reported by the backend, which may arrive as a number or as a
/// decimal string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AggregateValue {
    /// A JSON number.
    Number(f64),
    /// A decimal string, e.g. "152340.5".
    Text(String),
}

impl AggregateValue {
    /// The numeric value; text that is not a number gives NaN.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Number(number) => *number,
            Self::Text(text) => parse_amount(text).unwrap_or(f64::NAN),
        }
    }
}

/// Totals shown in the cards above the transaction table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardAggregates {
    /// The number of merchants.
    pub total_merchants: Option<AggregateValue>,
    /// Money collected in the interval.
    pub total_income: Option<AggregateValue>,
    /// Money collected today.
    pub today_income: Option<AggregateValue>,
    /// Collected money not yet paid out.
    pub total_balance_to_disburse: Option<AggregateValue>,
    /// Money paid out. The backend spells it this way.
    pub total_disbursment_amount: Option<AggregateValue>,
    /// Settled money still held for merchants.
    pub total_settlement_balance: Option<AggregateValue>,
    /// Money settled with merchants.
    pub total_settlement_amount: Option<AggregateValue>,
    /// Money settled in USDT.
    pub total_usdt_settlement: Option<AggregateValue>,
    /// Settlements still to be made.
    pub remaining_settlements: Option<AggregateValue>,
    /// Money refunded to customers.
    pub total_refund: Option<AggregateValue>,
}

/// A titled, formatted total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryCard {
    /// The card heading, e.g. "Today Collection".
    pub title: &'static str,
    /// Rounded to two decimal places with thousands separators. Missing totals
    /// are shown as "0.00".
    pub amount: String,
}

impl DashboardAggregates {
    /// The summary cards in display order.
    pub fn cards(&self) -> Vec<SummaryCard> {
        [
            ("Today Collection", &self.today_income),
            ("Total Collection", &self.total_income),
            ("Total Balance to Disbursement", &self.total_balance_to_disburse),
            ("Total Disbursement Amount", &self.total_disbursment_amount),
            ("Total Available Balance", &self.total_settlement_balance),
            ("Total Settlement Amount", &self.total_settlement_amount),
            ("USDT Settlement", &self.total_usdt_settlement),
            ("Remaining Settlement", &self.remaining_settlements),
            ("Total Refund", &self.total_refund),
            ("Total User", &self.total_merchants),
        ]
        .into_iter()
        .map(|(title, value)| SummaryCard {
            title,
            amount: format_amount(value.as_ref().map_or(0.0, AggregateValue::as_f64)),
        })
        .collect()
    }
}
