//! Transaction records as sent by the payments backend and as shown in the
//! dashboard's transaction table.

use serde::{Deserialize, Deserializer, Serialize};

/// The processing state of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// The provider has not answered yet.
    Pending,
    /// The provider accepted the payment.
    Successful,
    /// The provider declined the payment or it timed out.
    Failed,
    /// A status this dashboard does not know about, kept verbatim.
    #[serde(untagged)]
    Other(String),
}

/// The payment channel a transaction went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// A mobile wallet payment.
    Wallet,
    /// A channel this dashboard does not know about, kept verbatim.
    #[serde(untagged)]
    Other(String),
}

/// The payment provider (e.g. a mobile wallet) that handled a transaction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderDetails {
    /// The backend's ID for the provider.
    #[serde(default)]
    pub id: Option<i64>,
    /// The provider's display name, e.g. "JazzCash".
    #[serde(default)]
    pub name: Option<String>,
    /// The customer's mobile number with the provider.
    #[serde(default)]
    pub msisdn: Option<String>,
}

/// A transaction exactly as the backend ledger reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTransaction {
    /// The backend's ID for the transaction.
    pub transaction_id: String,
    /// When the transaction happened, as an ISO-8601 timestamp.
    pub date_time: String,
    /// A decimal string, e.g. "1500.255".
    pub original_amount: String,
    /// The processing state.
    pub status: TransactionStatus,
    /// The payment channel.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The provider's message, e.g. "Approved". Null is read as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub response_message: String,
    /// Whether the transaction has been settled with the merchant.
    pub settlement: bool,
    /// The merchant's own reference for the transaction.
    pub merchant_transaction_id: String,
    /// The provider that handled the transaction, if known.
    #[serde(rename = "providerDetails", default)]
    pub provider_details: Option<ProviderDetails>,
    /// Whether the merchant has been sent the result callback.
    pub callback_sent: bool,

    /// The amount paid out to the merchant, as a decimal string.
    #[serde(default)]
    pub settled_amount: Option<String>,
    /// The merchant's balance after the transaction, as a decimal string.
    #[serde(default)]
    pub balance: Option<String>,
    /// The backend's ID for the merchant.
    #[serde(default)]
    pub merchant_id: Option<i64>,
    /// The backend's ID for the paying customer.
    #[serde(default)]
    pub customer_id: Option<i64>,
    /// The backend's ID for the provider.
    #[serde(rename = "providerId", default)]
    pub provider_id: Option<i64>,
    /// When the backend created the record.
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    /// When the backend last changed the record.
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A row of the dashboard's transaction table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayTransaction {
    /// The backend's ID for the transaction.
    pub transaction_id: String,
    /// The merchant's own reference for the transaction.
    pub merchant_transaction_id: String,
    /// The provider MSISDN, or an empty string.
    pub account_no: String,
    /// The backend's timestamp, unchanged.
    pub date: String,
    /// The amount truncated to cents, e.g. "1,234.50".
    pub amount: String,
    /// The provider's message.
    pub message: String,
    /// The processing state.
    pub status: TransactionStatus,
    /// The provider name, or an empty string.
    pub provider: String,
    /// Whether the transaction has been settled with the merchant.
    pub settlement: bool,
    /// The payment channel.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Whether the merchant has been sent the result callback.
    pub callback_sent: bool,
}
