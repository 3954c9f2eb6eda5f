//! Projects backend transactions into dashboard table rows.

use crate::{
    Error,
    amount::{format_amount, parse_amount, truncate_to_cents},
    transaction::models::{DisplayTransaction, RawTransaction},
};

/// What to do with a transaction whose `original_amount` is not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedAmountPolicy {
    /// Keep the transaction and show its amount as "NaN".
    #[default]
    PropagateAsInvalid,
    /// Fail the whole transform with [Error::MalformedAmount].
    Reject,
}

/// Convert `transactions` into display rows, one per transaction and in the
/// same order.
///
/// Malformed amounts are shown as "NaN", see [MalformedAmountPolicy::PropagateAsInvalid].
pub fn transform(transactions: &[RawTransaction]) -> Vec<DisplayTransaction> {
    transactions
        .iter()
        .map(|transaction| {
            let amount = parse_amount(&transaction.original_amount).unwrap_or(f64::NAN);
            to_display(transaction, amount)
        })
        .collect()
}

/// Like [transform], with malformed amounts handled according to `policy`.
///
/// # Errors
///
/// Under [MalformedAmountPolicy::Reject], returns [Error::MalformedAmount] for
/// the first transaction whose amount is not a finite number.
pub fn transform_with_policy(
    transactions: &[RawTransaction],
    policy: MalformedAmountPolicy,
) -> Result<Vec<DisplayTransaction>, Error> {
    match policy {
        MalformedAmountPolicy::PropagateAsInvalid => Ok(transform(transactions)),
        MalformedAmountPolicy::Reject => transactions
            .iter()
            .map(|transaction| {
                let amount = parse_amount(&transaction.original_amount)
                    .filter(|amount| amount.is_finite())
                    .ok_or_else(|| Error::MalformedAmount {
                        transaction_id: transaction.transaction_id.clone(),
                        amount: transaction.original_amount.clone(),
                    })?;

                Ok(to_display(transaction, amount))
            })
            .collect(),
    }
}

fn to_display(transaction: &RawTransaction, amount: f64) -> DisplayTransaction {
    let provider_details = transaction.provider_details.as_ref();

    DisplayTransaction {
        transaction_id: transaction.transaction_id.clone(),
        merchant_transaction_id: transaction.merchant_transaction_id.clone(),
        account_no: provider_details
            .and_then(|details| details.msisdn.clone())
            .unwrap_or_default(),
        date: transaction.date_time.clone(),
        amount: format_amount(truncate_to_cents(amount)),
        message: transaction.response_message.clone(),
        status: transaction.status.clone(),
        provider: provider_details
            .and_then(|details| details.name.clone())
            .unwrap_or_default(),
        settlement: transaction.settlement,
        transaction_type: transaction.transaction_type.clone(),
        callback_sent: transaction.callback_sent,
    }
}
