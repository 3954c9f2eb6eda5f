mod models;
mod transform;

pub use models::{
    DisplayTransaction, ProviderDetails, RawTransaction, TransactionStatus, TransactionType,
};
pub use transform::{MalformedAmountPolicy, transform, transform_with_policy};
