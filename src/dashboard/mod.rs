//! Dashboard module
//!
//! Serves the admin dashboard: summary cards and the latest transactions for
//! a date filter, fetched from the payments backend.

mod handlers;
mod loader;
mod models;

pub use handlers::get_dashboard;
pub use loader::{DashboardLoader, DashboardSource};
pub use models::{
    AggregateValue, DashboardAggregates, DashboardData, DashboardEnvelope, SummaryCard,
    transform_envelope,
};
