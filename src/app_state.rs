//! Implements a struct that holds the state of the REST server.

use std::sync::Arc;

use crate::{
    Error,
    auth::AccessGate,
    backend::BackendClient,
    clock::Clock,
    config::AppConfig,
    dashboard::DashboardLoader,
    date_range::DateRangeResolver,
    transaction::MalformedAmountPolicy,
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// Decides who may see the dashboard.
    pub gate: Arc<AccessGate>,

    /// Turns date filters into intervals in the local timezone.
    pub resolver: Arc<DateRangeResolver>,

    /// The payments backend.
    pub backend: BackendClient,

    /// Loads dashboard data from [AppState::backend], one load per session at a time.
    pub loader: Arc<DashboardLoader<BackendClient>>,

    /// What to do with transactions whose amount is not a number.
    pub amount_policy: MalformedAmountPolicy,
}

impl AppState {
    /// Create a new [AppState] from `config`, reading the time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL or the timezone in `config` is invalid.
    pub fn new(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, Error> {
        let backend = BackendClient::new(&config.backend_url)?;
        let resolver = DateRangeResolver::new(
            clock.clone(),
            &config.local_timezone,
            config.unknown_preset_policy,
        )?;

        Ok(Self {
            gate: Arc::new(AccessGate::new(config.jwt_secret.as_bytes(), clock)),
            resolver: Arc::new(resolver),
            loader: Arc::new(DashboardLoader::new(backend.clone())),
            backend,
            amount_policy: config.malformed_amount_policy,
        })
    }
}
