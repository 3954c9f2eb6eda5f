//! The dashboard endpoint: resolves the requested date filter, loads the data
//! for it from the payments backend and returns it shaped for display.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::TOKEN_COOKIE,
    backend::BackendClient,
    dashboard::{DashboardLoader, SummaryCard},
    date_range::{DatePreset, DateInterval, DateRangeResolver, WireInterval},
    transaction::{DisplayTransaction, MalformedAmountPolicy, transform_with_policy},
};

/// The state needed to serve the dashboard.
#[derive(Clone)]
pub struct DashboardState {
    pub resolver: Arc<DateRangeResolver>,
    pub loader: Arc<DashboardLoader<BackendClient>>,
    pub amount_policy: MalformedAmountPolicy,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            resolver: state.resolver.clone(),
            loader: state.loader.clone(),
            amount_policy: state.amount_policy,
        }
    }
}

/// The date filter for the dashboard.
///
/// `start` and `end` ("YYYY-MM-DD") select a custom range and take precedence
/// over `range`, the name of a preset. With neither, all time is shown.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    filter: String,
    interval: WireInterval,
    aggregates: Vec<SummaryCard>,
    transactions: Vec<DisplayTransaction>,
}

/// Get the dashboard data for the requested date filter as JSON.
///
/// Responds with 204 No Content if a newer dashboard request from the same
/// session arrived before this one finished.
pub async fn get_dashboard(
    State(state): State<DashboardState>,
    jar: CookieJar,
    Query(query): Query<DashboardQuery>,
) -> Response {
    match dashboard_response(&state, &jar, query).await {
        Ok(Some(response)) => Json(response).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

async fn dashboard_response(
    state: &DashboardState,
    jar: &CookieJar,
    query: DashboardQuery,
) -> Result<Option<DashboardResponse>, Error> {
    let token = jar
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .ok_or(Error::NotAuthenticated)?;

    let (filter, interval) = resolve_filter(&state.resolver, query)?;

    tracing::debug!("Loading dashboard for \"{filter}\" ({interval:?})");

    let Some(data) = state.loader.load(&token, &interval).await? else {
        return Ok(None);
    };

    let transactions = transform_with_policy(data.transactions(), state.amount_policy)?;

    Ok(Some(DashboardResponse {
        filter,
        interval: interval.to_wire()?,
        aggregates: data.aggregates.cards(),
        transactions,
    }))
}

fn resolve_filter(
    resolver: &DateRangeResolver,
    query: DashboardQuery,
) -> Result<(String, DateInterval), Error> {
    match (query.start, query.end) {
        (Some(start), Some(end)) => Ok((
            DatePreset::CustomDate.to_string(),
            resolver.resolve_custom_str(&start, &end)?,
        )),
        (None, None) => {
            let filter = query
                .range
                .unwrap_or_else(|| DatePreset::AllTime.to_string());
            let interval = resolver.resolve(&filter)?;

            Ok((filter, interval))
        }
        _ => Err(Error::IncompleteCustomRange),
    }
}
