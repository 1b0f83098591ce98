// src/serve/mod.rs

use std::convert::Infallible;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

use crate::query::{QueryError, TableQueryService};

#[derive(Serialize)]
struct TablesResponse {
    tables: Vec<String>,
}

#[derive(Serialize)]
struct TableDetailsResponse {
    table_name: String,
    row_names: Vec<String>,
    column_names: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

#[derive(Serialize)]
struct RowSumResponse {
    table_name: String,
    row_name: String,
    sum: f64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableDetailsParams {
    table_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RowSumParams {
    table_name: Option<String>,
    row_name: Option<String>,
}

/// All routes of the table API. The query service is shared into every
/// handler; requests only ever read it.
pub fn routes(
    service: Arc<TableQueryService>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path("health").and(warp::get()).and_then(health_check);

    let list = warp::path("list_tables")
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(list_tables);

    let details = warp::path("get_table_details")
        .and(warp::get())
        .and(warp::query::<TableDetailsParams>())
        .and(with_service(service.clone()))
        .and_then(get_table_details);

    let sum = warp::path("row_sum")
        .and(warp::get())
        .and(warp::query::<RowSumParams>())
        .and(with_service(service))
        .and_then(row_sum);

    health.or(list).or(details).or(sum)
}

fn with_service(
    service: Arc<TableQueryService>,
) -> impl Filter<Extract = (Arc<TableQueryService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

async fn health_check() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "sheetserve"
    })))
}

async fn list_tables(service: Arc<TableQueryService>) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&TablesResponse {
        tables: service.list_tables(),
    }))
}

async fn get_table_details(
    params: TableDetailsParams,
    service: Arc<TableQueryService>,
) -> Result<impl Reply, Rejection> {
    let result = require(params.table_name, "table_name")
        .and_then(|name| service.table_details(&name));
    let reply = match result {
        Ok(details) => json_ok(&TableDetailsResponse {
            table_name: details.table_name,
            row_names: details.row_names,
            column_names: details.column_names,
            values: details.values,
        }),
        Err(err) => error_reply(&err),
    };
    Ok(reply)
}

async fn row_sum(
    params: RowSumParams,
    service: Arc<TableQueryService>,
) -> Result<impl Reply, Rejection> {
    let reply = match row_sum_response(params, &service) {
        Ok(response) => json_ok(&response),
        Err(err) => error_reply(&err),
    };
    Ok(reply)
}

fn row_sum_response(
    params: RowSumParams,
    service: &TableQueryService,
) -> Result<RowSumResponse, QueryError> {
    let table_name = require(params.table_name, "table_name")?;
    let row_name = require(params.row_name, "row_name")?;
    let sum = service.row_sum(&table_name, &row_name)?;
    Ok(RowSumResponse {
        table_name,
        row_name,
        sum: round2(sum),
    })
}

fn require(value: Option<String>, name: &'static str) -> Result<String, QueryError> {
    value.ok_or(QueryError::MissingParameter(name))
}

/// Reported sums are rounded to two decimal places, ties to even; the
/// service itself keeps the exact value.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn json_ok<T: Serialize>(body: &T) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(body), StatusCode::OK)
}

fn error_reply(err: &QueryError) -> WithStatus<Json> {
    let status = match err {
        QueryError::TableNotFound { .. } | QueryError::RowNotFound { .. } => StatusCode::NOT_FOUND,
        QueryError::MissingParameter(_) => StatusCode::BAD_REQUEST,
    };
    warn!(status = %status, "request failed: {err}");
    warp::reply::with_status(
        warp::reply::json(&ErrorResponse {
            error: err.to_string(),
            details: None,
        }),
        status,
    )
}
