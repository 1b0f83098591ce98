use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use sheetserve::query::TableQueryService;
use sheetserve::{extract, serve, workbook};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let workbook_path =
        env::var("WORKBOOK_PATH").unwrap_or_else(|_| "data/capbudg.xlsx".to_string());
    let sheet = env::var("WORKBOOK_SHEET").ok();
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "9090".to_string())
        .parse()
        .unwrap_or(9090);

    // ─── 3) load + extract once, before accepting traffic ────────────
    let grid = workbook::load_grid(&workbook_path, sheet.as_deref())
        .with_context(|| format!("loading workbook '{}'", workbook_path))?;
    info!(path = %workbook_path, rows = grid.height(), "workbook loaded");

    let tables = extract::extract(&grid)
        .with_context(|| format!("extracting tables from '{}'", workbook_path))?;
    info!(count = tables.len(), names = ?tables.names(), "tables extracted");

    // ─── 4) serve ────────────────────────────────────────────────────
    let service = Arc::new(TableQueryService::new(tables));
    let routes = serve::routes(service);

    info!("listening on 0.0.0.0:{}", port);
    warp::serve(routes).run(([0, 0, 0, 0], port)).await;

    Ok(())
}
