use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde::Deserialize;
use thiserror::Error;
use tokio::task;
use tracing::{error, info};

use featurelens_core::{
    load_detail, query_features, FeatureDetail, FeatureIndexStore, FsArtifactSource, Page,
    SortOption, DEFAULT_PER_PAGE,
};

struct AppState {
    store: FeatureIndexStore,
    source: FsArtifactSource,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();
    let source = FsArtifactSource::from_env();
    // The index is loaded once here; every request reads it through the Arc.
    let store = FeatureIndexStore::load(&source)?;
    info!(features = store.len(), root = %source.root().display(), "feature index loaded");
    let state = Arc::new(AppState { store, source });
    let app = Router::new()
        .route("/features", get(handle_list))
        .route("/features/:id", get(handle_detail))
        .with_state(state);
    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
        .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ListParams {
    q: Option<String>,
    sort: Option<String>,
    page: Option<i64>,
    per_page: Option<usize>,
}

async fn handle_list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Json<Page> {
    let query = params.q.unwrap_or_default();
    // Unknown sort names fall through to None: input order is preserved.
    let option = params.sort.as_deref().and_then(SortOption::parse);
    let page = params.page.unwrap_or(1).max(1) as usize;
    let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE);
    Json(query_features(&state.store, &query, option, page, per_page))
}

async fn handle_detail(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<u32>,
) -> Result<Json<FeatureDetail>, AppError> {
    let source = state.source.clone();
    let detail = task::spawn_blocking(move || load_detail(&source, id))
        .await
        .map_err(AppError::internal)?;
    match detail {
        Ok(Some(detail)) => Ok(Json(detail)),
        Ok(None) => Err(AppError::NotFound(format!(
            "no detail record for feature {id}"
        ))),
        // Malformed records fail this lookup only; the store stays serving.
        Err(err) => Err(AppError::internal(err)),
    }
}

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn internal<E: Into<anyhow::Error>>(err: E) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::Internal(err) => {
                error!("internal_error" = %err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}
