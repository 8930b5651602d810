use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::Duration;

use tracing::{error, info};

use crate::query::{ListParams, QueryError, QueryService};
use tower_http::services::ServeDir;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{log_requests, metrics, state::*, RequestsLoggingLevel, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            QueryError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            QueryError::EmptyQuery => (StatusCode::BAD_REQUEST, self.to_string()),
            QueryError::StoreUnavailable(reason) => {
                error!("Catalog store unavailable: {}", reason);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "data unavailable".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

fn json_or_error<T: Serialize>(result: Result<T, QueryError>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn server_info(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

async fn get_home(State(service): State<SharedQueryService>) -> Response {
    json_or_error(service.home())
}

async fn list_movies(
    State(service): State<SharedQueryService>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let params = ListParams::from_query_map(&query);
    json_or_error(service.list_movies_filtered(&params))
}

async fn get_movie(
    State(service): State<SharedQueryService>,
    Path(id): Path<String>,
) -> Response {
    json_or_error(service.get_movie_detail(&id))
}

async fn search(
    State(service): State<SharedQueryService>,
    Query(params): Query<SearchParams>,
) -> Response {
    json_or_error(service.search(&params.q))
}

async fn get_stats(State(service): State<SharedQueryService>) -> Response {
    json_or_error(service.stats())
}

async fn get_genres(State(service): State<SharedQueryService>) -> Response {
    json_or_error(service.genres())
}

async fn get_storage(State(service): State<SharedQueryService>) -> Response {
    json_or_error(service.storage_overview())
}

pub fn make_app(config: ServerConfig, query_service: Arc<QueryService>) -> Result<Router> {
    let state = ServerState::new(config.clone(), query_service);

    let api_routes: Router = Router::new()
        .route("/home", get(get_home))
        .route("/movies", get(list_movies))
        .route("/movies/{id}", get(get_movie))
        .route("/search", get(search))
        .route("/stats", get(get_stats))
        .route("/genres", get(get_genres))
        .route("/storage", get(get_storage))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(server_info))
            .with_state(state.clone()),
    };

    let app: Router = home_router
        .nest("/v1", api_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics::metrics_handler))
}

pub async fn run_server(
    query_service: Arc<QueryService>,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    metrics_port: u16,
    frontend_dir_path: Option<String>,
) -> Result<()> {
    let config = ServerConfig {
        requests_logging_level,
        port,
        metrics_port,
        frontend_dir_path,
    };
    let app = make_app(config, query_service)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Serving metrics on port {}", metrics_port);
    tokio::try_join!(
        async { axum::serve(listener, app).await },
        async { axum::serve(metrics_listener, make_metrics_app()).await },
    )?;
    Ok(())
}
