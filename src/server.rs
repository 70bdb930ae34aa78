use crate::analytics::{self, MeiFilter, MeiSummary, TransportSummary};
use crate::config::AppConfig;
use crate::data;
use crate::maps::{self, MapChoice, MapError};
use crate::render::{self, EconomyView, Page, RawDataset};
use crate::types::Datasets;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Result of the one-time dataset load. Failures are kept as their rendered message.
type LoadOutcome = std::result::Result<Datasets, String>;

pub struct AppState {
    pub config: AppConfig,
    data: OnceCell<Arc<LoadOutcome>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            data: OnceCell::new(),
        }
    }

    /// Loads the registries on first use and hands out the same outcome afterwards,
    /// including a failed one.
    pub async fn datasets(&self) -> Arc<LoadOutcome> {
        self.data
            .get_or_init(|| async {
                let config = self.config.clone();
                let joined = tokio::task::spawn_blocking(move || data::load_datasets(&config)).await;
                let outcome = match joined {
                    Ok(Ok(datasets)) => Ok(datasets),
                    Ok(Err(e)) => Err(format!("{:#}", e)),
                    Err(e) => Err(e.to_string()),
                };
                if let Err(msg) = &outcome {
                    error!("Dataset load failed: {}", msg);
                }
                Arc::new(outcome)
            })
            .await
            .clone()
    }

    #[cfg(test)]
    fn is_loaded(&self) -> bool {
        self.data.initialized()
    }
}

#[derive(Deserialize)]
pub struct EconomyParams {
    mei: Option<String>,
    bairro: Option<String>,
}

#[derive(Deserialize)]
pub struct MapParams {
    mapa: Option<String>,
}

#[derive(Deserialize)]
pub struct RawDataParams {
    dataset: Option<String>,
    busca: Option<String>,
}

#[derive(Serialize)]
pub struct OverviewResponse {
    neighborhoods: usize,
    businesses: usize,
    bus_stops: usize,
    mei: MeiSummary,
    transport: TransportSummary,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(overview_handler))
        .route("/economia", get(economy_handler))
        .route("/transporte", get(transport_handler))
        .route("/classificacao", get(classification_handler))
        .route("/mapas", get(maps_handler))
        .route("/mapas/download", get(map_download_handler))
        .route("/dados", get(raw_data_handler))
        .route("/api/overview", get(overview_api_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let state = Arc::new(AppState::new(config));

    // Warm the cache so the first visitor does not wait on CSV parsing.
    let warm = state.clone();
    tokio::spawn(async move {
        if let Ok(datasets) = warm.datasets().await.as_ref() {
            info!(
                "Datasets ready: {} neighborhoods, {} businesses, {} bus stops",
                datasets.neighborhoods.len(),
                datasets.businesses.len(),
                datasets.bus_stops.len()
            );
        }
    });

    let app = router(state);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!("Starting server on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Renders `page` with the loaded registries, or the load error in their place.
/// Whole-table scans run on the blocking pool, like the load itself.
async fn render_page<F>(state: Arc<AppState>, page: Page, render: F) -> Response
where
    F: FnOnce(&AppState, &Datasets) -> String + Send + 'static,
{
    let outcome = state.datasets().await;
    let rendered = tokio::task::spawn_blocking(move || match outcome.as_ref() {
        Ok(datasets) => Ok(render(&state, datasets)),
        Err(msg) => Err(render::error_page(page, msg)),
    })
    .await;

    match rendered {
        Ok(Ok(html)) => Html(html).into_response(),
        Ok(Err(html)) => (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response(),
        Err(e) => {
            error!("Rendering {} failed: {}", page.path(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn overview_handler(State(state): State<Arc<AppState>>) -> Response {
    render_page(state, Page::Overview, |state, data| {
        render::overview_page(data, &state.config.display)
    })
    .await
}

async fn economy_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EconomyParams>,
) -> Response {
    let view = EconomyView {
        mei: MeiFilter::from_param(params.mei.as_deref()),
        neighborhood: params.bairro.filter(|b| !b.is_empty()),
    };
    render_page(state, Page::Economy, move |state, data| {
        render::economy_page(data, &state.config.display, &view)
    })
    .await
}

async fn transport_handler(State(state): State<Arc<AppState>>) -> Response {
    render_page(state, Page::Transport, |state, data| {
        render::transport_page(data, &state.config.display)
    })
    .await
}

async fn classification_handler(State(state): State<Arc<AppState>>) -> Response {
    render_page(state, Page::Classification, |_, _| render::classification_page()).await
}

async fn maps_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapParams>,
) -> Response {
    let choice = MapChoice::from_param(params.mapa.as_deref());
    render_page(state, Page::Maps, move |state, _| {
        render::maps_page(choice, maps::load_map(&state.config.input.map_dir, choice))
    })
    .await
}

async fn map_download_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapParams>,
) -> Response {
    let choice = MapChoice::from_param(params.mapa.as_deref());
    match maps::load_map(&state.config.input.map_dir, choice) {
        Ok(html) => (
            [
                (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", choice.file_name()),
                ),
            ],
            html,
        )
            .into_response(),
        Err(err @ MapError::NotFound(_)) => (StatusCode::NOT_FOUND, err.to_string()).into_response(),
        Err(err) => {
            error!("{}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

async fn raw_data_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RawDataParams>,
) -> Response {
    let dataset = RawDataset::from_param(params.dataset.as_deref());
    let query = params.busca.unwrap_or_default();
    render_page(state, Page::RawData, move |state, data| {
        render::raw_data_page(data, &state.config.display, dataset, &query)
    })
    .await
}

async fn overview_api_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.datasets().await.as_ref() {
        Ok(data) => Json(OverviewResponse {
            neighborhoods: data.neighborhoods.len(),
            businesses: data.businesses.len(),
            bus_stops: data.bus_stops.len(),
            mei: analytics::mei_summary(&data.businesses.records),
            transport: analytics::transport_summary(&data.bus_stops.records),
        })
        .into_response(),
        Err(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": msg })),
        )
            .into_response(),
    }
}
