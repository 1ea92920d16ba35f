use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::RwLock;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cards::Shuffler;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::simulation::{Simulation, SimulationReport};

/// Finished runs kept for lookup; the oldest is evicted past this count.
const MAX_STORED_RUNS: usize = 64;

#[derive(Default)]
struct RunStore {
    runs: HashMap<Uuid, Arc<RunRecord>>,
    order: VecDeque<Uuid>,
}

#[derive(Clone)]
struct AppState {
    runs: Arc<RwLock<RunStore>>,
    capacity: usize,
}

impl AppState {
    fn new() -> Self {
        Self::with_capacity(MAX_STORED_RUNS)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            runs: Arc::new(RwLock::new(RunStore::default())),
            capacity: capacity.max(1),
        }
    }

    fn insert_run(&self, record: RunRecord) -> Arc<RunRecord> {
        let entry = Arc::new(record);
        let mut store = self.runs.write();
        store.runs.insert(entry.run_id, entry.clone());
        store.order.push_back(entry.run_id);
        while store.order.len() > self.capacity {
            if let Some(evicted) = store.order.pop_front() {
                store.runs.remove(&evicted);
                debug!(run_id = %evicted, "evicted stored run");
            }
        }
        entry
    }

    fn get_run(&self, id: &Uuid) -> Option<Arc<RunRecord>> {
        self.runs.read().runs.get(id).cloned()
    }
}

#[derive(Debug, Default, Deserialize)]
struct StartRunRequest {
    #[serde(default)]
    config: SimConfig,
    seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
struct RunRecord {
    run_id: Uuid,
    seed: u64,
    report: SimulationReport,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("run not found")]
    NotFound,
    #[error(transparent)]
    Simulation(#[from] SimError),
    #[error("simulation task failed")]
    Aborted,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Simulation(SimError::InvalidConfig(_) | SimError::ConfigFile(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Simulation(_) | ApiError::Aborted => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub async fn serve(addr: SocketAddr) -> Result<()> {
    let state = AppState::new();
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/runs", post(start_run))
        .route("/runs/:id", get(fetch_run));

    Router::new()
        .route("/healthz", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn router() -> Router {
    build_router(AppState::new())
}

async fn health() -> &'static str {
    "ok"
}

/// Validates the configuration, then runs the whole simulation off the async
/// executor so the server keeps answering while it works.
async fn start_run(
    State(state): State<AppState>,
    Json(req): Json<StartRunRequest>,
) -> Result<Json<RunRecord>, ApiError> {
    let simulation = Simulation::new(req.config)?;
    let seed = req.seed.unwrap_or_else(rand::random);
    info!(seed, rounds = simulation.config().rounds_per_run, "starting run");

    let report = tokio::task::spawn_blocking(move || {
        simulation.run(&mut Shuffler::new(StdRng::seed_from_u64(seed)))
    })
    .await
    .map_err(|_| ApiError::Aborted)??;

    let record = state.insert_run(RunRecord {
        run_id: Uuid::new_v4(),
        seed,
        report,
    });
    Ok(Json(RunRecord::clone(&record)))
}

async fn fetch_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunRecord>, ApiError> {
    let record = state.get_run(&id).ok_or(ApiError::NotFound)?;
    Ok(Json(RunRecord::clone(&record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::StackedDecks;

    fn record(report: &SimulationReport) -> RunRecord {
        RunRecord {
            run_id: Uuid::new_v4(),
            seed: 0,
            report: report.clone(),
        }
    }

    #[test]
    fn store_evicts_the_oldest_runs_past_capacity() {
        let config = SimConfig {
            rounds_per_run: 1,
            player_count: 1,
            ..SimConfig::default()
        };
        let report = Simulation::new(config)
            .unwrap()
            .run(&mut StackedDecks::new(Vec::new()))
            .unwrap();

        let state = AppState::with_capacity(3);
        let ids: Vec<Uuid> = (0..5)
            .map(|_| state.insert_run(record(&report)).run_id)
            .collect();

        assert!(state.get_run(&ids[0]).is_none());
        assert!(state.get_run(&ids[1]).is_none());
        for id in &ids[2..] {
            assert!(state.get_run(id).is_some());
        }
        let store = state.runs.read();
        assert_eq!(store.runs.len(), 3);
        assert_eq!(store.order.len(), 3);
    }
}
