use crate::catalog::images::{ImageKind, SizeTier};
use crate::catalog::{CatalogApi, CatalogClient};
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::filter::{year_options, SearchFilter};
use crate::models::{Genre, GenreId, Item, ItemId};
use crate::session::{
    FileStore, IdentityDirectory, KeyValueStore, Session, SessionError, SessionStore,
};
use crate::views::{self, DetailView, Landing, SearchPage};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Everything a handler may touch. Built once at startup and handed to the
/// router; the session store is disposed after the server stops.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogApi>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogApi>, sessions: SessionStore) -> Self {
        Self {
            catalog,
            sessions: Arc::new(Mutex::new(sessions)),
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let catalog: Arc<dyn CatalogApi> = Arc::new(CatalogClient::from_config(&config)?);
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_dir)?);
    let directory = IdentityDirectory::with_demo_identity(
        config.secret_key.as_bytes(),
        &config.demo_password,
    )?;
    let sessions = SessionStore::open(store, directory);
    info!(
        "Session store ready ({})",
        if sessions.is_authenticated() {
            "restored session"
        } else {
            "signed out"
        }
    );

    let state = AppState::new(catalog, sessions);
    let sessions = Arc::clone(&state.sessions);
    let app = build_router(state);

    info!("Listening on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(sessions) {
        Ok(sessions) => sessions.into_inner().close(),
        Err(_) => warn!("Session store still in use at shutdown"),
    }
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/home", get(home))
        .route("/api/genres", get(genres))
        .route("/api/genres/:id/items", get(genre_items))
        .route("/api/items/:id", get(item_detail))
        .route("/api/search", get(search))
        .route("/api/images", get(image_url))
        .route("/api/session", get(current_session))
        .route("/api/session/login", post(login))
        .route("/api/session/register", post(register))
        .route("/api/session/logout", post(logout))
        .route("/api/watchlist", get(watchlist))
        .route(
            "/api/watchlist/:id",
            put(add_to_watchlist).delete(remove_from_watchlist),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn home(State(state): State<AppState>) -> ApiResult<Json<Landing>> {
    let seed = Utc::now().timestamp_subsec_nanos() as usize;
    let landing = views::load_landing(state.catalog.as_ref(), seed).await?;
    Ok(Json(landing))
}

async fn genres(State(state): State<AppState>) -> Json<Vec<Genre>> {
    Json(state.catalog.genres().await)
}

async fn genre_items(
    State(state): State<AppState>,
    Path(id): Path<GenreId>,
) -> Json<Vec<Item>> {
    Json(state.catalog.by_genre(id).await)
}

async fn item_detail(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> ApiResult<Json<DetailView>> {
    let mut view = views::load_detail(state.catalog.as_ref(), id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("item {}", id)))?;
    view.in_watchlist = state.sessions.lock().await.is_in_watchlist(id);
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    genre: Option<String>,
    year: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    #[serde(flatten)]
    page: SearchPage,
    years: Vec<i32>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let genre = match params.genre.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<GenreId>()
                .map_err(|_| ApiError::InvalidInput(format!("Invalid genre '{}'", raw)))?,
        ),
    };
    let filter = SearchFilter::new(genre, params.year);
    let page = views::run_search(state.catalog.as_ref(), &params.q, &filter).await;
    Ok(Json(SearchResponse {
        page,
        years: year_options(Utc::now().year()),
    }))
}

#[derive(Debug, Deserialize)]
struct ImageQuery {
    path: String,
    kind: ImageKind,
    #[serde(default)]
    size: SizeTier,
}

async fn image_url(Query(params): Query<ImageQuery>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "url": params.kind.url(params.size, &params.path)
    }))
}

async fn current_session(State(state): State<AppState>) -> Json<Option<Session>> {
    Json(state.sessions.lock().await.current().cloned())
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<Session>> {
    let session = with_sessions(&state, move |sessions| {
        sessions.authenticate(&body.email, &body.password)
    })
    .await?;
    Ok(Json(session))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    confirm_password: Option<String>,
    name: String,
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    if body.email.trim().is_empty() || body.password.is_empty() || body.name.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "Email, password and name are required".to_string(),
        ));
    }
    if body
        .confirm_password
        .as_deref()
        .is_some_and(|c| c != body.password)
    {
        return Err(ApiError::InvalidInput("Passwords do not match".to_string()));
    }
    let session = with_sessions(&state, move |sessions| {
        sessions.register(&body.email, &body.password, &body.name)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn logout(State(state): State<AppState>) -> ApiResult<StatusCode> {
    with_sessions(&state, SessionStore::deauthenticate).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn watchlist(State(state): State<AppState>) -> ApiResult<Json<Vec<Item>>> {
    let ids = {
        let sessions = state.sessions.lock().await;
        let session = sessions.current().ok_or(ApiError::Unauthorized)?;
        session.watchlist.ids().to_vec()
    };
    Ok(Json(
        views::load_watchlist(Arc::clone(&state.catalog), &ids).await,
    ))
}

#[derive(Debug, Serialize)]
struct WatchlistChange {
    item_id: ItemId,
    in_watchlist: bool,
    changed: bool,
}

async fn add_to_watchlist(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> ApiResult<Json<WatchlistChange>> {
    let change = with_sessions(&state, move |sessions| {
        let changed = sessions.add_to_watchlist(id)?;
        Ok(WatchlistChange {
            item_id: id,
            in_watchlist: sessions.is_in_watchlist(id),
            changed,
        })
    })
    .await?;
    Ok(Json(change))
}

async fn remove_from_watchlist(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> ApiResult<Json<WatchlistChange>> {
    let change = with_sessions(&state, move |sessions| {
        let changed = sessions.remove_from_watchlist(id)?;
        Ok(WatchlistChange {
            item_id: id,
            in_watchlist: sessions.is_in_watchlist(id),
            changed,
        })
    })
    .await?;
    Ok(Json(change))
}

/// Runs a session mutation on the blocking pool. Commits hit the durable
/// store synchronously, so they stay off the async workers while the lock
/// is held.
async fn with_sessions<T, F>(state: &AppState, op: F) -> ApiResult<T>
where
    F: FnOnce(&mut SessionStore) -> Result<T, SessionError> + Send + 'static,
    T: Send + 'static,
{
    let mut sessions = Arc::clone(&state.sessions).lock_owned().await;
    let result = tokio::task::spawn_blocking(move || op(&mut *sessions))
        .await
        .map_err(|e| ApiError::Internal(format!("session task failed: {}", e)))?;
    Ok(result?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
