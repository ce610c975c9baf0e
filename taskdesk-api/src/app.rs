/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::{app::AppState, config::Config};
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let state = AppState::new(pool, config);
/// let app = taskdesk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post, put},
    Router,
};
use sqlx::SqlitePool;
use std::{sync::Arc, time::Duration};
use taskdesk_shared::{
    auth::middleware::{authenticate, AuthError},
    storage::UploadStore,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, Level};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Attachment directory
    pub uploads: UploadStore,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let uploads = UploadStore::new(config.upload.dir.clone());

        Self {
            db,
            config: Arc::new(config),
            uploads,
        }
    }

    /// Gets the session secret for token operations
    pub fn session_secret(&self) -> &str {
        &self.config.session.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /                    # Redirect to dashboard or login page
/// ├── GET  /health              # Health check (public)
/// ├── POST /register            # Create account (public)
/// ├── POST /login               # Start session (public)
/// ├── GET  /login-page          # HTML (public)
/// ├── GET  /register-page       # HTML (public)
/// ├── GET  /static/*            # Page assets (public)
/// ├── GET  /dashboard           # HTML (session, else redirect)
/// ├── GET  /logout              # End session (session, else 401)
/// ├── /api/                     # JSON API (session, else 401)
/// │   ├── GET    /tasks
/// │   ├── POST   /tasks         # multipart
/// │   ├── PUT    /tasks/:id     # toggle completion
/// │   ├── DELETE /tasks/:id
/// │   ├── PUT    /tasks/:id/edit
/// │   └── GET    /stats
/// └── GET  /uploads/:filename   # Attachment download (session, else 401)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Session gate (per-route basis)
/// 2. Body size limit
/// 3. Logging (tower-http TraceLayer)
/// 4. CORS (tower-http CorsLayer)
/// 5. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/", get(routes::pages::index))
        .route("/health", get(routes::health::health_check))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/login-page", get(routes::pages::login_page))
        .route("/register-page", get(routes::pages::register_page));

    // Pages bounce anonymous visitors to the login form
    let page_routes = Router::new()
        .route("/dashboard", get(routes::pages::dashboard))
        .route_layer(from_fn_with_state(state.clone(), page_session_layer));

    // Everything else answers 401 without a session
    let session_routes = Router::new()
        .route("/logout", get(routes::auth::logout))
        .route(
            "/api/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/api/tasks/:id",
            put(routes::tasks::toggle_task).delete(routes::tasks::delete_task),
        )
        .route("/api/tasks/:id/edit", put(routes::tasks::edit_task))
        .route("/api/stats", get(routes::tasks::get_stats))
        .route("/uploads/:filename", get(routes::uploads::download))
        .route_layer(from_fn_with_state(state.clone(), session_layer));

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(public_routes)
        .merge(page_routes)
        .merge(session_routes)
        .nest_service("/static", ServeDir::new(&state.config.api.static_dir))
        .layer(DefaultBodyLimit::max(state.config.upload.max_body_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS from configured origins; `*` allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Session gate for JSON routes
///
/// Resolves the session cookie to a `CurrentUser` and injects it into
/// request extensions; rejects with 401 otherwise.
async fn session_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state.db, state.session_secret(), req.headers())
        .await
        .map_err(|e| {
            debug!(reason = %e, path = %req.uri().path(), "Rejected unauthenticated request");
            ApiError::from(e)
        })?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Session gate for HTML pages
///
/// Same as [`session_layer`], but anonymous visitors are redirected to the
/// login page instead of receiving a 401.
async fn page_session_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match authenticate(&state.db, state.session_secret(), req.headers()).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(AuthError::DatabaseError(e)) => Err(e.into()),
        Err(e) => {
            debug!(reason = %e, "Redirecting anonymous visitor to login page");
            Ok(Redirect::to("/login-page").into_response())
        }
    }
}
