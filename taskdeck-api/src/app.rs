/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskdeck_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskdeck_shared::auth::{
    jwt,
    middleware::{bearer_token, AuthError, AuthUser},
};
use taskdeck_shared::models::user::User;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                   # Health check (public)
/// ├── /v1/                      # API v1 (versioned)
/// │   ├── /auth/
/// │   │   ├── POST /register    # Public
/// │   │   ├── POST /login       # Public
/// │   │   ├── POST /refresh     # Public
/// │   │   ├── GET  /profile     # Authenticated
/// │   │   └── PUT  /profile     # Authenticated
/// │   ├── /tasks/               # Authenticated, ownership-scoped
/// │   │   ├── POST   /
/// │   │   ├── GET    /
/// │   │   ├── GET    /stats
/// │   │   ├── GET    /:id
/// │   │   ├── PUT    /:id
/// │   │   └── DELETE /:id
/// │   └── /admin/               # Authenticated + admin role
/// │       ├── GET    /users
/// │       ├── GET    /users/:id
/// │       ├── PUT    /users/:id/role
/// │       ├── DELETE /users/:id
/// │       ├── GET    /users/:id/tasks
/// │       ├── GET    /tasks
/// │       └── GET    /stats
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes =
        Router::new().route("/health", get(routes::health::health_check_handler));

    // Public auth routes
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Profile routes (require JWT authentication)
    let auth_private = Router::new()
        .route("/profile", get(routes::auth::get_profile))
        .route("/profile", put(routes::auth::update_profile))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Task routes (require JWT authentication; ownership enforced in handlers).
    // /stats is registered before /:id so it is not captured as an id.
    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/", get(routes::tasks::list_tasks))
        .route("/stats", get(routes::tasks::task_stats))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", axum::routing::delete(routes::tasks::delete_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Admin routes (require JWT authentication + admin role)
    let admin_routes = Router::new()
        .route("/users", get(routes::admin::list_users))
        .route("/users/:id", get(routes::admin::user_detail))
        .route("/users/:id/role", put(routes::admin::change_role))
        .route("/users/:id", axum::routing::delete(routes::admin::delete_user))
        .route("/users/:id/tasks", get(routes::admin::tasks_for_user))
        .route("/tasks", get(routes::admin::list_all_tasks))
        .route("/stats", get(routes::admin::platform_stats))
        .layer(axum::middleware::from_fn(require_admin))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_private))
        .nest("/tasks", task_routes)
        .nest("/admin", admin_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
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
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the Bearer token, loads the user record, and rejects the
/// request if the account is missing or deactivated. On success an
/// [`AuthUser`] is inserted into request extensions so handlers see the
/// caller's current role, not the role at token issue time.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let token = bearer_token(req.headers())?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(AuthError::InactiveAccount)?;

    if !user.is_active {
        return Err(AuthError::InactiveAccount.into());
    }

    req.extensions_mut().insert(AuthUser::from_user(&user));

    Ok(next.run(req).await)
}

/// Admin gate middleware
///
/// Runs after `jwt_auth_layer`, so the extension is always present on
/// these routes. Non-admin callers get a 403.
async fn require_admin(req: Request, next: Next) -> Result<Response, crate::error::ApiError> {
    let auth = req
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| crate::error::ApiError::Unauthorized("Not authenticated".to_string()))?;

    if !auth.is_admin() {
        return Err(crate::error::ApiError::Forbidden(
            "Admin access required".to_string(),
        ));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    // Router construction and auth rejection are covered by the
    // integration tests in tests/, which drive the full middleware
    // stack with tower::ServiceExt.
}
