/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use orghub_api::{app::AppState, config::Config};
/// use orghub_shared::email::{EmailClient, EmailConfig, Mailer};
/// use orghub_shared::redis::{InvitationCodes, RedisClient, RedisConfig};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let redis = RedisClient::new(RedisConfig::from_env()?).await?;
/// let mailer = Mailer::spawn(EmailClient::new(EmailConfig::from_env()?));
/// let state = AppState::new(pool, InvitationCodes::new(redis), mailer, config);
/// let app = orghub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use orghub_shared::auth::{context::AuthContext, jwt};
use orghub_shared::email::Mailer;
use orghub_shared::redis::InvitationCodes;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; the
/// store handles are cheap clones over shared connections.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Ephemeral invitation code store
    pub codes: InvitationCodes,

    /// Best-effort email queue
    pub mailer: Mailer,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, codes: InvitationCodes, mailer: Mailer, config: Config) -> Self {
        Self {
            db,
            codes,
            mailer,
            config: Arc::new(config),
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /
/// ├── GET  /health                                        # public
/// ├── POST /users/accept-invitation                       # public (the code is the credential)
/// └── /organisations/:organisation_id/                    # session required
///     ├── POST   /invitations                             # issue invitation
///     ├── GET    /invitations                             # list pending invitations
///     ├── DELETE /invitations/:user_id                    # cancel pending invitation
///     ├── GET    /users                                   # list active members
///     ├── POST   /users/:user_id                          # direct add (global admin)
///     ├── PATCH  /users/:user_id                          # change role
///     └── DELETE /users/:user_id                          # remove member
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public routes: health and invitation redemption. Redemption has
    // no session; possession of the code is the credential.
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/users/accept-invitation",
            post(routes::invitations::accept_invitation),
        );

    // Organisation-scoped routes require a validated session.
    let organisation_routes = Router::new()
        .route(
            "/organisations/:organisation_id/invitations",
            post(routes::invitations::send_invitation)
                .get(routes::invitations::list_invitations),
        )
        .route(
            "/organisations/:organisation_id/invitations/:user_id",
            delete(routes::invitations::cancel_invitation),
        )
        .route(
            "/organisations/:organisation_id/users",
            get(routes::members::list_members),
        )
        .route(
            "/organisations/:organisation_id/users/:user_id",
            post(routes::members::add_member)
                .patch(routes::members::change_member_role)
                .delete(routes::members::remove_member),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.config.api.environment.is_production() {
        let origins: Vec<HeaderValue> = [state.config.api.frontend_base_url.as_str()]
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    } else {
        CorsLayer::permissive()
    };

    Router::new()
        .merge(public_routes)
        .merge(organisation_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the session token from the Authorization
/// header, then injects an `AuthContext` into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::BadRequest("Expected Bearer token".to_string())
    })?;

    let claims = jwt::validate_session_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}
