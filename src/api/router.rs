//! HTTP router.
//!
//! Owner routes sit behind the optional owner bearer token; public routes
//! (share links and the anonymized feed) are open and CORS-enabled for
//! `GET`. Everything is nested under `/api/`.

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the full router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn build_router(ctx: ApiContext) -> Router {
    let owner = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/cases",
            get(endpoints::cases::list).post(endpoints::cases::create),
        )
        .route("/cases/:id", get(endpoints::cases::get))
        .route(
            "/profile",
            get(endpoints::profile::get).put(endpoints::profile::update),
        )
        .route(
            "/profile/share-token",
            post(endpoints::profile::issue_token).delete(endpoints::profile::revoke_token),
        )
        .route("/clinical-summary", get(endpoints::clinical::summary))
        .route("/tags/:tag", get(endpoints::feed::by_tag))
        .route("/search", get(endpoints::feed::search))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_owner))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    let public = Router::new()
        .route("/share/:token", get(endpoints::share::view))
        .route("/public/cases", get(endpoints::share::public_cases))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(cors)
        .layer(axum::Extension(ctx));

    Router::new().nest("/api", owner.merge(public))
}
