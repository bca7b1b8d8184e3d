//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::{Extension, Request},
    middleware::{self, Next},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    create_company_handler, delete_company_handler, get_company_handler, health_handler,
    list_companies_handler, login_handler, update_company_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps) -> Router {
    let jwt_service = deps.jwt_service.clone();
    let state = AppState {
        deps: Arc::new(deps),
    };

    Router::new()
        .route("/login", post(login_handler))
        .route(
            "/company",
            get(list_companies_handler).post(create_company_handler),
        )
        .route(
            "/company/:id",
            get(get_company_handler)
                .patch(update_company_handler)
                .delete(delete_company_handler),
        )
        .route("/health", get(health_handler))
        .layer(middleware::from_fn(move |request: Request, next: Next| {
            let jwt_service = jwt_service.clone();
            async move { jwt_auth_middleware(jwt_service, request, next).await }
        }))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
