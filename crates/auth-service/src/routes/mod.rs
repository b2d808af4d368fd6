use crate::handlers::{auth_handler, user_handler, AppState};
use crate::middleware::auth::{require_auth, AuthMiddlewareState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// Login and the health check are public; every user endpoint sits
/// behind the bearer-token middleware.
pub fn build_routes(state: Arc<AppState>) -> Router {
    let auth_state = Arc::new(AuthMiddlewareState {
        pool: state.pool.clone(),
    });

    let protected = Router::new()
        .route(
            "/api/v1/users",
            post(user_handler::handle_create_user).get(user_handler::handle_list_users),
        )
        .route(
            "/api/v1/users/:id",
            get(user_handler::handle_get_user)
                .patch(user_handler::handle_update_user)
                .delete(user_handler::handle_delete_user),
        )
        .layer(middleware::from_fn_with_state(auth_state, require_auth));

    Router::new()
        .route("/api/v1/auth/login", post(auth_handler::handle_login))
        .merge(protected)
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
