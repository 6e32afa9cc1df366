use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{handlers, relay, state::ApiState};

pub fn create_router(state: ApiState, cors: CorsLayer) -> Router {
    Router::new()
        // Health check
        .route("/api/health", get(handlers::health::health_check))
        // Car endpoints
        .route(
            "/api/cars",
            get(handlers::car::list_cars).post(handlers::car::create_car),
        )
        .route(
            "/api/cars/:id",
            get(handlers::car::get_car)
                .put(handlers::car::update_car)
                .delete(handlers::car::delete_car),
        )
        // Task endpoints
        .route(
            "/api/tasks",
            get(handlers::task::list_tasks).post(handlers::task::create_task),
        )
        .route(
            "/api/tasks/:id",
            get(handlers::task::get_task)
                .put(handlers::task::update_task)
                .delete(handlers::task::delete_task),
        )
        // Mechanic endpoints (read-only roster)
        .route("/api/mechanics", get(handlers::mechanic::list_mechanics))
        .route(
            "/api/mechanics/leaderboard",
            get(handlers::mechanic::leaderboard),
        )
        .route(
            "/api/mechanics/stats",
            get(handlers::mechanic::mechanic_stats),
        )
        .route("/api/mechanics/:name", get(handlers::mechanic::get_mechanic))
        // Statistics
        .route("/api/stats", get(handlers::stats::get_statistics))
        // Event relay
        .route("/api/events", get(relay::ws_handler))
        // Add state
        .with_state(state)
        // Request tracing + CORS
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
