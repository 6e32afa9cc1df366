use std::env;
use std::sync::Arc;

use anyhow::Result;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pitstop_api::relay::{Broadcaster, EventRelay};
use pitstop_api::{routes, state};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pitstop_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    // Get configuration
    let port = env::var("PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()?;

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://pitstop.db".to_string());

    // Initialize database and seed the roster
    let db = pitstop_db::Database::new(&database_url).await?;
    db.init_schema().await?;
    db.seed_mechanics(pitstop_core::MECHANIC_ROSTER).await?;

    // Event relay for connected clients
    let broadcaster: Arc<dyn Broadcaster> = Arc::new(EventRelay::new(256));

    // Restrict CORS to the configured client origin when one is set
    let cors = match env::var("FRONTEND_URL") {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => CorsLayer::permissive(),
    };

    // Create app state
    let state = state::ApiState { db, broadcaster };

    // Build router
    let app = routes::create_router(state, cors);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Pitstop API server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
