pub mod error;
pub mod handlers;
pub mod relay;
pub mod routes;
pub mod state;

// Re-exports
pub use error::ApiError;
pub use relay::{Broadcaster, Event, EventRelay};
pub use state::ApiState;
