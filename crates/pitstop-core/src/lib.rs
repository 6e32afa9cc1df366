pub mod accounting;
pub mod roster;
pub mod status;

// Re-exports
pub use accounting::{completion_adjustment, removal_adjustment, PointAdjustment, TaskState};
pub use roster::MECHANIC_ROSTER;
pub use status::{CarStatus, TaskStatus};
