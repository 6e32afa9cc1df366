pub mod error;
pub mod models;
pub mod repository;

// Re-exports
pub use error::{Error, Result};
pub use models::{
    AggregateStats, Car, CarChanges, CompletedTaskSummary, Mechanic, MechanicStats, NewCar,
    NewTask, Task, TaskChanges, TaskFilter, TopMechanic,
};
pub use repository::Database;
