use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A repair job as stored, statuses kept as text the way the columns hold
/// them (CHECK constraints and `pitstop_core::status` guard the values).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Car {
    pub id: i64,
    pub brand: String,
    pub model: String,
    pub year: i64,
    pub repair_time: Option<String>,
    pub start_date: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A work item joined with its car's headline fields, the shape every task
/// read returns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub car_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub assigned_mechanic: Option<String>,
    pub points: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    // Joined car fields (LEFT JOIN, so nullable)
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Mechanic {
    pub id: i64,
    pub name: String,
    pub total_points: i64,
    pub total_tasks: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a mechanic's completed-work history.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompletedTaskSummary {
    pub id: i64,
    pub title: String,
    pub points: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewCar {
    pub brand: String,
    pub model: String,
    pub year: i64,
    pub repair_time: Option<String>,
    pub start_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub car_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub assigned_mechanic: Option<String>,
    pub points: i64,
}

/// Allow-listed mutable car fields. Outer `None` means "leave unchanged";
/// for nullable columns the inner `Option` distinguishes set from clear.
#[derive(Debug, Clone, Default)]
pub struct CarChanges {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub repair_time: Option<Option<String>>,
    pub start_date: Option<Option<String>>,
    pub status: Option<String>,
}

impl CarChanges {
    pub fn is_empty(&self) -> bool {
        self.brand.is_none()
            && self.model.is_none()
            && self.year.is_none()
            && self.repair_time.is_none()
            && self.start_date.is_none()
            && self.status.is_none()
    }
}

/// Allow-listed mutable task fields. `car_id` is deliberately not mutable.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub assigned_mechanic: Option<Option<String>>,
    pub points: Option<i64>,
    pub status: Option<String>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assigned_mechanic.is_none()
            && self.points.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub car_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AggregateStats {
    pub total_cars: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MechanicStats {
    pub total_mechanics: i64,
    pub total_points_awarded: i64,
    pub total_tasks_completed: i64,
    pub avg_points_per_mechanic: Option<f64>,
    pub highest_score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TopMechanic {
    pub name: String,
    pub total_points: i64,
}
