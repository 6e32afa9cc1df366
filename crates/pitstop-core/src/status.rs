use serde::{Deserialize, Serialize};

/// Lifecycle of a repair job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarStatus {
    Pending,
    InProgress,
    Completed,
    Delivered,
}

impl CarStatus {
    pub const ALL: [CarStatus; 4] = [
        CarStatus::Pending,
        CarStatus::InProgress,
        CarStatus::Completed,
        CarStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Pending => "pending",
            CarStatus::InProgress => "in_progress",
            CarStatus::Completed => "completed",
            CarStatus::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CarStatus::Pending),
            "in_progress" => Some(CarStatus::InProgress),
            "completed" => Some(CarStatus::Completed),
            "delivered" => Some(CarStatus::Delivered),
            _ => None,
        }
    }
}

/// Lifecycle of a work item. Only `Completed` counts toward mechanic scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_car_status_round_trip() {
        for status in CarStatus::ALL {
            assert_eq!(CarStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_task_status_round_trip() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_invalid_status_rejected() {
        assert_eq!(CarStatus::parse("scrapped"), None);
        assert_eq!(TaskStatus::parse("delivered"), None);
        assert_eq!(TaskStatus::parse(""), None);
    }
}
