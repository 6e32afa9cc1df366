//! Point accounting for task status transitions.
//!
//! A mechanic's `total_points` / `total_tasks` must always equal the sum of
//! point values / count of their currently-completed tasks. The store applies
//! the adjustment returned here in the same transaction as the task mutation,
//! so the rule cannot be bypassed and concurrent writers stay consistent.

use crate::status::TaskStatus;

/// What the accounting rule needs to know about a task row, before or after
/// a mutation. `status` is `None` when the stored text is not a valid task
/// status, which turns the transition into a no-op.
#[derive(Debug, Clone, Copy)]
pub struct TaskState<'a> {
    pub status: Option<TaskStatus>,
    pub mechanic: Option<&'a str>,
    pub points: i64,
}

/// Signed adjustment to one mechanic's aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointAdjustment<'a> {
    pub mechanic: &'a str,
    pub points_delta: i64,
    pub tasks_delta: i64,
}

/// Compute the aggregate adjustment for a task update.
///
/// Completion credits the post-update row (its mechanic, its point value);
/// un-completion reclaims from the pre-update row. That split keeps each
/// mechanic's aggregates equal to their currently-completed work even when
/// one update reassigns the mechanic and flips the status together.
///
/// Returns `None` when the status is unchanged, when either status is not a
/// valid task status, or when the side being adjusted has no mechanic.
pub fn completion_adjustment<'a>(
    old: TaskState<'a>,
    new: TaskState<'a>,
) -> Option<PointAdjustment<'a>> {
    let old_status = old.status?;
    let new_status = new.status?;

    if old_status == new_status {
        return None;
    }

    if new_status == TaskStatus::Completed {
        let mechanic = new.mechanic?;
        Some(PointAdjustment {
            mechanic,
            points_delta: new.points,
            tasks_delta: 1,
        })
    } else if old_status == TaskStatus::Completed {
        let mechanic = old.mechanic?;
        Some(PointAdjustment {
            mechanic,
            points_delta: -old.points,
            tasks_delta: -1,
        })
    } else {
        // pending <-> in_progress, no score impact
        None
    }
}

/// Compute the aggregate adjustment for removing a task row entirely.
///
/// A deleted task no longer counts toward anyone's score, so a completed,
/// assigned task gives its points back on the way out. Anything else is a
/// no-op.
pub fn removal_adjustment(state: TaskState<'_>) -> Option<PointAdjustment<'_>> {
    if state.status? != TaskStatus::Completed {
        return None;
    }
    let mechanic = state.mechanic?;

    Some(PointAdjustment {
        mechanic,
        points_delta: -state.points,
        tasks_delta: -1,
    })
}
