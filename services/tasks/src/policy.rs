//! Authorization policy for task mutations
//!
//! Admins may perform every mutation. Users may only change the status of,
//! or comment on, tasks currently assigned to them, which can only be
//! decided once the task is loaded.

use common::identity::{Caller, Role};
use tracing::warn;

use crate::{
    error::{TaskError, TaskResult},
    models::Task,
};

pub fn can_mutate_as_admin(caller: &Caller) -> bool {
    caller.role == Role::Admin
}

/// True iff the caller is a user and the task's current assignee
pub fn can_mutate_as_assignee(caller: &Caller, task: &Task) -> bool {
    caller.role == Role::User && task.assignee_id == Some(caller.id)
}

pub fn require_admin(caller: &Caller) -> TaskResult<()> {
    if can_mutate_as_admin(caller) {
        return Ok(());
    }

    warn!("User {} is not allowed to manage tasks", caller.username);
    Err(TaskError::AuthorizationDenied(
        "Only admins can manage tasks".to_string(),
    ))
}

pub fn require_assignee(caller: &Caller, task: &Task) -> TaskResult<()> {
    if can_mutate_as_assignee(caller, task) {
        return Ok(());
    }

    warn!(
        "User {} is not the assignee of task {}",
        caller.username, task.id
    );
    Err(TaskError::AuthorizationDenied(
        "You are not authorized to modify this task".to_string(),
    ))
}
