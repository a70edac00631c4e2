/// Analytics aggregator
///
/// Read-only views recomputed from current task and membership data on every
/// call. Nothing is cached and nothing is written.
///
/// Callers authorize first: the aggregator assumes the actor may see
/// analytics for the project.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use super::progress::percentage;
use crate::error::{CoreError, CoreResult};
use crate::models::membership::Role;
use crate::models::task::{Task, TaskFilter, TaskPriority, TaskStatus};
use crate::store::Store;

/// Default timeline window
pub const DEFAULT_TIMELINE_DAYS: u32 = 30;

/// Task counts per status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub todo: i64,
    pub in_progress: i64,
    pub completed: i64,
}

/// Task counts per priority
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriorityBreakdown {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
}

/// One member's output within a project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberProductivity {
    pub username: String,
    pub role: Role,
    pub tasks_assigned: i64,
    pub tasks_completed: i64,
    /// Percent, two decimals
    pub completion_rate: f64,
    /// Mean days from creation to completion, one decimal
    pub average_completion_time_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectAnalytics {
    pub project_id: Uuid,
    pub project_name: String,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub in_progress_tasks: i64,
    pub todo_tasks: i64,
    pub overall_progress: i32,
    pub team_size: usize,
    pub tasks_by_status: StatusBreakdown,
    pub tasks_by_priority: PriorityBreakdown,
    pub team_productivity: Vec<MemberProductivity>,
}

/// Activity on one calendar day (UTC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    pub tasks_completed: i64,
    pub tasks_created: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberAnalytics {
    pub project_id: Uuid,
    pub username: String,
    /// `None` once the user has left the project
    pub role: Option<Role>,
    pub tasks_assigned: i64,
    pub tasks_completed: i64,
    pub tasks_in_progress: i64,
    pub tasks_todo: i64,
    pub completion_rate: f64,
    pub average_completion_time_days: f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `100 * completed / assigned`, two decimals, 0 when nothing is assigned
pub fn completion_rate(completed: i64, assigned: i64) -> f64 {
    if assigned <= 0 {
        return 0.0;
    }
    round_to(100.0 * completed as f64 / assigned as f64, 2)
}

/// Mean completion time of completed tasks, in days with one decimal
pub fn average_completion_days<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> f64 {
    let durations: Vec<f64> = tasks
        .into_iter()
        .filter(|t| t.status.is_completed())
        .filter_map(|t| t.completed_at.map(|done| done - t.created_at))
        .map(|d| d.num_seconds().max(0) as f64 / 86_400.0)
        .collect();

    if durations.is_empty() {
        return 0.0;
    }
    round_to(durations.iter().sum::<f64>() / durations.len() as f64, 1)
}

fn status_breakdown<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> StatusBreakdown {
    let mut breakdown = StatusBreakdown::default();
    for task in tasks {
        match task.status {
            TaskStatus::Todo => breakdown.todo += 1,
            TaskStatus::InProgress => breakdown.in_progress += 1,
            TaskStatus::Completed => breakdown.completed += 1,
        }
    }
    breakdown
}

fn priority_breakdown<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> PriorityBreakdown {
    let mut breakdown = PriorityBreakdown::default();
    for task in tasks {
        match task.priority {
            TaskPriority::Low => breakdown.low += 1,
            TaskPriority::Medium => breakdown.medium += 1,
            TaskPriority::High => breakdown.high += 1,
        }
    }
    breakdown
}

/// Per-day created/completed counts for the `days` days ending on `today`
///
/// Oldest first, exactly `days` entries, zero-filled.
pub fn build_timeline(tasks: &[Task], days: u32, today: NaiveDate) -> Vec<TimelineEntry> {
    (0..days)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(i64::from(offset));
            let tasks_created = tasks
                .iter()
                .filter(|t| t.created_at.date_naive() == date)
                .count() as i64;
            let tasks_completed = tasks
                .iter()
                .filter(|t| t.status.is_completed())
                .filter(|t| t.completed_at.map(|c| c.date_naive()) == Some(date))
                .count() as i64;

            TimelineEntry {
                date,
                tasks_completed,
                tasks_created,
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct AnalyticsAggregator {
    store: Arc<dyn Store>,
}

impl AnalyticsAggregator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Counts, breakdowns and per-member productivity for one project
    ///
    /// `overall_progress` is computed from the tasks read here, not taken
    /// from the stored project row.
    pub async fn project_analytics(&self, project_id: Uuid) -> CoreResult<ProjectAnalytics> {
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| CoreError::project_not_found(project_id))?;
        let tasks = self.store.query_tasks(&TaskFilter::project(project_id)).await?;
        let team = self.store.list_memberships(project_id).await?;

        let by_status = status_breakdown(&tasks);
        let total = tasks.len() as i64;

        let team_productivity = team
            .iter()
            .map(|member| {
                let assigned: Vec<&Task> = tasks
                    .iter()
                    .filter(|t| t.is_assigned_to(&member.username))
                    .collect();
                let completed = assigned.iter().filter(|t| t.status.is_completed()).count() as i64;

                MemberProductivity {
                    username: member.username.clone(),
                    role: member.role,
                    tasks_assigned: assigned.len() as i64,
                    tasks_completed: completed,
                    completion_rate: completion_rate(completed, assigned.len() as i64),
                    average_completion_time_days: average_completion_days(assigned.iter().copied()),
                }
            })
            .collect();

        Ok(ProjectAnalytics {
            project_id,
            project_name: project.name,
            total_tasks: total,
            completed_tasks: by_status.completed,
            in_progress_tasks: by_status.in_progress,
            todo_tasks: by_status.todo,
            overall_progress: percentage(by_status.completed, total),
            team_size: team.len(),
            tasks_by_priority: priority_breakdown(&tasks),
            tasks_by_status: by_status,
            team_productivity,
        })
    }

    /// Daily activity over the `days` days ending on `today`
    pub async fn timeline(
        &self,
        project_id: Uuid,
        days: u32,
        today: NaiveDate,
    ) -> CoreResult<Vec<TimelineEntry>> {
        if self.store.get_project(project_id).await?.is_none() {
            return Err(CoreError::project_not_found(project_id));
        }
        let tasks = self.store.query_tasks(&TaskFilter::project(project_id)).await?;
        Ok(build_timeline(&tasks, days, today))
    }

    /// One user's task statistics within a project
    ///
    /// Works for users who have left the project too, as long as tasks are
    /// still assigned to them.
    pub async fn member_analytics(&self, project_id: Uuid, username: &str) -> CoreResult<MemberAnalytics> {
        if self.store.get_project(project_id).await?.is_none() {
            return Err(CoreError::project_not_found(project_id));
        }
        let role = self
            .store
            .get_membership(project_id, username)
            .await?
            .map(|m| m.role);
        let tasks = self
            .store
            .query_tasks(&TaskFilter::project(project_id).with_assignee(username))
            .await?;

        let by_status = status_breakdown(&tasks);
        let assigned = tasks.len() as i64;

        Ok(MemberAnalytics {
            project_id,
            username: username.to_string(),
            role,
            tasks_assigned: assigned,
            tasks_completed: by_status.completed,
            tasks_in_progress: by_status.in_progress,
            tasks_todo: by_status.todo,
            completion_rate: completion_rate(by_status.completed, assigned),
            average_completion_time_days: average_completion_days(&tasks),
        })
    }
}
