//! Dashboard and profile statistics.
//!
//! Both entry points are pure projections over the snapshot they are given: the caller
//! fetches the user's owned projects and visible tasks from storage and passes them in
//! together with the evaluation instant. Nothing here reads a clock or touches storage,
//! so identical inputs always yield identical views.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Priority, Project, ProjectStatus, Task, TaskStatus, User};

pub const LIST_LIMIT: usize = 5;
pub const UPCOMING_WINDOW_DAYS: i64 = 7;
pub const ACTIVITY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub archived: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
}

/// Open (non-completed) tasks per priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityStats {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub projects_created: usize,
    pub tasks_created: usize,
    pub tasks_completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub user_id: i32,
    pub generated_at: DateTime<Utc>,
    pub project_stats: ProjectStats,
    pub task_stats: TaskStats,
    pub overall_progress: u32,
    pub recent_tasks: Vec<Task>,
    pub upcoming_tasks: Vec<Task>,
    pub active_projects: Vec<Project>,
    pub priority_stats: PriorityStats,
    pub recent_activity: RecentActivity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub total_projects: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub completion_rate: u32,
}

/// `floor(100 * part / total)`, or 0 for an empty total.
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        ((part as u64 * 100) / total as u64) as u32
    }
}

/// Builds the dashboard for `user`.
///
/// `projects` should be the projects `user` owns; entries owned by someone else are
/// ignored. `tasks` should be the tasks visible to `user` (tasks of owned projects plus
/// tasks assigned to them) and are taken as given.
pub fn build_dashboard(
    user: &User,
    projects: &[Project],
    tasks: &[Task],
    now: DateTime<Utc>,
) -> DashboardView {
    let owned: Vec<&Project> = projects.iter().filter(|p| p.owner_id == user.id).collect();

    let project_stats = count_projects(&owned);
    let task_stats = count_tasks(tasks, now);
    let overall_progress = percentage(task_stats.completed, task_stats.total);

    DashboardView {
        user_id: user.id,
        generated_at: now,
        project_stats,
        task_stats,
        overall_progress,
        recent_tasks: recent_tasks(tasks),
        upcoming_tasks: upcoming_tasks(tasks, now),
        active_projects: active_projects(&owned),
        priority_stats: count_open_by_priority(tasks),
        recent_activity: recent_activity(&owned, tasks, now),
    }
}

/// Statistics for the profile page: projects owned and tasks created by the user.
pub fn build_profile_stats(owned_projects: &[Project], created_tasks: &[Task]) -> ProfileStats {
    let completed_tasks = created_tasks.iter().filter(|t| t.is_completed()).count();
    ProfileStats {
        total_projects: owned_projects.len(),
        total_tasks: created_tasks.len(),
        completed_tasks,
        completion_rate: percentage(completed_tasks, created_tasks.len()),
    }
}

fn count_projects(projects: &[&Project]) -> ProjectStats {
    let mut stats = ProjectStats {
        total: projects.len(),
        ..Default::default()
    };
    for project in projects {
        match project.status {
            ProjectStatus::Active => stats.active += 1,
            ProjectStatus::Completed => stats.completed += 1,
            ProjectStatus::Archived => stats.archived += 1,
        }
    }
    stats
}

fn count_tasks(tasks: &[Task], now: DateTime<Utc>) -> TaskStats {
    let mut stats = TaskStats {
        total: tasks.len(),
        ..Default::default()
    };
    for task in tasks {
        match task.status {
            TaskStatus::Pending => stats.pending += 1,
            TaskStatus::InProgress => stats.in_progress += 1,
            TaskStatus::Completed => stats.completed += 1,
        }
        if task.is_overdue(now) {
            stats.overdue += 1;
        }
    }
    stats
}

fn recent_tasks(tasks: &[Task]) -> Vec<Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    // stable: equal timestamps keep input order
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.into_iter().take(LIST_LIMIT).cloned().collect()
}

fn upcoming_tasks(tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
    let horizon = now + Duration::days(UPCOMING_WINDOW_DAYS);
    let mut upcoming: Vec<(&Task, DateTime<Utc>)> = tasks
        .iter()
        .filter(|t| !t.is_completed())
        .filter_map(|t| t.due_date.map(|due| (t, due)))
        .filter(|(_, due)| *due >= now && *due <= horizon)
        .collect();
    upcoming.sort_by_key(|(_, due)| *due);
    upcoming
        .into_iter()
        .take(LIST_LIMIT)
        .map(|(t, _)| t.clone())
        .collect()
}

fn active_projects(projects: &[&Project]) -> Vec<Project> {
    let mut active: Vec<&Project> = projects
        .iter()
        .copied()
        .filter(|p| p.status == ProjectStatus::Active)
        .collect();
    active.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    active.into_iter().take(LIST_LIMIT).cloned().collect()
}

fn count_open_by_priority(tasks: &[Task]) -> PriorityStats {
    let mut stats = PriorityStats::default();
    for task in tasks.iter().filter(|t| !t.is_completed()) {
        match task.priority {
            Priority::High => stats.high += 1,
            Priority::Medium => stats.medium += 1,
            Priority::Low => stats.low += 1,
        }
    }
    stats
}

fn recent_activity(projects: &[&Project], tasks: &[Task], now: DateTime<Utc>) -> RecentActivity {
    let window_start = now - Duration::days(ACTIVITY_WINDOW_DAYS);
    RecentActivity {
        projects_created: projects
            .iter()
            .filter(|p| p.created_at >= window_start)
            .count(),
        tasks_created: tasks.iter().filter(|t| t.created_at >= window_start).count(),
        tasks_completed: tasks
            .iter()
            .filter(|t| t.completed_at.map_or(false, |at| at >= window_start))
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn user(id: i32) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            full_name: String::new(),
            password_hash: String::new(),
            role: Role::User,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn project(owner_id: i32, status: ProjectStatus, at: DateTime<Utc>) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Project".to_string(),
            description: None,
            priority: Priority::Medium,
            status,
            owner_id,
            created_at: at,
            updated_at: at,
        }
    }

    fn task(project_id: Uuid, status: TaskStatus, created_at: DateTime<Utc>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Task".to_string(),
            description: None,
            priority: Priority::Medium,
            status,
            project_id,
            created_by: 1,
            assigned_to: None,
            due_date: None,
            created_at,
            completed_at: (status == TaskStatus::Completed).then_some(created_at),
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let now = Utc::now();
        let view = build_dashboard(&user(1), &[], &[], now);
        assert_eq!(view.project_stats, ProjectStats::default());
        assert_eq!(view.task_stats, TaskStats::default());
        assert_eq!(view.overall_progress, 0);
        assert!(view.recent_tasks.is_empty());
        assert!(view.upcoming_tasks.is_empty());
        assert!(view.active_projects.is_empty());
    }

    #[test]
    fn test_single_project_scenario() {
        let now = Utc::now();
        let owner = user(1);
        let p = project(1, ProjectStatus::Active, now - Duration::days(10));

        let mut done = task(p.id, TaskStatus::Completed, now - Duration::days(9));
        done.completed_at = Some(now - Duration::days(2));
        done.priority = Priority::High;

        let mut pending = task(p.id, TaskStatus::Pending, now - Duration::days(8));
        pending.due_date = Some(now + Duration::days(3));
        pending.priority = Priority::Low;

        let mut in_progress = task(p.id, TaskStatus::InProgress, now - Duration::days(1));
        in_progress.due_date = Some(now - Duration::days(1));
        in_progress.priority = Priority::High;

        let tasks = vec![done.clone(), pending.clone(), in_progress.clone()];
        let view = build_dashboard(&owner, &[p.clone()], &tasks, now);

        assert_eq!(
            view.task_stats,
            TaskStats {
                total: 3,
                pending: 1,
                in_progress: 1,
                completed: 1,
                overdue: 1,
            }
        );
        assert_eq!(view.overall_progress, 33);
        assert_eq!(view.upcoming_tasks, vec![pending.clone()]);
        assert_eq!(
            view.priority_stats,
            PriorityStats {
                high: 1,
                medium: 0,
                low: 1,
            }
        );
        assert_eq!(
            view.recent_activity,
            RecentActivity {
                projects_created: 0,
                tasks_created: 1,
                tasks_completed: 1,
            }
        );
        assert_eq!(
            view.project_stats,
            ProjectStats {
                total: 1,
                active: 1,
                completed: 0,
                archived: 0,
            }
        );
        assert_eq!(view.active_projects, vec![p]);
        assert_eq!(view.recent_tasks, vec![in_progress, pending, done]);
    }

    #[test]
    fn test_progress_is_floored() {
        let now = Utc::now();
        let pid = Uuid::new_v4();
        let tasks = vec![
            task(pid, TaskStatus::Completed, now),
            task(pid, TaskStatus::Completed, now),
            task(pid, TaskStatus::Pending, now),
        ];
        let view = build_dashboard(&user(1), &[], &tasks, now);
        assert_eq!(view.overall_progress, 66);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_overdue_drops_when_completed() {
        let now = Utc::now();
        let mut t = task(Uuid::new_v4(), TaskStatus::Pending, now - Duration::days(5));
        t.due_date = Some(now - Duration::seconds(1));
        let view = build_dashboard(&user(1), &[], std::slice::from_ref(&t), now);
        assert_eq!(view.task_stats.overdue, 1);

        t.set_status(TaskStatus::Completed, now);
        let view = build_dashboard(&user(1), &[], std::slice::from_ref(&t), now);
        assert_eq!(view.task_stats.overdue, 0);
    }

    #[test]
    fn test_recent_tasks_are_capped_sorted_and_stable() {
        let now = Utc::now();
        let pid = Uuid::new_v4();
        let same = now - Duration::hours(1);
        let mut tasks: Vec<Task> = (0..8)
            .map(|i| task(pid, TaskStatus::Pending, now - Duration::hours(10 + i)))
            .collect();
        let tie_a = task(pid, TaskStatus::Pending, same);
        let tie_b = task(pid, TaskStatus::Pending, same);
        tasks.insert(3, tie_a.clone());
        tasks.push(tie_b.clone());

        let view = build_dashboard(&user(1), &[], &tasks, now);
        assert_eq!(view.recent_tasks.len(), LIST_LIMIT);
        assert!(view
            .recent_tasks
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(view.recent_tasks[0].id, tie_a.id);
        assert_eq!(view.recent_tasks[1].id, tie_b.id);
    }

    #[test]
    fn test_upcoming_window_is_inclusive_and_capped() {
        let now = Utc::now();
        let pid = Uuid::new_v4();
        let due = |offset: Duration, status: TaskStatus| {
            let mut t = task(pid, status, now - Duration::days(1));
            t.due_date = Some(now + offset);
            t
        };
        let at_now = due(Duration::zero(), TaskStatus::Pending);
        let at_edge = due(Duration::days(7), TaskStatus::InProgress);
        let past_edge = due(Duration::days(7) + Duration::seconds(1), TaskStatus::Pending);
        let overdue = due(-Duration::seconds(1), TaskStatus::Pending);
        let done = due(Duration::days(1), TaskStatus::Completed);
        let no_due = task(pid, TaskStatus::Pending, now);

        let tasks = vec![
            at_edge.clone(),
            past_edge,
            overdue,
            done,
            no_due,
            at_now.clone(),
        ];
        let view = build_dashboard(&user(1), &[], &tasks, now);
        assert_eq!(view.upcoming_tasks, vec![at_now, at_edge]);

        let many: Vec<Task> = (1..=9)
            .rev()
            .map(|h| due(Duration::hours(h), TaskStatus::Pending))
            .collect();
        let view = build_dashboard(&user(1), &[], &many, now);
        assert_eq!(view.upcoming_tasks.len(), LIST_LIMIT);
        assert!(view
            .upcoming_tasks
            .windows(2)
            .all(|w| w[0].due_date <= w[1].due_date));
        assert_eq!(view.upcoming_tasks[0].due_date, Some(now + Duration::hours(1)));
    }

    #[test]
    fn test_active_projects_and_foreign_projects() {
        let now = Utc::now();
        let mut projects: Vec<Project> = (0..7)
            .map(|i| project(1, ProjectStatus::Active, now - Duration::days(i)))
            .collect();
        projects.push(project(1, ProjectStatus::Archived, now));
        projects.push(project(1, ProjectStatus::Completed, now - Duration::days(30)));
        projects.push(project(2, ProjectStatus::Active, now));

        let view = build_dashboard(&user(1), &projects, &[], now);
        assert_eq!(
            view.project_stats,
            ProjectStats {
                total: 9,
                active: 7,
                completed: 1,
                archived: 1,
            }
        );
        assert_eq!(view.active_projects.len(), LIST_LIMIT);
        assert!(view.active_projects.iter().all(|p| p.owner_id == 1));
        assert_eq!(view.active_projects[0].updated_at, now);
        // 7 active within the last 6 days plus the archived one created now
        assert_eq!(view.recent_activity.projects_created, 8);
    }

    #[test]
    fn test_dashboard_is_idempotent() {
        let now = Utc::now();
        let p = project(1, ProjectStatus::Active, now - Duration::days(3));
        let mut t = task(p.id, TaskStatus::InProgress, now - Duration::days(2));
        t.due_date = Some(now + Duration::days(2));
        let projects = vec![p];
        let tasks = vec![t];

        let first = build_dashboard(&user(1), &projects, &tasks, now);
        let second = build_dashboard(&user(1), &projects, &tasks, now);
        assert_eq!(first, second);
    }

    #[test]
    fn test_profile_stats() {
        let now = Utc::now();
        let pid = Uuid::new_v4();
        let created = vec![
            task(pid, TaskStatus::Completed, now),
            task(pid, TaskStatus::Pending, now),
            task(pid, TaskStatus::InProgress, now),
        ];
        let projects = vec![project(1, ProjectStatus::Active, now)];
        assert_eq!(
            build_profile_stats(&projects, &created),
            ProfileStats {
                total_projects: 1,
                total_tasks: 3,
                completed_tasks: 1,
                completion_rate: 33,
            }
        );
        assert_eq!(build_profile_stats(&[], &[]), ProfileStats::default());
    }
}
