use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Assignment, AssignmentStatus};

pub const UPCOMING_DAYS: i64 = 7;
pub const FOCUS_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    DueDate,
    Priority,
    Course,
}

pub fn sort_assignments(assignments: &mut [Assignment], sort_by: SortBy) {
    match sort_by {
        SortBy::DueDate => assignments.sort_by(|a, b| a.due_at.cmp(&b.due_at)),
        SortBy::Priority => assignments.sort_by(|a, b| b.impact.cmp(&a.impact)),
        SortBy::Course => assignments.sort_by(|a, b| a.course.cmp(&b.course)),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitioned {
    pub active: Vec<Assignment>,
    pub completed: Vec<Assignment>,
    pub dropped: Vec<Assignment>,
}

/// Splits assignments by status, sorting each group.
pub fn partition(assignments: Vec<Assignment>, sort_by: SortBy) -> Partitioned {
    let mut groups = Partitioned::default();
    for assignment in assignments {
        match assignment.status {
            AssignmentStatus::NotStarted | AssignmentStatus::InProgress => {
                groups.active.push(assignment)
            }
            AssignmentStatus::Completed => groups.completed.push(assignment),
            AssignmentStatus::Dropped => groups.dropped.push(assignment),
        }
    }
    sort_assignments(&mut groups.active, sort_by);
    sort_assignments(&mut groups.completed, sort_by);
    sort_assignments(&mut groups.dropped, sort_by);
    groups
}

/// Unique course names and titles, sorted, for autocompleting the add form.
pub fn autocomplete(assignments: &[Assignment]) -> (Vec<String>, Vec<String>) {
    let courses: BTreeSet<&str> = assignments.iter().map(|a| a.course.as_str()).collect();
    let titles: BTreeSet<&str> = assignments.iter().map(|a| a.title.as_str()).collect();
    (
        courses.into_iter().map(str::to_string).collect(),
        titles.into_iter().map(str::to_string).collect(),
    )
}

/// Unfinished work due within the next week, soonest first.
pub fn upcoming(assignments: &[Assignment], now: DateTime<Utc>) -> Vec<Assignment> {
    let horizon = now + Duration::days(UPCOMING_DAYS);
    let mut due: Vec<Assignment> = assignments
        .iter()
        .filter(|a| a.status.is_active() && a.due_at >= now && a.due_at <= horizon)
        .cloned()
        .collect();
    sort_assignments(&mut due, SortBy::DueDate);
    due
}

/// Highest-impact untouched work due by this time tomorrow.
pub fn todays_focus(assignments: &[Assignment], now: DateTime<Utc>) -> Vec<Assignment> {
    let tomorrow = now + Duration::days(1);
    let mut focus: Vec<Assignment> = assignments
        .iter()
        .filter(|a| a.status == AssignmentStatus::NotStarted && a.due_at <= tomorrow)
        .cloned()
        .collect();
    sort_assignments(&mut focus, SortBy::Priority);
    focus.truncate(FOCUS_LIMIT);
    focus
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn assignment(course: &str, title: &str, due_in_hours: i64, impact: i32) -> Assignment {
        let now = Utc::now();
        Assignment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            course: course.to_string(),
            title: title.to_string(),
            description: None,
            due_at: now + Duration::hours(due_in_hours),
            impact,
            est_minutes: 60,
            status: AssignmentStatus::NotStarted,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn sorts_by_each_order() {
        let mut list = vec![
            assignment("MATH 210", "Problem Set", 48, 2),
            assignment("BIO 101", "Lab Report", 72, 5),
            assignment("CS 301", "Final Project", 24, 3),
        ];

        sort_assignments(&mut list, SortBy::DueDate);
        assert_eq!(list[0].title, "Final Project");

        sort_assignments(&mut list, SortBy::Priority);
        assert_eq!(list[0].impact, 5);

        sort_assignments(&mut list, SortBy::Course);
        assert_eq!(list[0].course, "BIO 101");
    }

    #[test]
    fn partition_groups_by_status() {
        let mut done = assignment("CS 301", "Quiz", 24, 1);
        done.status = AssignmentStatus::Completed;
        let mut dropped = assignment("CS 301", "Extra Credit", 24, 1);
        dropped.status = AssignmentStatus::Dropped;
        let mut started = assignment("CS 301", "Essay", 24, 1);
        started.status = AssignmentStatus::InProgress;

        let groups = partition(
            vec![done, dropped, started, assignment("CS 301", "Reading", 5, 1)],
            SortBy::DueDate,
        );
        assert_eq!(groups.active.len(), 2);
        assert_eq!(groups.active[0].title, "Reading");
        assert_eq!(groups.completed.len(), 1);
        assert_eq!(groups.dropped.len(), 1);
    }

    #[test]
    fn autocomplete_dedupes_and_sorts() {
        let list = vec![
            assignment("CS 301", "Final Project", 24, 3),
            assignment("BIO 101", "Final Project", 24, 3),
            assignment("CS 301", "Midterm", 24, 3),
        ];
        let (courses, titles) = autocomplete(&list);
        assert_eq!(courses, vec!["BIO 101", "CS 301"]);
        assert_eq!(titles, vec!["Final Project", "Midterm"]);
    }

    #[test]
    fn upcoming_skips_past_distant_and_finished_work() {
        let now = Utc::now();
        let mut finished = assignment("CS 301", "Finished", 10, 3);
        finished.status = AssignmentStatus::Completed;
        let list = vec![
            assignment("CS 301", "Overdue", -5, 3),
            assignment("CS 301", "Soon", 30, 3),
            assignment("CS 301", "Later", 24 * 10, 3),
            finished,
        ];
        let due = upcoming(&list, now);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].title, "Soon");
    }

    #[test]
    fn focus_is_top_three_by_impact() {
        let now = Utc::now();
        let mut started = assignment("CS 301", "Started", 2, 5);
        started.status = AssignmentStatus::InProgress;
        let list = vec![
            assignment("A", "one", 2, 1),
            assignment("A", "two", 3, 4),
            assignment("A", "three", 4, 2),
            assignment("A", "four", 5, 5),
            assignment("A", "next week", 24 * 7, 5),
            started,
        ];
        let focus = todays_focus(&list, now);
        let titles: Vec<&str> = focus.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["four", "two", "three"]);
    }
}
