use crate::models::{Subtask, SubtaskProgress};

pub fn subtask_progress(subtasks: &[Subtask]) -> SubtaskProgress {
    let total = subtasks.len();
    let completed = subtasks.iter().filter(|subtask| subtask.completed).count();
    SubtaskProgress {
        completed,
        total,
        percentage: percentage(completed, total),
    }
}

pub fn percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

/// Position for a subtask appended after the existing ones.
pub fn next_order_position(subtasks: &[Subtask]) -> i32 {
    subtasks
        .iter()
        .map(|subtask| subtask.order_position)
        .max()
        .map(|max| max + 1)
        .unwrap_or(0)
}
