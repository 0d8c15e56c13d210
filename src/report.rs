use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::handlers::{AssignmentCard, BoardResponse};
use crate::models::{CheckInAverages, LittleWin, ProgressStats};

const MAX_LISTED_WINS: usize = 5;

pub fn build_report(
    student: &str,
    generated_at: DateTime<Utc>,
    stats: &ProgressStats,
    board: &BoardResponse,
    wins: &[LittleWin],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# StudyHaven Progress Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        student,
        generated_at.date_naive()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## This Month");
    let _ = writeln!(output, "- Check-ins: {}", stats.checkins);
    let _ = writeln!(output, "- Assignments completed: {}", stats.completed);
    let _ = writeln!(output, "- Little wins: {}", stats.wins);
    let _ = writeln!(output, "- Current streak: {} day(s)", stats.streak);
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", stats.growth_message);

    let _ = writeln!(output);
    let _ = writeln!(output, "## How You've Been Feeling");
    if stats.averages == CheckInAverages::default() {
        let _ = writeln!(output, "No check-ins in the last 30 days.");
    } else {
        let _ = writeln!(
            output,
            "- Mood {:.1}, energy {:.1}, focus {:.1} (30-day average)",
            stats.averages.mood, stats.averages.energy, stats.averages.focus
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Active Assignments");
    if board.active.is_empty() {
        let _ = writeln!(output, "Nothing on the board right now.");
    } else {
        for card in board.active.iter() {
            write_card(&mut output, card);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recently Completed");
    if board.completed.is_empty() {
        let _ = writeln!(output, "No completed assignments yet.");
    } else {
        for card in board.completed.iter() {
            let _ = writeln!(
                output,
                "- {}: {}",
                card.assignment.course, card.assignment.title
            );
        }
    }

    let mut recent_wins = wins.to_vec();
    recent_wins.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Little Wins");

    if recent_wins.is_empty() {
        let _ = writeln!(output, "No little wins logged for this window.");
    } else {
        for win in recent_wins.iter().take(MAX_LISTED_WINS) {
            let _ = writeln!(
                output,
                "- {} ({}): {}",
                win.created_at.date_naive(),
                win.category.as_str(),
                win.description
            );
        }
    }

    output
}

fn write_card(output: &mut String, card: &AssignmentCard) {
    let assignment = &card.assignment;
    let _ = writeln!(
        output,
        "- {}: {} due {} [{}] impact {}/5, {}% done ({}/{} subtasks)",
        assignment.course,
        assignment.title,
        assignment.due_at.format("%Y-%m-%d %H:%M"),
        assignment.status,
        assignment.impact,
        card.progress.percentage,
        card.progress.completed,
        card.progress.total
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, AssignmentStatus, SubtaskProgress, WinCategory};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn stats(checkins: i64, streak: u32) -> ProgressStats {
        let averages = if checkins == 0 {
            CheckInAverages::default()
        } else {
            CheckInAverages {
                mood: 3.5,
                energy: 2.0,
                focus: 4.0,
            }
        };
        ProgressStats {
            checkins,
            completed: 1,
            wins: 2,
            streak,
            averages,
            growth_message: "You're building a habit.".to_string(),
        }
    }

    fn card(title: &str, status: AssignmentStatus, now: DateTime<Utc>) -> AssignmentCard {
        AssignmentCard {
            assignment: Assignment {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                course: "CS 301".to_string(),
                title: title.to_string(),
                description: None,
                due_at: now + Duration::days(1),
                impact: 3,
                est_minutes: 60,
                status,
                created_at: now,
                updated_at: now,
            },
            progress: SubtaskProgress {
                completed: 1,
                total: 3,
                percentage: 33,
            },
        }
    }

    fn empty_board() -> BoardResponse {
        BoardResponse {
            active: Vec::new(),
            completed: Vec::new(),
            dropped: Vec::new(),
            course_suggestions: Vec::new(),
            title_suggestions: Vec::new(),
        }
    }

    fn win(description: &str, at: DateTime<Utc>) -> LittleWin {
        LittleWin {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category: WinCategory::SelfCare,
            description: description.to_string(),
            created_at: at,
        }
    }

    #[test]
    fn report_lists_board_and_stats() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap();
        let mut board = empty_board();
        board.active.push(card("Final Project", AssignmentStatus::InProgress, now));
        board.completed.push(card("Essay", AssignmentStatus::Completed, now));

        let report = build_report("Morgan", now, &stats(4, 2), &board, &[]);

        assert!(report.starts_with("# StudyHaven Progress Report"));
        assert!(report.contains("Generated for Morgan on 2026-03-04"));
        assert!(report.contains("- Check-ins: 4"));
        assert!(report.contains("- Current streak: 2 day(s)"));
        assert!(report.contains("Mood 3.5, energy 2.0, focus 4.0"));
        assert!(report.contains("- CS 301: Final Project due 2026-03-05 12:00 [in_progress]"));
        assert!(report.contains("33% done (1/3 subtasks)"));
        assert!(report.contains("- CS 301: Essay"));
        assert!(report.contains("No little wins logged"));
    }

    #[test]
    fn empty_sections_get_placeholders() {
        let now = Utc::now();
        let report = build_report("Morgan", now, &stats(0, 0), &empty_board(), &[]);
        assert!(report.contains("No check-ins in the last 30 days."));
        assert!(report.contains("Nothing on the board right now."));
        assert!(report.contains("No completed assignments yet."));
    }

    #[test]
    fn newest_wins_come_first() {
        let now = Utc::now();
        let wins = vec![
            win("Older", now - Duration::days(3)),
            win("Newest", now),
            win("Middle", now - Duration::days(1)),
        ];
        let report = build_report("Morgan", now, &stats(1, 1), &empty_board(), &wins);

        let newest = report.find("Newest").unwrap();
        let middle = report.find("Middle").unwrap();
        let older = report.find("Older").unwrap();
        assert!(newest < middle && middle < older);
        assert!(report.contains("(self_care)"));
    }
}
