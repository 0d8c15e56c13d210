use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcademicYear {
    Freshman,
    Sophomore,
    Junior,
    Senior,
    Graduate,
    Other,
}

impl AcademicYear {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcademicYear::Freshman => "freshman",
            AcademicYear::Sophomore => "sophomore",
            AcademicYear::Junior => "junior",
            AcademicYear::Senior => "senior",
            AcademicYear::Graduate => "graduate",
            AcademicYear::Other => "other",
        }
    }
}

impl FromStr for AcademicYear {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "freshman" => Ok(AcademicYear::Freshman),
            "sophomore" => Ok(AcademicYear::Sophomore),
            "junior" => Ok(AcademicYear::Junior),
            "senior" => Ok(AcademicYear::Senior),
            "graduate" => Ok(AcademicYear::Graduate),
            "other" => Ok(AcademicYear::Other),
            other => Err(format!("unknown academic year '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Dropped,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::NotStarted => "not_started",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Dropped => "dropped",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AssignmentStatus::NotStarted | AssignmentStatus::InProgress
        )
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "not_started" => Ok(AssignmentStatus::NotStarted),
            "in_progress" => Ok(AssignmentStatus::InProgress),
            "completed" => Ok(AssignmentStatus::Completed),
            "dropped" => Ok(AssignmentStatus::Dropped),
            other => Err(format!("unknown assignment status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinCategory {
    Academic,
    SelfCare,
    Social,
    Personal,
    Other,
}

impl WinCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WinCategory::Academic => "academic",
            WinCategory::SelfCare => "self_care",
            WinCategory::Social => "social",
            WinCategory::Personal => "personal",
            WinCategory::Other => "other",
        }
    }
}

impl FromStr for WinCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "academic" => Ok(WinCategory::Academic),
            "self_care" => Ok(WinCategory::SelfCare),
            "social" => Ok(WinCategory::Social),
            "personal" => Ok(WinCategory::Personal),
            "other" => Ok(WinCategory::Other),
            other => Err(format!("unknown win category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub school: Option<String>,
    pub academic_year: Option<AcademicYear>,
    pub consent_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A profile is complete once the setup step has filled in name, school and year.
    pub fn is_complete(&self) -> bool {
        let filled = |value: &Option<String>| {
            value
                .as_deref()
                .map(|text| !text.trim().is_empty())
                .unwrap_or(false)
        };
        filled(&self.full_name) && filled(&self.school) && self.academic_year.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProfile {
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub school: Option<String>,
    pub academic_year: Option<AcademicYear>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mood: i32,
    pub energy: i32,
    pub focus: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCheckIn {
    pub mood: i32,
    pub energy: i32,
    pub focus: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course: String,
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
    pub impact: i32,
    pub est_minutes: i32,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAssignment {
    pub course: String,
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
    pub impact: i32,
    pub est_minutes: i32,
    #[serde(default)]
    pub status: AssignmentStatus,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentUpdate {
    pub course: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub impact: Option<i32>,
    pub est_minutes: Option<i32>,
    pub status: Option<AssignmentStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub est_minutes: i32,
    pub completed: bool,
    pub order_position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubtask {
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "default_subtask_minutes")]
    pub est_minutes: i32,
}

fn default_subtask_minutes() -> i32 {
    30
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubtaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub est_minutes: Option<i32>,
    pub completed: Option<bool>,
    pub order_position: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LittleWin {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: WinCategory,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLittleWin {
    pub category: WinCategory,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubtaskProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CheckInAverages {
    pub mood: f64,
    pub energy: f64,
    pub focus: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressStats {
    pub checkins: i64,
    pub completed: i64,
    pub wins: i64,
    pub streak: u32,
    pub averages: CheckInAverages,
    pub growth_message: String,
}
