use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    Assignment, AssignmentUpdate, CheckIn, LittleWin, NewAssignment, NewCheckIn, NewLittleWin,
    NewProfile, NewSubtask, ProfileUpdate, Subtask, SubtaskUpdate, UserProfile,
};

/// Typed data access for the five record kinds.
///
/// Every call is scoped by the owning user id. Subtasks are reached through
/// their assignment, so a subtask belonging to another user reads as absent.
/// Updates stamp `updated_at`; nothing is retried.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_profile(&self, user_id: Uuid, profile: NewProfile) -> AppResult<UserProfile>;
    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;
    async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> AppResult<Option<UserProfile>>;

    async fn create_checkin(&self, user_id: Uuid, checkin: NewCheckIn) -> AppResult<CheckIn>;
    /// Newest first.
    async fn recent_checkins(&self, user_id: Uuid, since: DateTime<Utc>)
        -> AppResult<Vec<CheckIn>>;
    async fn latest_checkin(&self, user_id: Uuid) -> AppResult<Option<CheckIn>>;
    async fn count_checkins_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<i64>;

    /// Ordered by due date, earliest first.
    async fn list_assignments(&self, user_id: Uuid) -> AppResult<Vec<Assignment>>;
    async fn get_assignment(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Assignment>>;
    async fn create_assignment(
        &self,
        user_id: Uuid,
        assignment: NewAssignment,
    ) -> AppResult<Assignment>;
    async fn update_assignment(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: AssignmentUpdate,
    ) -> AppResult<Option<Assignment>>;
    async fn delete_assignment(&self, user_id: Uuid, id: Uuid) -> AppResult<bool>;
    /// Assignments marked completed since `since`, judged by `updated_at`.
    async fn count_completed_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<i64>;

    /// Ordered by `order_position`.
    async fn list_subtasks(&self, user_id: Uuid, assignment_id: Uuid) -> AppResult<Vec<Subtask>>;
    /// Appends after the current highest `order_position`.
    async fn create_subtask(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
        subtask: NewSubtask,
    ) -> AppResult<Option<Subtask>>;
    async fn update_subtask(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: SubtaskUpdate,
    ) -> AppResult<Option<Subtask>>;
    async fn delete_subtask(&self, user_id: Uuid, id: Uuid) -> AppResult<bool>;

    async fn create_win(&self, user_id: Uuid, win: NewLittleWin) -> AppResult<LittleWin>;
    /// Newest first.
    async fn recent_wins(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<Vec<LittleWin>>;
    async fn count_wins_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<i64>;
}
