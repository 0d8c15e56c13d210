use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Assignment, AssignmentStatus, AssignmentUpdate, CheckIn, LittleWin, NewAssignment,
    NewCheckIn, NewLittleWin, NewProfile, NewSubtask, ProfileUpdate, Subtask, SubtaskUpdate,
    UserProfile,
};
use crate::progress::next_order_position;
use crate::store::Store;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserProfile>,
    checkins: Vec<CheckIn>,
    assignments: HashMap<Uuid, Assignment>,
    subtasks: HashMap<Uuid, Subtask>,
    wins: Vec<LittleWin>,
}

impl Tables {
    /// Mirrors the users foreign key on check-ins, assignments and wins.
    fn require_profile(&self, user_id: Uuid) -> AppResult<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(AppError::NotFound("profile"))
        }
    }

    fn owns_assignment(&self, user_id: Uuid, assignment_id: Uuid) -> bool {
        self.assignments
            .get(&assignment_id)
            .map(|assignment| assignment.user_id == user_id)
            .unwrap_or(false)
    }

    fn subtasks_of(&self, assignment_id: Uuid) -> Vec<Subtask> {
        let mut subtasks: Vec<Subtask> = self
            .subtasks
            .values()
            .filter(|subtask| subtask.assignment_id == assignment_id)
            .cloned()
            .collect();
        subtasks.sort_by(|a, b| {
            a.order_position
                .cmp(&b.order_position)
                .then(a.created_at.cmp(&b.created_at))
        });
        subtasks
    }
}

/// Process-local store for development and tests. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_profile(&self, user_id: Uuid, profile: NewProfile) -> AppResult<UserProfile> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let entry = tables.users.entry(user_id).or_insert_with(|| UserProfile {
            id: user_id,
            email: profile.email.clone(),
            full_name: None,
            display_name: profile.display_name.clone(),
            school: None,
            academic_year: None,
            consent_at: now,
            created_at: now,
            updated_at: now,
        });
        entry.email = profile.email;
        entry.updated_at = now;
        Ok(entry.clone())
    }

    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> AppResult<Option<UserProfile>> {
        let mut tables = self.tables.write().await;
        let Some(profile) = tables.users.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(full_name) = update.full_name {
            profile.full_name = Some(full_name);
        }
        if let Some(display_name) = update.display_name {
            profile.display_name = Some(display_name);
        }
        if let Some(school) = update.school {
            profile.school = Some(school);
        }
        if let Some(year) = update.academic_year {
            profile.academic_year = Some(year);
        }
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn create_checkin(&self, user_id: Uuid, checkin: NewCheckIn) -> AppResult<CheckIn> {
        let mut tables = self.tables.write().await;
        tables.require_profile(user_id)?;
        let record = CheckIn {
            id: Uuid::new_v4(),
            user_id,
            mood: checkin.mood,
            energy: checkin.energy,
            focus: checkin.focus,
            notes: checkin.notes,
            created_at: Utc::now(),
        };
        tables.checkins.push(record.clone());
        Ok(record)
    }

    async fn recent_checkins(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<CheckIn>> {
        let tables = self.tables.read().await;
        let mut checkins: Vec<CheckIn> = tables
            .checkins
            .iter()
            .filter(|c| c.user_id == user_id && c.created_at >= since)
            .cloned()
            .collect();
        checkins.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(checkins)
    }

    async fn latest_checkin(&self, user_id: Uuid) -> AppResult<Option<CheckIn>> {
        let tables = self.tables.read().await;
        Ok(tables
            .checkins
            .iter()
            .filter(|c| c.user_id == user_id)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn count_checkins_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .checkins
            .iter()
            .filter(|c| c.user_id == user_id && c.created_at >= since)
            .count() as i64)
    }

    async fn list_assignments(&self, user_id: Uuid) -> AppResult<Vec<Assignment>> {
        let tables = self.tables.read().await;
        let mut assignments: Vec<Assignment> = tables
            .assignments
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        assignments.sort_by(|a, b| a.due_at.cmp(&b.due_at));
        Ok(assignments)
    }

    async fn get_assignment(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Assignment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .get(&id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    async fn create_assignment(
        &self,
        user_id: Uuid,
        assignment: NewAssignment,
    ) -> AppResult<Assignment> {
        let mut tables = self.tables.write().await;
        tables.require_profile(user_id)?;
        let now = Utc::now();
        let record = Assignment {
            id: Uuid::new_v4(),
            user_id,
            course: assignment.course,
            title: assignment.title,
            description: assignment.description,
            due_at: assignment.due_at,
            impact: assignment.impact,
            est_minutes: assignment.est_minutes,
            status: assignment.status,
            created_at: now,
            updated_at: now,
        };
        tables.assignments.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_assignment(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: AssignmentUpdate,
    ) -> AppResult<Option<Assignment>> {
        let mut tables = self.tables.write().await;
        let Some(assignment) = tables
            .assignments
            .get_mut(&id)
            .filter(|a| a.user_id == user_id)
        else {
            return Ok(None);
        };
        if let Some(course) = update.course {
            assignment.course = course;
        }
        if let Some(title) = update.title {
            assignment.title = title;
        }
        if let Some(description) = update.description {
            assignment.description = Some(description);
        }
        if let Some(due_at) = update.due_at {
            assignment.due_at = due_at;
        }
        if let Some(impact) = update.impact {
            assignment.impact = impact;
        }
        if let Some(est_minutes) = update.est_minutes {
            assignment.est_minutes = est_minutes;
        }
        if let Some(status) = update.status {
            assignment.status = status;
        }
        assignment.updated_at = Utc::now();
        Ok(Some(assignment.clone()))
    }

    async fn delete_assignment(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.owns_assignment(user_id, id) {
            return Ok(false);
        }
        tables.assignments.remove(&id);
        tables.subtasks.retain(|_, subtask| subtask.assignment_id != id);
        Ok(true)
    }

    async fn count_completed_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .values()
            .filter(|a| {
                a.user_id == user_id
                    && a.status == AssignmentStatus::Completed
                    && a.updated_at >= since
            })
            .count() as i64)
    }

    async fn list_subtasks(&self, user_id: Uuid, assignment_id: Uuid) -> AppResult<Vec<Subtask>> {
        let tables = self.tables.read().await;
        if !tables.owns_assignment(user_id, assignment_id) {
            return Ok(Vec::new());
        }
        Ok(tables.subtasks_of(assignment_id))
    }

    async fn create_subtask(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
        subtask: NewSubtask,
    ) -> AppResult<Option<Subtask>> {
        let mut tables = self.tables.write().await;
        if !tables.owns_assignment(user_id, assignment_id) {
            return Ok(None);
        }
        let now = Utc::now();
        let record = Subtask {
            id: Uuid::new_v4(),
            assignment_id,
            title: subtask.title,
            description: subtask.description,
            est_minutes: subtask.est_minutes,
            completed: false,
            order_position: next_order_position(&tables.subtasks_of(assignment_id)),
            created_at: now,
            updated_at: now,
        };
        tables.subtasks.insert(record.id, record.clone());
        Ok(Some(record))
    }

    async fn update_subtask(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: SubtaskUpdate,
    ) -> AppResult<Option<Subtask>> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .subtasks
            .get(&id)
            .map(|subtask| subtask.assignment_id)
            .map(|assignment_id| tables.owns_assignment(user_id, assignment_id))
            .unwrap_or(false);
        if !owned {
            return Ok(None);
        }
        let Some(subtask) = tables.subtasks.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            subtask.title = title;
        }
        if let Some(description) = update.description {
            subtask.description = Some(description);
        }
        if let Some(est_minutes) = update.est_minutes {
            subtask.est_minutes = est_minutes;
        }
        if let Some(completed) = update.completed {
            subtask.completed = completed;
        }
        if let Some(order_position) = update.order_position {
            subtask.order_position = order_position;
        }
        subtask.updated_at = Utc::now();
        Ok(Some(subtask.clone()))
    }

    async fn delete_subtask(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .subtasks
            .get(&id)
            .map(|subtask| tables.owns_assignment(user_id, subtask.assignment_id))
            .unwrap_or(false);
        if owned {
            tables.subtasks.remove(&id);
        }
        Ok(owned)
    }

    async fn create_win(&self, user_id: Uuid, win: NewLittleWin) -> AppResult<LittleWin> {
        let mut tables = self.tables.write().await;
        tables.require_profile(user_id)?;
        let record = LittleWin {
            id: Uuid::new_v4(),
            user_id,
            category: win.category,
            description: win.description,
            created_at: Utc::now(),
        };
        tables.wins.push(record.clone());
        Ok(record)
    }

    async fn recent_wins(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<Vec<LittleWin>> {
        let tables = self.tables.read().await;
        let mut wins: Vec<LittleWin> = tables
            .wins
            .iter()
            .filter(|w| w.user_id == user_id && w.created_at >= since)
            .cloned()
            .collect();
        wins.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(wins)
    }

    async fn count_wins_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .wins
            .iter()
            .filter(|w| w.user_id == user_id && w.created_at >= since)
            .count() as i64)
    }
}
