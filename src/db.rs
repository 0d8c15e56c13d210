use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{
    Assignment, AssignmentUpdate, CheckIn, LittleWin, NewAssignment, NewCheckIn, NewLittleWin,
    NewProfile, NewSubtask, ProfileUpdate, Subtask, SubtaskUpdate, UserProfile,
};
use crate::store::Store;

const USER_COLUMNS: &str = "id, email, full_name, display_name, school, academic_year, \
     consent_at, created_at, updated_at";
const CHECKIN_COLUMNS: &str = "id, user_id, mood, energy, focus, notes, created_at";
const ASSIGNMENT_COLUMNS: &str = "id, user_id, course, title, description, due_at, impact, \
     est_minutes, status, created_at, updated_at";
const SUBTASK_COLUMNS: &str = "s.id, s.assignment_id, s.title, s.description, s.est_minutes, \
     s.completed, s.order_position, s.created_at, s.updated_at";
const WIN_COLUMNS: &str = "id, user_id, category, description, created_at";

pub async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub const DEMO_USER_ID: &str = "6710d328-07f1-4a0b-afe5-64f08e7c105d";

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let user_id = Uuid::parse_str(DEMO_USER_ID)?;
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO studyhaven.users (id, email, full_name, display_name, school, academic_year)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE
        SET full_name = EXCLUDED.full_name, school = EXCLUDED.school
        "#,
    )
    .bind(user_id)
    .bind("morgan.demo@example.edu")
    .bind("Morgan Ellis")
    .bind("Morgan")
    .bind("State University")
    .bind("junior")
    .execute(pool)
    .await?;

    let assignments = vec![
        (
            Uuid::parse_str("1a10ae26-c839-4db2-87fe-e4c3476810a8")?,
            "CS 301",
            "Final Project",
            now + Duration::days(5),
            5,
            240,
            "in_progress",
        ),
        (
            Uuid::parse_str("784c2020-ffba-4891-9cda-921ad1952c70")?,
            "BIO 101",
            "Lab Report",
            now + Duration::days(1),
            3,
            90,
            "not_started",
        ),
        (
            Uuid::parse_str("6f1c3b0e-5c55-4a4b-9b0e-1f3b8b2a7c10")?,
            "HIST 220",
            "Reading Response",
            now - Duration::days(2),
            2,
            45,
            "completed",
        ),
    ];

    for (id, course, title, due_at, impact, est_minutes, status) in &assignments {
        sqlx::query(
            r#"
            INSERT INTO studyhaven.assignments
            (id, user_id, course, title, due_at, impact, est_minutes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(course)
        .bind(title)
        .bind(due_at)
        .bind(impact)
        .bind(est_minutes)
        .bind(status)
        .execute(pool)
        .await?;
    }

    let project_id = assignments[0].0;
    let subtasks = [
        ("a1b6a1d4-0d36-4a53-9a55-6a8f0b3f4d01", "Write proposal", 60, true),
        ("a1b6a1d4-0d36-4a53-9a55-6a8f0b3f4d02", "Build prototype", 120, false),
        ("a1b6a1d4-0d36-4a53-9a55-6a8f0b3f4d03", "Record demo", 60, false),
    ];

    for (position, (id, title, est_minutes, completed)) in subtasks.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO studyhaven.subtasks
            (id, assignment_id, title, est_minutes, completed, order_position)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(project_id)
        .bind(title)
        .bind(est_minutes)
        .bind(completed)
        .bind(position as i32)
        .execute(pool)
        .await?;
    }

    let checkins = [
        ("b2c7b2e5-1e47-4b64-8b66-7b9f1c4f5e01", 0, 3, 4, 3),
        ("b2c7b2e5-1e47-4b64-8b66-7b9f1c4f5e02", 1, 2, 2, 3),
        ("b2c7b2e5-1e47-4b64-8b66-7b9f1c4f5e03", 2, 4, 4, 4),
    ];

    for (id, days_ago, mood, energy, focus) in checkins {
        sqlx::query(
            r#"
            INSERT INTO studyhaven.checkins (id, user_id, mood, energy, focus, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(user_id)
        .bind(mood)
        .bind(energy)
        .bind(focus)
        .bind(now - Duration::days(days_ago))
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO studyhaven.little_wins (id, user_id, category, description)
        VALUES ($1, $2, 'academic', 'Asked a question in class')
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(Uuid::parse_str("c3d8c3f6-2f58-4c75-9c77-8ca02d5a6f01")?)
    .bind(user_id)
    .execute(pool)
    .await?;

    tracing::info!(%user_id, "seeded demo student");
    Ok(())
}

fn parse_column<T>(row: &PgRow, column: &str) -> AppResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(AppError::Internal)
}

fn profile_from_row(row: &PgRow) -> AppResult<UserProfile> {
    let academic_year: Option<String> = row.try_get("academic_year")?;
    Ok(UserProfile {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        display_name: row.try_get("display_name")?,
        school: row.try_get("school")?,
        academic_year: academic_year
            .map(|value| value.parse())
            .transpose()
            .map_err(AppError::Internal)?,
        consent_at: row.try_get("consent_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn checkin_from_row(row: &PgRow) -> AppResult<CheckIn> {
    Ok(CheckIn {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        mood: row.try_get("mood")?,
        energy: row.try_get("energy")?,
        focus: row.try_get("focus")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
    })
}

fn assignment_from_row(row: &PgRow) -> AppResult<Assignment> {
    Ok(Assignment {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        course: row.try_get("course")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        due_at: row.try_get("due_at")?,
        impact: row.try_get("impact")?,
        est_minutes: row.try_get("est_minutes")?,
        status: parse_column(row, "status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn subtask_from_row(row: &PgRow) -> AppResult<Subtask> {
    Ok(Subtask {
        id: row.try_get("id")?,
        assignment_id: row.try_get("assignment_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        est_minutes: row.try_get("est_minutes")?,
        completed: row.try_get("completed")?,
        order_position: row.try_get("order_position")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn win_from_row(row: &PgRow) -> AppResult<LittleWin> {
    Ok(LittleWin {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        category: parse_column(row, "category")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Inserts keyed on `user_id` fail the users foreign key until the profile
/// exists; report that as a missing profile rather than a store fault.
fn profile_required(err: sqlx::Error) -> AppError {
    let missing_user = err
        .as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation());
    if missing_user {
        AppError::NotFound("profile")
    } else {
        AppError::Database(err)
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_profile(&self, user_id: Uuid, profile: NewProfile) -> AppResult<UserProfile> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO studyhaven.users (id, email, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email, updated_at = now()
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&profile.email)
        .bind(&profile.display_name)
        .fetch_one(&self.pool)
        .await?;

        profile_from_row(&row)
    }

    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM studyhaven.users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE studyhaven.users
            SET full_name = COALESCE($2, full_name),
                display_name = COALESCE($3, display_name),
                school = COALESCE($4, school),
                academic_year = COALESCE($5, academic_year),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&update.full_name)
        .bind(&update.display_name)
        .bind(&update.school)
        .bind(update.academic_year.map(|year| year.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn create_checkin(&self, user_id: Uuid, checkin: NewCheckIn) -> AppResult<CheckIn> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO studyhaven.checkins (id, user_id, mood, energy, focus, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CHECKIN_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(checkin.mood)
        .bind(checkin.energy)
        .bind(checkin.focus)
        .bind(&checkin.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(profile_required)?;

        checkin_from_row(&row)
    }

    async fn recent_checkins(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<CheckIn>> {
        let rows = sqlx::query(&format!(
            "SELECT {CHECKIN_COLUMNS} FROM studyhaven.checkins \
             WHERE user_id = $1 AND created_at >= $2 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(checkin_from_row).collect()
    }

    async fn latest_checkin(&self, user_id: Uuid) -> AppResult<Option<CheckIn>> {
        let row = sqlx::query(&format!(
            "SELECT {CHECKIN_COLUMNS} FROM studyhaven.checkins \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(checkin_from_row).transpose()
    }

    async fn count_checkins_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM studyhaven.checkins \
             WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?
        .try_get("count")?;

        Ok(count)
    }

    async fn list_assignments(&self, user_id: Uuid) -> AppResult<Vec<Assignment>> {
        let rows = sqlx::query(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM studyhaven.assignments \
             WHERE user_id = $1 ORDER BY due_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(assignment_from_row).collect()
    }

    async fn get_assignment(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Assignment>> {
        let row = sqlx::query(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM studyhaven.assignments \
             WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(assignment_from_row).transpose()
    }

    async fn create_assignment(
        &self,
        user_id: Uuid,
        assignment: NewAssignment,
    ) -> AppResult<Assignment> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO studyhaven.assignments
            (id, user_id, course, title, description, due_at, impact, est_minutes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&assignment.course)
        .bind(&assignment.title)
        .bind(&assignment.description)
        .bind(assignment.due_at)
        .bind(assignment.impact)
        .bind(assignment.est_minutes)
        .bind(assignment.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(profile_required)?;

        assignment_from_row(&row)
    }

    async fn update_assignment(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: AssignmentUpdate,
    ) -> AppResult<Option<Assignment>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE studyhaven.assignments
            SET course = COALESCE($3, course),
                title = COALESCE($4, title),
                description = COALESCE($5, description),
                due_at = COALESCE($6, due_at),
                impact = COALESCE($7, impact),
                est_minutes = COALESCE($8, est_minutes),
                status = COALESCE($9, status),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&update.course)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.due_at)
        .bind(update.impact)
        .bind(update.est_minutes)
        .bind(update.status.map(|status| status.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(assignment_from_row).transpose()
    }

    async fn delete_assignment(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM studyhaven.assignments WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_completed_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM studyhaven.assignments \
             WHERE user_id = $1 AND status = 'completed' AND updated_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?
        .try_get("count")?;

        Ok(count)
    }

    async fn list_subtasks(&self, user_id: Uuid, assignment_id: Uuid) -> AppResult<Vec<Subtask>> {
        let rows = sqlx::query(&format!(
            "SELECT {SUBTASK_COLUMNS} FROM studyhaven.subtasks s \
             JOIN studyhaven.assignments a ON a.id = s.assignment_id \
             WHERE s.assignment_id = $1 AND a.user_id = $2 \
             ORDER BY s.order_position ASC, s.created_at ASC"
        ))
        .bind(assignment_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(subtask_from_row).collect()
    }

    async fn create_subtask(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
        subtask: NewSubtask,
    ) -> AppResult<Option<Subtask>> {
        let row = sqlx::query(&format!(
            r#"
            WITH owned AS (
                SELECT id FROM studyhaven.assignments WHERE id = $2 AND user_id = $3
            ), s AS (
                INSERT INTO studyhaven.subtasks
                (id, assignment_id, title, description, est_minutes, completed, order_position)
                SELECT $1, owned.id, $4, $5, $6, FALSE,
                       COALESCE(
                           (SELECT MAX(order_position) + 1 FROM studyhaven.subtasks
                            WHERE assignment_id = owned.id),
                           0
                       )
                FROM owned
                RETURNING *
            )
            SELECT {SUBTASK_COLUMNS} FROM s
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(assignment_id)
        .bind(user_id)
        .bind(&subtask.title)
        .bind(&subtask.description)
        .bind(subtask.est_minutes)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(subtask_from_row).transpose()
    }

    async fn update_subtask(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: SubtaskUpdate,
    ) -> AppResult<Option<Subtask>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE studyhaven.subtasks s
            SET title = COALESCE($3, s.title),
                description = COALESCE($4, s.description),
                est_minutes = COALESCE($5, s.est_minutes),
                completed = COALESCE($6, s.completed),
                order_position = COALESCE($7, s.order_position),
                updated_at = now()
            FROM studyhaven.assignments a
            WHERE s.id = $1 AND a.id = s.assignment_id AND a.user_id = $2
            RETURNING {SUBTASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.est_minutes)
        .bind(update.completed)
        .bind(update.order_position)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(subtask_from_row).transpose()
    }

    async fn delete_subtask(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM studyhaven.subtasks s USING studyhaven.assignments a \
             WHERE s.id = $1 AND a.id = s.assignment_id AND a.user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_win(&self, user_id: Uuid, win: NewLittleWin) -> AppResult<LittleWin> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO studyhaven.little_wins (id, user_id, category, description)
            VALUES ($1, $2, $3, $4)
            RETURNING {WIN_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(win.category.as_str())
        .bind(&win.description)
        .fetch_one(&self.pool)
        .await
        .map_err(profile_required)?;

        win_from_row(&row)
    }

    async fn recent_wins(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<Vec<LittleWin>> {
        let rows = sqlx::query(&format!(
            "SELECT {WIN_COLUMNS} FROM studyhaven.little_wins \
             WHERE user_id = $1 AND created_at >= $2 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(win_from_row).collect()
    }

    async fn count_wins_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM studyhaven.little_wins \
             WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?
        .try_get("count")?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_write_failures_stay_database_errors() {
        let err = profile_required(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }
}
