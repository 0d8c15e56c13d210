use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::{needs_profile_setup, CurrentUser};
use crate::error::{AppError, AppResult};
use crate::models::{
    Assignment, AssignmentUpdate, CheckIn, LittleWin, NewAssignment, NewCheckIn, NewLittleWin,
    NewProfile, NewSubtask, ProfileUpdate, ProgressStats, Subtask, SubtaskProgress,
    SubtaskUpdate, UserProfile,
};
use crate::planner::{self, SortBy};
use crate::progress::subtask_progress;
use crate::stats;
use crate::suggestions::{self, Quote, SuggestionRequest, SuggestionResponse, MISSING_RATINGS};

const DEFAULT_CHECKIN_DAYS: i64 = 7;
const DEFAULT_WIN_DAYS: i64 = 30;
const MAX_WINDOW_DAYS: i64 = 365;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn suggest(
    payload: Result<Json<SuggestionRequest>, JsonRejection>,
) -> AppResult<Json<SuggestionResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(%rejection, "unreadable check-in payload");
        AppError::Validation(MISSING_RATINGS.to_string())
    })?;
    let ratings = request.validate()?;
    tracing::debug!(
        mood = ratings.mood,
        energy = ratings.energy,
        focus = ratings.focus,
        has_notes = request.notes.is_some(),
        "selecting suggestions"
    );
    Ok(Json(suggestions::build_response(&ratings)))
}

pub async fn inspiration() -> Json<Quote> {
    Json(suggestions::daily_quote(Utc::now().date_naive()))
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub needs_profile_setup: bool,
    pub profile: Option<UserProfile>,
}

pub async fn session(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Json<SessionResponse> {
    match state.store.get_profile(user_id).await {
        Ok(profile) => Json(SessionResponse {
            user_id,
            needs_profile_setup: needs_profile_setup(profile.as_ref()),
            profile,
        }),
        Err(err) => {
            tracing::error!(%user_id, error = %err, "failed to load profile for session");
            Json(SessionResponse {
                user_id,
                needs_profile_setup: false,
                profile: None,
            })
        }
    }
}

pub async fn create_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(profile): Json<NewProfile>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    require_text("email", &profile.email)?;
    let created = state.store.create_profile(user_id, profile).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<UserProfile>> {
    state
        .store
        .get_profile(user_id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("profile"))
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<UserProfile>> {
    state
        .store
        .update_profile(user_id, update)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("profile"))
}

fn validate_rating(name: &str, value: i32) -> AppResult<()> {
    if (1..=5).contains(&value) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("{name} must be between 1 and 5")))
    }
}

fn require_text(name: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        Err(AppError::Validation(format!("{name} is required")))
    } else {
        Ok(())
    }
}

fn read_json<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

fn read_query<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

pub async fn create_checkin(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<NewCheckIn>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CheckIn>)> {
    let checkin = read_json(payload)?;
    validate_rating("mood", checkin.mood)?;
    validate_rating("energy", checkin.energy)?;
    validate_rating("focus", checkin.focus)?;

    let created = state.store.create_checkin(user_id, checkin).await?;
    tracing::info!(%user_id, checkin_id = %created.id, "check-in saved");
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub days: Option<i64>,
}

impl WindowQuery {
    /// Start of the lookback window, capped at a year.
    fn since(&self, default_days: i64) -> DateTime<Utc> {
        let days = self.days.unwrap_or(default_days).clamp(1, MAX_WINDOW_DAYS);
        Utc::now() - Duration::days(days)
    }
}

pub async fn list_checkins(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> AppResult<Json<Vec<CheckIn>>> {
    let since = read_query(query)?.since(DEFAULT_CHECKIN_DAYS);
    Ok(Json(state.store.recent_checkins(user_id, since).await?))
}

#[derive(Serialize)]
pub struct LatestCheckInResponse {
    pub checkin: Option<CheckIn>,
    pub message: String,
}

pub async fn latest_checkin(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Json<LatestCheckInResponse> {
    let checkin = state
        .store
        .latest_checkin(user_id)
        .await
        .unwrap_or_else(|err| {
            tracing::error!(%user_id, error = %err, "failed to load last check-in");
            None
        });
    let last_at = checkin.as_ref().map(|c| c.created_at);
    let message = stats::last_checkin_message(last_at, Utc::now());
    Json(LatestCheckInResponse { checkin, message })
}

pub async fn progress_stats(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Json<ProgressStats> {
    Json(load_stats(&state, user_id).await)
}

/// Each piece falls back to zero on failure so one bad query does not
/// blank the whole card.
pub async fn load_stats(state: &AppState, user_id: Uuid) -> ProgressStats {
    let now = Utc::now();
    let month_start = stats::month_start(now);
    let store = &state.store;

    let (checkins, completed, wins, recent) = tokio::join!(
        store.count_checkins_since(user_id, month_start),
        store.count_completed_since(user_id, month_start),
        store.count_wins_since(user_id, month_start),
        store.recent_checkins(user_id, stats::window_start(now)),
    );

    let checkins = checkins.unwrap_or_else(|err| {
        tracing::error!(%user_id, error = %err, "failed to count check-ins");
        0
    });
    let completed = completed.unwrap_or_else(|err| {
        tracing::error!(%user_id, error = %err, "failed to count completed assignments");
        0
    });
    let wins = wins.unwrap_or_else(|err| {
        tracing::error!(%user_id, error = %err, "failed to count little wins");
        0
    });
    let recent = recent.unwrap_or_else(|err| {
        tracing::error!(%user_id, error = %err, "failed to load recent check-ins");
        Vec::new()
    });

    ProgressStats {
        checkins,
        completed,
        wins,
        streak: stats::checkin_streak(&recent, now.date_naive()),
        averages: stats::averages(&recent),
        growth_message: stats::growth_message(checkins + completed + wins).to_string(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SortQuery {
    #[serde(default)]
    pub sort: SortBy,
}

pub async fn list_assignments(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<SortQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Assignment>>> {
    let query = read_query(query)?;
    let mut assignments = state.store.list_assignments(user_id).await?;
    planner::sort_assignments(&mut assignments, query.sort);
    Ok(Json(assignments))
}

fn validate_assignment_fields(
    course: Option<&str>,
    title: Option<&str>,
    impact: Option<i32>,
    est_minutes: Option<i32>,
) -> AppResult<()> {
    if let Some(course) = course {
        require_text("course", course)?;
    }
    if let Some(title) = title {
        require_text("title", title)?;
    }
    if let Some(impact) = impact {
        validate_rating("impact", impact)?;
    }
    if matches!(est_minutes, Some(minutes) if minutes < 0) {
        return Err(AppError::Validation(
            "est_minutes cannot be negative".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_assignment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<NewAssignment>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Assignment>)> {
    let assignment = read_json(payload)?;
    validate_assignment_fields(
        Some(&assignment.course),
        Some(&assignment.title),
        Some(assignment.impact),
        Some(assignment.est_minutes),
    )?;

    let created = state.store.create_assignment(user_id, assignment).await?;
    tracing::info!(%user_id, assignment_id = %created.id, "assignment created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_assignment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Assignment>> {
    state
        .store
        .get_assignment(user_id, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("assignment"))
}

pub async fn update_assignment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<AssignmentUpdate>, JsonRejection>,
) -> AppResult<Json<Assignment>> {
    let update = read_json(payload)?;
    validate_assignment_fields(
        update.course.as_deref(),
        update.title.as_deref(),
        update.impact,
        update.est_minutes,
    )?;

    state
        .store
        .update_assignment(user_id, id, update)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("assignment"))
}

pub async fn delete_assignment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.store.delete_assignment(user_id, id).await? {
        tracing::info!(%user_id, assignment_id = %id, "assignment deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("assignment"))
    }
}

#[derive(Debug, Serialize)]
pub struct AssignmentCard {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub progress: SubtaskProgress,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub active: Vec<AssignmentCard>,
    pub completed: Vec<AssignmentCard>,
    pub dropped: Vec<AssignmentCard>,
    pub course_suggestions: Vec<String>,
    pub title_suggestions: Vec<String>,
}

pub async fn board(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<SortQuery>, QueryRejection>,
) -> AppResult<Json<BoardResponse>> {
    let query = read_query(query)?;
    Ok(Json(load_board(&state, user_id, query.sort).await?))
}

pub async fn load_board(state: &AppState, user_id: Uuid, sort: SortBy) -> AppResult<BoardResponse> {
    let assignments = state.store.list_assignments(user_id).await?;
    let (course_suggestions, title_suggestions) = planner::autocomplete(&assignments);
    let groups = planner::partition(assignments, sort);

    let (active, completed, dropped) = tokio::join!(
        with_progress(state, user_id, groups.active),
        with_progress(state, user_id, groups.completed),
        with_progress(state, user_id, groups.dropped),
    );

    Ok(BoardResponse {
        active,
        completed,
        dropped,
        course_suggestions,
        title_suggestions,
    })
}

/// Loads subtask progress for every card at once; a failed load shows as
/// zero progress on that card only.
async fn with_progress(
    state: &AppState,
    user_id: Uuid,
    assignments: Vec<Assignment>,
) -> Vec<AssignmentCard> {
    let loads = assignments.iter().map(|assignment| async move {
        match state.store.list_subtasks(user_id, assignment.id).await {
            Ok(subtasks) => subtask_progress(&subtasks),
            Err(err) => {
                tracing::error!(
                    assignment_id = %assignment.id,
                    error = %err,
                    "failed to load subtask progress"
                );
                SubtaskProgress::default()
            }
        }
    });
    let progress = join_all(loads).await;

    assignments
        .into_iter()
        .zip(progress)
        .map(|(assignment, progress)| AssignmentCard {
            assignment,
            progress,
        })
        .collect()
}

pub async fn upcoming_assignments(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<Assignment>>> {
    let assignments = state.store.list_assignments(user_id).await?;
    Ok(Json(planner::upcoming(&assignments, Utc::now())))
}

pub async fn focus_assignments(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<Assignment>>> {
    let assignments = state.store.list_assignments(user_id).await?;
    Ok(Json(planner::todays_focus(&assignments, Utc::now())))
}

async fn owned_assignment(state: &AppState, user_id: Uuid, id: Uuid) -> AppResult<Assignment> {
    state
        .store
        .get_assignment(user_id, id)
        .await?
        .ok_or(AppError::NotFound("assignment"))
}

pub async fn list_subtasks(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(assignment_id): Path<Uuid>,
) -> AppResult<Json<Vec<Subtask>>> {
    owned_assignment(&state, user_id, assignment_id).await?;
    Ok(Json(
        state.store.list_subtasks(user_id, assignment_id).await?,
    ))
}

pub async fn create_subtask(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(assignment_id): Path<Uuid>,
    payload: Result<Json<NewSubtask>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Subtask>)> {
    let subtask = read_json(payload)?;
    require_text("title", &subtask.title)?;
    if subtask.est_minutes < 0 {
        return Err(AppError::Validation(
            "est_minutes cannot be negative".to_string(),
        ));
    }

    let created = state
        .store
        .create_subtask(user_id, assignment_id, subtask)
        .await?
        .ok_or(AppError::NotFound("assignment"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn assignment_progress(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(assignment_id): Path<Uuid>,
) -> AppResult<Json<SubtaskProgress>> {
    owned_assignment(&state, user_id, assignment_id).await?;
    let subtasks = state.store.list_subtasks(user_id, assignment_id).await?;
    Ok(Json(subtask_progress(&subtasks)))
}

pub async fn update_subtask(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<SubtaskUpdate>, JsonRejection>,
) -> AppResult<Json<Subtask>> {
    let update = read_json(payload)?;
    if let Some(title) = update.title.as_deref() {
        require_text("title", title)?;
    }

    state
        .store
        .update_subtask(user_id, id, update)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("subtask"))
}

pub async fn delete_subtask(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.store.delete_subtask(user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("subtask"))
    }
}

pub async fn create_win(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<NewLittleWin>, JsonRejection>,
) -> AppResult<(StatusCode, Json<LittleWin>)> {
    let mut win = read_json(payload)?;
    win.description = win.description.trim().to_string();
    require_text("description", &win.description)?;

    let created = state.store.create_win(user_id, win).await?;
    tracing::info!(%user_id, category = created.category.as_str(), "little win saved");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_wins(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> AppResult<Json<Vec<LittleWin>>> {
    let since = read_query(query)?.since(DEFAULT_WIN_DAYS);
    Ok(Json(state.store.recent_wins(user_id, since).await?))
}
