//! HTTP endpoint handlers. Thin wrappers that forward to the store and the
//! completion pipeline; each handler is instrumented with its parameters.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  response::IntoResponse,
  Json,
};
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::completion;
use crate::domain::{EnrollmentStatus, Profile};
use crate::error::ApiError;
use crate::protocol::*;
use crate::routes::AuthedUser;
use crate::state::AppState;
use crate::util::percent;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_courses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let mut out = Vec::new();
  for course in state.store.courses_sorted().await {
    let lesson_count = state.store.lesson_count(course.id).await;
    out.push(CourseSummaryOut::new(&course, lesson_count));
  }
  Json(CoursesOut { success: true, courses: out })
}

/// Courses the caller has not enrolled in yet.
#[instrument(level = "info", skip(state, user), fields(user_id = %user.0))]
pub async fn http_available_courses(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
) -> Json<CoursesOut> {
  let enrolled: Vec<Uuid> = state
    .store
    .enrollments_for_user(user.0)
    .await
    .iter()
    .map(|e| e.course_id)
    .collect();

  let mut out = Vec::new();
  for course in state.store.courses_sorted().await {
    if enrolled.contains(&course.id) {
      continue;
    }
    let lesson_count = state.store.lesson_count(course.id).await;
    out.push(CourseSummaryOut::new(&course, lesson_count));
  }
  Json(CoursesOut { success: true, courses: out })
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.0))]
pub async fn http_my_courses(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
) -> impl IntoResponse {
  let mut out = Vec::new();
  for e in state.store.enrollments_for_user(user.0).await {
    let Some(course) = state.store.course(e.course_id).await else {
      continue;
    };
    let lesson_count = state.store.lesson_count(course.id).await;
    out.push(MyCourseOut {
      course: CourseSummaryOut::new(&course, lesson_count),
      enrollment_status: e.status,
      progress: e.progress,
      enrolled_at: e.enrolled_at,
      completed_at: e.completed_at,
    });
  }
  Json(MyCoursesOut { success: true, courses: out })
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.0, %course_id))]
pub async fn http_course_with_topics(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
  Path(course_id): Path<Uuid>,
) -> Result<Json<CourseWithTopicsOut>, ApiError> {
  let course = state.store.course(course_id).await.ok_or(ApiError::NotFound("course"))?;
  let lessons = state.store.lessons_for_course(course_id).await;

  let mut topics = Vec::with_capacity(lessons.len());
  for l in &lessons {
    let has_quiz = state.store.quiz_for_lesson(course_id, l.id).await.is_some();
    topics.push(topic_summary(l, has_quiz));
  }

  let enrollment = state.store.enrollment(user.0, course_id).await;
  let completed_topics: Vec<Uuid> = state
    .store
    .passed_lesson_ids(user.0, course_id)
    .await
    .into_iter()
    .collect();

  Ok(Json(CourseWithTopicsOut {
    success: true,
    course: CourseSummaryOut::new(&course, lessons.len()),
    topics,
    enrollment: enrollment.as_ref().map(EnrollmentOut::from),
    completed_topics,
  }))
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.0, %course_id, %topic_id))]
pub async fn http_topic_details(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
  Path((course_id, topic_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TopicDetailsOut>, ApiError> {
  let lesson = state
    .store
    .lesson_in_course(course_id, topic_id)
    .await
    .ok_or(ApiError::NotFound("lesson"))?;
  let enrollment = state.store.enrollment(user.0, course_id).await;

  // Completed = the enrollment's current lesson has moved past this one.
  let mut is_completed = false;
  if let Some(current_id) = enrollment.as_ref().and_then(|e| e.current_lesson_id) {
    if let Some(current) = state.store.lesson(current_id).await {
      is_completed = current.order > lesson.order;
    }
  }

  Ok(Json(TopicDetailsOut {
    success: true,
    id: lesson.id,
    title: lesson.title,
    description: lesson.description,
    order: lesson.order,
    is_completed,
    user_progress: enrollment.map_or(0, |e| e.progress),
  }))
}

#[instrument(level = "info", skip(state, _user), fields(%course_id, %topic_id))]
pub async fn http_topic_content(
  State(state): State<Arc<AppState>>,
  _user: AuthedUser,
  Path((course_id, topic_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TopicContentOut>, ApiError> {
  let lesson = state
    .store
    .lesson_in_course(course_id, topic_id)
    .await
    .ok_or(ApiError::NotFound("lesson"))?;
  let course = state.store.course(course_id).await.ok_or(ApiError::NotFound("course"))?;

  Ok(Json(TopicContentOut {
    success: true,
    id: lesson.id,
    title: lesson.title,
    content: lesson.content,
    course_title: course.title,
  }))
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.0, %course_id, %topic_id))]
pub async fn http_quiz_data(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
  Path((course_id, topic_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<QuizDataOut>, ApiError> {
  let quiz = state
    .store
    .quiz_for_lesson(course_id, topic_id)
    .await
    .ok_or(ApiError::NotFound("quiz"))?;

  let attempts = state.store.attempts_for_quiz(user.0, quiz.id).await;
  let last = attempts.last();
  let stats = QuizUserStatsOut {
    total_attempts: attempts.len(),
    last_score: last.map_or(0, |a| a.score),
    next_attempt_number: last.map_or(1, |a| a.attempt_number + 1),
    attempts_left: quiz.max_attempts as i64 - attempts.len() as i64,
  };
  Ok(Json(QuizDataOut::new(&quiz, stats)))
}

/// Manual completion path for lessons consumed without a quiz: advances the
/// current-lesson pointer and derives progress from lesson order alone.
#[instrument(level = "info", skip(state, user, body), fields(user_id = %user.0, %course_id, %topic_id, completed = body.completed))]
pub async fn http_update_lesson_progress(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
  Path((course_id, topic_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<LessonProgressIn>,
) -> Result<Json<LessonProgressOut>, ApiError> {
  let mut enrollment = state
    .store
    .enrollment(user.0, course_id)
    .await
    .ok_or(ApiError::NotFound("enrollment"))?;

  if body.completed {
    let lesson = state
      .store
      .lesson_in_course(course_id, topic_id)
      .await
      .ok_or(ApiError::NotFound("lesson"))?;
    let next = state.store.next_lesson_after(course_id, lesson.order).await;
    let total = state.store.lesson_count(course_id).await;

    let completed_lessons = match &next {
      Some(n) => n.order as usize - 1,
      None => total,
    };
    enrollment.current_lesson_id = Some(next.as_ref().map_or(topic_id, |n| n.id));
    enrollment.progress = percent(completed_lessons, total);

    if next.is_none() && enrollment.status != EnrollmentStatus::Completed {
      enrollment.status = EnrollmentStatus::Completed;
      enrollment.completed_at = Some(Utc::now());
    }
    state.store.save_enrollment(enrollment.clone()).await;
    info!(target: "progress", user_id = %user.0, %course_id, progress = enrollment.progress, "manual lesson progress applied");
  }

  Ok(Json(LessonProgressOut {
    success: true,
    message: "Progress updated".into(),
    enrollment: EnrollmentOut::from(&enrollment),
  }))
}

#[instrument(level = "info", skip(state, user, body), fields(user_id = %user.0, %course_id, %topic_id))]
pub async fn http_complete_quiz(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
  Path((course_id, topic_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<CompleteQuizIn>,
) -> Result<Json<CompleteQuizOut>, ApiError> {
  let out = completion::complete_quiz(&state.store, user.0, course_id, topic_id, body).await?;
  info!(
    target: "coursehub_backend",
    user_id = %user.0,
    score = out.quiz_attempt.score,
    passed = out.quiz_attempt.is_passed,
    awarded = out.awarded_achievements.len(),
    "quiz completion handled"
  );
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.0))]
pub async fn http_achievements(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
) -> impl IntoResponse {
  let all = state.store.all_achievements().await;
  let earned = state.store.user_achievements(user.0).await;

  let mut rows = Vec::with_capacity(all.len());
  let mut total_xp = 0u32;
  let mut by_rarity = RarityBreakdownOut { common: 0, rare: 0, epic: 0, legendary: 0 };
  for a in &all {
    let ua = earned.iter().find(|ua| ua.achievement_id == a.id);
    if ua.is_some() {
      total_xp += a.xp_reward;
      match a.rarity {
        crate::domain::Rarity::Common => by_rarity.common += 1,
        crate::domain::Rarity::Rare => by_rarity.rare += 1,
        crate::domain::Rarity::Epic => by_rarity.epic += 1,
        crate::domain::Rarity::Legendary => by_rarity.legendary += 1,
      }
    }
    rows.push(AchievementOut::new(a, ua));
  }

  let stats = AchievementStatsOut {
    total: all.len(),
    earned: earned.len(),
    progress: percent(earned.len(), all.len()),
    total_xp,
    by_rarity,
  };
  Json(AchievementsOut { success: true, achievements: rows, stats })
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.0, %achievement_id))]
pub async fn http_achievement_progress(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
  Path(achievement_id): Path<Uuid>,
) -> Result<Json<AchievementProgressOut>, ApiError> {
  let achievement = state
    .store
    .achievement(achievement_id)
    .await
    .ok_or(ApiError::NotFound("achievement"))?;

  let out = match state.store.user_achievement(user.0, achievement_id).await {
    Some(ua) => AchievementProgressOut {
      success: true,
      earned: true,
      progress: ua.progress,
      earned_at: Some(ua.earned_at),
      achievement: Some(AchievementOut::new(&achievement, Some(&ua))),
    },
    None => AchievementProgressOut {
      success: true,
      earned: false,
      progress: 0,
      earned_at: None,
      achievement: None,
    },
  };
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.0))]
pub async fn http_notifications(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
) -> impl IntoResponse {
  let notifications = state
    .store
    .notifications_for(user.0)
    .await
    .iter()
    .map(NotificationOut::from)
    .collect();
  Json(NotificationsOut { success: true, notifications })
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.0))]
pub async fn http_unread_count(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
) -> Json<UnreadCountOut> {
  let unread_count = state.store.unread_notification_count(user.0).await;
  Json(UnreadCountOut { success: true, unread_count })
}

/// The id arrives as a raw path segment so a malformed one is a 400 from
/// our own taxonomy, not a framework rejection.
#[instrument(level = "info", skip(state, user), fields(user_id = %user.0, %notification_id))]
pub async fn http_mark_notification_read(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
  Path(notification_id): Path<String>,
) -> Result<Json<NotificationActionOut>, ApiError> {
  let id = Uuid::parse_str(notification_id.trim())
    .map_err(|_| ApiError::Validation(format!("notification id is not a uuid: {notification_id}")))?;
  if !state.store.mark_notification_read(user.0, id).await {
    return Err(ApiError::NotFound("notification"));
  }
  Ok(Json(NotificationActionOut {
    success: true,
    message: "Notification marked as read".into(),
  }))
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.0))]
pub async fn http_mark_all_notifications_read(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
) -> Json<NotificationActionOut> {
  let flipped = state.store.mark_all_notifications_read(user.0).await;
  info!(target: "coursehub_backend", user_id = %user.0, flipped, "notifications marked read");
  Json(NotificationActionOut {
    success: true,
    message: "All notifications marked as read".into(),
  })
}

#[instrument(level = "info", skip(state, user), fields(user_id = %user.0))]
pub async fn http_profile(
  State(state): State<Arc<AppState>>,
  user: AuthedUser,
) -> impl IntoResponse {
  let profile = state
    .store
    .profile(user.0)
    .await
    .unwrap_or_else(|| Profile::empty(user.0));
  Json(ProfileOut::from(profile))
}
