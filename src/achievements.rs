//! Achievement evaluator.
//!
//! Maps a triggering action to a target achievement kind, checks each
//! candidate's criteria against the user's records, and awards at most once
//! per (user, achievement). Awarding emits a notification. Nothing here may
//! abort the caller: a predicate that cannot be evaluated is logged and
//! treated as not qualifying.

use chrono::{DateTime, Days, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
  Achievement, AchievementKind, EnrollmentStatus, Notification, NotificationPriority,
};
use crate::store::Store;

/// How far back the streak computation looks, in days.
const STREAK_WINDOW_DAYS: u64 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AchievementAction {
  CourseStarted,
  CourseCompleted,
  QuizCompleted,
  LessonCompleted,
}

/// Trigger metadata carried alongside the action. Only what the predicates
/// actually read.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActionContext {
  pub score: Option<u32>,
  pub course_id: Option<Uuid>,
  pub lesson_order: Option<u32>,
}

/// Fixed action-to-kind table. `Streak` has no action of its own; it is
/// evaluated opportunistically on lesson completion.
fn target_kinds(action: AchievementAction) -> &'static [AchievementKind] {
  match action {
    AchievementAction::CourseStarted | AchievementAction::CourseCompleted => {
      &[AchievementKind::CourseCompletion]
    }
    AchievementAction::QuizCompleted => &[AchievementKind::PerfectScore],
    AchievementAction::LessonCompleted => {
      &[AchievementKind::LessonCompletion, AchievementKind::Streak]
    }
  }
}

/// Evaluate all achievements matching `action` and return the ones newly
/// awarded by this call. Re-qualifying for an already-earned achievement is
/// a no-op, not an error.
#[instrument(level = "info", skip(store, ctx), fields(%user_id, ?action))]
pub async fn evaluate(
  store: &Store,
  user_id: Uuid,
  action: AchievementAction,
  ctx: &ActionContext,
) -> Vec<Achievement> {
  let mut candidates = Vec::new();
  for kind in target_kinds(action) {
    candidates.extend(store.achievements_of_kind(*kind).await);
  }

  let now = Utc::now();
  let mut awarded = Vec::new();
  for achievement in candidates {
    if !criteria_met(store, user_id, &achievement, action, ctx, now).await {
      continue;
    }
    if store.award_if_new(user_id, achievement.id, now).await {
      info!(
        target: "achievement",
        %user_id, achievement = %achievement.name, kind = ?achievement.kind,
        xp = achievement.xp_reward, "achievement awarded"
      );
      notify_award(store, user_id, &achievement, now).await;
      awarded.push(achievement);
    } else {
      debug!(target: "achievement", %user_id, achievement = %achievement.name, "already earned; skipping");
    }
  }
  awarded
}

async fn criteria_met(
  store: &Store,
  user_id: Uuid,
  achievement: &Achievement,
  action: AchievementAction,
  ctx: &ActionContext,
  now: DateTime<Utc>,
) -> bool {
  let criteria = &achievement.criteria;
  match achievement.kind {
    AchievementKind::CourseCompletion => {
      if action != AchievementAction::CourseCompleted {
        return false;
      }
      let completed = store
        .enrollment_count(user_id, EnrollmentStatus::Completed)
        .await as u32;
      completed >= criteria.target_count.unwrap_or(1)
    }

    AchievementKind::PerfectScore => {
      if action != AchievementAction::QuizCompleted {
        return false;
      }
      let min_score = criteria.min_score.unwrap_or(100);
      let Some(score) = ctx.score else {
        warn!(target: "achievement", %user_id, achievement = %achievement.name, "quiz trigger without a score; not qualifying");
        return false;
      };
      if score < min_score {
        return false;
      }
      let perfect = store.perfect_attempt_count(user_id).await as u32;
      perfect >= criteria.target_count.unwrap_or(1)
    }

    AchievementKind::Streak => {
      if action != AchievementAction::LessonCompleted {
        return false;
      }
      current_streak(store, user_id, now).await >= criteria.target_days.unwrap_or(7)
    }

    AchievementKind::LessonCompletion => {
      if action != AchievementAction::LessonCompleted {
        return false;
      }
      if criteria.first_lesson.unwrap_or(false) && ctx.lesson_order == Some(1) {
        return true;
      }
      let Some(course_id) = ctx.course_id else {
        warn!(target: "achievement", %user_id, achievement = %achievement.name, "lesson trigger without a course; not qualifying");
        return false;
      };
      let completed = store.passed_lesson_ids(user_id, course_id).await.len() as u32;
      completed >= criteria.lessons_completed.unwrap_or(1)
    }

    // SpeedRun has no trigger wired yet; Other is never awarded.
    AchievementKind::SpeedRun | AchievementKind::Other => false,
  }
}

/// Consecutive calendar days with at least one attempt, counted from the
/// day of `now` backwards over the last week. Multiple attempts on one day
/// count as a single day of activity.
pub async fn current_streak(store: &Store, user_id: Uuid, now: DateTime<Utc>) -> u32 {
  let Some(cutoff) = now.checked_sub_days(Days::new(STREAK_WINDOW_DAYS)) else {
    return 0;
  };
  let today = now.date_naive();
  let active_days: BTreeSet<i64> = store
    .attempt_times_since(user_id, cutoff)
    .await
    .iter()
    .map(|t| (today - t.date_naive()).num_days())
    .filter(|d| *d >= 0)
    .collect();

  let mut streak = 0u32;
  // Walk day offsets 0, 1, 2, ... and stop at the first gap.
  while active_days.contains(&(streak as i64)) {
    streak += 1;
  }
  streak
}

async fn notify_award(store: &Store, user_id: Uuid, achievement: &Achievement, now: DateTime<Utc>) {
  store
    .push_notification(Notification {
      id: Uuid::new_v4(),
      user_id,
      kind: "achievement".into(),
      title: "New achievement!".into(),
      message: format!(
        "You earned \"{}\": {}",
        achievement.name, achievement.description
      ),
      action_url: "/achievements".into(),
      priority: NotificationPriority::High,
      created_at: now,
      is_read: false,
    })
    .await;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{AchievementCriteria, Rarity};
  use crate::progress::tests::{course_fixture, passed_attempt};
  use chrono::Duration;
  use crate::store::{ContentSet, Store};

  fn achievement(kind: AchievementKind, criteria: AchievementCriteria) -> Achievement {
    Achievement {
      id: Uuid::new_v4(),
      course_id: None,
      name: format!("{kind:?}"),
      description: "test".into(),
      icon: "star".into(),
      kind,
      criteria,
      rarity: Rarity::Common,
      xp_reward: 50,
    }
  }

  fn store_with(achievements: Vec<Achievement>) -> Store {
    Store::with_content(ContentSet { achievements, ..Default::default() })
  }

  #[tokio::test]
  async fn award_is_at_most_once_per_pair() {
    let first = achievement(
      AchievementKind::LessonCompletion,
      AchievementCriteria { first_lesson: Some(true), ..Default::default() },
    );
    let store = store_with(vec![first.clone()]);
    let user = Uuid::new_v4();
    let ctx = ActionContext { lesson_order: Some(1), course_id: Some(Uuid::new_v4()), ..Default::default() };

    let awarded = evaluate(&store, user, AchievementAction::LessonCompleted, &ctx).await;
    assert_eq!(awarded.len(), 1);
    assert_eq!(awarded[0].id, first.id);
    assert_eq!(store.notifications_for(user).await.len(), 1);

    // Same qualifying state again: no new award, no new notification.
    let awarded = evaluate(&store, user, AchievementAction::LessonCompleted, &ctx).await;
    assert!(awarded.is_empty());
    assert_eq!(store.user_achievements(user).await.len(), 1);
    assert_eq!(store.notifications_for(user).await.len(), 1);
  }

  #[tokio::test]
  async fn perfect_score_requires_min_score_and_count() {
    let perfect = achievement(AchievementKind::PerfectScore, AchievementCriteria::default());
    let store = store_with(vec![perfect]);
    let user = Uuid::new_v4();
    let quiz_id = Uuid::new_v4();

    // A 90 does not qualify even though the trigger fires.
    store.record_attempt(passed_attempt(user, quiz_id, 90, 1)).await;
    let ctx = ActionContext { score: Some(90), ..Default::default() };
    assert!(evaluate(&store, user, AchievementAction::QuizCompleted, &ctx).await.is_empty());

    store.record_attempt(passed_attempt(user, quiz_id, 100, 2)).await;
    let ctx = ActionContext { score: Some(100), ..Default::default() };
    assert_eq!(evaluate(&store, user, AchievementAction::QuizCompleted, &ctx).await.len(), 1);
  }

  #[tokio::test]
  async fn course_completion_counts_completed_enrollments() {
    let conqueror = achievement(
      AchievementKind::CourseCompletion,
      AchievementCriteria { target_count: Some(1), ..Default::default() },
    );
    let store = store_with(vec![conqueror]);
    let user = Uuid::new_v4();
    let ctx = ActionContext::default();

    // No completed enrollment yet.
    assert!(evaluate(&store, user, AchievementAction::CourseCompleted, &ctx).await.is_empty());

    let e = crate::domain::Enrollment {
      id: Uuid::new_v4(),
      user_id: user,
      course_id: Uuid::new_v4(),
      current_lesson_id: None,
      progress: 100,
      status: EnrollmentStatus::Completed,
      enrolled_at: Utc::now(),
      completed_at: Some(Utc::now()),
    };
    store.save_enrollment(e).await;

    // course_started maps to the same kind but never satisfies the predicate.
    assert!(evaluate(&store, user, AchievementAction::CourseStarted, &ctx).await.is_empty());

    assert_eq!(evaluate(&store, user, AchievementAction::CourseCompleted, &ctx).await.len(), 1);
  }

  #[tokio::test]
  async fn streak_counts_consecutive_days_only() {
    let (store, _course, _lessons, quizzes) = course_fixture(1);
    let user = Uuid::new_v4();
    let now = Utc::now();

    // Activity today and yesterday: streak of 2.
    let mut a = passed_attempt(user, quizzes[0].id, 80, 1);
    a.completed_at = now;
    store.record_attempt(a).await;
    let mut a = passed_attempt(user, quizzes[0].id, 80, 2);
    a.completed_at = now - Duration::days(1);
    store.record_attempt(a).await;
    assert_eq!(current_streak(&store, user, now).await, 2);

    // Activity today and the day before yesterday: gap at yesterday, streak 1.
    let user2 = Uuid::new_v4();
    let mut a = passed_attempt(user2, quizzes[0].id, 80, 1);
    a.completed_at = now;
    store.record_attempt(a).await;
    let mut a = passed_attempt(user2, quizzes[0].id, 80, 2);
    a.completed_at = now - Duration::days(2);
    store.record_attempt(a).await;
    assert_eq!(current_streak(&store, user2, now).await, 1);
  }

  #[tokio::test]
  async fn streak_dedupes_same_day_attempts() {
    let (store, _course, _lessons, quizzes) = course_fixture(1);
    let user = Uuid::new_v4();
    let now = Utc::now();

    for n in 1..=3 {
      let mut a = passed_attempt(user, quizzes[0].id, 80, n);
      a.completed_at = now;
      store.record_attempt(a).await;
    }
    assert_eq!(current_streak(&store, user, now).await, 1);
  }

  #[tokio::test]
  async fn lesson_completion_counts_distinct_passed_lessons() {
    let (mut content, lessons, quizzes) = crate::progress::tests::course_content(3);
    let three = achievement(
      AchievementKind::LessonCompletion,
      AchievementCriteria { lessons_completed: Some(3), ..Default::default() },
    );
    content.achievements.push(three);
    let course_id = lessons[0].course_id;
    let store = Store::with_content(content);
    let user = Uuid::new_v4();

    // Two distinct lessons passed (one of them twice): still short of three.
    store.record_attempt(passed_attempt(user, quizzes[0].id, 80, 1)).await;
    store.record_attempt(passed_attempt(user, quizzes[0].id, 90, 2)).await;
    store.record_attempt(passed_attempt(user, quizzes[1].id, 80, 1)).await;
    let ctx = ActionContext { course_id: Some(course_id), lesson_order: Some(2), ..Default::default() };
    assert!(evaluate(&store, user, AchievementAction::LessonCompleted, &ctx).await.is_empty());

    store.record_attempt(passed_attempt(user, quizzes[2].id, 70, 1)).await;
    let ctx = ActionContext { course_id: Some(course_id), lesson_order: Some(3), ..Default::default() };
    assert_eq!(evaluate(&store, user, AchievementAction::LessonCompleted, &ctx).await.len(), 1);
  }
}
