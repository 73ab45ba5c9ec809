//! Profile statistics aggregator.
//!
//! Every update is a full recompute over the attempt log and enrollments,
//! never an incremental blend, so the stored numbers cannot drift from the
//! underlying records. Statistics are best-effort and must never block the
//! completion response.

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::EnrollmentStatus;
use crate::store::Store;
use crate::util::round2;

/// Recompute and write back averageScore, completedTopics and activeCourses
/// for the user. `latest_score` is used directly when it is the user's only
/// attempt on record.
#[instrument(level = "debug", skip(store), fields(%user_id, latest_score))]
pub async fn refresh_profile(store: &Store, user_id: Uuid, latest_score: u32) {
  let total_attempts = store.attempt_count(user_id).await;

  let average_score = if total_attempts <= 1 {
    latest_score as f64
  } else {
    round2(store.score_sum(user_id).await / total_attempts as f64)
  };

  let completed_topics = store.passed_attempt_count(user_id).await as u32;
  let active_courses = store.enrollment_count(user_id, EnrollmentStatus::Active).await as u32;

  store
    .write_profile_stats(user_id, average_score, completed_topics, active_courses)
    .await;
  debug!(
    target: "coursehub_backend",
    %user_id, average_score, completed_topics, active_courses,
    "profile statistics refreshed"
  );
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::progress::tests::{course_fixture, passed_attempt};

  #[tokio::test]
  async fn first_attempt_sets_average_to_its_score() {
    let (store, _course, _lessons, quizzes) = course_fixture(1);
    let user = Uuid::new_v4();

    store.record_attempt(passed_attempt(user, quizzes[0].id, 100, 1)).await;
    refresh_profile(&store, user, 100).await;

    let p = store.profile(user).await.unwrap();
    assert_eq!(p.average_score, 100.0);
    assert_eq!(p.completed_topics, 1);
  }

  #[tokio::test]
  async fn average_is_a_full_recompute_not_a_blend() {
    let (store, _course, _lessons, quizzes) = course_fixture(1);
    let user = Uuid::new_v4();

    store.record_attempt(passed_attempt(user, quizzes[0].id, 100, 1)).await;
    refresh_profile(&store, user, 100).await;
    store.record_attempt(passed_attempt(user, quizzes[0].id, 50, 2)).await;
    refresh_profile(&store, user, 50).await;

    let p = store.profile(user).await.unwrap();
    assert_eq!(p.average_score, 75.0);
  }

  #[tokio::test]
  async fn counts_only_passed_attempts_as_completed_topics() {
    let (store, _course, _lessons, quizzes) = course_fixture(1);
    let user = Uuid::new_v4();

    store.record_attempt(passed_attempt(user, quizzes[0].id, 90, 1)).await;
    store.record_attempt(passed_attempt(user, quizzes[0].id, 40, 2)).await;
    refresh_profile(&store, user, 40).await;

    let p = store.profile(user).await.unwrap();
    assert_eq!(p.completed_topics, 1);
    assert_eq!(p.average_score, 65.0);
  }
}
