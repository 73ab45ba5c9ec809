//! Progress tracker: enrollment advancement and course completion.
//!
//! Completed-lesson counts are re-derived from the attempt log on every
//! update rather than cached; this keeps the enrollment's `progress`
//! consistent with the attempts without an invalidation scheme.

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{Enrollment, EnrollmentStatus, Lesson};
use crate::store::Store;
use crate::util::percent;

#[derive(Clone, Debug)]
pub struct ProgressOutcome {
  pub enrollment: Enrollment,
  pub next_lesson_available: bool,
  /// True when this call created the enrollment; the caller fires the
  /// course-started achievement trigger off it.
  pub newly_enrolled: bool,
}

/// Find the enrollment for (user, course), creating a fresh active one
/// pointing at `lesson_id` when none exists yet. The flag is true only
/// when this call created it.
pub async fn find_or_enroll(
  store: &Store,
  user_id: Uuid,
  course_id: Uuid,
  lesson_id: Uuid,
) -> (Enrollment, bool) {
  if let Some(e) = store.enrollment(user_id, course_id).await {
    return (e, false);
  }
  let e = Enrollment {
    id: Uuid::new_v4(),
    user_id,
    course_id,
    current_lesson_id: Some(lesson_id),
    progress: 0,
    status: EnrollmentStatus::Active,
    enrolled_at: Utc::now(),
    completed_at: None,
  };
  store.save_enrollment(e.clone()).await;
  info!(target: "progress", %user_id, %course_id, "enrollment created on first submission");
  (e, true)
}

/// Apply a quiz result to the enrollment.
///
/// Not passed: no state change beyond the find-or-create above. Passed:
/// advance the current-lesson pointer, recompute `progress` from the
/// distinct passed lessons, and mark the course completed at 100%,
/// stamping `completed_at` only on the first transition.
#[instrument(level = "info", skip(store, lesson), fields(%user_id, course_id = %lesson.course_id, lesson_order = lesson.order, passed))]
pub async fn apply_quiz_result(
  store: &Store,
  user_id: Uuid,
  lesson: &Lesson,
  passed: bool,
) -> ProgressOutcome {
  let course_id = lesson.course_id;
  let (mut enrollment, newly_enrolled) = find_or_enroll(store, user_id, course_id, lesson.id).await;

  if !passed {
    debug!(target: "progress", %user_id, %course_id, "attempt not passed; enrollment unchanged");
    return ProgressOutcome { enrollment, next_lesson_available: false, newly_enrolled };
  }

  let next = store.next_lesson_after(course_id, lesson.order).await;
  let next_lesson_available = next.is_some();
  enrollment.current_lesson_id = Some(match &next {
    Some(n) => n.id,
    // The last lesson stays current once the course is exhausted.
    None => lesson.id,
  });

  let total = store.lesson_count(course_id).await;
  let completed = store.passed_lesson_ids(user_id, course_id).await.len();
  enrollment.progress = percent(completed, total);

  if enrollment.progress >= 100 && enrollment.status != EnrollmentStatus::Completed {
    enrollment.status = EnrollmentStatus::Completed;
    enrollment.completed_at = Some(Utc::now());
    info!(target: "progress", %user_id, %course_id, "course completed");
  }

  store.save_enrollment(enrollment.clone()).await;
  info!(
    target: "progress",
    %user_id, %course_id,
    progress = enrollment.progress,
    completed, total, next_lesson_available,
    "enrollment updated"
  );
  ProgressOutcome { enrollment, next_lesson_available, newly_enrolled }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::domain::{Question, QuestionKind, Quiz, QuizAttempt, SubmittedAnswer};
  use crate::store::ContentSet;

  /// One course with `n` lessons, each carrying a one-question quiz.
  pub(crate) fn course_content(n: u32) -> (ContentSet, Vec<Lesson>, Vec<Quiz>) {
    let course_id = Uuid::new_v4();
    let mut lessons = Vec::new();
    let mut quizzes = Vec::new();
    for order in 1..=n {
      let lesson = Lesson {
        id: Uuid::new_v4(),
        course_id,
        title: format!("Lesson {order}"),
        description: String::new(),
        content: String::new(),
        order,
      };
      quizzes.push(Quiz {
        id: Uuid::new_v4(),
        course_id,
        lesson_id: Some(lesson.id),
        title: format!("Quiz {order}"),
        description: String::new(),
        time_limit_secs: None,
        passing_score: 70,
        max_attempts: 3,
        questions: vec![Question {
          id: Uuid::new_v4(),
          kind: QuestionKind::SingleChoice,
          prompt: "q".into(),
          options: vec!["a".into(), "b".into()],
          correct_options: vec![0],
          accepted_texts: vec![],
          points: 1,
        }],
      });
      lessons.push(lesson);
    }
    let content = ContentSet {
      courses: vec![crate::domain::Course {
        id: course_id,
        title: "Fixture".into(),
        description: String::new(),
        duration_minutes: 60,
        rating: 0.0,
      }],
      lessons: lessons.clone(),
      quizzes: quizzes.clone(),
      achievements: vec![],
    };
    (content, lessons, quizzes)
  }

  /// `course_content` wrapped into a ready store.
  pub(crate) fn course_fixture(n: u32) -> (Store, Uuid, Vec<Lesson>, Vec<Quiz>) {
    let (content, lessons, quizzes) = course_content(n);
    let course_id = lessons[0].course_id;
    (Store::with_content(content), course_id, lessons, quizzes)
  }

  pub(crate) fn passed_attempt(user_id: Uuid, quiz_id: Uuid, score: u32, number: u32) -> QuizAttempt {
    QuizAttempt {
      id: Uuid::new_v4(),
      user_id,
      quiz_id,
      score,
      correct_answers: 1,
      total_questions: 1,
      time_spent_secs: 30,
      answers: vec![SubmittedAnswer::Choice(0)],
      is_passed: score >= 70,
      attempt_number: number,
      completed_at: Utc::now(),
    }
  }

  #[tokio::test]
  async fn progress_follows_passed_lessons_and_is_monotonic() {
    let (store, _course, lessons, quizzes) = course_fixture(4);
    let user = Uuid::new_v4();

    let mut last_progress = 0u8;
    for (i, score) in [80u32, 90, 70].iter().enumerate() {
      store.record_attempt(passed_attempt(user, quizzes[i].id, *score, 1)).await;
      let out = apply_quiz_result(&store, user, &lessons[i], true).await;
      assert!(out.enrollment.progress >= last_progress, "progress must not decrease");
      last_progress = out.enrollment.progress;
    }

    let e = store.enrollment(user, lessons[0].course_id).await.unwrap();
    assert_eq!(e.progress, 75);
    assert_eq!(e.status, EnrollmentStatus::Active);
    assert_eq!(e.current_lesson_id, Some(lessons[3].id));
    assert!(e.completed_at.is_none());
  }

  #[tokio::test]
  async fn final_lesson_completes_the_course_and_keeps_pointer() {
    let (store, course, lessons, quizzes) = course_fixture(2);
    let user = Uuid::new_v4();

    store.record_attempt(passed_attempt(user, quizzes[0].id, 80, 1)).await;
    apply_quiz_result(&store, user, &lessons[0], true).await;
    store.record_attempt(passed_attempt(user, quizzes[1].id, 70, 1)).await;
    let out = apply_quiz_result(&store, user, &lessons[1], true).await;

    assert!(!out.next_lesson_available);
    let e = store.enrollment(user, course).await.unwrap();
    assert_eq!(e.progress, 100);
    assert_eq!(e.status, EnrollmentStatus::Completed);
    assert!(e.completed_at.is_some());
    // No next lesson: the last one stays current.
    assert_eq!(e.current_lesson_id, Some(lessons[1].id));
  }

  #[tokio::test]
  async fn completed_at_is_stamped_exactly_once() {
    let (store, course, lessons, quizzes) = course_fixture(1);
    let user = Uuid::new_v4();

    store.record_attempt(passed_attempt(user, quizzes[0].id, 100, 1)).await;
    apply_quiz_result(&store, user, &lessons[0], true).await;
    let first = store.enrollment(user, course).await.unwrap().completed_at;
    assert!(first.is_some());

    // A later re-pass of the same course must not move the timestamp.
    store.record_attempt(passed_attempt(user, quizzes[0].id, 100, 2)).await;
    apply_quiz_result(&store, user, &lessons[0], true).await;
    let second = store.enrollment(user, course).await.unwrap().completed_at;
    assert_eq!(first, second);
  }

  #[tokio::test]
  async fn failed_attempt_changes_nothing_after_enrollment() {
    let (store, course, lessons, _quizzes) = course_fixture(3);
    let user = Uuid::new_v4();

    let out = apply_quiz_result(&store, user, &lessons[0], false).await;
    assert!(!out.next_lesson_available);
    let e = store.enrollment(user, course).await.unwrap();
    assert_eq!(e.progress, 0);
    assert_eq!(e.status, EnrollmentStatus::Active);
    assert_eq!(e.current_lesson_id, Some(lessons[0].id));
  }

  #[tokio::test]
  async fn enrollment_creation_is_flagged_exactly_once() {
    let (store, course, lessons, _quizzes) = course_fixture(2);
    let user = Uuid::new_v4();

    let out = apply_quiz_result(&store, user, &lessons[0], false).await;
    assert!(out.newly_enrolled);
    assert!(store.enrollment(user, course).await.is_some());

    let out = apply_quiz_result(&store, user, &lessons[0], false).await;
    assert!(!out.newly_enrolled);
  }

  #[tokio::test]
  async fn repeated_passes_of_one_lesson_count_once() {
    let (store, course, lessons, quizzes) = course_fixture(2);
    let user = Uuid::new_v4();

    store.record_attempt(passed_attempt(user, quizzes[0].id, 90, 1)).await;
    store.record_attempt(passed_attempt(user, quizzes[0].id, 95, 2)).await;
    apply_quiz_result(&store, user, &lessons[0], true).await;

    let e = store.enrollment(user, course).await.unwrap();
    assert_eq!(e.progress, 50, "distinct lessons, not attempts, drive progress");
  }
}
