//! Completion pipeline for a quiz submission.
//!
//! Stage order: score → persist attempt → enrollment/progress → profile
//! stats → achievement checks (lesson, quiz, and course once progress hits
//! 100). Only the scoring stage is fatal; once the attempt row is written
//! it is the single source of truth and nothing later may fail the request
//! or roll it back. The achievement evaluator swallows its own failures and
//! the remaining stages write derived data that is recomputed on the next
//! submission anyway.

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::achievements::{self, AchievementAction, ActionContext};
use crate::domain::QuizAttempt;
use crate::error::ApiError;
use crate::progress;
use crate::protocol::{AttemptOut, CompleteQuizIn, CompleteQuizOut, EnrollmentOut};
use crate::scoring::{self, EvaluatedAttempt};
use crate::stats;
use crate::store::Store;

/// Handle one quiz submission end to end and assemble the response.
#[instrument(level = "info", skip(store, body), fields(%user_id, %course_id, topic_id = %lesson_id, quiz_id = %body.quiz_id))]
pub async fn complete_quiz(
  store: &Store,
  user_id: Uuid,
  course_id: Uuid,
  lesson_id: Uuid,
  body: CompleteQuizIn,
) -> Result<CompleteQuizOut, ApiError> {
  // Fatal stage: resolve the quiz and lesson, score the submission. Nothing
  // is written if either lookup fails.
  let quiz = store.quiz(body.quiz_id).await.ok_or(ApiError::NotFound("quiz"))?;
  let lesson = store
    .lesson_in_course(course_id, lesson_id)
    .await
    .ok_or(ApiError::NotFound("lesson"))?;

  let eval = if quiz.questions.is_empty() {
    // No stored answer key: the reported totals stand.
    EvaluatedAttempt::from_reported(body.score, body.correct_answers, body.total_questions)
  } else {
    scoring::evaluate(&quiz, &body.answers)
  };
  let attempt_number = scoring::next_attempt_number(store, user_id, quiz.id).await;

  store
    .record_attempt(QuizAttempt {
      id: Uuid::new_v4(),
      user_id,
      quiz_id: quiz.id,
      score: eval.score,
      correct_answers: eval.correct_answers,
      total_questions: eval.total_questions,
      time_spent_secs: body.time_spent,
      answers: body.answers,
      is_passed: eval.is_passed,
      attempt_number,
      completed_at: Utc::now(),
    })
    .await;
  info!(
    target: "coursehub_backend",
    score = eval.score, passed = eval.is_passed, attempt_number,
    "quiz attempt recorded"
  );

  // Everything below is best-effort derived-data maintenance.
  let outcome = progress::apply_quiz_result(store, user_id, &lesson, eval.is_passed).await;

  let ctx = ActionContext {
    score: Some(eval.score),
    course_id: Some(course_id),
    lesson_order: Some(lesson.order),
  };
  let mut awarded = Vec::new();
  if outcome.newly_enrolled {
    awarded.extend(achievements::evaluate(store, user_id, AchievementAction::CourseStarted, &ctx).await);
  }
  if eval.is_passed {
    stats::refresh_profile(store, user_id, eval.score).await;

    awarded.extend(achievements::evaluate(store, user_id, AchievementAction::LessonCompleted, &ctx).await);
    awarded.extend(achievements::evaluate(store, user_id, AchievementAction::QuizCompleted, &ctx).await);

    if outcome.enrollment.progress >= 100 {
      awarded.extend(
        achievements::evaluate(store, user_id, AchievementAction::CourseCompleted, &ctx).await,
      );
    }
  }

  Ok(CompleteQuizOut {
    success: true,
    message: "Quiz completed".into(),
    quiz_attempt: AttemptOut {
      score: eval.score,
      correct_answers: eval.correct_answers,
      total_questions: eval.total_questions,
      is_passed: eval.is_passed,
    },
    next_lesson_available: outcome.next_lesson_available,
    awarded_achievements: awarded.into_iter().map(|a| a.name).collect(),
    enrollment: EnrollmentOut::from(&outcome.enrollment),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{
    Achievement, AchievementCriteria, AchievementKind, EnrollmentStatus, Rarity, SubmittedAnswer,
  };
  use crate::progress::tests::course_content;
  use crate::store::Store;

  fn achievement(name: &str, kind: AchievementKind, criteria: AchievementCriteria) -> Achievement {
    Achievement {
      id: Uuid::new_v4(),
      course_id: None,
      name: name.into(),
      description: String::new(),
      icon: "medal".into(),
      kind,
      criteria,
      rarity: Rarity::Common,
      xp_reward: 25,
    }
  }

  /// Course where each quiz has no stored questions, so the client-reported
  /// score is authoritative, matching submissions with arbitrary scores.
  fn reported_score_fixture(lessons: u32) -> (Store, Uuid, Vec<crate::domain::Lesson>, Vec<Uuid>) {
    let (mut content, lesson_list, quizzes) = course_content(lessons);
    for q in &mut content.quizzes {
      q.questions.clear();
    }
    content.achievements.push(achievement(
      "First Steps",
      AchievementKind::LessonCompletion,
      AchievementCriteria { first_lesson: Some(true), ..Default::default() },
    ));
    content.achievements.push(achievement(
      "Course Conqueror",
      AchievementKind::CourseCompletion,
      AchievementCriteria { target_count: Some(1), ..Default::default() },
    ));
    content.achievements.push(achievement(
      "Perfectionist",
      AchievementKind::PerfectScore,
      AchievementCriteria::default(),
    ));
    let course_id = lesson_list[0].course_id;
    let quiz_ids = quizzes.iter().map(|q| q.id).collect();
    (Store::with_content(content), course_id, lesson_list, quiz_ids)
  }

  fn submission(quiz_id: Uuid, score: u32) -> CompleteQuizIn {
    CompleteQuizIn {
      quiz_id,
      score,
      correct_answers: score / 10,
      total_questions: 10,
      time_spent: 120,
      answers: vec![SubmittedAnswer::Choice(0)],
    }
  }

  #[tokio::test]
  async fn four_lesson_course_runs_to_completion() {
    let (store, course, lessons, quizzes) = reported_score_fixture(4);
    let user = Uuid::new_v4();

    for (i, score) in [80u32, 90, 70].iter().enumerate() {
      let out = complete_quiz(&store, user, course, lessons[i].id, submission(quizzes[i], *score))
        .await
        .unwrap();
      assert!(out.quiz_attempt.is_passed);
      assert!(out.next_lesson_available);
    }

    let e = store.enrollment(user, course).await.unwrap();
    assert_eq!(e.progress, 75);
    assert_eq!(e.status, EnrollmentStatus::Active);
    assert_eq!(e.current_lesson_id, Some(lessons[3].id));

    let out = complete_quiz(&store, user, course, lessons[3].id, submission(quizzes[3], 70))
      .await
      .unwrap();
    assert!(!out.next_lesson_available);
    assert_eq!(out.enrollment.progress, 100);
    assert_eq!(out.enrollment.status, EnrollmentStatus::Completed);
    assert!(out.awarded_achievements.contains(&"Course Conqueror".to_string()));
    assert!(store.enrollment(user, course).await.unwrap().completed_at.is_some());
  }

  #[tokio::test]
  async fn failing_score_records_attempt_but_freezes_enrollment() {
    let (store, course, lessons, quizzes) = reported_score_fixture(3);
    let user = Uuid::new_v4();

    let out = complete_quiz(&store, user, course, lessons[0].id, submission(quizzes[0], 65))
      .await
      .unwrap();
    assert!(out.success);
    assert!(!out.quiz_attempt.is_passed);
    assert!(!out.next_lesson_available);
    assert!(out.awarded_achievements.is_empty());
    assert_eq!(out.enrollment.progress, 0);

    // The attempt itself is still the learning record.
    assert_eq!(store.attempts_for_quiz(user, quizzes[0]).await.len(), 1);
    // And the profile was not touched by the failed path.
    assert!(store.profile(user).await.is_none());
  }

  #[tokio::test]
  async fn attempt_numbers_form_a_gapless_sequence() {
    let (store, course, lessons, quizzes) = reported_score_fixture(1);
    let user = Uuid::new_v4();

    for score in [40u32, 65, 90] {
      complete_quiz(&store, user, course, lessons[0].id, submission(quizzes[0], score))
        .await
        .unwrap();
    }
    let numbers: Vec<u32> = store
      .attempts_for_quiz(user, quizzes[0])
      .await
      .iter()
      .map(|a| a.attempt_number)
      .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn perfect_first_lesson_flattens_all_award_triggers() {
    let (store, course, lessons, quizzes) = reported_score_fixture(1);
    let user = Uuid::new_v4();

    let out = complete_quiz(&store, user, course, lessons[0].id, submission(quizzes[0], 100))
      .await
      .unwrap();
    // Lesson, quiz and course triggers all fire on this single submission.
    assert_eq!(
      out.awarded_achievements,
      vec!["First Steps".to_string(), "Perfectionist".into(), "Course Conqueror".into()]
    );
    // Repeat submission: state still qualifies but nothing is re-awarded.
    let out = complete_quiz(&store, user, course, lessons[0].id, submission(quizzes[0], 100))
      .await
      .unwrap();
    assert!(out.awarded_achievements.is_empty());
  }

  #[tokio::test]
  async fn unknown_quiz_is_fatal_and_writes_nothing() {
    let (store, course, lessons, _quizzes) = reported_score_fixture(1);
    let user = Uuid::new_v4();

    let err = complete_quiz(&store, user, course, lessons[0].id, submission(Uuid::new_v4(), 90))
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::NotFound("quiz")));
    assert_eq!(store.attempt_count(user).await, 0);
    assert!(store.enrollment(user, course).await.is_none());
  }

  #[tokio::test]
  async fn stored_answer_keys_override_reported_score() {
    // Keep the fixture's real questions: one single-choice with answer 0.
    let (content, lessons, quizzes) = course_content(1);
    let store = Store::with_content(content);
    let user = Uuid::new_v4();
    let course = lessons[0].course_id;

    // Client claims 100 but answers wrong: server-side keys win.
    let body = CompleteQuizIn {
      quiz_id: quizzes[0].id,
      score: 100,
      correct_answers: 1,
      total_questions: 1,
      time_spent: 5,
      answers: vec![SubmittedAnswer::Choice(1)],
    };
    let out = complete_quiz(&store, user, course, lessons[0].id, body).await.unwrap();
    assert_eq!(out.quiz_attempt.score, 0);
    assert!(!out.quiz_attempt.is_passed);
  }
}
