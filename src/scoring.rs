//! Quiz evaluator: pure scoring of a submission against the stored answer
//! keys, plus attempt numbering.
//!
//! Persisting the resulting attempt is the completion pipeline's job, not
//! ours; evaluation itself has no side effects.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::domain::{Question, QuestionKind, Quiz, SubmittedAnswer};
use crate::store::Store;

/// The pass threshold for progress purposes. The quiz model also carries a
/// per-quiz `passing_score`, but that field is never consulted for the
/// pass/fail decision; the downstream progress and achievement logic
/// depends on the literal 70.
pub const PASS_THRESHOLD: u32 = 70;

#[derive(Clone, Copy, Debug)]
pub struct EvaluatedAttempt {
  pub score: u32,
  pub correct_answers: u32,
  pub total_questions: u32,
  pub is_passed: bool,
}

impl EvaluatedAttempt {
  /// Used when a quiz carries no stored questions: the client-reported
  /// totals are taken as-is, with only the pass decision applied here.
  pub fn from_reported(score: u32, correct_answers: u32, total_questions: u32) -> Self {
    Self {
      score,
      correct_answers,
      total_questions,
      is_passed: score >= PASS_THRESHOLD,
    }
  }
}

/// Score `answers` against the quiz's questions in order. A missing answer
/// for a question counts as incorrect; extra answers are ignored.
pub fn evaluate(quiz: &Quiz, answers: &[SubmittedAnswer]) -> EvaluatedAttempt {
  let total = quiz.questions.len();
  let correct = quiz
    .questions
    .iter()
    .enumerate()
    .filter(|(i, q)| answers.get(*i).is_some_and(|a| question_correct(q, a)))
    .count();

  let score = crate::util::percent(correct, total) as u32;
  EvaluatedAttempt {
    score,
    correct_answers: correct as u32,
    total_questions: total as u32,
    is_passed: score >= PASS_THRESHOLD,
  }
}

/// Exact-match correctness: set equality for choice questions, trimmed
/// string equality against any accepted text for free-text ones.
fn question_correct(q: &Question, answer: &SubmittedAnswer) -> bool {
  match q.kind {
    QuestionKind::SingleChoice | QuestionKind::MultipleChoice => {
      let submitted: BTreeSet<u32> = match answer {
        SubmittedAnswer::Choice(i) => BTreeSet::from([*i]),
        SubmittedAnswer::Choices(v) => v.iter().copied().collect(),
        SubmittedAnswer::Text(_) => return false,
      };
      let expected: BTreeSet<u32> = q.correct_options.iter().copied().collect();
      !expected.is_empty() && submitted == expected
    }
    QuestionKind::FreeText => match answer {
      SubmittedAnswer::Text(t) => {
        let t = t.trim();
        q.accepted_texts.iter().any(|acc| acc.trim() == t)
      }
      _ => false,
    },
  }
}

/// One more than the user's highest attempt number for this quiz; 1 for the
/// first attempt. Concurrent submissions may race here; accepted, there is
/// no per-user serialization.
pub async fn next_attempt_number(store: &Store, user_id: Uuid, quiz_id: Uuid) -> u32 {
  store
    .max_attempt_number(user_id, quiz_id)
    .await
    .map_or(1, |n| n + 1)
}
