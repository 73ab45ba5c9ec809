//! Domain models: courses, lessons, quizzes, attempts, enrollments,
//! achievements, profiles and notifications.
//!
//! `Enrollment.progress` and the `Profile` statistics are derived values;
//! they are only ever written by the progress tracker and the stats
//! aggregator respectively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of one user's enrollment in one course.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
  Active,
  Completed,
  Dropped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
  CourseCompletion,
  PerfectScore,
  SpeedRun,
  Streak,
  LessonCompletion,
  Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
  Common,
  Rare,
  Epic,
  Legendary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
  SingleChoice,
  MultipleChoice,
  FreeText,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
  Low,
  Normal,
  High,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
  pub id: Uuid,
  pub title: String,
  pub description: String,
  /// Total duration in minutes, display-only.
  pub duration_minutes: u32,
  pub rating: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lesson {
  pub id: Uuid,
  pub course_id: Uuid,
  pub title: String,
  pub description: String,
  pub content: String,
  /// 1-based position within the course; strictly increasing, unique.
  pub order: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
  pub id: Uuid,
  pub kind: QuestionKind,
  pub prompt: String,
  pub options: Vec<String>,
  /// Indices into `options` forming the correct answer set (choice kinds).
  pub correct_options: Vec<u32>,
  /// Accepted answers for free-text questions, compared after trimming.
  pub accepted_texts: Vec<String>,
  pub points: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quiz {
  pub id: Uuid,
  pub course_id: Uuid,
  /// At most one quiz per lesson; a quiz may also be course-level (None).
  pub lesson_id: Option<Uuid>,
  pub title: String,
  pub description: String,
  pub time_limit_secs: Option<u32>,
  /// Dead configuration: the pass/fail decision uses the literal 70
  /// threshold in `scoring`, not this field. Kept because the data model
  /// carries it and the quiz UI displays it.
  pub passing_score: u32,
  pub max_attempts: u32,
  pub questions: Vec<Question>,
}

/// One user's progress record for one course. Unique per (user, course).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Enrollment {
  pub id: Uuid,
  pub user_id: Uuid,
  pub course_id: Uuid,
  /// The lesson the student should attempt next. Stays on the last lesson
  /// once the course is exhausted.
  pub current_lesson_id: Option<Uuid>,
  /// Derived: round(100 * completed lessons / total lessons).
  pub progress: u8,
  pub status: EnrollmentStatus,
  pub enrolled_at: DateTime<Utc>,
  /// Stamped exactly once, on the transition to `Completed`.
  pub completed_at: Option<DateTime<Utc>>,
}

/// A submitted answer for one question: a choice index, a set of indices,
/// or free text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
  Choice(u32),
  Choices(Vec<u32>),
  Text(String),
}

/// One scored submission of a quiz. Append-only: attempts are a log and
/// are never mutated after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuizAttempt {
  pub id: Uuid,
  pub user_id: Uuid,
  pub quiz_id: Uuid,
  pub score: u32,
  pub correct_answers: u32,
  pub total_questions: u32,
  pub time_spent_secs: u32,
  pub answers: Vec<SubmittedAnswer>,
  pub is_passed: bool,
  /// 1-based, strictly increasing per (user, quiz).
  pub attempt_number: u32,
  pub completed_at: DateTime<Utc>,
}

/// Parameters for an achievement's predicate. All optional; each predicate
/// applies its own default.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AchievementCriteria {
  #[serde(default)] pub target_count: Option<u32>,
  #[serde(default)] pub min_score: Option<u32>,
  #[serde(default)] pub target_days: Option<u32>,
  #[serde(default)] pub lessons_completed: Option<u32>,
  #[serde(default)] pub first_lesson: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Achievement {
  pub id: Uuid,
  /// Optional course scope; None means platform-wide.
  pub course_id: Option<Uuid>,
  pub name: String,
  pub description: String,
  pub icon: String,
  pub kind: AchievementKind,
  pub criteria: AchievementCriteria,
  pub rarity: Rarity,
  pub xp_reward: u32,
}

/// Join row recording that a user earned an achievement. Unique per
/// (user, achievement); the at-most-once award invariant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserAchievement {
  pub user_id: Uuid,
  pub achievement_id: Uuid,
  pub earned_at: DateTime<Utc>,
  pub progress: u8,
}

/// Per-user derived statistics. Recomputed in full by the stats
/// aggregator; never edited directly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Profile {
  pub user_id: Uuid,
  pub average_score: f64,
  pub active_courses: u32,
  pub completed_topics: u32,
  pub total_study_time_secs: u64,
}

impl Profile {
  pub fn empty(user_id: Uuid) -> Self {
    Self {
      user_id,
      average_score: 0.0,
      active_courses: 0,
      completed_topics: 0,
      total_study_time_secs: 0,
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
  pub id: Uuid,
  pub user_id: Uuid,
  pub kind: String,
  pub title: String,
  pub message: String,
  pub action_url: String,
  pub priority: NotificationPriority,
  pub created_at: DateTime<Utc>,
  pub is_read: bool,
}
