//! Public request/response structs for the HTTP endpoints (serde ready).
//! Wire names are camelCase to match the SPA; keep this small and stable so
//! backend and frontend can evolve independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Achievement, AchievementCriteria, AchievementKind, Course, Enrollment, EnrollmentStatus,
    Lesson, Notification, NotificationPriority, Profile, Question, Quiz, Rarity, SubmittedAnswer,
    UserAchievement,
};

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

//
// Quiz completion
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteQuizIn {
    pub quiz_id: Uuid,
    /// Client-reported totals; authoritative only for quizzes that carry no
    /// stored answer keys.
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub correct_answers: u32,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default)]
    pub time_spent: u32,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOut {
    pub score: u32,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub is_passed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentOut {
    pub progress: u8,
    pub current_lesson_id: Option<Uuid>,
    pub status: EnrollmentStatus,
}

impl From<&Enrollment> for EnrollmentOut {
    fn from(e: &Enrollment) -> Self {
        Self {
            progress: e.progress,
            current_lesson_id: e.current_lesson_id,
            status: e.status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteQuizOut {
    pub success: bool,
    pub message: String,
    pub quiz_attempt: AttemptOut,
    pub next_lesson_available: bool,
    /// Names of achievements newly awarded by this submission, flattened
    /// across the lesson/quiz/course triggers.
    pub awarded_achievements: Vec<String>,
    pub enrollment: EnrollmentOut,
}

//
// Courses & topics
//

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummaryOut {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_minutes: u32,
    pub rating: f32,
    pub lesson_count: usize,
}

impl CourseSummaryOut {
    pub fn new(c: &Course, lesson_count: usize) -> Self {
        Self {
            id: c.id,
            title: c.title.clone(),
            description: c.description.clone(),
            duration_minutes: c.duration_minutes,
            rating: c.rating,
            lesson_count,
        }
    }
}

#[derive(Serialize)]
pub struct CoursesOut {
    pub success: bool,
    pub courses: Vec<CourseSummaryOut>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyCourseOut {
    #[serde(flatten)]
    pub course: CourseSummaryOut,
    pub enrollment_status: EnrollmentStatus,
    pub progress: u8,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct MyCoursesOut {
    pub success: bool,
    pub courses: Vec<MyCourseOut>,
}

/// Topic row inside a course view: no content, just sequencing info.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummaryOut {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub order: u32,
    pub has_quiz: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithTopicsOut {
    pub success: bool,
    pub course: CourseSummaryOut,
    pub topics: Vec<TopicSummaryOut>,
    pub enrollment: Option<EnrollmentOut>,
    /// Lesson ids the caller has completed (passed the lesson's quiz).
    pub completed_topics: Vec<Uuid>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDetailsOut {
    pub success: bool,
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub order: u32,
    pub is_completed: bool,
    pub user_progress: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicContentOut {
    pub success: bool,
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub course_title: String,
}

//
// Quiz data (questions served without answer keys)
//

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    pub id: Uuid,
    pub kind: crate::domain::QuestionKind,
    pub prompt: String,
    pub options: Vec<String>,
    pub points: u32,
}

impl From<&Question> for QuestionOut {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            kind: q.kind,
            prompt: q.prompt.clone(),
            options: q.options.clone(),
            points: q.points,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizUserStatsOut {
    pub total_attempts: usize,
    pub last_score: u32,
    pub next_attempt_number: u32,
    pub attempts_left: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDataOut {
    pub success: bool,
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub time_limit_secs: Option<u32>,
    pub passing_score: u32,
    pub max_attempts: u32,
    pub questions: Vec<QuestionOut>,
    pub user_stats: QuizUserStatsOut,
}

impl QuizDataOut {
    pub fn new(quiz: &Quiz, stats: QuizUserStatsOut) -> Self {
        Self {
            success: true,
            id: quiz.id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            time_limit_secs: quiz.time_limit_secs,
            passing_score: quiz.passing_score,
            max_attempts: quiz.max_attempts,
            questions: quiz.questions.iter().map(QuestionOut::from).collect(),
            user_stats: stats,
        }
    }
}

//
// Manual lesson progress (non-quiz path)
//

#[derive(Debug, Deserialize)]
pub struct LessonProgressIn {
    #[serde(default)]
    pub completed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressOut {
    pub success: bool,
    pub message: String,
    pub enrollment: EnrollmentOut,
}

//
// Achievements
//

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementOut {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub kind: AchievementKind,
    pub rarity: Rarity,
    pub xp_reward: u32,
    pub criteria: AchievementCriteria,
    pub earned: bool,
    pub earned_at: Option<DateTime<Utc>>,
    pub progress: u8,
}

impl AchievementOut {
    pub fn new(a: &Achievement, earned: Option<&UserAchievement>) -> Self {
        Self {
            id: a.id,
            name: a.name.clone(),
            description: a.description.clone(),
            icon: a.icon.clone(),
            kind: a.kind,
            rarity: a.rarity,
            xp_reward: a.xp_reward,
            criteria: a.criteria.clone(),
            earned: earned.is_some(),
            earned_at: earned.map(|ua| ua.earned_at),
            progress: earned.map_or(0, |ua| ua.progress),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityBreakdownOut {
    pub common: usize,
    pub rare: usize,
    pub epic: usize,
    pub legendary: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStatsOut {
    pub total: usize,
    pub earned: usize,
    pub progress: u8,
    pub total_xp: u32,
    pub by_rarity: RarityBreakdownOut,
}

#[derive(Serialize)]
pub struct AchievementsOut {
    pub success: bool,
    pub achievements: Vec<AchievementOut>,
    pub stats: AchievementStatsOut,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgressOut {
    pub success: bool,
    pub earned: bool,
    pub progress: u8,
    pub earned_at: Option<DateTime<Utc>>,
    pub achievement: Option<AchievementOut>,
}

//
// Notifications & profile
//

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOut {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub action_url: String,
    pub priority: NotificationPriority,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl From<&Notification> for NotificationOut {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind.clone(),
            title: n.title.clone(),
            message: n.message.clone(),
            action_url: n.action_url.clone(),
            priority: n.priority,
            created_at: n.created_at,
            is_read: n.is_read,
        }
    }
}

#[derive(Serialize)]
pub struct NotificationsOut {
    pub success: bool,
    pub notifications: Vec<NotificationOut>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountOut {
    pub success: bool,
    pub unread_count: usize,
}

/// Response for the read-state mutations (single and all).
#[derive(Debug, Serialize)]
pub struct NotificationActionOut {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOut {
    pub success: bool,
    pub average_score: f64,
    pub active_courses: u32,
    pub completed_topics: u32,
    pub total_study_time_secs: u64,
}

impl From<Profile> for ProfileOut {
    fn from(p: Profile) -> Self {
        Self {
            success: true,
            average_score: p.average_score,
            active_courses: p.active_courses,
            completed_topics: p.completed_topics,
            total_study_time_secs: p.total_study_time_secs,
        }
    }
}

/// Topic summary for course views, derived from the full lesson.
pub fn topic_summary(l: &Lesson, has_quiz: bool) -> TopicSummaryOut {
    TopicSummaryOut {
        id: l.id,
        title: l.title.clone(),
        description: l.description.clone(),
        order: l.order,
        has_quiz,
    }
}
