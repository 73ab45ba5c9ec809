//! In-memory entity store.
//!
//! Collections live behind `tokio::sync::RwLock`s and are handed to the
//! engine modules as an explicit `&Store` parameter, no ambient
//! singletons. Two uniqueness rules are load-bearing and enforced
//! structurally by the map keys:
//!   - one `Enrollment` per (user, course)
//!   - one `UserAchievement` per (user, achievement)
//!
//! Attempts are an append-only log; nothing here ever mutates one.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    Achievement, AchievementKind, Course, Enrollment, EnrollmentStatus, Lesson, Notification,
    Profile, Quiz, QuizAttempt, UserAchievement,
};

/// Static content loaded at startup (config bank or built-in seeds).
#[derive(Default)]
pub struct ContentSet {
    pub courses: Vec<Course>,
    pub lessons: Vec<Lesson>,
    pub quizzes: Vec<Quiz>,
    pub achievements: Vec<Achievement>,
}

pub struct Store {
    courses: RwLock<HashMap<Uuid, Course>>,
    lessons: RwLock<HashMap<Uuid, Lesson>>,
    quizzes: RwLock<HashMap<Uuid, Quiz>>,
    achievements: RwLock<HashMap<Uuid, Achievement>>,
    /// Keyed by (user_id, course_id).
    enrollments: RwLock<HashMap<(Uuid, Uuid), Enrollment>>,
    attempts: RwLock<Vec<QuizAttempt>>,
    /// Keyed by (user_id, achievement_id).
    user_achievements: RwLock<HashMap<(Uuid, Uuid), UserAchievement>>,
    profiles: RwLock<HashMap<Uuid, Profile>>,
    notifications: RwLock<Vec<Notification>>,
}

impl Store {
    pub fn with_content(content: ContentSet) -> Self {
        let courses = content.courses.into_iter().map(|c| (c.id, c)).collect();
        let lessons = content.lessons.into_iter().map(|l| (l.id, l)).collect();
        let quizzes = content.quizzes.into_iter().map(|q| (q.id, q)).collect();
        let achievements = content.achievements.into_iter().map(|a| (a.id, a)).collect();
        Self {
            courses: RwLock::new(courses),
            lessons: RwLock::new(lessons),
            quizzes: RwLock::new(quizzes),
            achievements: RwLock::new(achievements),
            enrollments: RwLock::new(HashMap::new()),
            attempts: RwLock::new(Vec::new()),
            user_achievements: RwLock::new(HashMap::new()),
            profiles: RwLock::new(HashMap::new()),
            notifications: RwLock::new(Vec::new()),
        }
    }

    // ----- courses & lessons -----

    pub async fn course(&self, id: Uuid) -> Option<Course> {
        self.courses.read().await.get(&id).cloned()
    }

    /// All courses, sorted by title for stable listings.
    pub async fn courses_sorted(&self) -> Vec<Course> {
        let mut all: Vec<Course> = self.courses.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.title.cmp(&b.title));
        all
    }

    /// Lessons of a course in curriculum order.
    pub async fn lessons_for_course(&self, course_id: Uuid) -> Vec<Lesson> {
        let mut out: Vec<Lesson> = self
            .lessons
            .read()
            .await
            .values()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect();
        out.sort_by_key(|l| l.order);
        out
    }

    pub async fn lesson_count(&self, course_id: Uuid) -> usize {
        self.lessons
            .read()
            .await
            .values()
            .filter(|l| l.course_id == course_id)
            .count()
    }

    pub async fn lesson(&self, id: Uuid) -> Option<Lesson> {
        self.lessons.read().await.get(&id).cloned()
    }

    /// Lesson lookup scoped to a course; the route parameters carry both ids.
    pub async fn lesson_in_course(&self, course_id: Uuid, lesson_id: Uuid) -> Option<Lesson> {
        self.lessons
            .read()
            .await
            .get(&lesson_id)
            .filter(|l| l.course_id == course_id)
            .cloned()
    }

    /// The lesson with `order == after + 1`, first match when sorted
    /// ascending. Well-formed courses have at most one.
    pub async fn next_lesson_after(&self, course_id: Uuid, after: u32) -> Option<Lesson> {
        let lessons = self.lessons.read().await;
        let mut candidates: Vec<&Lesson> = lessons
            .values()
            .filter(|l| l.course_id == course_id && l.order == after + 1)
            .collect();
        candidates.sort_by_key(|l| l.order);
        candidates.first().map(|l| (*l).clone())
    }

    // ----- quizzes -----

    pub async fn quiz(&self, id: Uuid) -> Option<Quiz> {
        self.quizzes.read().await.get(&id).cloned()
    }

    pub async fn quiz_for_lesson(&self, course_id: Uuid, lesson_id: Uuid) -> Option<Quiz> {
        self.quizzes
            .read()
            .await
            .values()
            .find(|q| q.course_id == course_id && q.lesson_id == Some(lesson_id))
            .cloned()
    }

    // ----- enrollments -----

    pub async fn enrollment(&self, user_id: Uuid, course_id: Uuid) -> Option<Enrollment> {
        self.enrollments
            .read()
            .await
            .get(&(user_id, course_id))
            .cloned()
    }

    /// Insert or overwrite the enrollment for its (user, course) pair.
    pub async fn save_enrollment(&self, e: Enrollment) {
        self.enrollments
            .write()
            .await
            .insert((e.user_id, e.course_id), e);
    }

    pub async fn enrollments_for_user(&self, user_id: Uuid) -> Vec<Enrollment> {
        let mut out: Vec<Enrollment> = self
            .enrollments
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|e| e.enrolled_at);
        out
    }

    pub async fn enrollment_count(&self, user_id: Uuid, status: EnrollmentStatus) -> usize {
        self.enrollments
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id && e.status == status)
            .count()
    }

    // ----- quiz attempts -----

    pub async fn record_attempt(&self, attempt: QuizAttempt) {
        self.attempts.write().await.push(attempt);
    }

    pub async fn max_attempt_number(&self, user_id: Uuid, quiz_id: Uuid) -> Option<u32> {
        self.attempts
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
            .map(|a| a.attempt_number)
            .max()
    }

    /// Attempts for one (user, quiz), ordered by attempt number.
    pub async fn attempts_for_quiz(&self, user_id: Uuid, quiz_id: Uuid) -> Vec<QuizAttempt> {
        let mut out: Vec<QuizAttempt> = self
            .attempts
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
            .cloned()
            .collect();
        out.sort_by_key(|a| a.attempt_number);
        out
    }

    pub async fn attempt_count(&self, user_id: Uuid) -> usize {
        self.attempts
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id)
            .count()
    }

    pub async fn passed_attempt_count(&self, user_id: Uuid) -> usize {
        self.attempts
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id && a.is_passed)
            .count()
    }

    pub async fn perfect_attempt_count(&self, user_id: Uuid) -> usize {
        self.attempts
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id && a.score == 100)
            .count()
    }

    pub async fn score_sum(&self, user_id: Uuid) -> f64 {
        self.attempts
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.score as f64)
            .sum()
    }

    /// Distinct lessons of a course the user has passed, derived from the
    /// attempt log joined through lesson-bound quizzes. Recomputed on every
    /// call; there is no cached counter to invalidate.
    pub async fn passed_lesson_ids(&self, user_id: Uuid, course_id: Uuid) -> BTreeSet<Uuid> {
        let quizzes = self.quizzes.read().await;
        let attempts = self.attempts.read().await;
        attempts
            .iter()
            .filter(|a| a.user_id == user_id && a.is_passed)
            .filter_map(|a| quizzes.get(&a.quiz_id))
            .filter(|q| q.course_id == course_id)
            .filter_map(|q| q.lesson_id)
            .collect()
    }

    /// Completion timestamps of the user's attempts at or after `cutoff`,
    /// newest first. Feeds the streak computation.
    pub async fn attempt_times_since(
        &self,
        user_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Vec<DateTime<Utc>> {
        let mut out: Vec<DateTime<Utc>> = self
            .attempts
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id && a.completed_at >= cutoff)
            .map(|a| a.completed_at)
            .collect();
        out.sort_by(|a, b| b.cmp(a));
        out
    }

    // ----- achievements -----

    pub async fn achievement(&self, id: Uuid) -> Option<Achievement> {
        self.achievements.read().await.get(&id).cloned()
    }

    pub async fn achievements_of_kind(&self, kind: AchievementKind) -> Vec<Achievement> {
        self.achievements
            .read()
            .await
            .values()
            .filter(|a| a.kind == kind)
            .cloned()
            .collect()
    }

    pub async fn all_achievements(&self) -> Vec<Achievement> {
        let mut all: Vec<Achievement> = self.achievements.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.xp_reward.cmp(&a.xp_reward));
        all
    }

    /// Find-or-create on (user, achievement). Returns true only when the
    /// row was created by this call; an existing row is left untouched.
    pub async fn award_if_new(&self, user_id: Uuid, achievement_id: Uuid, now: DateTime<Utc>) -> bool {
        let mut map = self.user_achievements.write().await;
        match map.entry((user_id, achievement_id)) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(v) => {
                v.insert(UserAchievement {
                    user_id,
                    achievement_id,
                    earned_at: now,
                    progress: 100,
                });
                true
            }
        }
    }

    pub async fn user_achievement(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
    ) -> Option<UserAchievement> {
        self.user_achievements
            .read()
            .await
            .get(&(user_id, achievement_id))
            .cloned()
    }

    pub async fn user_achievements(&self, user_id: Uuid) -> Vec<UserAchievement> {
        let mut out: Vec<UserAchievement> = self
            .user_achievements
            .read()
            .await
            .values()
            .filter(|ua| ua.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));
        out
    }

    // ----- profiles -----

    pub async fn profile(&self, user_id: Uuid) -> Option<Profile> {
        self.profiles.read().await.get(&user_id).cloned()
    }

    /// Upsert the derived statistics; a missing profile row is created with
    /// defaults first.
    pub async fn write_profile_stats(
        &self,
        user_id: Uuid,
        average_score: f64,
        completed_topics: u32,
        active_courses: u32,
    ) {
        let mut profiles = self.profiles.write().await;
        let p = profiles
            .entry(user_id)
            .or_insert_with(|| Profile::empty(user_id));
        p.average_score = average_score;
        p.completed_topics = completed_topics;
        p.active_courses = active_courses;
    }

    // ----- notifications -----

    pub async fn push_notification(&self, n: Notification) {
        self.notifications.write().await.push(n);
    }

    pub async fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        let mut out: Vec<Notification> = self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    pub async fn unread_notification_count(&self, user_id: Uuid) -> usize {
        self.notifications
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count()
    }

    /// Mark one notification read. False when no notification with this id
    /// belongs to the user; marking an already-read one again is a no-op
    /// success.
    pub async fn mark_notification_read(&self, user_id: Uuid, id: Uuid) -> bool {
        let mut notifications = self.notifications.write().await;
        match notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                true
            }
            None => false,
        }
    }

    /// Mark every unread notification of the user read; returns how many
    /// were flipped.
    pub async fn mark_all_notifications_read(&self, user_id: Uuid) -> usize {
        let mut notifications = self.notifications.write().await;
        let mut flipped = 0;
        for n in notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            flipped += 1;
        }
        flipped
    }
}
