//! Loading the content bank (courses, lessons, quizzes, achievements)
//! from TOML.
//!
//! See `ContentConfig` for the expected schema. Ids are optional in the
//! file; missing ones are generated at load time.

use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{
  Achievement, AchievementCriteria, AchievementKind, Course, Lesson, Question, QuestionKind, Quiz,
  Rarity,
};
use crate::store::ContentSet;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ContentConfig {
  #[serde(default)]
  pub courses: Vec<CourseCfg>,
  #[serde(default)]
  pub achievements: Vec<AchievementCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CourseCfg {
  #[serde(default)] pub id: Option<Uuid>,
  pub title: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub duration_minutes: u32,
  #[serde(default)] pub rating: f32,
  #[serde(default)] pub lessons: Vec<LessonCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LessonCfg {
  pub title: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub content: String,
  /// 1-based; defaults to the lesson's position in the file.
  #[serde(default)] pub order: Option<u32>,
  #[serde(default)] pub quiz: Option<QuizCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuizCfg {
  #[serde(default)] pub title: Option<String>,
  #[serde(default)] pub description: String,
  #[serde(default)] pub time_limit_secs: Option<u32>,
  #[serde(default = "default_passing_score")] pub passing_score: u32,
  #[serde(default = "default_max_attempts")] pub max_attempts: u32,
  #[serde(default)] pub questions: Vec<QuestionCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  #[serde(default = "default_question_kind")] pub kind: QuestionKind,
  pub prompt: String,
  #[serde(default)] pub options: Vec<String>,
  #[serde(default)] pub correct: Vec<u32>,
  #[serde(default)] pub accepted: Vec<String>,
  #[serde(default = "default_points")] pub points: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AchievementCfg {
  #[serde(default)] pub id: Option<Uuid>,
  pub name: String,
  #[serde(default)] pub description: String,
  #[serde(default = "default_icon")] pub icon: String,
  pub kind: AchievementKind,
  #[serde(default)] pub criteria: AchievementCriteria,
  #[serde(default = "default_rarity")] pub rarity: Rarity,
  #[serde(default)] pub xp_reward: u32,
}

fn default_passing_score() -> u32 { 70 }
fn default_max_attempts() -> u32 { 3 }
fn default_points() -> u32 { 1 }
fn default_question_kind() -> QuestionKind { QuestionKind::SingleChoice }
fn default_icon() -> String { "medal".into() }
fn default_rarity() -> Rarity { Rarity::Common }

impl ContentConfig {
  /// Materialize the config into store-ready records, generating ids and
  /// wiring course/lesson/quiz foreign keys.
  pub fn into_content(self) -> ContentSet {
    let mut out = ContentSet::default();

    for cc in self.courses {
      if cc.title.trim().is_empty() {
        error!(target: "coursehub_backend", "Skipping bank course: empty title.");
        continue;
      }
      let course_id = cc.id.unwrap_or_else(Uuid::new_v4);
      out.courses.push(Course {
        id: course_id,
        title: cc.title,
        description: cc.description,
        duration_minutes: cc.duration_minutes,
        rating: cc.rating,
      });

      for (idx, lc) in cc.lessons.into_iter().enumerate() {
        let lesson_id = Uuid::new_v4();
        let order = lc.order.unwrap_or(idx as u32 + 1);
        out.lessons.push(Lesson {
          id: lesson_id,
          course_id,
          title: lc.title,
          description: lc.description,
          content: lc.content,
          order,
        });

        if let Some(qc) = lc.quiz {
          let questions = qc
            .questions
            .into_iter()
            .map(|q| Question {
              id: Uuid::new_v4(),
              kind: q.kind,
              prompt: q.prompt,
              options: q.options,
              correct_options: q.correct,
              accepted_texts: q.accepted,
              points: q.points,
            })
            .collect();
          out.quizzes.push(Quiz {
            id: Uuid::new_v4(),
            course_id,
            lesson_id: Some(lesson_id),
            title: qc.title.unwrap_or_else(|| format!("Quiz: lesson {order}")),
            description: qc.description,
            time_limit_secs: qc.time_limit_secs,
            passing_score: qc.passing_score,
            max_attempts: qc.max_attempts,
            questions,
          });
        }
      }
    }

    for ac in self.achievements {
      out.achievements.push(Achievement {
        id: ac.id.unwrap_or_else(Uuid::new_v4),
        course_id: None,
        name: ac.name,
        description: ac.description,
        icon: ac.icon,
        kind: ac.kind,
        criteria: ac.criteria,
        rarity: ac.rarity,
        xp_reward: ac.xp_reward,
      });
    }

    out
  }
}

/// Attempt to load `ContentConfig` from CONTENT_CONFIG_PATH. On any
/// parsing/IO error, returns None and the built-in seeds take over.
pub fn load_content_config_from_env() -> Option<ContentConfig> {
  let path = std::env::var("CONTENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<ContentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "coursehub_backend", %path, "Loaded content bank (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "coursehub_backend", %path, error = %e, "Failed to parse TOML content bank");
        None
      }
    },
    Err(e) => {
      error!(target: "coursehub_backend", %path, error = %e, "Failed to read TOML content bank");
      None
    }
  }
}
