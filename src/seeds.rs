//! Built-in seed content: one demo course and a starter achievement set.
//! Guarantees the app is usable even without an external content bank.

use uuid::Uuid;

use crate::domain::{
  Achievement, AchievementCriteria, AchievementKind, Course, Lesson, Question, QuestionKind, Quiz,
  Rarity,
};
use crate::store::ContentSet;

fn choice_question(prompt: &str, options: &[&str], correct: u32) -> Question {
  Question {
    id: Uuid::new_v4(),
    kind: QuestionKind::SingleChoice,
    prompt: prompt.into(),
    options: options.iter().map(|s| s.to_string()).collect(),
    correct_options: vec![correct],
    accepted_texts: vec![],
    points: 1,
  }
}

/// A four-lesson demo course, each lesson gated by a short quiz.
pub fn seed_content() -> ContentSet {
  let course_id = Uuid::new_v4();
  let course = Course {
    id: course_id,
    title: "Introduction to Programming".into(),
    description: "Variables, control flow, functions and collections.".into(),
    duration_minutes: 240,
    rating: 4.6,
  };

  let lesson_specs: [(&str, &str, Vec<Question>); 4] = [
    (
      "Variables and Types",
      "What a value is and where it lives.",
      vec![
        choice_question("Which of these is a type?", &["integer", "loop", "comment"], 0),
        choice_question("A variable is...", &["a named value", "a file", "a network call"], 0),
      ],
    ),
    (
      "Control Flow",
      "Branching and repetition.",
      vec![
        choice_question("`if` is used for...", &["branching", "storage", "printing"], 0),
        choice_question("A loop that never ends is...", &["infinite", "finite", "lazy"], 0),
      ],
    ),
    (
      "Functions",
      "Naming and reusing behavior.",
      vec![choice_question("A function's inputs are called...", &["parameters", "results", "types"], 0)],
    ),
    (
      "Collections",
      "Lists and maps.",
      vec![choice_question("A map associates keys with...", &["values", "loops", "files"], 0)],
    ),
  ];

  let mut lessons = Vec::new();
  let mut quizzes = Vec::new();
  for (idx, (title, description, questions)) in lesson_specs.into_iter().enumerate() {
    let order = idx as u32 + 1;
    let lesson_id = Uuid::new_v4();
    lessons.push(Lesson {
      id: lesson_id,
      course_id,
      title: title.into(),
      description: description.into(),
      content: format!("Lesson {order}: {description}"),
      order,
    });
    quizzes.push(Quiz {
      id: Uuid::new_v4(),
      course_id,
      lesson_id: Some(lesson_id),
      title: format!("Checkpoint {order}"),
      description: String::new(),
      time_limit_secs: Some(300),
      passing_score: 70,
      max_attempts: 3,
      questions,
    });
  }

  ContentSet {
    courses: vec![course],
    lessons,
    quizzes,
    achievements: seed_achievements(),
  }
}

/// Starter achievements covering each wired trigger.
pub fn seed_achievements() -> Vec<Achievement> {
  vec![
    Achievement {
      id: Uuid::new_v4(),
      course_id: None,
      name: "First Steps".into(),
      description: "Complete your first lesson.".into(),
      icon: "footprints".into(),
      kind: AchievementKind::LessonCompletion,
      criteria: AchievementCriteria { first_lesson: Some(true), ..Default::default() },
      rarity: Rarity::Common,
      xp_reward: 10,
    },
    Achievement {
      id: Uuid::new_v4(),
      course_id: None,
      name: "Course Conqueror".into(),
      description: "Finish a whole course.".into(),
      icon: "trophy".into(),
      kind: AchievementKind::CourseCompletion,
      criteria: AchievementCriteria { target_count: Some(1), ..Default::default() },
      rarity: Rarity::Rare,
      xp_reward: 100,
    },
    Achievement {
      id: Uuid::new_v4(),
      course_id: None,
      name: "Perfectionist".into(),
      description: "Score 100% on a quiz.".into(),
      icon: "star".into(),
      kind: AchievementKind::PerfectScore,
      criteria: AchievementCriteria { min_score: Some(100), target_count: Some(1), ..Default::default() },
      rarity: Rarity::Epic,
      xp_reward: 50,
    },
    Achievement {
      id: Uuid::new_v4(),
      course_id: None,
      name: "Week of Learning".into(),
      description: "Practice seven days in a row.".into(),
      icon: "flame".into(),
      kind: AchievementKind::Streak,
      criteria: AchievementCriteria { target_days: Some(7), ..Default::default() },
      rarity: Rarity::Legendary,
      xp_reward: 200,
    },
  ]
}
