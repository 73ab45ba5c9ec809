//! Application state: the entity store plus startup content loading.
//!
//! Content comes from the TOML bank when configured; the built-in seed
//! course and achievements are the fallback so the app is useful out of
//! the box.

use tracing::{info, instrument};

use crate::config::load_content_config_from_env;
use crate::seeds::{seed_achievements, seed_content};
use crate::store::Store;

pub struct AppState {
    pub store: Store,
}

impl AppState {
    /// Build state from env: load the content bank if present, otherwise
    /// fall back to seeds, then report the startup inventory.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let mut content = load_content_config_from_env()
            .map(|cfg| cfg.into_content())
            .unwrap_or_default();

        if content.courses.is_empty() {
            info!(target: "coursehub_backend", "No content bank configured; using built-in seed course.");
            content = seed_content();
        } else if content.achievements.is_empty() {
            // A bank that defines courses but no achievements still gets
            // the starter set, so awarding has something to work with.
            content.achievements = seed_achievements();
        }

        info!(
            target: "coursehub_backend",
            courses = content.courses.len(),
            lessons = content.lessons.len(),
            quizzes = content.quizzes.len(),
            achievements = content.achievements.len(),
            "Startup content inventory"
        );

        Self { store: Store::with_content(content) }
    }
}
