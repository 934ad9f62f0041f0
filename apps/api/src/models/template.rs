use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Profession the catalog falls back to when nothing more specific is active.
pub const DEFAULT_PROFESSION: &str = "developer";

/// A profession-keyed rendering strategy reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Template {
    pub id: i64,
    pub profession: String,
    pub template_name: String,
    /// Free-form presentation metadata (palette hints, preview image, ...).
    pub template_data: Value,
    pub is_active: bool,
}

/// Catalog shipped with every fresh store. Mirrors the seed rows in the
/// initial migration.
pub fn seed_templates() -> Vec<Template> {
    [
        ("developer", "Modern Developer", "#667eea"),
        ("doctor", "Medical Professional", "#2c5aa0"),
        ("photographer", "Creative Photographer", "#ff6b6b"),
        ("video_editor", "Video Editor Showcase", "#667eea"),
        ("marketing", "Marketing Professional", "#667eea"),
        ("designer", "Creative Designer", "#667eea"),
        ("writer", "Writer Portfolio", "#667eea"),
        ("consultant", "Business Consultant", "#667eea"),
    ]
    .into_iter()
    .enumerate()
    .map(|(idx, (profession, name, accent))| Template {
        id: idx as i64 + 1,
        profession: profession.to_string(),
        template_name: name.to_string(),
        template_data: serde_json::json!({ "accent": accent }),
        is_active: true,
    })
    .collect()
}
