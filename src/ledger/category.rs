use serde::{Deserialize, Serialize};

use super::transaction::fresh_id;

/// Categorises ledger activity for entry and reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Short glyph shown next to the name.
    pub icon: String,
    /// Hex color used by presentation layers.
    pub color: String,
}

impl Category {
    pub fn new(draft: NewCategory) -> Self {
        Self {
            id: fresh_id(),
            name: draft.name,
            icon: draft.icon,
            color: draft.color,
        }
    }

    fn seed(id: &str, name: &str, icon: &str, color: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            color: color.into(),
        }
    }
}

/// Category attributes as supplied by the caller; the container assigns
/// the id. Seed categories keep their fixed literal ids instead.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub icon: String,
    pub color: String,
}

/// Partial update applied by `update_category`; absent fields are left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl CategoryPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// The built-in category set used when no prior data exists in storage.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::seed("income", "收入", "💰", "#51cf66"),
        Category::seed("food", "食", "🍽️", "#ff6b6b"),
        Category::seed("drink", "飲料", "🥤", "#4ecdc4"),
        Category::seed("transport", "交通", "🚗", "#45b7d1"),
        Category::seed("shopping", "購物", "🛍️", "#96ceb4"),
        Category::seed("entertainment", "娛樂", "🎮", "#feca57"),
        Category::seed("health", "醫療", "💊", "#ff9ff3"),
        Category::seed("education", "教育", "📚", "#54a0ff"),
    ]
}
