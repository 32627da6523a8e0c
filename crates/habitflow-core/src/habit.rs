//! Habit metadata model.
//!
//! A habit is owned by exactly one user and carries display metadata only;
//! its completion history lives in the ledger and its streaks are derived.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::storage::HabitsConfig;

pub const MAX_TITLE_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Unique habit identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(Uuid);

impl HabitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HabitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for HabitId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| CoreError::invalid("habit_id", format!("'{s}': {e}")))
    }
}

/// Habit category. Deserializes case-insensitively, like `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String")]
pub enum HabitCategory {
    Health,
    Productivity,
    Learning,
    Fitness,
    Mindfulness,
    #[default]
    Other,
}

impl HabitCategory {
    pub const ALL: [HabitCategory; 6] = [
        HabitCategory::Health,
        HabitCategory::Productivity,
        HabitCategory::Learning,
        HabitCategory::Fitness,
        HabitCategory::Mindfulness,
        HabitCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Health => "Health",
            Self::Productivity => "Productivity",
            Self::Learning => "Learning",
            Self::Fitness => "Fitness",
            Self::Mindfulness => "Mindfulness",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for HabitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HabitCategory {
    type Err = CoreError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::invalid("category", format!("unknown category '{s}'")))
    }
}

impl TryFrom<String> for HabitCategory {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A tracked habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub owner: String,
    pub title: String,
    pub description: Option<String>,
    pub category: HabitCategory,
    pub target_days: u32,
    pub color: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a habit. Unset fields take configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewHabit {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<HabitCategory>,
    #[serde(default)]
    pub target_days: Option<u32>,
    #[serde(default)]
    pub color: Option<String>,
}

impl NewHabit {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Validate and materialize into a `Habit` owned by `owner`.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty owner or any field that fails
    /// validation.
    pub fn into_habit(self, owner: &str, defaults: &HabitsConfig) -> Result<Habit, CoreError> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(CoreError::invalid("owner", "must not be empty"));
        }

        let habit = Habit {
            id: HabitId::new(),
            owner: owner.to_string(),
            title: normalize_title(&self.title)?,
            description: normalize_description(self.description)?,
            category: self.category.unwrap_or(defaults.default_category),
            target_days: validate_target_days(
                self.target_days.unwrap_or(defaults.default_target_days),
            )?,
            color: validate_color(
                self.color.as_deref().unwrap_or(&defaults.default_color),
            )?,
            is_active: true,
            created_at: Utc::now(),
        };
        Ok(habit)
    }
}

/// Partial metadata update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub category: Option<HabitCategory>,
    pub target_days: Option<u32>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

impl Habit {
    /// Apply a patch, validating every changed field before touching `self`.
    ///
    /// # Errors
    /// Returns `InvalidArgument` and leaves the habit unchanged if any field
    /// is invalid.
    pub fn apply(&mut self, patch: HabitPatch) -> Result<(), CoreError> {
        let title = patch.title.as_deref().map(normalize_title).transpose()?;
        let description = patch.description.map(normalize_description).transpose()?;
        let target_days = patch.target_days.map(validate_target_days).transpose()?;
        let color = patch.color.as_deref().map(validate_color).transpose()?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(target_days) = target_days {
            self.target_days = target_days;
        }
        if let Some(color) = color {
            self.color = color;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        Ok(())
    }
}

fn normalize_title(title: &str) -> Result<String, CoreError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::invalid("title", "must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::invalid(
            "title",
            format!("must be at most {MAX_TITLE_LEN} characters"),
        ));
    }
    Ok(title.to_string())
}

fn normalize_description(description: Option<String>) -> Result<Option<String>, CoreError> {
    let Some(description) = description else {
        return Ok(None);
    };
    let description = description.trim();
    if description.is_empty() {
        return Ok(None);
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CoreError::invalid(
            "description",
            format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    Ok(Some(description.to_string()))
}

pub(crate) fn validate_target_days(target_days: u32) -> Result<u32, CoreError> {
    if target_days == 0 {
        return Err(CoreError::invalid("target_days", "must be at least 1"));
    }
    Ok(target_days)
}

/// Accepts `#RRGGBB`; returns it lowercased.
pub(crate) fn validate_color(color: &str) -> Result<String, CoreError> {
    let color = color.trim();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(CoreError::invalid(
            "color",
            format!("expected #RRGGBB, got '{color}'"),
        ));
    }
    Ok(color.to_ascii_lowercase())
}
