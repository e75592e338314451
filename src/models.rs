use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum ClassLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ClassLevel {
    pub const ALL: [ClassLevel; 3] = [
        ClassLevel::Beginner,
        ClassLevel::Intermediate,
        ClassLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassLevel::Beginner => "Beginner",
            ClassLevel::Intermediate => "Intermediate",
            ClassLevel::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown level '{0}', expected one of Beginner, Intermediate, Advanced")]
pub struct UnknownLevel(pub String);

impl FromStr for ClassLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ClassLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownLevel(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    #[schema(example = "1")]
    pub id: String,
    #[schema(example = "Hatha Yoga for Beginners")]
    pub name: String,
    pub level: ClassLevel,
    #[schema(example = "Priya Sharma")]
    pub instructor: String,
    #[schema(example = "Ananda Yoga Studio")]
    pub center: String,
    #[serde(default)]
    pub is_booked: bool,
}

/// Level and instructor selection driving the class list.
///
/// `selected_levels` behaves as a set: use [`FilterState::with_levels`] or
/// [`FilterState::toggle_level`] to keep it free of duplicates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub selected_levels: Vec<ClassLevel>,
    pub selected_instructor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[schema(example = "Rohan Kumar")]
    pub name: String,
    pub mobile: String,
    pub credits: i64,
    pub city: String,
    #[schema(example = "March 2024")]
    pub joined_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResult {
    pub success: bool,
    pub class_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, body)
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, body)
    }

    fn new(kind: NotificationKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: body.into(),
            class_id: None,
            at: Utc::now(),
        }
    }

    pub fn for_class(mut self, class_id: impl Into<String>) -> Self {
        self.class_id = Some(class_id.into());
        self
    }
}
