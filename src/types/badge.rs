use serde::Serialize;

/// Severity band shown on the badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeLevel {
    Clear,
    Warning,
    Critical,
}

impl BadgeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeLevel::Clear => "clear",
            BadgeLevel::Warning => "warning",
            BadgeLevel::Critical => "critical",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            BadgeLevel::Clear => "#4caf50",
            BadgeLevel::Warning => "#ff9800",
            BadgeLevel::Critical => "#d32f2f",
        }
    }
}

/// Visible badge state. Always derived from a total, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeState {
    pub total: u64,
    pub level: BadgeLevel,
    pub text: String,
    pub color: String,
    pub title: String,
}
