//! Status string → badge lookup.
use std::collections::HashMap;

use derive_more::Display;
use enum_iterator::Sequence;
use eyre::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::config::StatusSettings;

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, Sequence, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeVariant {
    #[default]
    #[display("default")]
    Default,
    #[display("secondary")]
    Secondary,
    #[display("success")]
    Success,
    #[display("warning")]
    Warning,
    #[display("destructive")]
    Destructive,
    #[display("outline")]
    Outline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Sequence, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeIcon {
    #[display("clock")]
    Clock,
    #[display("check")]
    Check,
    #[display("cross")]
    Cross,
    #[display("alert")]
    Alert,
    #[display("archive")]
    Archive,
    #[display("truck")]
    Truck,
}

/// Configured look of one status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeStyle {
    pub variant: BadgeVariant,
    /// Shown instead of the raw status when set.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub icon: Option<BadgeIcon>,
}

/// A rendered badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadge {
    pub variant: BadgeVariant,
    pub label: String,
    pub icon: Option<BadgeIcon>,
    pub color_class: String,
}

/// Case-insensitive status lookup. Unknown statuses render with the default
/// variant and their raw text; there is no error path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadgeRenderer {
    badges: HashMap<String, BadgeStyle>,
    colors: HashMap<String, String>,
    default_color: String,
}

impl Default for StatusBadgeRenderer {
    fn default() -> Self {
        Self::new("badge-neutral")
    }
}

/// Lookup key: lowercase, with spaces and dashes folded to underscores so
/// "Low stock" finds a `low_stock` entry.
fn status_key(status: &str) -> String {
    status.trim().to_lowercase().replace([' ', '-'], "_")
}

impl StatusBadgeRenderer {
    #[must_use]
    pub fn new(default_color: impl Into<String>) -> Self {
        Self {
            badges: HashMap::new(),
            colors: HashMap::new(),
            default_color: default_color.into(),
        }
    }

    #[must_use]
    pub fn with_badge(mut self, status: &str, style: BadgeStyle) -> Self {
        self.badges.insert(status_key(status), style);
        self
    }

    #[must_use]
    pub fn with_color(mut self, status: &str, color_class: impl Into<String>) -> Self {
        self.colors.insert(status_key(status), color_class.into());
        self
    }

    /// Builds the lookup tables from the `[status]` configuration section.
    /// Keys that only differ in case are rejected since lookups ignore case.
    pub fn from_settings(settings: &StatusSettings) -> Result<Self> {
        let mut renderer = Self::new(settings.default_color.clone());
        for (status, style) in &settings.badges {
            if renderer.badges.contains_key(&status_key(status)) {
                bail!("status badge '{status}' is configured more than once");
            }
            renderer = renderer.with_badge(status, style.clone());
        }
        for (status, color_class) in &settings.colors {
            if renderer.colors.contains_key(&status_key(status)) {
                bail!("status color '{status}' is configured more than once");
            }
            renderer = renderer.with_color(status, color_class.clone());
        }
        Ok(renderer)
    }

    pub fn style(&self, status: &str) -> Option<&BadgeStyle> {
        self.badges.get(&status_key(status))
    }

    pub fn color_class(&self, status: &str) -> &str {
        self.colors
            .get(&status_key(status))
            .map_or(&self.default_color, |class| class)
    }

    #[must_use]
    pub fn render(&self, status: &str) -> StatusBadge {
        let color_class = self.color_class(status).to_string();
        match self.style(status) {
            Some(style) => StatusBadge {
                variant: style.variant,
                label: style.label.clone().unwrap_or_else(|| status.to_string()),
                icon: style.icon,
                color_class,
            },
            None => StatusBadge {
                variant: BadgeVariant::Default,
                label: status.to_string(),
                icon: None,
                color_class,
            },
        }
    }
}
