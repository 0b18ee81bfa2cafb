//! What the shield blocks: apps, websites and whole categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppCategory {
    SocialMedia,
    Games,
    Entertainment,
    Shopping,
    News,
    Messaging,
}

impl AppCategory {
    pub const ALL: [AppCategory; 6] = [
        AppCategory::SocialMedia,
        AppCategory::Games,
        AppCategory::Entertainment,
        AppCategory::Shopping,
        AppCategory::News,
        AppCategory::Messaging,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppCategory::SocialMedia => "social_media",
            AppCategory::Games => "games",
            AppCategory::Entertainment => "entertainment",
            AppCategory::Shopping => "shopping",
            AppCategory::News => "news",
            AppCategory::Messaging => "messaging",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AppCategory::SocialMedia => "Social Media",
            AppCategory::Games => "Games",
            AppCategory::Entertainment => "Entertainment",
            AppCategory::Shopping => "Shopping",
            AppCategory::News => "News",
            AppCategory::Messaging => "Messaging",
        }
    }
}

impl fmt::Display for AppCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for AppCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        AppCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown category '{s}'. Valid categories: {}",
                    AppCategory::ALL.map(|c| c.as_str()).join(", ")
                )
            })
    }
}

/// The user's selection of things to block during prayer windows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Blocklist {
    pub apps: Vec<String>,
    pub websites: Vec<String>,
    pub categories: Vec<AppCategory>,
}

impl Blocklist {
    pub fn item_count(&self) -> usize {
        self.apps.len() + self.websites.len() + self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Comma-separated lists for the `SALAHSHIELD_BLOCKED_*` variables.
    pub fn env_values(&self) -> (String, String, String) {
        (
            self.apps.join(","),
            self.websites.join(","),
            self.categories
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}
