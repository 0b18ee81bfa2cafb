//! Default config generation and in-place edits.
//!
//! Edits rewrite single lines and keep the user's comments and alignment,
//! so `salahshield set` never reformats a hand-maintained file.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::prayer::PrayerKind;

/// Write a commented default configuration to `path`.
///
/// The location is left commented out: until the user sets it the daemon
/// runs without blocking and says so.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let mut builder = ConfigBuilder::new()
        .add_section("Location")
        .add_commented_setting("latitude", "21.422500", "Degrees north (-90 to 90)")
        .add_commented_setting("longitude", "39.826200", "Degrees east (-180 to 180)")
        .add_commented_setting("city", "\"Makkah\"", "Display name for the location")
        .add_commented_setting(
            "timezone",
            "\"Asia/Riyadh\"",
            "IANA zone; derived from coordinates when unset",
        )
        .add_section("Calculation")
        .add_setting(
            "method",
            &format!("\"{DEFAULT_METHOD}\""),
            "mwl, isna, egyptian, umm_al_qura, karachi, tehran, jafari",
        )
        .add_setting(
            "method_source",
            &format!("\"{DEFAULT_METHOD_SOURCE}\""),
            "unset lets salahshield recommend a method for your location",
        )
        .add_setting(
            "asr_madhab",
            &format!("\"{DEFAULT_ASR_MADHAB}\""),
            "shafi or hanafi",
        )
        .add_section("Prayer windows");

    for kind in PrayerKind::ALL {
        let key = kind.config_key();
        let name = kind.name();
        builder = builder
            .add_setting(
                &format!("{key}_buffer_before"),
                &DEFAULT_BUFFER_BEFORE.to_string(),
                &format!(
                    "Minutes to block before {name} ({MINIMUM_BUFFER_BEFORE}-{MAXIMUM_BUFFER_BEFORE})"
                ),
            )
            .add_setting(
                &format!("{key}_buffer_after"),
                &DEFAULT_BUFFER_AFTER.to_string(),
                &format!(
                    "Minutes to block after {name} ({MINIMUM_BUFFER_AFTER}-{MAXIMUM_BUFFER_AFTER})"
                ),
            )
            .add_setting(
                &format!("{key}_enabled"),
                &DEFAULT_PRAYER_ENABLED.to_string(),
                &format!("Block during {name}"),
            );
    }

    let content = builder
        .add_section("Shield")
        .add_setting(
            "shield",
            &format!("\"{DEFAULT_SHIELD}\""),
            "\"log\" or \"command\"",
        )
        .add_commented_setting(
            "start_command",
            "\"~/.local/bin/block-distractions\"",
            "Run when a window opens (shield = \"command\")",
        )
        .add_commented_setting(
            "stop_command",
            "\"~/.local/bin/unblock-distractions\"",
            "Run when a window closes",
        )
        .add_setting("paused", &DEFAULT_PAUSED.to_string(), "Suspend all blocking")
        .add_setting("blocked_apps", "[]", "Exported as SALAHSHIELD_BLOCKED_APPS")
        .add_setting(
            "blocked_websites",
            "[]",
            "Exported as SALAHSHIELD_BLOCKED_WEBSITES",
        )
        .add_setting(
            "blocked_categories",
            "[]",
            "social_media, games, entertainment, shopping, news, messaging",
        )
        .add_section("Scheduler")
        .add_setting(
            "check_interval",
            &DEFAULT_CHECK_INTERVAL.to_string(),
            &format!(
                "Seconds between blocking checks ({MINIMUM_CHECK_INTERVAL}-{MAXIMUM_CHECK_INTERVAL})"
            ),
        )
        .add_setting(
            "rollover_interval",
            &DEFAULT_ROLLOVER_INTERVAL.to_string(),
            &format!(
                "Seconds between date change checks ({MINIMUM_ROLLOVER_INTERVAL}-{MAXIMUM_ROLLOVER_INTERVAL})"
            ),
        )
        .build();

    fs::write(path, content)
        .with_context(|| format!("Failed to write config to {}", private_path(path)))?;

    log_block_start!("Created default config at {}", private_path(path));
    Ok(())
}

/// Set `key` to the TOML literal `value` in the file at `path`.
///
/// Replaces the existing line (or its commented-out template) keeping the
/// comment column, or appends a new line.
pub fn update_config_value(path: &Path, key: &str, value: &str) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;
    let updated = set_value_in_content(&content, key, value);
    fs::write(path, updated)
        .with_context(|| format!("Failed to write config to {}", private_path(path)))
}

/// Set latitude, longitude and optionally the city name in one write.
pub fn update_coordinates(
    path: &Path,
    latitude: f64,
    longitude: f64,
    city: Option<&str>,
) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let mut updated = set_value_in_content(&content, "latitude", &format!("{latitude:.6}"));
    updated = set_value_in_content(&updated, "longitude", &format!("{longitude:.6}"));
    if let Some(city) = city {
        updated = set_value_in_content(&updated, "city", &toml_string(city));
    }

    fs::write(path, updated)
        .with_context(|| format!("Failed to write config to {}", private_path(path)))
}

/// Quote a string as a TOML basic string.
pub fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

pub(crate) fn set_value_in_content(content: &str, key: &str, value: &str) -> String {
    let target = find_config_line(content, key).or_else(|| find_commented_line(content, key));

    match target {
        Some(line) => {
            let replacement = preserve_comment_formatting(&line, key, value);
            let index = content.lines().position(|l| l == line);
            content
                .lines()
                .enumerate()
                .map(|(i, l)| if Some(i) == index { replacement.as_str() } else { l })
                .collect::<Vec<_>>()
                .join("\n")
                + if content.ends_with('\n') { "\n" } else { "" }
        }
        None => {
            let mut updated = content.to_string();
            if !updated.is_empty() && !updated.ends_with('\n') {
                updated.push('\n');
            }
            updated.push_str(&format!("{key} = {value}\n"));
            updated
        }
    }
}

fn line_key(line: &str) -> Option<&str> {
    line.split_once('=').map(|(key, _)| key.trim())
}

/// First active (uncommented) line assigning `key`.
pub(crate) fn find_config_line(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .find(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with('#') && line_key(trimmed) == Some(key)
        })
        .map(str::to_string)
}

/// A `#key = value` template line left by the default config.
fn find_commented_line(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .find(|line| {
            line.trim()
                .strip_prefix('#')
                .filter(|rest| !rest.starts_with('['))
                .and_then(line_key)
                == Some(key)
        })
        .map(str::to_string)
}

/// Rebuild `key = new_value`, keeping the comment and its column.
pub(crate) fn preserve_comment_formatting(original_line: &str, key: &str, new_value: &str) -> String {
    let key_value = format!("{key} = {new_value}");

    // Skip a leading '#' of a commented template when looking for the comment
    let search_from = original_line
        .find(|c: char| !c.is_whitespace() && c != '#')
        .unwrap_or(0);
    let Some(offset) = original_line[search_from..].find(" #") else {
        return key_value;
    };
    let comment_pos = search_from + offset + 1;
    let comment = &original_line[comment_pos..];

    let padding = comment_pos.saturating_sub(key_value.len()).max(1);
    format!("{key_value}{}{comment}", " ".repeat(padding))
}

/// Builds a config file with every comment aligned to one column.
struct ConfigBuilder {
    entries: Vec<Entry>,
}

enum Entry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(Entry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(Entry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn add_commented_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(Entry::Setting {
            line: format!("#{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Setting { line, .. } => Some(line.len()),
                Entry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut lines = Vec::new();
        for entry in self.entries {
            match entry {
                Entry::Section(title) => {
                    if !lines.is_empty() {
                        lines.push(String::new());
                    }
                    lines.push(title);
                }
                Entry::Setting { line, comment } => {
                    lines.push(format!("{line:<width$}{comment}"));
                }
            }
        }
        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_config_line_matches_whole_key() {
        let content = "asr_madhab = \"shafi\"\nasr_buffer_before = 5\n";
        assert_eq!(find_config_line(content, "asr"), None);
        assert_eq!(
            find_config_line(content, "asr_buffer_before").as_deref(),
            Some("asr_buffer_before = 5")
        );
    }

    #[test]
    fn test_preserve_comment_column() {
        let line = "method = \"mwl\"          # which method";
        let updated = preserve_comment_formatting(line, "method", "\"isna\"");
        assert_eq!(updated, "method = \"isna\"         # which method");
        assert_eq!(updated.find('#'), line.find('#'));
    }

    #[test]
    fn test_commented_template_is_activated() {
        let content = "#[Location]\n#latitude = 21.4225   # Degrees north\n";
        let updated = set_value_in_content(content, "latitude", "45.421500");
        assert_eq!(updated, "#[Location]\nlatitude = 45.421500  # Degrees north\n");
    }

    #[test]
    fn test_only_first_identical_line_is_replaced() {
        let content = "#latitude = 0.0\n#latitude = 0.0\n";
        let updated = set_value_in_content(content, "latitude", "45.421500");
        assert_eq!(updated, "latitude = 45.421500\n#latitude = 0.0\n");
    }

    #[test]
    fn test_missing_key_is_appended() {
        let updated = set_value_in_content("paused = false", "city", "\"Ottawa\"");
        assert_eq!(updated, "paused = false\ncity = \"Ottawa\"\n");
    }

    #[test]
    fn test_toml_string_round_trips() {
        let name = "Saint-Jean \"Centre\"";
        let parsed: toml::Value = toml::from_str(&format!("city = {}", toml_string(name))).unwrap();
        assert_eq!(parsed["city"].as_str(), Some(name));
    }
}
