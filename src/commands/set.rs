//! `set`: update configuration fields from the command line.
//!
//! Values are converted to TOML, applied to the file text with the same
//! line-preserving editor the default config uses, and the result is
//! validated as a whole before anything is written. A running daemon picks
//! the change up through its file watcher.

use anyhow::{Context, Result, bail};
use std::fs;

use crate::common::utils::private_path;
use crate::config::builder::{set_value_in_content, toml_string};
use crate::config::validation::validate_config;
use crate::config::{Config, create_default_config};
use crate::io::lock::read_running_pid;
use crate::prayer::{AsrMadhab, CalculationMethod, MethodSource, PrayerKind};

#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldKind {
    Number,
    Integer,
    Bool,
    Text,
    List,
}

pub fn handle_set_command(fields: &[(String, String)]) -> Result<()> {
    log_version!();

    let config_path = Config::get_config_path()?;
    if !config_path.exists() {
        create_default_config(&config_path)?;
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config from {}", private_path(&config_path)))?;

    let (updated, applied) = match apply_fields(&content, fields) {
        Ok(result) => result,
        Err(e) => {
            log_pipe!();
            log_error!("{e:#}");
            log_indented!("Nothing was written");
            bail!("Configuration validation failed");
        }
    };

    if updated == content {
        log_block_start!("Configuration unchanged");
        log_indented!("All fields already have the specified values");
        log_end!();
        return Ok(());
    }

    fs::write(&config_path, &updated)
        .with_context(|| format!("Failed to write config to {}", private_path(&config_path)))?;

    log_block_start!("Updated configuration");
    for (field, literal) in &applied {
        log_indented!("{field} = {literal}");
    }
    log_indented!("in {}", private_path(&config_path));

    match read_running_pid() {
        Some(pid) => log_block_start!("salahshield (PID {pid}) will reload automatically"),
        None => log_block_start!("Start salahshield to apply the new configuration"),
    }

    log_end!();
    Ok(())
}

/// Apply every field to `content` and validate the result.
///
/// Returns the new text and the `(field, literal)` pairs written. Choosing a
/// method by hand also marks it as user-chosen so it is never auto-replaced.
pub(crate) fn apply_fields(
    content: &str,
    fields: &[(String, String)],
) -> Result<(String, Vec<(String, String)>)> {
    let mut updated = content.to_string();
    let mut applied = Vec::new();

    for (field, value) in fields {
        let literal = toml_literal(field, value)
            .with_context(|| format!("Invalid value for field '{field}'"))?;
        updated = set_value_in_content(&updated, field, &literal);
        applied.push((field.clone(), literal));
    }

    let sets_method = fields.iter().any(|(field, _)| field == "method");
    let sets_source = fields.iter().any(|(field, _)| field == "method_source");
    if sets_method && !sets_source {
        let literal = toml_string(MethodSource::User.as_str());
        updated = set_value_in_content(&updated, "method_source", &literal);
        applied.push(("method_source".to_string(), literal));
    }

    let config: Config = toml::from_str(&updated).context("Resulting configuration is not valid TOML")?;
    validate_config(&config)?;

    Ok((updated, applied))
}

fn field_kind(field: &str) -> Option<FieldKind> {
    let kind = match field {
        "latitude" | "longitude" => FieldKind::Number,
        "city" | "timezone" | "method" | "method_source" | "asr_madhab" | "shield"
        | "start_command" | "stop_command" => FieldKind::Text,
        "paused" => FieldKind::Bool,
        "check_interval" | "rollover_interval" => FieldKind::Integer,
        "blocked_apps" | "blocked_websites" | "blocked_categories" => FieldKind::List,
        _ => return per_prayer_kind(field),
    };
    Some(kind)
}

fn per_prayer_kind(field: &str) -> Option<FieldKind> {
    let (prefix, suffix) = field.split_once('_')?;
    if !PrayerKind::ALL.iter().any(|kind| kind.config_key() == prefix) {
        return None;
    }
    match suffix {
        "buffer_before" | "buffer_after" => Some(FieldKind::Integer),
        "enabled" => Some(FieldKind::Bool),
        _ => None,
    }
}

/// Convert a command-line value into the TOML literal for `field`.
fn toml_literal(field: &str, value: &str) -> Result<String> {
    let Some(kind) = field_kind(field) else {
        bail!("Unknown field. Run `salahshield help` for the list of settings");
    };
    let value = value.trim();

    let literal = match kind {
        FieldKind::Number => {
            let number: f64 = value.parse().with_context(|| format!("'{value}' is not a number"))?;
            format!("{number:.6}")
        }
        FieldKind::Integer => {
            let number: u64 = value
                .parse()
                .with_context(|| format!("'{value}' is not a whole number"))?;
            number.to_string()
        }
        FieldKind::Bool => match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => "true".to_string(),
            "false" | "no" | "off" | "0" => "false".to_string(),
            _ => bail!("'{value}' is not true or false"),
        },
        FieldKind::Text => {
            let text = unquote(value);
            // Store named values in their canonical spelling
            let canonical = match field {
                "method" => text.parse::<CalculationMethod>()?.as_str().to_string(),
                "asr_madhab" => text.parse::<AsrMadhab>()?.as_str().to_string(),
                "method_source" => text.parse::<MethodSource>()?.as_str().to_string(),
                _ => text.to_string(),
            };
            toml_string(&canonical)
        }
        FieldKind::List => {
            let items: Vec<toml::Value> = unquote(value)
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty() && *item != "none")
                .map(|item| toml::Value::String(item.to_string()))
                .collect();
            toml::Value::Array(items).to_string()
        }
    };
    Ok(literal)
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)))
        .unwrap_or(value)
}
