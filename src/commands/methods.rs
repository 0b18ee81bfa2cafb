//! `methods`: list the calculation methods and their angles.

use anyhow::Result;

use crate::config::Config;
use crate::prayer::{CalculationMethod, IshaRule, method::recommended_for_timezone};

pub fn handle_methods_command() -> Result<()> {
    log_version!();

    // The listing works without a config; it only adds markers when one loads
    let config = Config::load().ok();
    let current = config.as_ref().and_then(|c| c.calculation_method().ok());
    let recommended = config
        .as_ref()
        .filter(|c| c.coordinate().is_some())
        .and_then(|c| c.resolve_timezone().ok())
        .and_then(|(tz, _)| recommended_for_timezone(tz.name()));

    log_block_start!("Calculation methods:");
    for method in CalculationMethod::ALL {
        let mut markers = Vec::new();
        if Some(method) == current {
            markers.push("current");
        }
        if Some(method) == recommended {
            markers.push("recommended here");
        }
        let suffix = if markers.is_empty() {
            String::new()
        } else {
            format!(" ({})", markers.join(", "))
        };

        log_decorated!("{:<12} {}{suffix}", method.as_str(), method.full_name());
        log_indented!("Used in: {}", method.region());
        log_indented!("{}", describe_angles(method));
    }

    log_block_start!("Choose one with: salahshield set method <name>");
    log_end!();
    Ok(())
}

fn describe_angles(method: CalculationMethod) -> String {
    let params = method.parameters();
    let isha = match params.isha {
        IshaRule::Angle(angle) => format!("Isha {angle}°"),
        IshaRule::Interval(minutes) => format!("Isha {minutes} min after Maghrib"),
    };
    format!("Fajr {}°, {isha}", params.fajr_angle)
}
