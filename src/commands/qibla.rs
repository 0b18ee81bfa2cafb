//! `qibla`: direction and distance to the Kaaba from the configured location.

use anyhow::Result;

use crate::config::Config;
use crate::qibla::QiblaDirection;

pub fn handle_qibla_command(heading: Option<f64>) -> Result<()> {
    log_version!();

    let config = Config::load()?;
    let Some(coordinate) = config.coordinate() else {
        super::log_missing_location();
        log_end!();
        return Ok(());
    };

    let qibla = QiblaDirection::from_coordinate(coordinate);
    match &config.city {
        Some(city) => log_block_start!("Qibla from {city} ({coordinate})"),
        None => log_block_start!("Qibla from {coordinate}"),
    }
    log_indented!("Bearing: {qibla} from true north");
    log_indented!("Distance: {:.0} km", qibla.distance_km);

    if let Some(heading) = heading {
        log_indented!("{}", turn_instruction(qibla.relative_to_heading(heading)));
    }

    log_end!();
    Ok(())
}

/// Human wording for a relative angle in [0, 360).
fn turn_instruction(relative: f64) -> String {
    if relative < 0.5 || relative > 359.5 {
        "You are facing the Qibla".to_string()
    } else if relative <= 180.0 {
        format!("Turn {relative:.0}° to the right")
    } else {
        format!("Turn {:.0}° to the left", 360.0 - relative)
    }
}
