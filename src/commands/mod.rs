//! Command-line command handlers.
//!
//! Every one-shot command loads the configuration, does its work with the
//! same calculator the daemon uses, and prints through the logger. `run` and
//! `simulate` start the coordinator in [`crate::core`].

pub mod methods;
pub mod next;
pub mod qibla;
pub mod reload;
pub mod set;
pub mod simulate;
pub mod status;
pub mod times;

use anyhow::Result;
use chrono::NaiveDate;

use crate::config::Config;
use crate::prayer::CalculationRequest;
use crate::time_source;

/// Load the config and the calculation inputs it describes.
///
/// `Ok(None)` means no location is configured; the caller reports it.
pub(crate) fn load_request() -> Result<(Config, Option<CalculationRequest>)> {
    let config = Config::load()?;
    let request = config.calculation_request()?;
    Ok((config, request))
}

/// Today's date in the request's zone, from the active time source.
pub(crate) fn today_for(request: &CalculationRequest) -> NaiveDate {
    time_source::now()
        .with_timezone(&request.timezone)
        .date_naive()
}

pub(crate) fn log_missing_location() {
    log_pipe!();
    log_warning!("No location configured");
    log_indented!("Set one with: salahshield set latitude <lat> longitude <lon>");
    log_indented!("Optionally name it: salahshield set city \"<name>\"");
}
