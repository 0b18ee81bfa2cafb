//! Entry point: parse arguments and dispatch to the daemon or a command.

use salahshield::args::{self, CliAction, ParsedArgs};
use salahshield::common::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use salahshield::{Salahshield, commands, config, log_error_exit};

fn main() {
    let parsed_args = ParsedArgs::from_env();

    let code = match dispatch(parsed_args.action) {
        Ok(code) => code,
        Err(e) => {
            log_error_exit!("{e:#}");
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

fn dispatch(action: CliAction) -> anyhow::Result<i32> {
    match action {
        CliAction::ShowVersion => args::display_version_info(),
        CliAction::ShowHelp => args::display_help(),
        CliAction::ShowHelpDueToError => {
            args::display_help();
            return Ok(EXIT_FAILURE);
        }
        CliAction::Methods => commands::methods::handle_methods_command()?,
        CliAction::Run {
            debug_enabled,
            config_dir,
        } => {
            config::set_config_dir(config_dir)?;
            Salahshield::new(debug_enabled).run()?;
        }
        CliAction::Times {
            debug_enabled,
            config_dir,
            date,
        } => {
            config::set_config_dir(config_dir)?;
            commands::times::handle_times_command(date.as_deref(), debug_enabled)?;
        }
        CliAction::Next { config_dir, .. } => {
            config::set_config_dir(config_dir)?;
            commands::next::handle_next_command()?;
        }
        CliAction::Status {
            config_dir, json, ..
        } => {
            config::set_config_dir(config_dir)?;
            commands::status::handle_status_command(json)?;
        }
        CliAction::Qibla {
            config_dir,
            heading,
            ..
        } => {
            config::set_config_dir(config_dir)?;
            commands::qibla::handle_qibla_command(heading)?;
        }
        CliAction::Set {
            fields, config_dir, ..
        } => {
            config::set_config_dir(config_dir)?;
            commands::set::handle_set_command(&fields)?;
        }
        CliAction::Reload {
            debug_enabled,
            config_dir,
        } => {
            config::set_config_dir(config_dir)?;
            commands::reload::handle_reload_command(debug_enabled)?;
        }
        CliAction::Simulate {
            debug_enabled,
            start_time,
            end_time,
            multiplier,
            log_to_file,
            config_dir,
        } => {
            config::set_config_dir(config_dir)?;
            commands::simulate::handle_simulate_command(
                &start_time,
                &end_time,
                multiplier,
                log_to_file,
                debug_enabled,
            )?;
        }
    }
    Ok(EXIT_SUCCESS)
}
