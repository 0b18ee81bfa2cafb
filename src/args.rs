//! Command-line argument parsing.
//!
//! Global flags (`--debug`, `--config`, `--help`, `--version`) may appear
//! anywhere; the first remaining word selects the command. Anything the
//! parser cannot make sense of turns into [`CliAction::ShowHelpDueToError`]
//! after a warning that names the problem.

/// What the invocation asks salahshield to do.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the blocking daemon (the default).
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Print the day's prayer times and windows.
    Times {
        debug_enabled: bool,
        config_dir: Option<String>,
        date: Option<String>,
    },
    /// Print the next prayer, rolling over to tomorrow's Fajr.
    Next {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    Status {
        debug_enabled: bool,
        config_dir: Option<String>,
        json: bool,
    },
    Qibla {
        debug_enabled: bool,
        config_dir: Option<String>,
        heading: Option<f64>,
    },
    /// List the calculation methods.
    Methods,
    /// Update configuration field(s).
    Set {
        debug_enabled: bool,
        fields: Vec<(String, String)>,
        config_dir: Option<String>,
    },
    /// Ask a running daemon to reload its configuration.
    Reload {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Run the daemon against a simulated clock.
    Simulate {
        debug_enabled: bool,
        start_time: String,
        end_time: String,
        multiplier: f64, // 0 = fast-forward
        log_to_file: bool,
        config_dir: Option<String>,
    },
    ShowHelp,
    ShowVersion,
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

/// Flags shared by every command.
struct GlobalFlags {
    debug_enabled: bool,
    config_dir: Option<String>,
}

impl ParsedArgs {
    /// Parse arguments, including the program name in first position.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut debug_enabled = false;
        let mut config_dir: Option<String> = None;
        let mut display_help = false;
        let mut display_version = false;
        let mut invalid = false;
        let mut rest: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args_vec.len() {
            match args_vec[i].as_str() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--config" | "-c" => {
                    if i + 1 < args_vec.len() && !args_vec[i + 1].starts_with('-') {
                        config_dir = Some(args_vec[i + 1].clone());
                        i += 1;
                    } else {
                        log_warning!("Missing directory for --config. Usage: --config <directory>");
                        invalid = true;
                    }
                }
                other => rest.push(other.to_string()),
            }
            i += 1;
        }

        // Version and help win over everything else
        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help {
            CliAction::ShowHelp
        } else if invalid {
            CliAction::ShowHelpDueToError
        } else {
            let globals = GlobalFlags {
                debug_enabled,
                config_dir,
            };
            match parse_command(&rest, globals) {
                Ok(action) => action,
                Err(message) => {
                    log_warning!("{message}");
                    CliAction::ShowHelpDueToError
                }
            }
        };

        ParsedArgs { action }
    }

    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

fn parse_command(rest: &[String], globals: GlobalFlags) -> Result<CliAction, String> {
    let GlobalFlags {
        debug_enabled,
        config_dir,
    } = globals;

    let Some((command, params)) = rest.split_first() else {
        return Ok(CliAction::Run {
            debug_enabled,
            config_dir,
        });
    };

    match command.as_str() {
        "run" => {
            expect_no_params(command, params)?;
            Ok(CliAction::Run {
                debug_enabled,
                config_dir,
            })
        }
        "times" | "t" => {
            let mut date = None;
            let mut iter = params.iter();
            while let Some(param) = iter.next() {
                match param.as_str() {
                    "--date" => {
                        let value = iter
                            .next()
                            .ok_or("Missing value for --date. Usage: salahshield times --date YYYY-MM-DD")?;
                        if !looks_like_date(value) {
                            return Err(format!("Invalid date '{value}'. Use YYYY-MM-DD"));
                        }
                        date = Some(value.clone());
                    }
                    other => return Err(unexpected(command, other)),
                }
            }
            Ok(CliAction::Times {
                debug_enabled,
                config_dir,
                date,
            })
        }
        "next" | "n" => {
            expect_no_params(command, params)?;
            Ok(CliAction::Next {
                debug_enabled,
                config_dir,
            })
        }
        "status" => {
            let mut json = false;
            for param in params {
                match param.as_str() {
                    "--json" => json = true,
                    other => return Err(unexpected(command, other)),
                }
            }
            Ok(CliAction::Status {
                debug_enabled,
                config_dir,
                json,
            })
        }
        "qibla" | "q" => {
            let mut heading = None;
            let mut iter = params.iter();
            while let Some(param) = iter.next() {
                match param.as_str() {
                    "--heading" => {
                        let value = iter.next().ok_or(
                            "Missing value for --heading. Usage: salahshield qibla --heading <degrees>",
                        )?;
                        let degrees = value
                            .parse::<f64>()
                            .ok()
                            .filter(|d| d.is_finite())
                            .ok_or_else(|| format!("Invalid heading '{value}'. Use degrees, e.g. 90"))?;
                        heading = Some(degrees);
                    }
                    other => return Err(unexpected(command, other)),
                }
            }
            Ok(CliAction::Qibla {
                debug_enabled,
                config_dir,
                heading,
            })
        }
        "methods" | "m" => {
            expect_no_params(command, params)?;
            Ok(CliAction::Methods)
        }
        "set" | "s" => {
            if params.is_empty() || params.len() % 2 != 0 {
                return Err(
                    "Missing field or value. Usage: salahshield set <field> <value> [<field> <value>...]"
                        .to_string(),
                );
            }
            let fields = params
                .chunks(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect();
            Ok(CliAction::Set {
                debug_enabled,
                fields,
                config_dir,
            })
        }
        "reload" | "r" => {
            expect_no_params(command, params)?;
            Ok(CliAction::Reload {
                debug_enabled,
                config_dir,
            })
        }
        "simulate" => parse_simulate(params, debug_enabled, config_dir),
        "help" => Ok(CliAction::ShowHelp),
        other => Err(format!("Unknown command: {other}")),
    }
}

/// `simulate <start> <end> [multiplier | --fast-forward] [--log]`
fn parse_simulate(
    params: &[String],
    debug_enabled: bool,
    config_dir: Option<String>,
) -> Result<CliAction, String> {
    const USAGE: &str = "Usage: salahshield simulate \"YYYY-MM-DD HH:MM:SS\" \"YYYY-MM-DD HH:MM:SS\" [multiplier | --fast-forward] [--log]";

    let [start, end, options @ ..] = params else {
        return Err(format!("Missing start or end time. {USAGE}"));
    };
    for (label, value) in [("start", start), ("end", end)] {
        if !looks_like_datetime(value) {
            return Err(format!(
                "Invalid {label} time format: '{value}'. Use YYYY-MM-DD HH:MM:SS"
            ));
        }
    }

    let mut multiplier = None;
    let mut log_to_file = false;
    for option in options {
        match option.as_str() {
            "--log" => log_to_file = true,
            "--fast-forward" if multiplier.is_none() => multiplier = Some(0.0),
            value if multiplier.is_none() => {
                let parsed = value
                    .parse::<f64>()
                    .map_err(|_| format!("Unexpected argument '{value}'. {USAGE}"))?;
                if parsed != 0.0 && !(0.1..=3600.0).contains(&parsed) {
                    return Err(format!(
                        "Invalid multiplier: {parsed}. Must be 0 (fast-forward) or between 0.1 and 3600."
                    ));
                }
                multiplier = Some(parsed);
            }
            other => return Err(format!("Unexpected argument '{other}'. {USAGE}")),
        }
    }

    Ok(CliAction::Simulate {
        debug_enabled,
        start_time: start.clone(),
        end_time: end.clone(),
        multiplier: multiplier.unwrap_or(3600.0),
        log_to_file,
        config_dir,
    })
}

fn expect_no_params(command: &str, params: &[String]) -> Result<(), String> {
    match params.first() {
        Some(extra) => Err(unexpected(command, extra)),
        None => Ok(()),
    }
}

fn unexpected(command: &str, arg: &str) -> String {
    if arg.starts_with('-') {
        format!("Unknown option for {command}: {arg}")
    } else {
        format!("Unexpected argument for {command}: {arg}")
    }
}

// Shape checks only; the commands parse the values properly
fn looks_like_date(s: &str) -> bool {
    s.len() == 10
        && s.char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() })
}

fn looks_like_datetime(s: &str) -> bool {
    s.len() == 19
        && looks_like_date(&s[..10])
        && s.as_bytes()[10] == b' '
        && s[11..]
            .char_indices()
            .all(|(i, c)| if i == 2 || i == 5 { c == ':' } else { c.is_ascii_digit() })
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    crate::common::logger::write_output(&format!("┗ {}\n", env!("CARGO_PKG_DESCRIPTION")));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("salahshield [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("run                    Run the blocking daemon (default)");
    log_indented!("times, t [--date D]    Show prayer times for today or YYYY-MM-DD");
    log_indented!("next, n                Show the next prayer");
    log_indented!("status [--json]        Show whether blocking is active");
    log_indented!("qibla, q [--heading H] Show the Qibla direction");
    log_indented!("methods, m             List calculation methods");
    log_indented!("set, s <field> <value> [...] Update configuration field(s)");
    log_indented!("reload, r              Reload the running daemon's configuration");
    log_indented!("simulate <start> <end> [multiplier | --fast-forward] [--log]");
    log_indented!("                       Run against simulated time");
    log_block_start!("Examples:");
    log_indented!("salahshield set latitude 45.4215 longitude -75.6972 city Ottawa");
    log_indented!("salahshield set method isna maghrib_buffer_after 20");
    log_end!();
}
