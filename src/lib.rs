//! # salahshield
//!
//! Prayer-time aware distraction shielding.
//!
//! The library backs the `salahshield` binary and keeps its internals
//! testable. It is organized in layers:
//!
//! - **Calculation**: [`prayer`] turns a location, date and method into a
//!   [`prayer::DailyPrayerSet`]; [`qibla`] gives the direction to the Kaaba.
//! - **Scheduling**: [`schedule`] answers "block now?" and "what is next?"
//!   for a set and a moment in time.
//! - **Coordination**: [`core`] runs the daemon loop, recalculating on
//!   reloads and at day rollover, and drives a [`shield::Shield`].
//! - **Interface**: [`args`] and [`commands`] for the CLI, [`config`] for the
//!   TOML file with hot reload.
//! - **Infrastructure**: [`common`] (logging, constants, helpers), [`io`]
//!   (instance lock, signals) and [`time_source`] (real or simulated clock).

// Declared first so the logging macros are visible to every module below
#[macro_use]
pub mod common;

pub mod args;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod prayer;
pub mod qibla;
pub mod schedule;
pub mod shield;
pub mod time_source;

mod salahshield;

pub use salahshield::Salahshield;
