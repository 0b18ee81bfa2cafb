//! Shared infrastructure used by every other module: logging macros,
//! defaults and limits, and small helpers.

// Declared first so the logging macros are in scope for the siblings
#[macro_use]
pub mod logger;

pub mod constants;
pub mod utils;
