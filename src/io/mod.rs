// External I/O: process lock and signals
pub mod lock; // Single-instance lock file
pub mod signals; // Unix signal handling
