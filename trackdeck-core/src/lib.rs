pub mod config;
pub mod logs;
pub mod model;
pub mod reducer;
pub mod state;
pub mod tracker;

// Operator commands from the dashboard UI
pub mod command;

// Event producers and the single-writer pump
pub mod bridge;
