mod demo;
mod script;

pub use demo::DemoBridge;
pub use script::{ScriptBridge, ScriptError};
