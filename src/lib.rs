pub mod config;
pub mod error;
pub mod football_extract;
pub mod football_rules;
pub mod football_state;
pub mod logging;
pub mod pipeline;
pub mod play;
pub mod rules;
pub mod synthetic;
pub mod volleyball_extract;
pub mod volleyball_rules;
pub mod volleyball_state;
pub mod yardline;
