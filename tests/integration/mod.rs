//! Integration tests driving the engine end to end through its public API.

mod bundled_rules;
mod correction_loop;
mod registration;
mod runner;
