// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "table/mod.rs"]
pub mod table;

#[path = "indicators/mod.rs"]
pub mod indicators;
