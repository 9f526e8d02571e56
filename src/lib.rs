// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod answers;
pub mod api;
pub mod app;
pub mod config;
pub mod countdown;
pub mod gapfill;
pub mod paper;
pub mod relay;
pub mod runtime;
pub mod session;
pub mod ui;
