// ABOUTME: Library half of the grove CLI: wiring, logging, prompting and terminal rendering
// ABOUTME: The binary in src/bin parses arguments and calls into these modules

pub mod context;
pub mod logging;
pub mod prompt;
pub mod render;

pub use context::GroveContext;
