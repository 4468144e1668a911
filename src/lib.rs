pub mod commands;
pub mod config;
pub mod logging;
pub mod repl;
pub mod sink;
