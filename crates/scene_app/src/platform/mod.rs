pub mod app;
pub mod config;
mod effects;
mod logging;
mod persistence;
mod prompt;
mod render;
