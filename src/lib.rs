pub mod cli;
pub mod monitor;
pub mod scoring;
pub mod settings;
pub mod utils;
