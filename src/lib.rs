pub mod config;
pub mod json_format;
pub mod logging;
pub mod matrix;
pub mod version;
