use std::path::PathBuf;

pub mod commands;
pub mod notify;

/// Environment variable overriding the output directory
pub const OUTPUT_DIR_ENV: &str = "FLIGHTSCOUT_OUTPUT_DIR";

/// `~/.flightscout`, where runs, screenshots and reports are kept
pub fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".flightscout")
}

pub fn output_dir(arg: Option<PathBuf>) -> PathBuf {
    arg.unwrap_or_else(default_output_dir)
}
