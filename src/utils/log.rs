use colored::Colorize;

//Log utils
#[derive(PartialEq, PartialOrd, Debug, Clone, Copy)]
/// This enum is used to represent the different log levels
pub enum LogLevel {
    Debug,
    Info,
    Log,
    Warn,
    Error,
}

impl LogLevel {
    fn from_env() -> LogLevel {
        match std::env::var("INSTALLER_CPP_LOG_LEVEL").as_deref() {
            Ok("Debug") => LogLevel::Debug,
            Ok("Info") => LogLevel::Info,
            Ok("Log") => LogLevel::Log,
            Ok("Warn") => LogLevel::Warn,
            Ok("Error") => LogLevel::Error,
            _ => LogLevel::Log,
        }
    }
}

/// This function is used to log messages to the console
/// # Arguments
/// * `level` - The log level of the message
/// * `message` - The message to log
/// # Example
/// ```
/// use installer_cpp::utils::{log, LogLevel};
/// log(LogLevel::Info, "Staging headers");
/// log(LogLevel::Error, &format!("Something went wrong! {}", 42));
/// ```
///
/// # Level setting
/// The log level can be set by setting the environment variable `INSTALLER_CPP_LOG_LEVEL`
/// to one of the following values:
/// * `Debug`
/// * `Info`
/// * `Log`
/// * `Warn`
/// * `Error`
/// If the environment variable is not set, the default log level is `Log`
pub fn log(level: LogLevel, message: &str) {
    if !enabled(level, LogLevel::from_env()) {
        return;
    }
    let level_str = match level {
        LogLevel::Debug => "[DEBUG]".purple(),
        LogLevel::Info => "[INFO]".blue(),
        LogLevel::Log => "[LOG]".green(),
        LogLevel::Warn => "[WARN]".yellow(),
        LogLevel::Error => "[ERROR]".red(),
    };
    if level >= LogLevel::Warn {
        eprintln!("{} {}", level_str, message);
    } else {
        println!("{} {}", level_str, message);
    }
}

// Debug mode shows debug output plus warnings and errors, nothing in between
fn enabled(level: LogLevel, threshold: LogLevel) -> bool {
    if threshold == LogLevel::Debug {
        level == LogLevel::Debug || level >= LogLevel::Warn
    } else {
        level >= threshold
    }
}
