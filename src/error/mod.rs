//! Error handling for the network autopsy engine

use thiserror::Error;

/// Error taxonomy for diagnostic runs
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed user input (target domains, service specs)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network-level probe failures
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Malformed external diagnostic text or values
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Saving the report failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The platform diagnostic layer could not be queried
    #[error("Platform unavailable: {0}")]
    PlatformUnavailable(String),

    /// A run was requested while another one is still in flight
    #[error("A diagnostic run is already in progress")]
    RunInProgress,

    /// The run was cancelled by the caller
    #[error("Diagnostic run cancelled")]
    Cancelled,

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new persistence error
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence(message.into())
    }

    /// Create a new platform error
    pub fn platform_unavailable<S: Into<String>>(message: S) -> Self {
        Self::PlatformUnavailable(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Network(_) => "NETWORK",
            Self::Timeout(_) => "TIMEOUT",
            Self::Parse(_) => "PARSE",
            Self::Persistence(_) => "IO",
            Self::PlatformUnavailable(_) => "PLATFORM",
            Self::RunInProgress => "BUSY",
            Self::Cancelled => "CANCELLED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is recoverable (the operation can simply be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RunInProgress | Self::Cancelled => true,
            Self::PlatformUnavailable(_) | Self::Persistence(_) => true,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file or command line arguments.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Domains must look like 'example.com'; services like 'wireguard@vpn.example.com:51820'.", msg)
            }
            Self::Network(msg) => {
                format!("Network connectivity issue: {}\n\nSuggestion: Check your internet connection and try again.", msg)
            }
            Self::Timeout(msg) => {
                format!("Request timed out: {}\n\nSuggestion: Increase --timeout or --run-timeout.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: The platform report may be truncated or from an unsupported tool version.", msg)
            }
            Self::Persistence(msg) => {
                format!("Could not save the report: {}\n\nSuggestion: Check permissions and free space in the report directory.", msg)
            }
            Self::PlatformUnavailable(msg) => {
                format!("Platform diagnostics unavailable: {}\n\nSuggestion: Pass a readable file with --platform-report.", msg)
            }
            Self::RunInProgress => {
                "A diagnostic run is already in progress.\n\nSuggestion: Wait for it to finish before starting another one.".to_string()
            }
            Self::Cancelled => {
                "The diagnostic run was cancelled before it finished.".to_string()
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Network(_) | Self::PlatformUnavailable(_) => 2,
            Self::Timeout(_) => 3,
            Self::RunInProgress | Self::Cancelled => 4,
            Self::Persistence(_) => 5,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Network(_) | Self::PlatformUnavailable(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) | Self::RunInProgress | Self::Cancelled => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Persistence(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::persistence(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_connect() || error.is_request() {
            Self::network(error.to_string())
        } else {
            Self::internal(format!("HTTP client error: {}", error))
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for user feedback from the binary
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());

            if error.is_recoverable() {
                eprintln!();
                if self.use_color {
                    use colored::Colorize;
                    eprintln!("{}", "This error might be temporary. You can try running the command again.".green());
                } else {
                    eprintln!("This error might be temporary. You can try running the command again.");
                }
            }
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(!config_error.is_recoverable());
        assert_eq!(config_error.exit_code(), 1);

        let network_error = AppError::network("Connection failed");
        assert_eq!(network_error.category(), "NETWORK");
        assert!(network_error.is_recoverable());
        assert_eq!(network_error.exit_code(), 2);
    }

    #[test]
    fn test_error_categories() {
        let errors = [
            AppError::config("config"),
            AppError::validation("validation"),
            AppError::network("network"),
            AppError::timeout("timeout"),
            AppError::parse("parse"),
            AppError::persistence("io"),
            AppError::platform_unavailable("platform"),
            AppError::RunInProgress,
            AppError::Cancelled,
            AppError::internal("internal"),
        ];

        let expected_categories = [
            "CONFIG", "VALIDATION", "NETWORK", "TIMEOUT", "PARSE",
            "IO", "PLATFORM", "BUSY", "CANCELLED", "INTERNAL",
        ];

        for (error, expected) in errors.iter().zip(expected_categories.iter()) {
            assert_eq!(error.category(), *expected);
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::validation("test").exit_code(), 1);
        assert_eq!(AppError::platform_unavailable("test").exit_code(), 2);
        assert_eq!(AppError::timeout("test").exit_code(), 3);
        assert_eq!(AppError::RunInProgress.exit_code(), 4);
        assert_eq!(AppError::persistence("test").exit_code(), 5);
        assert_eq!(AppError::internal("test").exit_code(), 99);
    }

    #[test]
    fn test_user_friendly_messages() {
        let error = AppError::validation("'localhost' is not a domain");
        let message = error.user_friendly_message();
        assert!(message.contains("Invalid input"));
        assert!(message.contains("Suggestion:"));
        assert!(message.contains("localhost"));
    }

    #[test]
    fn test_io_error_maps_to_persistence() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let app_error: AppError = io_error.into();
        assert!(matches!(app_error, AppError::Persistence(_)));
        assert_eq!(app_error.category(), "IO");
    }

    #[test]
    fn test_numeric_parse_conversions() {
        let parse_error = "not_a_number".parse::<i32>().unwrap_err();
        let app_error: AppError = parse_error.into();
        assert_eq!(app_error.category(), "PARSE");

        let float_error = "12,5".parse::<f64>().unwrap_err();
        let app_error: AppError = float_error.into();
        assert!(app_error.to_string().contains("Float parse error"));
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::validation("Test error");
        let formatted_no_color = error.format_for_console(false);
        let formatted_color = error.format_for_console(true);

        assert_eq!(formatted_no_color, "[VALIDATION] Validation error: Test error");
        assert!(formatted_color.contains("VALIDATION"));
        assert!(formatted_color.contains("Test error"));
    }

    #[test]
    fn test_dotenv_error_conversion() {
        let dotenv_error = dotenv::Error::LineParse(".env".to_string(), 1);
        let app_error: AppError = dotenv_error.into();
        assert_eq!(app_error.category(), "CONFIG");
        assert!(app_error.to_string().contains("Environment file error"));
    }

    #[test]
    fn test_error_reporter_default() {
        let reporter = ErrorReporter::default();
        assert!(reporter.use_color);
        assert!(!reporter.verbose);
        reporter.report_error(&AppError::RunInProgress);
    }
}
