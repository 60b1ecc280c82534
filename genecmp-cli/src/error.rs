//! Error handling for the GeneCmp CLI

use genecmp_core::{CompareError, ProviderError};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for GeneCmp CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input/Output error: {message}")]
    Io { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("Parsing error in {file} at line {line}: {message}")]
    Parse { file: String, line: usize, message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Comparison interrupted: {message}")]
    Interrupted { message: String },

    #[error("Resource error: {message}")]
    Resource { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        Self::InvalidFormat { message: message.into() }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn resource<S: Into<String>>(message: S) -> Self {
        Self::Resource { message: message.into() }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<ProviderError> for CliError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Io(e) => Self::io(e.to_string()),
            ProviderError::Parse { file, line, message } => Self::Parse { file, line, message },
            ProviderError::Record { file, record, message } => Self::invalid_format(format!(
                "alignment record {record} in {file}: {message}"
            )),
            ProviderError::UnsupportedFormat(path) => Self::invalid_format(format!(
                "cannot read samples from {} (expected .sam, .sam.gz or .bam)",
                path.display()
            )),
            ProviderError::InvalidRecord(e) => Self::validation(e.to_string()),
        }
    }
}

impl From<CompareError> for CliError {
    fn from(err: CompareError) -> Self {
        match err {
            CompareError::Validation(e) => Self::validation(e.to_string()),
            CompareError::Provider(e) => e.into(),
            CompareError::Interrupted(message) => Self::Interrupted { message },
            CompareError::Pool(message) => Self::resource(message),
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

fn suggestions(error: &CliError) -> Option<String> {
    let text = match error {
        CliError::FileNotFound { path } => format!(
            "• Check that the file path is correct: {}\n\
             • Ensure you have read permissions for the file\n\
             • Compressed SAM input must end in .sam.gz and BAM in .bam",
            path.display()
        ),
        CliError::InvalidFormat { .. } => "• Samples must be SAM (.sam or .sam.gz) or BAM (.bam)\n\
             • Convert CRAM input with `samtools view -b`\n\
             • Check that every record's CIGAR fits its sequence"
            .to_string(),
        CliError::Parse { .. } => "• Check the reported line of the input file\n\
             • Region files need tab-separated `chrom start end gene [motif]` columns\n\
             • Ensure the file is not corrupted or truncated"
            .to_string(),
        CliError::Config { .. } => "• Check your genecmp.toml configuration file\n\
             • Use 'genecmp config --example' to generate a sample configuration\n\
             • Verify that all configuration values are valid"
            .to_string(),
        CliError::Resource { .. } => "• Reduce the number of threads with --threads\n\
             • Free up system memory"
            .to_string(),
        _ => return None,
    };
    Some(text)
}

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();
    if let Some(text) = suggestions(error) {
        message.push_str("\n\nSuggestions:\n");
        message.push_str(&text);
    }
    message
}

/// Print an error chain, with suggestions when it carries a [`CliError`], and exit
pub fn print_error_and_exit(error: &anyhow::Error) -> ! {
    match error.downcast_ref::<CliError>() {
        Some(cli_error) if error.chain().count() == 1 => {
            eprintln!("Error: {}", format_error_with_suggestions(cli_error));
        }
        Some(cli_error) => {
            eprintln!("Error: {:#}", error);
            if let Some(text) = suggestions(cli_error) {
                eprintln!("\nSuggestions:\n{}", text);
            }
        }
        None => eprintln!("Error: {:#}", error),
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use genecmp_core::ValidationError;

    #[test]
    fn test_error_creation() {
        let err = CliError::config("test message");
        assert!(matches!(err, CliError::Config { .. }));
        assert_eq!(err.to_string(), "Configuration error: test message");
    }

    #[test]
    fn test_error_suggestions() {
        let err = CliError::file_not_found(PathBuf::from("father.sam"));
        let formatted = format_error_with_suggestions(&err);
        assert!(formatted.contains("Suggestions:"));
        assert!(formatted.contains("Check that the file path is correct"));

        let plain = format_error_with_suggestions(&CliError::validation("bad"));
        assert!(!plain.contains("Suggestions:"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(matches!(cli_err, CliError::Io { .. }));
    }

    #[test]
    fn test_core_error_conversion() {
        let parse: CliError = ProviderError::parse("son.sam", 12, "invalid POS").into();
        assert_eq!(parse.to_string(), "Parsing error in son.sam at line 12: invalid POS");

        let validation: CliError =
            CompareError::Validation(ValidationError::NegativeDistance(-2)).into();
        assert!(matches!(validation, CliError::Validation { .. }));

        let pool: CliError = CompareError::Pool("no threads".into()).into();
        assert!(matches!(pool, CliError::Resource { .. }));

        let format: CliError = ProviderError::UnsupportedFormat(PathBuf::from("x.cram")).into();
        assert!(format.to_string().contains("x.cram"));

        let record: CliError = ProviderError::record("son.bam", 4, "invalid POS").into();
        assert!(matches!(record, CliError::InvalidFormat { .. }));
        assert!(record.to_string().contains("record 4 in son.bam"));
    }
}
