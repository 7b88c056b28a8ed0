//! Process exit codes
//!
//! Scripts can rely on these values; do not renumber existing variants.

use s3fc_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Bad arguments, pattern or path
    UsageError = 2,
    NetworkError = 3,
    AuthError = 4,
    NotFound = 5,
    /// Some items of a batch failed, the rest succeeded
    PartialFailure = 6,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Exit code matching a core error
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Auth(_) => ExitCode::AuthError,
            Error::NotFound(_) => ExitCode::NotFound,
            Error::Network(_) => ExitCode::NetworkError,
            Error::InvalidInput(_) | Error::InvalidPattern { .. } | Error::InvalidPath(_) => {
                ExitCode::UsageError
            }
            Error::Config(_) | Error::Table(_) | Error::Io(_) | Error::Csv(_) => {
                ExitCode::GeneralError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::UsageError.as_i32(), 2);
        assert_eq!(ExitCode::PartialFailure.as_i32(), 6);
    }

    #[test]
    fn test_from_error() {
        assert_eq!(
            ExitCode::from_error(&Error::Auth("x".to_string())),
            ExitCode::AuthError
        );
        assert_eq!(
            ExitCode::from_error(&Error::NotFound("x".to_string())),
            ExitCode::NotFound
        );
        assert_eq!(
            ExitCode::from_error(&Error::InvalidPattern {
                pattern: "(".to_string(),
                message: "x".to_string()
            }),
            ExitCode::UsageError
        );
    }
}
