//! CLI command implementations
//!
//! Every command returns its process exit code:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 2 | Configuration error |
//! | 4 | Browser session could not be launched |
//! | 5 | Fatal error |
//! | 130 | Interrupted by SIGINT/SIGTERM |

pub mod init;
pub mod run;
pub mod status;
pub mod validate;

use crate::domain::DashportError;

/// Exit code for success
pub const EXIT_OK: i32 = 0;
/// Exit code for configuration errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for session launch failures
pub const EXIT_SESSION: i32 = 4;
/// Exit code for any other fatal error
pub const EXIT_FATAL: i32 = 5;
/// Exit code after a shutdown signal (SIGINT convention)
pub const EXIT_INTERRUPTED: i32 = 130;

/// Map an error to the process exit code
pub fn exit_code_for(error: &DashportError) -> i32 {
    match error {
        DashportError::Configuration(_) => EXIT_CONFIG,
        DashportError::Session(_) => EXIT_SESSION,
        DashportError::Interrupted => EXIT_INTERRUPTED,
        _ => EXIT_FATAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code_for(&DashportError::Configuration("x".to_string())),
            EXIT_CONFIG
        );
        assert_eq!(
            exit_code_for(&DashportError::Session("x".to_string())),
            EXIT_SESSION
        );
        assert_eq!(
            exit_code_for(&DashportError::Ledger("x".to_string())),
            EXIT_FATAL
        );
        assert_eq!(
            exit_code_for(&DashportError::Finalize("x".to_string())),
            EXIT_FATAL
        );
        assert_eq!(exit_code_for(&DashportError::Interrupted), EXIT_INTERRUPTED);
    }
}
