use std::process::exit;

use tracing::error;

/// Logs the error and exits with a failure status.
pub fn log_and_exit<Err: core::fmt::Display>(error: Err, message: &str) -> ! {
    error!("{message}:\n{error}");
    eprintln!("{message}, see the logs for more details.");

    exit(1);
}

pub trait Failure<T> {
    /// Unwraps the value or logs the error and exits.
    fn log_and_exit(self, message: &str) -> T;

    /// Logs the error and continues without the value.
    fn log(self, message: &str) -> Option<T>;
}

impl<T, E: core::fmt::Display> Failure<T> for Result<T, E> {
    fn log_and_exit(self, message: &str) -> T {
        match self {
            Ok(value) => value,
            Err(error) => log_and_exit(error, message),
        }
    }

    fn log(self, message: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                error!("{message}:\n{error}");
                None
            }
        }
    }
}
