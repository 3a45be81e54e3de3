use core::fmt::{self, Display};

use thiserror::Error;

use crate::{
    ffi::constants::{ADL_OK, ADL_OK_WARNING},
    memory,
};

/// A shortcut for `Result<T, AdlError>`.
pub type AdlResult<T> = Result<T, AdlError>;

/// A status code returned by an ADL2 entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AdlStatus(pub i32);

impl AdlStatus {
    /// Whether the status is `ADL_OK` or `ADL_OK_WARNING`.
    pub fn is_ok(self) -> bool {
        self.0 == ADL_OK || self.0 == ADL_OK_WARNING
    }

    /// Converts the status into a result labelled with the entry point that returned it.
    pub fn check(self, call: &'static str) -> AdlResult<()> {
        if self.is_ok() {
            return Ok(());
        }

        Err(AdlError::from_status(self, call))
    }

    fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            0 => "ADL_OK",
            1 => "ADL_OK_WARNING",
            -1 => "ADL_ERR",
            -2 => "ADL_ERR_NOT_INIT",
            -3 => "ADL_ERR_INVALID_PARAM",
            -4 => "ADL_ERR_INVALID_PARAM_SIZE",
            -5 => "ADL_ERR_INVALID_ADL_IDX",
            -6 => "ADL_ERR_INVALID_CONTROLLER_IDX",
            -7 => "ADL_ERR_INVALID_DIPLAY_IDX",
            -8 => "ADL_ERR_NOT_SUPPORTED",
            -9 => "ADL_ERR_NULL_POINTER",
            -10 => "ADL_ERR_DISABLED_ADAPTER",
            -11 => "ADL_ERR_INVALID_CALLBACK",
            -12 => "ADL_ERR_RESOURCE_CONFLICT",
            -20 => "ADL_ERR_SET_INCOMPLETE",
            -21 => "ADL_ERR_NO_XDISPLAY",
            _ => return None,
        };

        Some(name)
    }
}

impl Display for AdlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "unknown status ({})", self.0),
        }
    }
}

/// An ADL2 failure with the entry point that triggered it.
#[derive(Debug, Error)]
pub struct AdlError {
    call: &'static str,
    #[source]
    source: AdlErrorSource,
}

/// Possible sources for an [`AdlError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdlErrorSource {
    /// The entry point returned a failure status.
    #[error("Status: {0}")]
    Status(AdlStatus),

    /// Marshaling the call's buffers failed.
    #[error(transparent)]
    Memory(#[from] memory::Error),

    /// The entry point reported success but the result could not be used.
    #[error("Unexpected result: {0}")]
    Unexpected(&'static str),

    /// A Windows call made on behalf of the entry point failed.
    #[cfg(windows)]
    #[error(transparent)]
    WindowsError(#[from] windows_result::Error),
}

impl AdlError {
    /// Create an AdlError from a failure status and a label.
    pub fn from_status(status: AdlStatus, call: &'static str) -> Self {
        Self {
            call,
            source: AdlErrorSource::Status(status),
        }
    }

    /// Create an AdlError from a marshaling failure and a label.
    pub fn from_memory(source: memory::Error, call: &'static str) -> Self {
        Self {
            call,
            source: source.into(),
        }
    }

    /// Create an AdlError for a successful call whose result could not be used.
    pub fn unexpected(reason: &'static str, call: &'static str) -> Self {
        Self {
            call,
            source: AdlErrorSource::Unexpected(reason),
        }
    }

    /// Create an AdlError from a `windows_result::Error` and a label.
    #[cfg(windows)]
    pub fn from_windows(source: windows_result::Error, call: &'static str) -> Self {
        Self {
            call,
            source: source.into(),
        }
    }

    /// The entry point that failed.
    pub fn call(&self) -> &'static str {
        self.call
    }

    /// The status the entry point returned, if it returned one.
    pub fn status(&self) -> Option<AdlStatus> {
        match self.source {
            AdlErrorSource::Status(status) => Some(status),
            _ => None,
        }
    }
}

impl Display for AdlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ADL {} call failed:\n{}", self.call, self.source)
    }
}

/// A value that was either read in full, or filled in with placeholders after a secondary query
/// failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Degradable<T> {
    /// Every query behind the value succeeded.
    Exact(T),
    /// Some parts of the value are placeholders.
    Degraded {
        /// The value with placeholders substituted.
        value: T,
        /// Why the placeholders were needed.
        reason: String,
    },
}

impl<T> Degradable<T> {
    /// The value, whether exact or degraded.
    pub fn into_value(self) -> T {
        match self {
            Self::Exact(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// Whether placeholders were substituted.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{AdlError, AdlStatus};

    #[test]
    fn warnings_are_success() {
        assert!(AdlStatus(0).check("ADL2_Test").is_ok());
        assert!(AdlStatus(1).check("ADL2_Test").is_ok());

        let error = AdlStatus(-8).check("ADL2_Test").unwrap_err();
        assert_eq!(error.call(), "ADL2_Test");
        assert_eq!(error.status(), Some(AdlStatus(-8)));
    }

    #[test]
    fn errors_name_the_call() {
        let error = AdlError::from_status(AdlStatus(-3), "ADL2_Display_Modes_Get");
        let message = error.to_string();

        assert!(message.contains("ADL2_Display_Modes_Get"), "{message}");
        assert!(message.contains("ADL_ERR_INVALID_PARAM"), "{message}");
    }
}
