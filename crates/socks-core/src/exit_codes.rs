//! Exit codes for the socks CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/input errors (fix the arguments, config or observation)
//! - 20-29: Internal or environment errors

/// Exit codes for socks operations.
///
/// These codes are a stable contract for scripts driving the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed.
    Ok = 0,

    /// Invalid arguments
    ArgsError = 10,

    /// Configuration could not be loaded or failed validation
    ConfigError = 11,

    /// The posterior could not be formed (infeasible k, degenerate grid,
    /// invalid prior or likelihood values)
    InferenceError = 12,

    /// Internal error (bug)
    InternalError = 20,

    /// I/O error writing output
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Ok
    }

    /// Check if this exit code is a user/input error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Ok => "OK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InferenceError => "ERR_INFERENCE",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
