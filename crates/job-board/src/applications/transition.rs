use std::fmt;
use std::str::FromStr;

use super::domain::{ApplicationStatus, UnknownStatus};

/// Whether a decided application may be moved again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// `accepted` and `rejected` are final; only a repeat of the current status is allowed.
    #[default]
    ForbidTerminalExit,
    /// Any status may follow any other.
    AllowAny,
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "forbid" | "strict" => Ok(Self::ForbidTerminalExit),
            "allow" | "permissive" => Ok(Self::AllowAny),
            other => Err(format!("unknown transition policy '{other}'")),
        }
    }
}

impl fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionPolicy::ForbidTerminalExit => f.write_str("forbid"),
            TransitionPolicy::AllowAny => f.write_str("allow"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("status is required")]
    MissingStatus,
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
    #[error("application is already {current} and cannot move to {requested}")]
    TerminalStatus {
        current: ApplicationStatus,
        requested: ApplicationStatus,
    },
}

/// Result of checking a requested transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Changed,
    Unchanged,
}

/// Decides which recruiter-requested status changes are permitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusTransitionAuthority {
    policy: TransitionPolicy,
}

impl StatusTransitionAuthority {
    pub fn new(policy: TransitionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Normalise the raw request value; blank input counts as missing.
    pub fn parse_requested(&self, raw: &str) -> Result<ApplicationStatus, TransitionError> {
        if raw.trim().is_empty() {
            return Err(TransitionError::MissingStatus);
        }
        Ok(raw.parse::<ApplicationStatus>()?)
    }

    pub fn authorize(
        &self,
        current: ApplicationStatus,
        requested: ApplicationStatus,
    ) -> Result<TransitionOutcome, TransitionError> {
        if current == requested {
            return Ok(TransitionOutcome::Unchanged);
        }

        match self.policy {
            TransitionPolicy::ForbidTerminalExit if current.is_terminal() => {
                Err(TransitionError::TerminalStatus { current, requested })
            }
            _ => Ok(TransitionOutcome::Changed),
        }
    }
}
