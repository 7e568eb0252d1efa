//! Error types for the claim workflow and its remote collaborators.

use thiserror::Error;

/// Why a locally validated field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatIssue {
    #[error("handle must be at least 3 characters")]
    TooShort,
    #[error("handle may only contain letters, numbers, '_' and '-'")]
    InvalidCharacters,
    #[error("please enter your full name")]
    MissingName,
    #[error("please enter a valid email address")]
    InvalidEmail,
}

/// Errors surfaced to the page. `Display` is the user-facing message.
///
/// Every variant is recoverable: the workflow falls back to the phase it was
/// in before the failed step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("{0}")]
    InvalidFormat(FormatIssue),
    #[error("That handle is already taken")]
    HandleTaken,
    #[error("This email has already been used to claim a handle")]
    EmailAlreadyUsed,
    #[error("Sorry, all spots have been taken")]
    CapacityExceeded,
    #[error("Could not check availability, please try again")]
    AvailabilityCheckFailed,
    #[error("Something went wrong submitting your claim, please try again")]
    SubmissionFailed,
    #[error("Please wait for the current step to finish")]
    Busy,
}

impl ClaimError {
    /// Short machine-readable tag used in analytics properties.
    pub fn code(&self) -> &'static str {
        match self {
            ClaimError::InvalidFormat(_) => "invalid_format",
            ClaimError::HandleTaken => "handle_taken",
            ClaimError::EmailAlreadyUsed => "email_already_used",
            ClaimError::CapacityExceeded => "capacity_exceeded",
            ClaimError::AvailabilityCheckFailed => "availability_check_failed",
            ClaimError::SubmissionFailed => "submission_failed",
            ClaimError::Busy => "busy",
        }
    }
}

impl From<FormatIssue> for ClaimError {
    fn from(issue: FormatIssue) -> Self {
        ClaimError::InvalidFormat(issue)
    }
}

/// Transport-level failures talking to the record store or the chat relay.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("invalid url: {0}")]
    Url(String),
}
