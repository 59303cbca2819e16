//! Outcome classification
//!
//! Maps the terminal error of a call to a small, closed vocabulary used as
//! the `code` label. A `tonic::Status` found in the error's source chain wins;
//! otherwise cancellation and timeout causes are recognized; anything else
//! is `unknown`.

use std::error::Error;
use std::fmt;
use std::io;
use tonic::{Code, Status};

/// How a call terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Ok,
    Canceled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl Outcome {
    /// Label value for the `code` label
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
            Self::InvalidArgument => "invalid_argument",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::PermissionDenied => "permission_denied",
            Self::ResourceExhausted => "resource_exhausted",
            Self::FailedPrecondition => "failed_precondition",
            Self::Aborted => "aborted",
            Self::OutOfRange => "out_of_range",
            Self::Unimplemented => "unimplemented",
            Self::Internal => "internal",
            Self::Unavailable => "unavailable",
            Self::DataLoss => "data_loss",
            Self::Unauthenticated => "unauthenticated",
        }
    }

    /// Classify the terminal status of a call; `None` means success
    pub fn of_status(status: Option<&Status>) -> Self {
        match status {
            None => Self::Ok,
            Some(status) => classify(status),
        }
    }

    /// Classify a call result without consuming it
    pub fn of_result<T>(result: &Result<T, Status>) -> Self {
        Self::of_status(result.as_ref().err())
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Code> for Outcome {
    fn from(code: Code) -> Self {
        match code {
            Code::Ok => Self::Ok,
            Code::Cancelled => Self::Canceled,
            Code::Unknown => Self::Unknown,
            Code::InvalidArgument => Self::InvalidArgument,
            Code::DeadlineExceeded => Self::DeadlineExceeded,
            Code::NotFound => Self::NotFound,
            Code::AlreadyExists => Self::AlreadyExists,
            Code::PermissionDenied => Self::PermissionDenied,
            Code::ResourceExhausted => Self::ResourceExhausted,
            Code::FailedPrecondition => Self::FailedPrecondition,
            Code::Aborted => Self::Aborted,
            Code::OutOfRange => Self::OutOfRange,
            Code::Unimplemented => Self::Unimplemented,
            Code::Internal => Self::Internal,
            Code::Unavailable => Self::Unavailable,
            Code::DataLoss => Self::DataLoss,
            Code::Unauthenticated => Self::Unauthenticated,
            #[allow(unreachable_patterns)]
            _ => Self::Unknown,
        }
    }
}

/// Classify any error, walking its source chain
///
/// Never returns [`Outcome::Ok`]: an error is present.
pub fn classify(err: &(dyn Error + 'static)) -> Outcome {
    let mut cause = Some(err);
    while let Some(current) = cause {
        if let Some(status) = current.downcast_ref::<Status>() {
            match status.code() {
                Code::Ok | Code::Unknown => {}
                code => return Outcome::from(code),
            }
        }
        cause = current.source();
    }

    let mut cause = Some(err);
    while let Some(current) = cause {
        if is_canceled(current) {
            return Outcome::Canceled;
        }
        if is_deadline(current) {
            return Outcome::DeadlineExceeded;
        }
        cause = current.source();
    }

    Outcome::Unknown
}

fn is_canceled(err: &(dyn Error + 'static)) -> bool {
    if err.is::<futures::channel::oneshot::Canceled>() {
        return true;
    }
    err.downcast_ref::<tokio::task::JoinError>()
        .is_some_and(|join| join.is_cancelled())
}

fn is_deadline(err: &(dyn Error + 'static)) -> bool {
    if err.is::<tokio::time::error::Elapsed>() {
        return true;
    }
    err.downcast_ref::<io::Error>()
        .is_some_and(|io| io.kind() == io::ErrorKind::TimedOut)
}
