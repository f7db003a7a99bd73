mod launchpad;

pub(crate) use launchpad::is_unique_violation;
pub use launchpad::{ApiErrorBody, ApiErrorObject, LaunchpadError};

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
