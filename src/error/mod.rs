mod camcast;
mod fetch;
mod store;

pub use camcast::{ApiErrorBody, ApiErrorObject, CamcastError, UpstreamFailure};
pub use fetch::{FetchError, SnapshotApi};
pub use store::{NotFound, ReadError, StoreError};

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
