use std::future::Future;

mod error;
mod open_notify;

pub use error::FetchError;
pub use open_notify::{OpenNotifySource, DEFAULT_URL};

use crate::tracker::Fix;

/// Where positions come from. Network failures, timeouts and malformed
/// payloads all surface as `FetchError`.
pub trait PositionSource {
    fn fetch(&self) -> impl Future<Output = Result<Fix, FetchError>> + Send;
}
