// Profile page transport module
// Author: kelexine (https://github.com/kelexine)

mod resolver;

pub use resolver::{Route, TransportResolver};

use crate::error::Result;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

/// Anything that can turn a profile URL into page HTML.
///
/// The refresh coordinator only depends on this trait, so tests and
/// alternative transports can stand in for the network.
pub trait PageSource: Send + Sync {
    fn fetch_page<'a>(
        &'a self,
        url: &'a str,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<String>>;
}
