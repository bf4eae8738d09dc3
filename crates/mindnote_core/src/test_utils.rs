//! Test utilities for mindnote_core

use std::future::Future;

/// Drive a future to completion on the current thread.
///
/// For gateway and resolver futures that never wait on a tokio timer or IO.
pub(crate) fn block_on_test<F: Future>(future: F) -> F::Output {
    futures_lite::future::block_on(future)
}
