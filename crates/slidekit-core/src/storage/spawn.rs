//! Fire-and-forget execution of store calls.

use std::future::Future;
use std::pin::Pin;

/// A unit future that may borrow nothing from the caller.
pub type LocalFuture = Pin<Box<dyn Future<Output = ()> + 'static>>;

/// Runs store futures without the interaction loop awaiting them.
pub trait Spawn {
    fn spawn(&self, future: LocalFuture);
}

/// Native spawner that drives each future to completion on the spot.
///
/// Used by the command-line replay and by tests, where every store is local.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingSpawner;

#[cfg(not(target_arch = "wasm32"))]
impl Spawn for BlockingSpawner {
    fn spawn(&self, future: LocalFuture) {
        pollster::block_on(future);
    }
}

/// Browser spawner on the page's microtask queue.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSpawner;

#[cfg(target_arch = "wasm32")]
impl Spawn for LocalSpawner {
    fn spawn(&self, future: LocalFuture) {
        wasm_bindgen_futures::spawn_local(future);
    }
}
