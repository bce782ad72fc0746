//! One-tick deferral.
//!
//! A push that resolves a dialog handler must not settle inside the host's
//! `onNotification` invocation, otherwise the page's default action for the
//! originating event runs before the continuation. `defer` pushes the work
//! one scheduling tick later on the current runtime.

use tokio::runtime::Handle;

/// Yield once to the scheduler.
pub async fn next_tick() {
    tokio::task::yield_now().await;
}

/// Run `f` one tick from now, or inline when no runtime is available.
pub fn defer<F>(f: F)
where
    F: FnOnce() + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                next_tick().await;
                f();
            });
        }
        Err(_) => f(),
    }
}
