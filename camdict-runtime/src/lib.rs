//! Tokio runtime wrapper with a root cancellation token.
//!
//! Every lookup runs under a child of the root token (see
//! [`CamdictHandle::request_token`]), so tripping the root, either through
//! [`CamdictRuntime::shutdown`] or Ctrl-C, cancels all in-flight requests.
//!
//! ```
//! use camdict_runtime::CamdictRuntime;
//! use std::time::Duration;
//!
//! let runtime = CamdictRuntime::build("camdict-doc", Some(1)).expect("runtime builds");
//! let handle = runtime.handle();
//! let request = handle.request_token();
//! let answer = runtime.block_on(async { 6 * 7 });
//! assert_eq!(answer, 42);
//!
//! runtime.shutdown(Duration::from_millis(10));
//! assert!(request.is_cancelled());
//! ```
use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct CamdictRuntime {
    runtime: Runtime,
    root: CancellationToken,
}

/// Cheap, cloneable access to the runtime and its root token.
#[derive(Clone)]
pub struct CamdictHandle {
    tokio: Handle,
    root: CancellationToken,
}

impl CamdictRuntime {
    /// Multi-threaded runtime; `None` lets Tokio pick one worker per core.
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);
        if let Some(n) = worker_threads {
            builder.worker_threads(n.max(1));
        }
        let runtime = builder
            .build()
            .with_context(|| format!("failed to start {thread_name} runtime"))?;
        Ok(Self {
            runtime,
            root: CancellationToken::new(),
        })
    }

    pub fn handle(&self) -> CamdictHandle {
        CamdictHandle {
            tokio: self.runtime.handle().clone(),
            root: self.root.clone(),
        }
    }

    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Cancel the root token, then give tasks `grace` to finish.
    pub fn shutdown(self, grace: Duration) {
        self.root.cancel();
        self.runtime.shutdown_timeout(grace);
    }
}

impl CamdictHandle {
    /// The root token. Cancelling it cancels every request token.
    pub fn cancellation(&self) -> CancellationToken {
        self.root.clone()
    }

    /// A token for one lookup: cancelled with the root, or on its own.
    ///
    /// ```
    /// use camdict_runtime::CamdictRuntime;
    ///
    /// let runtime = CamdictRuntime::build("request-token", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// handle.request_token().cancel();
    /// assert!(!handle.cancellation().is_cancelled());
    /// ```
    pub fn request_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Trip the root token on the first Ctrl-C.
    pub fn cancel_on_ctrl_c(&self) -> JoinHandle<()> {
        let root = self.root.clone();
        self.tokio.spawn(async move {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => match signal {
                    Ok(()) => {
                        tracing::info!("runtime.ctrl_c");
                        root.cancel();
                    }
                    Err(e) => tracing::warn!(error = %e, "runtime.ctrl_c.unavailable"),
                },
                _ = root.cancelled() => {}
            }
        })
    }
}
