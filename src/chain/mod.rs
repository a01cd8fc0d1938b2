//! Chains of dependent resources with LIFO teardown.
//!
//! A [`Chain`] is built one link at a time. Each link runs an acquire step
//! against the previous link's value and records the release action for what
//! it produced. If an acquire step fails, everything acquired so far is
//! released in reverse order before the failure is returned. Once the chain
//! is complete, the caller uses the final value and then tears the chain down
//! explicitly with [`Chain::close`].
//!
//! # Example
//!
//! ```rust
//! use closeable_chain::{Chain, Suppressed};
//!
//! # fn main() -> Result<(), Suppressed<String>> {
//! let chain = Chain::<(), String>::new()
//!     .append(|_| Ok::<_, String>("connection"), |_conn| Ok(()))?
//!     .append(|conn| Ok::<_, String>(format!("session on {}", conn)), |_session| Ok(()))?;
//!
//! assert_eq!(chain.output(), "session on connection");
//!
//! chain.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Failure handling
//!
//! | Where it fails | What is released | What is returned |
//! |----------------|------------------|------------------|
//! | acquire of link `n` | links `n-1..=1` | the acquire error, with release errors suppressed |
//! | release during `close` | every link, tail to root | first release error, later ones suppressed |
//!
//! Nothing is released implicitly: dropping a chain drops its values without
//! running any release action.
//!
//! A panic in an acquire step is handled like a failure, except that it is
//! resumed after the rollback instead of being returned.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::suppressed::Suppressed;

mod teardown;

use teardown::{Panic, Predecessor};

pub(crate) type Release<T, C> = Box<dyn FnOnce(T) -> Result<(), C> + Send>;
pub(crate) type EffectRelease<T, C> = Box<dyn FnOnce(&T) -> Result<(), C> + Send>;

/// An append-only chain of acquired resources.
///
/// `T` is the value of the tail link and `C` the error type shared by every
/// release action in the chain.
///
/// A node owns its value, the release action that consumes the value, the
/// release actions of effect links bound to the value, and its predecessor.
/// The root node carries `()` and no release action; it is skipped by
/// teardown.
///
/// `Chain` is `Send` when `T` is, so separate parts of a chain may be built on
/// different threads. Synchronizing those hand-offs is up to the caller.
#[must_use = "dropping a chain releases nothing; call `close` to tear it down"]
pub struct Chain<T, C> {
    output: T,
    release: Option<Release<T, C>>,
    effects: Vec<EffectRelease<T, C>>,
    prev: Predecessor<C>,
    len: usize,
}

impl<C> Chain<(), C> {
    /// Create a chain holding only the root link.
    pub fn new() -> Self {
        Chain {
            output: (),
            release: None,
            effects: Vec::new(),
            prev: Predecessor::none(),
            len: 0,
        }
    }

    /// Alias for [`Chain::new`].
    pub fn empty() -> Self {
        Self::new()
    }
}

impl<C> Default for Chain<(), C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> Chain<T, C> {
    /// The tail link's value, or `()` for an empty chain.
    pub fn output(&self) -> &T {
        &self.output
    }

    /// Number of links appended so far, effect links included.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T, C> Chain<T, C>
where
    T: Send + 'static,
    C: Send + 'static,
{
    /// Acquire a new resource from the tail's value and link it to the chain.
    ///
    /// `acquire` receives the current tail value. On success the returned
    /// chain's tail is the new value, released by `release` during teardown,
    /// and this chain becomes its predecessor.
    ///
    /// On failure every link of this chain is released, tail to root, and the
    /// acquire error is returned with any release errors suppressed into it in
    /// the order they occurred. No link is created for the failed step.
    ///
    /// # Panics
    ///
    /// If `acquire` panics, this chain is rolled back as above and the panic
    /// is then resumed. Release failures from that rollback are logged.
    ///
    /// # Example
    ///
    /// ```rust
    /// use closeable_chain::Chain;
    ///
    /// let result = Chain::<(), &str>::new()
    ///     .append(|_| Ok::<_, &str>(1), |_| Err("close 1"))
    ///     .and_then(|chain| chain.append(|_| Err::<i32, _>("open 2"), |_| Ok(())));
    ///
    /// let err = result.err().unwrap();
    /// assert_eq!(err.primary(), &"open 2");
    /// assert_eq!(err.suppressed(), &["close 1"]);
    /// ```
    pub fn append<O, X, A, R>(
        self,
        acquire: A,
        release: R,
    ) -> Result<Chain<O, C>, Suppressed<X, C>>
    where
        A: FnOnce(&T) -> Result<O, X>,
        R: FnOnce(O) -> Result<(), C> + Send + 'static,
        O: Send + 'static,
    {
        let output = match panic::catch_unwind(AssertUnwindSafe(|| acquire(&self.output))) {
            Ok(Ok(output)) => output,
            Ok(Err(failure)) => return Err(self.rollback(failure)),
            Err(payload) => self.abandon(payload),
        };

        let len = self.len + 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(link = len, "link acquired");

        Ok(Chain {
            output,
            release: Some(Box::new(release)),
            effects: Vec::new(),
            prev: Predecessor::new(Box::new(self)),
            len,
        })
    }

    /// Run a side effect against the tail's value and link its undo action.
    ///
    /// The returned chain keeps the same tail value. `release` is bound to
    /// that value and runs before the value's own release during teardown.
    /// Failure and panic handling are the same as for [`Chain::append`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::{Arc, Mutex};
    /// use closeable_chain::Chain;
    ///
    /// let log = Arc::new(Mutex::new(Vec::new()));
    /// let (on_close, on_unregister) = (log.clone(), log.clone());
    ///
    /// let chain = Chain::<(), String>::new()
    ///     .append(|_| Ok::<_, String>("handle"), move |_| {
    ///         on_close.lock().unwrap().push("close");
    ///         Ok(())
    ///     })
    ///     .unwrap()
    ///     .append_effect(|_| Ok::<_, String>(()), move |_| {
    ///         on_unregister.lock().unwrap().push("unregister");
    ///         Ok(())
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(chain.output(), &"handle");
    /// chain.close().unwrap();
    /// assert_eq!(*log.lock().unwrap(), vec!["unregister", "close"]);
    /// ```
    pub fn append_effect<X, A, R>(
        mut self,
        acquire: A,
        release: R,
    ) -> Result<Chain<T, C>, Suppressed<X, C>>
    where
        A: FnOnce(&T) -> Result<(), X>,
        R: FnOnce(&T) -> Result<(), C> + Send + 'static,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| acquire(&self.output))) {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => return Err(self.rollback(failure)),
            Err(payload) => self.abandon(payload),
        }

        self.effects.push(Box::new(release));
        self.len += 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(link = self.len, "effect link acquired");

        Ok(self)
    }

    fn rollback<X>(self, failure: X) -> Suppressed<X, C> {
        #[cfg(feature = "tracing")]
        tracing::debug!(links = self.len, "acquisition failed, rolling back");

        self.close_suppressing(failure)
    }

    fn abandon(self, payload: Panic) -> ! {
        #[cfg(feature = "tracing")]
        tracing::error!(links = self.len, "acquisition panicked, rolling back");

        let mut failures = 0usize;
        // The acquire panic wins over any panic raised by a release.
        let _ = teardown::unwind(Box::new(self), &mut |_| failures += 1);

        if failures > 0 {
            #[cfg(feature = "tracing")]
            tracing::error!(failures, "Resource cleanup failed after panic");
            #[cfg(not(feature = "tracing"))]
            eprintln!("Resource cleanup failed after panic: {} release(s) failed", failures);
        }

        panic::resume_unwind(payload)
    }
}

impl<T: fmt::Debug, C> fmt::Debug for Chain<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("output", &self.output)
            .field("len", &self.len)
            .field("release", &self.release.as_ref().map(|_| "<function>"))
            .field("effects", &self.effects.len())
            .finish()
    }
}
