//! Single-resource wrappers that run a release action on close.
//!
//! - [`OnClose`] - an optional action run at most once
//! - [`Closing`] - a value with a release action bound to it
//!
//! Both prefer an explicit `close()`, which returns the release result. If a
//! wrapper is dropped without being closed, its action runs on drop and a
//! failure is logged with its `Debug` output, since `Drop` cannot return it.
//!
//! # Example
//!
//! ```rust
//! use closeable_chain::guard::{run_on_close, wrap};
//!
//! let guard = run_on_close(|| Ok::<_, String>(()));
//! guard.close().unwrap();
//!
//! let file = wrap(vec![1u8, 2, 3], |buf: Vec<u8>| {
//!     assert_eq!(buf.len(), 3);
//!     Ok::<_, String>(())
//! });
//! assert_eq!(file.len(), 3);
//! file.close().unwrap();
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};

// ============================================================================
// OnClose
// ============================================================================

/// An optional action run when the wrapper is closed or dropped.
///
/// An absent action makes the wrapper a no-op.
pub struct OnClose<E: fmt::Debug> {
    action: Option<Box<dyn FnOnce() -> Result<(), E> + Send>>,
}

impl<E: fmt::Debug> OnClose<E> {
    /// Wrap an action to run on close.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
    {
        OnClose {
            action: Some(Box::new(action)),
        }
    }

    /// A wrapper with no action.
    pub fn none() -> Self {
        OnClose { action: None }
    }

    /// Whether an action is still pending.
    pub fn is_armed(&self) -> bool {
        self.action.is_some()
    }

    /// Run the action now and return its result.
    pub fn close(mut self) -> Result<(), E> {
        match self.action.take() {
            Some(action) => action(),
            None => Ok(()),
        }
    }
}

impl<E: fmt::Debug> Default for OnClose<E> {
    fn default() -> Self {
        Self::none()
    }
}

impl<E> From<Option<Box<dyn FnOnce() -> Result<(), E> + Send>>> for OnClose<E>
where
    E: fmt::Debug,
{
    fn from(action: Option<Box<dyn FnOnce() -> Result<(), E> + Send>>) -> Self {
        OnClose { action }
    }
}

impl<E: fmt::Debug> fmt::Debug for OnClose<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnClose")
            .field("action", &self.action.as_ref().map(|_| "<function>"))
            .finish()
    }
}

impl<E: fmt::Debug> Drop for OnClose<E> {
    fn drop(&mut self) {
        if let Some(action) = self.action.take() {
            if let Err(err) = action() {
                #[cfg(feature = "tracing")]
                tracing::warn!("Close action failed on drop: {:?}", err);
                #[cfg(not(feature = "tracing"))]
                eprintln!("Close action failed on drop: {:?}", err);
            }
        }
    }
}

/// Create an [`OnClose`] that runs `action` when closed or dropped.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use closeable_chain::guard::run_on_close;
///
/// let closed = Arc::new(AtomicBool::new(false));
/// let flag = closed.clone();
/// {
///     let _guard = run_on_close(move || {
///         flag.store(true, Ordering::SeqCst);
///         Ok::<_, ()>(())
///     });
/// }
/// assert!(closed.load(Ordering::SeqCst));
/// ```
pub fn run_on_close<E, F>(action: F) -> OnClose<E>
where
    E: fmt::Debug,
    F: FnOnce() -> Result<(), E> + Send + 'static,
{
    OnClose::new(action)
}

// ============================================================================
// Closing
// ============================================================================

/// A value paired with the action that releases it.
///
/// Derefs to the value. [`Closing::close`] hands the value to the release
/// action and returns its result.
pub struct Closing<T, E: fmt::Debug> {
    inner: Option<(T, Box<dyn FnOnce(T) -> Result<(), E> + Send>)>,
}

impl<T, E: fmt::Debug> Closing<T, E> {
    /// Bind `release` to `value`.
    pub fn new<R>(value: T, release: R) -> Self
    where
        R: FnOnce(T) -> Result<(), E> + Send + 'static,
    {
        Closing {
            inner: Some((value, Box::new(release))),
        }
    }

    /// Release the value now and return the release result.
    pub fn close(mut self) -> Result<(), E> {
        match self.inner.take() {
            Some((value, release)) => release(value),
            None => Ok(()),
        }
    }
}

impl<T, E: fmt::Debug> Deref for Closing<T, E> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.inner {
            Some((value, _)) => value,
            None => unreachable!("Closing is only emptied by close or drop"),
        }
    }
}

impl<T, E: fmt::Debug> DerefMut for Closing<T, E> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.inner {
            Some((value, _)) => value,
            None => unreachable!("Closing is only emptied by close or drop"),
        }
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Closing<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closing")
            .field("value", &self.inner.as_ref().map(|(value, _)| value))
            .field("release", &"<function>")
            .finish()
    }
}

impl<T, E: fmt::Debug> Drop for Closing<T, E> {
    fn drop(&mut self) {
        if let Some((value, release)) = self.inner.take() {
            if let Err(err) = release(value) {
                #[cfg(feature = "tracing")]
                tracing::warn!("Resource cleanup failed: {:?}", err);
                #[cfg(not(feature = "tracing"))]
                eprintln!("Resource cleanup failed: {:?}", err);
            }
        }
    }
}

/// Bind a release action to an already-acquired value.
pub fn wrap<T, E, R>(value: T, release: R) -> Closing<T, E>
where
    E: fmt::Debug,
    R: FnOnce(T) -> Result<(), E> + Send + 'static,
{
    Closing::new(value, release)
}

/// Run a fallible setup step against `value`, then bind `release` to it.
///
/// If `acquire` fails, `value` is dropped and `release` never runs.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use closeable_chain::guard::wrap_with;
///
/// let registry = Arc::new(Mutex::new(Vec::new()));
/// let on_release = registry.clone();
///
/// let entry = wrap_with(
///     "worker-1",
///     |name: &&str| {
///         registry.lock().unwrap().push(name.to_string());
///         Ok::<_, String>(())
///     },
///     move |name| {
///         on_release.lock().unwrap().retain(|n| n != name);
///         Ok::<_, String>(())
///     },
/// )
/// .unwrap();
///
/// assert_eq!(registry.lock().unwrap().len(), 1);
/// entry.close().unwrap();
/// assert!(registry.lock().unwrap().is_empty());
/// ```
pub fn wrap_with<T, X, E, A, R>(value: T, acquire: A, release: R) -> Result<Closing<T, E>, X>
where
    E: fmt::Debug,
    A: FnOnce(&T) -> Result<(), X>,
    R: FnOnce(T) -> Result<(), E> + Send + 'static,
{
    acquire(&value)?;
    Ok(Closing::new(value, release))
}
