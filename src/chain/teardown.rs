//! Teardown of a chain, tail to root.
//!
//! One walk serves both call shapes. Plain teardown turns the first release
//! failure into the primary and suppresses the rest under it; suppressing
//! teardown appends every release failure to a failure the caller already
//! holds. Either way each release action runs exactly once, in reverse
//! acquisition order, and a failing release never stops the walk.
//!
//! A panicking release does not stop the walk either. The first panic is held
//! until the root has been reached and is then resumed.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use super::Chain;
use crate::suppressed::Suppressed;

pub(crate) type Panic = Box<dyn Any + Send + 'static>;

/// A type-erased node that can release itself and hand back its predecessor.
pub(crate) trait Unwind<C>: Send {
    fn unwind(self: Box<Self>, walk: &mut Walk<'_, C>) -> Option<Box<dyn Unwind<C>>>;

    /// Detach the predecessor without releasing anything.
    fn take_prev(&mut self) -> Option<Box<dyn Unwind<C>>>;
}

/// Owning link from a node to the node before it.
///
/// Dropping it detaches predecessors one at a time, so discarding a long
/// chain does not recurse once per link.
pub(crate) struct Predecessor<C>(Option<Box<dyn Unwind<C>>>);

impl<C> Predecessor<C> {
    pub(crate) fn none() -> Self {
        Predecessor(None)
    }

    pub(crate) fn new(node: Box<dyn Unwind<C>>) -> Self {
        Predecessor(Some(node))
    }

    fn take(&mut self) -> Option<Box<dyn Unwind<C>>> {
        self.0.take()
    }
}

impl<C> Drop for Predecessor<C> {
    fn drop(&mut self) {
        let mut next = self.0.take();
        while let Some(mut node) = next {
            next = node.take_prev();
        }
    }
}

/// State of one teardown pass.
pub(crate) struct Walk<'a, C> {
    on_failure: &'a mut dyn FnMut(C),
    panic: Option<Panic>,
}

impl<C> Walk<'_, C> {
    fn release<F>(&mut self, link: usize, release: F)
    where
        F: FnOnce() -> Result<(), C>,
    {
        match panic::catch_unwind(AssertUnwindSafe(release)) {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => {
                report(link);
                (self.on_failure)(failure);
            }
            Err(payload) => {
                report_panic(link);
                if self.panic.is_none() {
                    self.panic = Some(payload);
                }
            }
        }
    }
}

impl<T, C> Unwind<C> for Chain<T, C>
where
    T: Send + 'static,
    C: Send + 'static,
{
    fn unwind(self: Box<Self>, walk: &mut Walk<'_, C>) -> Option<Box<dyn Unwind<C>>> {
        let Chain {
            output,
            release,
            mut effects,
            mut prev,
            len,
        } = *self;

        // Effect links were appended after the value, so they go first.
        let mut link = len;
        while let Some(effect) = effects.pop() {
            walk.release(link, || effect(&output));
            link -= 1;
        }

        if let Some(release) = release {
            walk.release(link, || release(output));
        }

        prev.take()
    }

    fn take_prev(&mut self) -> Option<Box<dyn Unwind<C>>> {
        self.prev.take()
    }
}

#[cfg(feature = "tracing")]
fn report(link: usize) {
    tracing::debug!(link, "release failed");
}

#[cfg(not(feature = "tracing"))]
fn report(_link: usize) {}

#[cfg(feature = "tracing")]
fn report_panic(link: usize) {
    tracing::error!(link, "release panicked, continuing teardown");
}

#[cfg(not(feature = "tracing"))]
fn report_panic(link: usize) {
    eprintln!("Release of link {} panicked, continuing teardown", link);
}

/// Walk from `tail` to the root. Returns the first panic raised by a release.
pub(crate) fn unwind<C>(
    tail: Box<dyn Unwind<C>>,
    on_failure: &mut dyn FnMut(C),
) -> Option<Panic> {
    let mut walk = Walk {
        on_failure,
        panic: None,
    };
    let mut next = Some(tail);
    while let Some(node) = next {
        next = node.unwind(&mut walk);
    }
    walk.panic
}

impl<T, C> Chain<T, C>
where
    T: Send + 'static,
    C: Send + 'static,
{
    /// Release every link, tail to root.
    ///
    /// The first release failure becomes the primary of the returned error;
    /// each later one is suppressed under it, in the order encountered. The
    /// walk always reaches the root. An empty chain closes without running
    /// anything.
    ///
    /// # Panics
    ///
    /// If a release action panics, the remaining links are still released and
    /// the first panic is resumed afterwards.
    ///
    /// # Example
    ///
    /// ```rust
    /// use closeable_chain::Chain;
    ///
    /// let chain = Chain::<(), &str>::new()
    ///     .append(|_| Ok::<_, ()>(1), |_| Err("d1"))
    ///     .unwrap()
    ///     .append(|_| Ok::<_, ()>(2), |_| Err("d2"))
    ///     .unwrap()
    ///     .append(|_| Ok::<_, ()>(3), |_| Ok(()))
    ///     .unwrap();
    ///
    /// let err = chain.close().unwrap_err();
    /// assert_eq!(err.primary(), &"d2");
    /// assert_eq!(err.suppressed(), &["d1"]);
    /// ```
    pub fn close(self) -> Result<(), Suppressed<C>> {
        let mut record: Option<Suppressed<C>> = None;

        let panicked = unwind(Box::new(self), &mut |failure| {
            record = Some(match record.take() {
                Some(existing) => existing.with_suppressed(failure),
                None => Suppressed::new(failure),
            });
        });
        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }

        match record {
            Some(record) => Err(record),
            None => Ok(()),
        }
    }

    /// Release every link, tail to root, suppressing all release failures
    /// into `failure`.
    ///
    /// Use this when the chain must be torn down because of an error the
    /// caller already holds, for example after using the chain's output
    /// failed. `failure` stays the primary throughout.
    ///
    /// # Example
    ///
    /// ```rust
    /// use closeable_chain::Chain;
    ///
    /// let chain = Chain::<(), &str>::new()
    ///     .append(|_| Ok::<_, ()>(1), |_| Err("d1"))
    ///     .unwrap();
    ///
    /// let err = chain.close_suppressing("use failed");
    /// assert_eq!(err.primary(), &"use failed");
    /// assert_eq!(err.suppressed(), &["d1"]);
    /// ```
    pub fn close_suppressing<P>(self, failure: P) -> Suppressed<P, C> {
        let mut record = Suppressed::new(failure);
        self.close_into(&mut record);
        record
    }

    /// Release every link, tail to root, appending each release failure to
    /// an existing record.
    ///
    /// A panicking release is handled as in [`Chain::close`]; failures
    /// recorded before the panic is resumed stay in `record`.
    pub fn close_into<P>(self, record: &mut Suppressed<P, C>) {
        if let Some(payload) = unwind(Box::new(self), &mut |failure| record.push(failure)) {
            panic::resume_unwind(payload);
        }
    }
}
