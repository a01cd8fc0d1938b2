//! Testing utilities for code built on chains
//!
//! This module provides assertion macros for inspecting [`Suppressed`](crate::Suppressed)
//! records and, behind the `proptest` feature, an `Arbitrary` implementation
//! for generating them.
//!
//! # Examples
//!
//! ```rust
//! use closeable_chain::{assert_no_suppressed, assert_suppressed, Suppressed};
//!
//! let err = Suppressed::new("c3").with_suppressed("d2").with_suppressed("d1");
//! assert_suppressed!(err, "c3", ["d2", "d1"]);
//!
//! let clean = Suppressed::<_, &str>::new("c1");
//! assert_no_suppressed!(clean, "c1");
//! ```

/// Assert that a record has the given primary and suppressed failures.
///
/// The suppressed failures are compared in order.
///
/// # Example
///
/// ```rust
/// use closeable_chain::{assert_suppressed, Suppressed};
///
/// let err = Suppressed::new("d2").with_suppressed("d1");
/// assert_suppressed!(err, "d2", ["d1"]);
/// ```
#[macro_export]
macro_rules! assert_suppressed {
    ($record:expr, $primary:expr, []) => {{
        let record: &$crate::Suppressed<_, _> = &$record;
        assert_eq!(record.primary(), &$primary, "primary failure");
        assert!(
            !record.has_suppressed(),
            "suppressed failures: expected none, got {}",
            record.suppressed().len()
        );
    }};
    ($record:expr, $primary:expr, [$($suppressed:expr),+ $(,)?]) => {{
        let record: &$crate::Suppressed<_, _> = &$record;
        assert_eq!(record.primary(), &$primary, "primary failure");
        let expected: ::std::vec::Vec<_> = ::std::vec![$($suppressed),*];
        assert_eq!(record.suppressed(), expected.as_slice(), "suppressed failures");
    }};
}

/// Assert that a record has the given primary and nothing suppressed.
///
/// # Example
///
/// ```rust
/// use closeable_chain::{assert_no_suppressed, Suppressed};
///
/// let err = Suppressed::<_, String>::new("c1");
/// assert_no_suppressed!(err, "c1");
/// ```
#[macro_export]
macro_rules! assert_no_suppressed {
    ($record:expr, $primary:expr) => {{
        let record: &$crate::Suppressed<_, _> = &$record;
        assert_eq!(record.primary(), &$primary, "primary failure");
        if record.has_suppressed() {
            panic!(
                "Expected no suppressed failures, got {}",
                record.suppressed().len()
            );
        }
    }};
}

#[cfg(feature = "proptest")]
use crate::Suppressed;
#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl<P, S> Arbitrary for Suppressed<P, S>
where
    P: Arbitrary + 'static,
    S: Arbitrary + 'static,
{
    type Parameters = (P::Parameters, S::Parameters);
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        let (p_params, s_params) = args;
        (
            any_with::<P>(p_params),
            prop::collection::vec(any_with::<S>(s_params), 0..8),
        )
            .prop_map(|(primary, suppressed)| {
                suppressed
                    .into_iter()
                    .fold(Suppressed::new(primary), Suppressed::with_suppressed)
            })
            .boxed()
    }
}
