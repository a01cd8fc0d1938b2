//! Primary failures with suppressed follow-up failures
//!
//! This module provides the `Suppressed` type, which pairs the failure that is
//! ultimately reported with every secondary failure that happened while cleaning
//! up after it. Nothing is dropped: the primary is kept as-is and each later
//! failure is appended, in the order it occurred.
//!
//! # Examples
//!
//! ```
//! use closeable_chain::Suppressed;
//!
//! let mut err = Suppressed::new("connect failed");
//! err.push("closing socket");
//! err.push("removing lock file");
//!
//! assert_eq!(err.primary(), &"connect failed");
//! assert_eq!(err.suppressed(), &["closing socket", "removing lock file"]);
//! ```

use std::error::Error as StdError;
use std::fmt;

/// A primary failure plus the ordered failures suppressed by it
///
/// `P` is the type of the reported failure and `S` the type of the failures
/// recorded underneath it. Teardown of a chain reports release failures under
/// a release failure, so `S` defaults to `P`; a failed acquisition reports
/// release failures under the acquisition error, where the two types differ.
///
/// The suppressed list is append-only. Once a record exists its primary is
/// never replaced.
///
/// # Examples
///
/// ```
/// use closeable_chain::Suppressed;
///
/// let err = Suppressed::<_, &str>::new("open failed")
///     .with_suppressed("close b")
///     .with_suppressed("close a");
///
/// println!("{}", err);
/// // Output:
/// // open failed
/// //   suppressed: close b
/// //   suppressed: close a
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Suppressed<P, S = P> {
    primary: P,
    suppressed: Vec<S>,
}

impl<P, S> Suppressed<P, S> {
    /// Create a record with an empty suppressed list
    ///
    /// # Examples
    ///
    /// ```
    /// use closeable_chain::Suppressed;
    ///
    /// let err = Suppressed::<_, String>::new("base error");
    /// assert_eq!(err.primary(), &"base error");
    /// assert!(!err.has_suppressed());
    /// ```
    pub fn new(primary: P) -> Self {
        Suppressed {
            primary,
            suppressed: Vec::new(),
        }
    }

    /// Append a failure to the suppressed list
    pub fn push(&mut self, failure: S) {
        self.suppressed.push(failure);
    }

    /// Append a failure to the suppressed list, builder style
    ///
    /// # Examples
    ///
    /// ```
    /// use closeable_chain::Suppressed;
    ///
    /// let err = Suppressed::new("c3").with_suppressed("d2").with_suppressed("d1");
    /// assert_eq!(err.suppressed(), &["d2", "d1"]);
    /// ```
    pub fn with_suppressed(mut self, failure: S) -> Self {
        self.push(failure);
        self
    }

    /// The failure this record reports
    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// Suppressed failures, in the order they occurred
    pub fn suppressed(&self) -> &[S] {
        &self.suppressed
    }

    /// Whether anything has been suppressed
    pub fn has_suppressed(&self) -> bool {
        !self.suppressed.is_empty()
    }

    /// Consume the record and return the primary, discarding the rest
    pub fn into_primary(self) -> P {
        self.primary
    }

    /// Split the record into its primary and suppressed failures
    ///
    /// # Examples
    ///
    /// ```
    /// use closeable_chain::Suppressed;
    ///
    /// let (primary, rest) = Suppressed::new(1).with_suppressed(2).into_parts();
    /// assert_eq!(primary, 1);
    /// assert_eq!(rest, vec![2]);
    /// ```
    pub fn into_parts(self) -> (P, Vec<S>) {
        (self.primary, self.suppressed)
    }

    /// Transform the primary, keeping the suppressed list intact
    pub fn map_primary<Q, F>(self, f: F) -> Suppressed<Q, S>
    where
        F: FnOnce(P) -> Q,
    {
        Suppressed {
            primary: f(self.primary),
            suppressed: self.suppressed,
        }
    }

    /// Transform every suppressed failure, preserving order
    pub fn map_suppressed<T, F>(self, f: F) -> Suppressed<P, T>
    where
        F: FnMut(S) -> T,
    {
        Suppressed {
            primary: self.primary,
            suppressed: self.suppressed.into_iter().map(f).collect(),
        }
    }
}

impl<P, S> From<P> for Suppressed<P, S> {
    fn from(primary: P) -> Self {
        Suppressed::new(primary)
    }
}

impl<P: fmt::Display, S: fmt::Display> fmt::Display for Suppressed<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;

        for failure in &self.suppressed {
            write!(f, "\n  suppressed: {}", failure)?;
        }

        Ok(())
    }
}

impl<P, S> StdError for Suppressed<P, S>
where
    P: StdError + 'static,
    S: fmt::Debug + fmt::Display,
{
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.primary)
    }
}
