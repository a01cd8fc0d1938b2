//! # Closeable Chain
//!
//! Acquire a sequence of dependent resources, each built from the one before
//! it, and release them in reverse order, even when acquisition stops halfway
//! or a release fails.
//!
//! ## Model
//!
//! - A [`Chain`] starts empty and grows one link per [`Chain::append`]. Each
//!   link pairs the value it acquired with the action that releases it.
//! - If an acquire step fails, the links built so far are released, last
//!   first, and the acquire error is returned with every release error
//!   suppressed into it.
//! - Once the chain is complete, use [`Chain::output`] and then call
//!   [`Chain::close`]. The first release failure is returned as the primary,
//!   later ones are suppressed under it.
//! - Failures are reported as [`Suppressed`]: one primary error and an ordered
//!   list of suppressed errors.
//!
//! ## Quick Example
//!
//! ```rust
//! use closeable_chain::prelude::*;
//!
//! #[derive(Debug)]
//! struct Pool(&'static str);
//! #[derive(Debug)]
//! struct Conn(&'static str);
//!
//! fn open() -> Result<Chain<Conn, String>, Suppressed<String>> {
//!     Chain::new()
//!         .append(|_| Ok::<_, String>(Pool("db")), |_pool| Ok(()))?
//!         .append(|pool| Ok::<_, String>(Conn(pool.0)), |_conn| Ok(()))
//! }
//!
//! let chain = open().unwrap();
//! assert_eq!(chain.output().0, "db");
//!
//! match chain.close() {
//!     Ok(()) => {}
//!     Err(failure) => println!("teardown failed: {}", failure),
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Effect |
//! |---------|--------|
//! | `tracing` | Log link acquisition, rollback and release failures with `tracing` |
//! | `serde` | `Serialize`/`Deserialize` for [`Suppressed`] |
//! | `proptest` | `Arbitrary` for [`Suppressed`] |

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod chain;
pub mod guard;
pub mod suppressed;
pub mod testing;

// Re-exports
pub use chain::Chain;
pub use guard::{run_on_close, wrap, wrap_with, Closing, OnClose};
pub use suppressed::Suppressed;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::chain::Chain;
    pub use crate::guard::{run_on_close, wrap, wrap_with, Closing, OnClose};
    pub use crate::suppressed::Suppressed;
}
