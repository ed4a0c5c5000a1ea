//! try-await - await a fallible future, get the failure back as a value
//!
//! # Overview
//!
//! `try-await` turns `operation.await?` into a value you can branch on.
//! A failure is either *converted* into the returned [`Caught`], or, if the
//! caller listed the kinds it expects and this one is not among them,
//! handed back untouched for the caller to re-raise with `?`.
//!
//! # Quick Start
//!
//! ```
//! use try_await::{try_await, AnyOf2, Caught, Result};
//! use std::{fmt, io};
//!
//! async fn fetch() -> std::result::Result<String, io::Error> {
//!     Err(io::Error::new(io::ErrorKind::Other, "disk full"))
//! }
//!
//! async fn run() -> Result<()> {
//!     match try_await!(fetch(), [io::Error, fmt::Error]).await? {
//!         Caught::Failed(AnyOf2::First(e)) => println!("io failure: {}", e.message()),
//!         Caught::Failed(AnyOf2::Second(e)) => println!("format failure: {}", e.message()),
//!         Caught::Value(data) => println!("fetched: {data}"),
//!     }
//!     Ok(())
//! }
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() { run().await.unwrap() }
//! ```
//!
//! # Entry points
//!
//! | Call | Converts | Failure type |
//! |------|----------|--------------|
//! | `try_await(op)` | every failure | `Failure` |
//! | `try_await_with(op, Kinds::<(A,)>::new())` | kind `A` | `Failure<A>` |
//! | `try_await_with(op, Kinds::<(A, B)>::new())` | kinds `A`, `B` | `AnyOf2<A, B>` |
//! | `try_await_with(op, KindSet::of::<A>().or_when(..))` | kinds or predicates | `Failure` |
//! | `try_await!(op)` / `try_await!(op, [A, B])` | as above | as above |
//! | `op.caught()` / `op.caught_with(sel)` | method form ([`TryAwaitExt`]) | as above |
//! | `result.caught()` / `result.caught_with(sel)` | ready results ([`CatchExt`]) | as above |
//!
//! # Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `std` | Required, on by default |
//! | `serde` | `Serialize` for `Failure` (message and trace) |

#[cfg(not(feature = "std"))]
compile_error!("try-await requires the `std` feature");

// ============================================================
// Modules
// ============================================================

mod caught;
mod combinator;
mod ext;
mod failure;
mod macros;
mod selector;

// ============================================================
// Re-exports
// ============================================================

pub use caught::Caught;
pub use combinator::{try_await, try_await_with};
pub use ext::{CatchExt, TryAwaitExt};
pub use failure::{
    Error, Failure, FrameView, Frames, StringError, DEFAULT_CONTEXT_LIMIT, DEFAULT_LOCATION_LIMIT,
};
pub use selector::{AnyOf2, AnyOf3, AnyOf4, KindSet, Kinds, Selector};

// ============================================================
// Type aliases
// ============================================================

/// Result type alias.
///
/// - `Result<T>` = `core::result::Result<T, Failure>` (type-erased)
/// - `Result<T, Failure<io::Error>>` = preserves the concrete kind
pub type Result<T, E = Failure> = core::result::Result<T, E>;
