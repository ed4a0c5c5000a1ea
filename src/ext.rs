//! Extension traits for futures and results.

use core::future::{Future, IntoFuture};
use core::panic::Location;
use std::error::Error as StdError;

use crate::caught::Caught;
use crate::combinator::{classify, convert, try_await, try_await_with};
use crate::failure::Failure;
use crate::selector::Selector;

/// Method form of [`try_await`] and [`try_await_with`].
///
/// ```
/// use try_await::{Caught, TryAwaitExt};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let caught = async { Err::<u8, _>(std::fmt::Error) }.caught().await;
/// assert!(caught.is_failed());
/// # }
/// ```
pub trait TryAwaitExt<T, E>: IntoFuture<Output = Result<T, E>> + Sized {
    /// Await, converting every failure.
    fn caught(self) -> impl Future<Output = Caught<T, Failure>>;

    /// Await, converting only the failures `selector` matches.
    fn caught_with<S: Selector>(
        self,
        selector: S,
    ) -> impl Future<Output = Result<Caught<T, S::Narrowed>, Failure>>;
}

impl<F, T, E> TryAwaitExt<T, E> for F
where
    F: IntoFuture<Output = Result<T, E>>,
    E: StdError + Send + Sync + 'static,
{
    #[track_caller]
    fn caught(self) -> impl Future<Output = Caught<T, Failure>> {
        try_await(self)
    }

    #[track_caller]
    fn caught_with<S: Selector>(
        self,
        selector: S,
    ) -> impl Future<Output = Result<Caught<T, S::Narrowed>, Failure>> {
        try_await_with(self, selector)
    }
}

/// The same conversion for a result that is already available.
///
/// ```
/// use try_await::{CatchExt, KindSet};
/// use std::num::ParseIntError;
///
/// # fn main() -> Result<(), try_await::Failure> {
/// let caught = "x".parse::<i32>().caught_with(KindSet::of::<ParseIntError>())?;
/// assert!(caught.is_failed());
/// # Ok(())
/// # }
/// ```
pub trait CatchExt<T> {
    /// Convert any failure.
    fn caught(self) -> Caught<T, Failure>;

    /// Convert only the failures `selector` matches.
    fn caught_with<S: Selector>(self, selector: S) -> Result<Caught<T, S::Narrowed>, Failure>;
}

impl<T, E> CatchExt<T> for Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    #[track_caller]
    fn caught(self) -> Caught<T, Failure> {
        convert(self, Location::caller())
    }

    #[track_caller]
    fn caught_with<S: Selector>(self, selector: S) -> Result<Caught<T, S::Narrowed>, Failure> {
        classify(self, &selector, Location::caller())
    }
}
