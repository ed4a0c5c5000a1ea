//! The `try_await` combinators.

use core::future::{Future, IntoFuture};
use core::panic::Location;
use std::error::Error as StdError;

use crate::caught::Caught;
use crate::failure::Failure;
use crate::selector::Selector;

/// Await `operation` and return its failure as a value instead of an `Err`.
///
/// Every failure is converted. The failure gets one trace frame pointing at
/// the call to `try_await`; an error that already is a [`Failure`] is kept
/// as-is rather than wrapped again.
///
/// ```
/// use try_await::{try_await, Caught};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let caught = try_await(async { "42".parse::<i32>() }).await;
/// assert_eq!(caught.value(), Some(42));
///
/// let caught = try_await(async { "forty-two".parse::<i32>() }).await;
/// let (err, value) = caught.into_pair();
/// assert!(err.unwrap().is::<std::num::ParseIntError>());
/// assert!(value.is_none());
/// # }
/// ```
#[track_caller]
pub fn try_await<F, T, E>(operation: F) -> impl Future<Output = Caught<T, Failure>>
where
    F: IntoFuture<Output = Result<T, E>>,
    E: StdError + Send + Sync + 'static,
{
    let caught_at = Location::caller();
    async move { convert(operation.await, caught_at) }
}

/// Await `operation`, converting only the failures `selector` matches.
///
/// Returns `Ok(Caught)` for a value or a converted failure, and `Err` with
/// the untouched failure otherwise, ready to be re-raised with `?`.
/// With a [`Kinds`](crate::Kinds) selector the converted failure is narrowed
/// to the listed kinds.
///
/// ```
/// use try_await::{try_await_with, Caught, Kinds};
/// use std::{fmt, io};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), try_await::Failure> {
/// let op = async { Err::<(), _>(io::Error::new(io::ErrorKind::Other, "disk full")) };
/// let caught = try_await_with(op, Kinds::<(io::Error,)>::new()).await?;
/// assert_eq!(caught.failure().unwrap().message(), "disk full");
///
/// let op = async { Err::<(), _>(fmt::Error) };
/// let unexpected = try_await_with(op, Kinds::<(io::Error,)>::new()).await;
/// assert!(unexpected.unwrap_err().is::<fmt::Error>());
/// # Ok(())
/// # }
/// ```
#[track_caller]
pub fn try_await_with<F, T, E, S>(
    operation: F,
    selector: S,
) -> impl Future<Output = Result<Caught<T, S::Narrowed>, Failure>>
where
    F: IntoFuture<Output = Result<T, E>>,
    E: StdError + Send + Sync + 'static,
    S: Selector,
{
    let caught_at = Location::caller();
    async move { classify(operation.await, &selector, caught_at) }
}

/// Convert every failure.
pub(crate) fn convert<T, E>(
    outcome: Result<T, E>,
    caught_at: &'static Location<'static>,
) -> Caught<T, Failure>
where
    E: StdError + Send + Sync + 'static,
{
    match outcome {
        Ok(value) => Caught::Value(value),
        Err(e) => Caught::Failed(Failure::wrap(e).at(caught_at)),
    }
}

/// Convert the failures `selector` matches; hand the rest back untouched.
pub(crate) fn classify<T, E, S>(
    outcome: Result<T, E>,
    selector: &S,
    caught_at: &'static Location<'static>,
) -> Result<Caught<T, S::Narrowed>, Failure>
where
    E: StdError + Send + Sync + 'static,
    S: Selector + ?Sized,
{
    let failure = match outcome {
        Ok(value) => return Ok(Caught::Value(value)),
        Err(e) => Failure::wrap(e),
    };
    if !selector.matches(&failure) {
        return Err(failure);
    }
    selector.select(failure.at(caught_at)).map(Caught::Failed)
}
