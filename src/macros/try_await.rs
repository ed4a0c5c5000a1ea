//! The `try_await!` macro - call-site shorthand for the combinators.

/// Await an operation and get its failure back as a value.
///
/// - `try_await!(op)` expands to [`try_await(op)`](crate::try_await()).
/// - `try_await!(op, [K1, K2, ..])` expands to
///   [`try_await_with`](crate::try_await_with) with a
///   [`Kinds`](crate::Kinds) selector over the listed kinds.
///
/// Both forms produce a future; `.await` it.
///
/// ## Every failure
/// ```
/// use try_await::{try_await, Caught};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let caught = try_await!(async { Ok::<_, std::fmt::Error>("ok") }).await;
/// assert_eq!(caught.into_pair().1, Some("ok"));
/// # }
/// ```
///
/// ## Listed kinds
/// ```
/// use try_await::{try_await, AnyOf2, Caught};
/// use std::{fmt, io};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), try_await::Failure> {
/// let op = async { Err::<(), _>(fmt::Error) };
/// match try_await!(op, [io::Error, fmt::Error]).await? {
///     Caught::Failed(AnyOf2::First(e)) => panic!("io: {e}"),
///     Caught::Failed(AnyOf2::Second(e)) => assert!(e.message().contains("formatting")),
///     Caught::Value(()) => panic!("expected a failure"),
/// }
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! try_await {
    ($op:expr, [$($kind:ty),+ $(,)?] $(,)?) => {
        $crate::try_await_with($op, $crate::Kinds::<($($kind,)+)>::new())
    };

    ($op:expr $(,)?) => {
        $crate::try_await($op)
    };
}
