//! The two-slot outcome of awaiting an operation.

/// Outcome of a caught operation: a value, or the failure it produced.
///
/// Exactly one side is ever present. [`Caught::into_pair`] gives the
/// `(error, value)` view where one slot is always `None`.
///
/// A `Caught` only ever holds *converted* failures. Failures a selector
/// did not ask for never end up here; they come back through the outer
/// `Result` of [`try_await_with`](crate::try_await_with) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "this `Caught` may hold a failure, which should be handled"]
pub enum Caught<T, E> {
    /// The operation completed with a value.
    Value(T),
    /// The operation failed and the failure was converted.
    Failed(E),
}

impl<T, E> Caught<T, E> {
    #[inline]
    pub const fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    #[inline]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The value, discarding any failure.
    #[inline]
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Failed(_) => None,
        }
    }

    /// The failure, discarding any value.
    #[inline]
    pub fn failure(self) -> Option<E> {
        match self {
            Self::Value(_) => None,
            Self::Failed(e) => Some(e),
        }
    }

    #[inline]
    pub const fn as_ref(&self) -> Caught<&T, &E> {
        match self {
            Self::Value(v) => Caught::Value(v),
            Self::Failed(e) => Caught::Failed(e),
        }
    }

    /// Split into `(error, value)`.
    ///
    /// ```
    /// use try_await::Caught;
    ///
    /// let (err, value) = Caught::<_, String>::Value("ok").into_pair();
    /// assert!(err.is_none());
    /// assert_eq!(value, Some("ok"));
    /// ```
    #[inline]
    pub fn into_pair(self) -> (Option<E>, Option<T>) {
        match self {
            Self::Value(v) => (None, Some(v)),
            Self::Failed(e) => (Some(e), None),
        }
    }

    #[inline]
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Value(v) => Ok(v),
            Self::Failed(e) => Err(e),
        }
    }

    /// Map the value, leaving a failure untouched.
    #[inline]
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Caught<U, E> {
        match self {
            Self::Value(v) => Caught::Value(f(v)),
            Self::Failed(e) => Caught::Failed(e),
        }
    }

    /// Map the failure, leaving a value untouched.
    #[inline]
    pub fn map_failure<O, F: FnOnce(E) -> O>(self, f: F) -> Caught<T, O> {
        match self {
            Self::Value(v) => Caught::Value(v),
            Self::Failed(e) => Caught::Failed(f(e)),
        }
    }

    /// The value, or one recovered from the failure.
    #[inline]
    pub fn unwrap_or_else<F: FnOnce(E) -> T>(self, f: F) -> T {
        match self {
            Self::Value(v) => v,
            Self::Failed(e) => f(e),
        }
    }
}

impl<T, E> From<Result<T, E>> for Caught<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Self::Value(v),
            Err(e) => Self::Failed(e),
        }
    }
}

impl<T, E> From<Caught<T, E>> for Result<T, E> {
    fn from(caught: Caught<T, E>) -> Self {
        caught.into_result()
    }
}
