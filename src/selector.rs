//! Selectors decide which failures get converted into a [`Caught`](crate::Caught).
//!
//! A failure a selector does not match is handed back untouched so the
//! caller can propagate it with `?`.

use core::any::type_name;
use core::fmt;
use core::marker::PhantomData;
use std::error::Error as StdError;

use crate::failure::{Error, Failure, Frames};

// ============================================================
// Selector trait
// ============================================================

/// Picks the failure kinds to convert, and the shape they are converted to.
///
/// [`matches`](Selector::matches) is the whole decision: a failure is
/// converted if and only if it returns `true`, and it is asked exactly
/// once per failure. [`select`](Selector::select) is only called after
/// `matches` returned `true`; it repackages the failure into `Narrowed`
/// without deciding anything again.
pub trait Selector {
    /// Static type of a converted failure.
    type Narrowed;

    /// Does this failure belong to one of the selected kinds?
    fn matches(&self, failure: &Failure) -> bool;

    /// Convert a failure that already matched into the narrowed type.
    ///
    /// The failure may have gained a catch-site frame since `matches` saw
    /// it. `Err` is only for a failure that is not of a selected kind,
    /// which a caller honoring `matches` never passes in.
    fn select(&self, failure: Failure) -> Result<Self::Narrowed, Failure>;
}

impl<S: Selector + ?Sized> Selector for &S {
    type Narrowed = S::Narrowed;

    #[inline]
    fn matches(&self, failure: &Failure) -> bool {
        (**self).matches(failure)
    }

    #[inline]
    fn select(&self, failure: Failure) -> Result<Self::Narrowed, Failure> {
        (**self).select(failure)
    }
}

// ============================================================
// Kinds - statically typed selector
// ============================================================

/// Selects the failure kinds listed in the tuple `K`.
///
/// Implemented for tuples of one to four error types. A single kind
/// narrows to [`Failure<K>`](Failure); several narrow to the matching
/// `AnyOfN` enum. There is no selector for `()`.
///
/// ```
/// use try_await::{Failure, Kinds, Selector};
/// use std::{fmt, io};
///
/// let failure = Failure::wrap(io::Error::new(io::ErrorKind::Other, "refused"));
/// assert!(Kinds::<(io::Error,)>::new().matches(&failure));
/// assert!(!Kinds::<(fmt::Error,)>::new().matches(&failure));
/// ```
pub struct Kinds<K>(PhantomData<fn() -> K>);

impl<K> Kinds<K> {
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K> Default for Kinds<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for Kinds<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Kinds<K> {}

impl<K> fmt::Debug for Kinds<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kinds<{}>", type_name::<K>())
    }
}

impl<A: StdError + Send + Sync + 'static> Selector for Kinds<(A,)> {
    type Narrowed = Failure<A>;

    #[inline]
    fn matches(&self, failure: &Failure) -> bool {
        failure.is::<A>()
    }

    #[inline]
    fn select(&self, failure: Failure) -> Result<Failure<A>, Failure> {
        failure.downcast::<A>()
    }
}

// Generates an `AnyOfN` enum and the `Kinds` selector that narrows to it.
// Kinds are tried in listed order, so a duplicated kind lands in its
// first position.
macro_rules! any_of {
    ($(#[$doc:meta])* $name:ident { $($variant:ident => $kind:ident),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub enum $name<$($kind),+> {
            $( $variant(Failure<$kind>), )+
        }

        impl<$($kind: fmt::Display),+> $name<$($kind),+> {
            /// Message of the underlying failure, whatever its kind.
            pub fn message(&self) -> &str {
                match self {
                    $( Self::$variant(f) => f.message(), )+
                }
            }
        }

        impl<$($kind),+> $name<$($kind),+> {
            /// Type name of the matched kind.
            pub fn kind_name(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => type_name::<$kind>(), )+
                }
            }

            /// Frames of the underlying failure.
            pub fn frames(&self) -> Frames<'_> {
                match self {
                    $( Self::$variant(f) => f.frames(), )+
                }
            }
        }

        impl<$($kind: StdError + 'static),+> $name<$($kind),+> {
            /// The underlying error as a trait object.
            pub fn as_error(&self) -> &(dyn StdError + 'static) {
                match self {
                    $( Self::$variant(f) => f.source_ref(), )+
                }
            }
        }

        impl<$($kind: StdError + Send + Sync + 'static),+> $name<$($kind),+> {
            /// Forget which kind matched.
            pub fn erase(self) -> Failure<Error> {
                match self {
                    $( Self::$variant(f) => f.erase(), )+
                }
            }
        }

        impl<$($kind: fmt::Display),+> fmt::Display for $name<$($kind),+> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( Self::$variant(inner) => fmt::Display::fmt(inner, f), )+
                }
            }
        }

        impl<$($kind: StdError + Send + Sync + 'static),+> Selector for Kinds<($($kind,)+)> {
            type Narrowed = $name<$($kind),+>;

            #[inline]
            fn matches(&self, failure: &Failure) -> bool {
                false $( || failure.is::<$kind>() )+
            }

            fn select(&self, failure: Failure) -> Result<Self::Narrowed, Failure> {
                $(
                    let failure = match failure.downcast::<$kind>() {
                        Ok(narrowed) => return Ok($name::$variant(narrowed)),
                        Err(failure) => failure,
                    };
                )+
                Err(failure)
            }
        }
    };
}

any_of! {
    /// A converted failure known to be one of two kinds.
    ///
    /// Branching on it is exhaustive:
    ///
    /// ```
    /// use try_await::AnyOf2;
    /// use std::{fmt, io};
    ///
    /// fn describe(e: &AnyOf2<io::Error, fmt::Error>) -> &'static str {
    ///     match e {
    ///         AnyOf2::First(_) => "io",
    ///         AnyOf2::Second(_) => "fmt",
    ///     }
    /// }
    /// ```
    ///
    /// and leaving a kind out does not compile:
    ///
    /// ```compile_fail
    /// use try_await::AnyOf2;
    /// use std::{fmt, io};
    ///
    /// fn describe(e: &AnyOf2<io::Error, fmt::Error>) -> &'static str {
    ///     match e {
    ///         AnyOf2::First(_) => "io",
    ///     }
    /// }
    /// ```
    AnyOf2 { First => A, Second => B }
}

any_of! {
    /// A converted failure known to be one of three kinds.
    AnyOf3 { First => A, Second => B, Third => C }
}

any_of! {
    /// A converted failure known to be one of four kinds.
    AnyOf4 { First => A, Second => B, Third => C, Fourth => D }
}

// ============================================================
// KindSet - runtime selector
// ============================================================

type Descriptor = Box<dyn Fn(&Failure) -> bool + Send + Sync>;

/// Runtime list of failure kinds, built one descriptor at a time.
///
/// A descriptor is either a kind (`of`/`or`) or a predicate over the
/// failure (`when`/`or_when`). A failure matches when any descriptor does.
/// Converted failures keep the erased [`Failure`] type.
///
/// ```
/// use try_await::{Failure, KindSet, Selector};
/// use std::{fmt, io};
///
/// let kinds = KindSet::of::<fmt::Error>().or::<io::Error>();
/// assert!(kinds.matches(&Failure::wrap(fmt::Error)));
/// assert!(!kinds.matches(&Failure::msg("other")));
/// ```
pub struct KindSet {
    descriptors: Vec<Descriptor>,
}

impl KindSet {
    /// Start with a single kind.
    pub fn of<K: StdError + 'static>() -> Self {
        Self::when(|f: &Failure| f.is::<K>())
    }

    /// Start with a single predicate.
    pub fn when<P>(predicate: P) -> Self
    where
        P: Fn(&Failure) -> bool + Send + Sync + 'static,
    {
        Self {
            descriptors: vec![Box::new(predicate)],
        }
    }

    /// Also select kind `K`.
    pub fn or<K: StdError + 'static>(self) -> Self {
        self.or_when(|f: &Failure| f.is::<K>())
    }

    /// Also select failures matching `predicate`.
    pub fn or_when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&Failure) -> bool + Send + Sync + 'static,
    {
        self.descriptors.push(Box::new(predicate));
        self
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindSet")
            .field("descriptors", &self.descriptors.len())
            .finish()
    }
}

impl Selector for KindSet {
    type Narrowed = Failure;

    fn matches(&self, failure: &Failure) -> bool {
        self.descriptors.iter().any(|d| d(failure))
    }

    // Descriptors run once, in `matches`.
    #[inline]
    fn select(&self, failure: Failure) -> Result<Failure, Failure> {
        Ok(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::StringError;
    use std::io;

    #[derive(Debug)]
    struct Transport;

    impl fmt::Display for Transport {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("transport down")
        }
    }

    impl StdError for Transport {}

    fn io_err(msg: &str) -> io::Error {
        io::Error::new(io::ErrorKind::Other, msg)
    }

    #[test]
    fn test_single_kind_narrows_to_typed_failure() {
        let selected = Kinds::<(io::Error,)>::new()
            .select(Failure::wrap(io_err("disk full")))
            .unwrap();
        assert_eq!(selected.source_ref().to_string(), "disk full");
    }

    #[test]
    fn test_unlisted_kind_is_returned_unchanged() {
        let failure = Failure::wrap(Transport).here();
        let back = Kinds::<(io::Error, fmt::Error)>::new().select(failure).unwrap_err();
        assert!(back.is::<Transport>());
        assert_eq!(back.depth(), 1);
    }

    #[test]
    fn test_second_kind_lands_in_second_variant() {
        let selected = Kinds::<(io::Error, Transport)>::new()
            .select(Failure::wrap(Transport))
            .unwrap();
        assert!(matches!(selected, AnyOf2::Second(_)));
        assert_eq!(selected.message(), "transport down");
        assert!(selected.kind_name().ends_with("Transport"));
    }

    #[test]
    fn test_duplicate_kind_is_harmless() {
        let kinds = Kinds::<(Transport, Transport)>::new();
        assert!(kinds.matches(&Failure::wrap(Transport)));
        assert!(matches!(
            kinds.select(Failure::wrap(Transport)).unwrap(),
            AnyOf2::First(_)
        ));
    }

    #[test]
    fn test_order_does_not_change_matching() {
        let failure = Failure::wrap(Transport);
        assert!(Kinds::<(io::Error, Transport)>::new().matches(&failure));
        assert!(Kinds::<(Transport, io::Error)>::new().matches(&failure));
    }

    #[test]
    fn test_four_kinds() {
        let kinds = Kinds::<(io::Error, fmt::Error, Transport, StringError)>::new();
        let selected = kinds.select(Failure::msg("plain")).unwrap();
        assert!(matches!(selected, AnyOf4::Fourth(_)));
        assert_eq!(selected.as_error().to_string(), "plain");
    }

    #[test]
    fn test_kind_set_predicate() {
        let kinds = KindSet::when(|f: &Failure| f.message().starts_with("retry"));
        assert!(kinds.matches(&Failure::msg("retry later")));
        assert!(!kinds.matches(&Failure::msg("fatal")));
    }

    #[test]
    fn test_kind_set_mixes_kinds_and_predicates() {
        let kinds = KindSet::of::<Transport>().or_when(|f: &Failure| f.message() == "timeout");
        assert!(kinds.matches(&Failure::wrap(Transport)));
        assert!(kinds.matches(&Failure::msg("timeout")));
        assert!(!kinds.matches(&Failure::wrap(io_err("eof"))));
    }

    #[test]
    fn test_selector_by_reference() {
        let kinds = KindSet::of::<Transport>();
        let by_ref = &kinds;
        assert!(by_ref.matches(&Failure::wrap(Transport)));
        assert!(by_ref.select(Failure::wrap(Transport)).is_ok());
    }

    #[test]
    fn test_kind_set_select_does_not_rerun_descriptors() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let kinds = KindSet::when(move |_: &Failure| {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        });
        assert!(kinds.select(Failure::msg("anything").here()).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
