//! Failure carrier and related structures.

use core::fmt;
use core::panic::Location;
use core::slice;
use std::error::Error as StdError;
use std::sync::OnceLock;

use smallvec::SmallVec;

/// Default limits for trace depth
pub const DEFAULT_LOCATION_LIMIT: usize = 32;
pub const DEFAULT_CONTEXT_LIMIT: usize = 8;

/// Frames stored inline before the trace spills to the heap.
/// A caught failure usually carries one or two.
const INLINE_CAPACITY: usize = 4;

// ============================================================
// Core types
// ============================================================

/// A failure observed while awaiting an operation.
///
/// `Failure<E>` holds the original error value (its *source*) and adds:
/// - A trace of the places where the failure was caught
/// - Optional context messages attached to those places
///
/// # Type Parameters
///
/// - `E` - The error type. Defaults to [`Error`], the type-erased form
///   every combinator produces before a selector narrows it.
///
/// The kind of a failure is the Rust type of its source. Checking a kind
/// is a downcast, so new kinds never require changes here.
///
/// # Examples
///
/// ```
/// use try_await::Failure;
/// use std::io;
///
/// let failure = Failure::wrap(io::Error::new(io::ErrorKind::Other, "disk full"));
/// assert!(failure.is::<io::Error>());
/// assert_eq!(failure.message(), "disk full");
/// ```
#[derive(Debug)]
pub struct Failure<E = Error> {
    pub(crate) source: E,
    /// Computed from `source` on first access.
    pub(crate) message: OnceLock<String>,
    pub(crate) locations: SmallVec<[&'static Location<'static>; INLINE_CAPACITY]>,
    /// Only allocated once `.context()` is used.
    pub(crate) contexts: Option<Vec<ContextEntry>>,
}

/// Type-erased error wrapper.
///
/// A newtype around `Box<dyn StdError>`. It does NOT implement `Error`
/// itself, which keeps `From<E: Error> for Error` free of conflicts.
#[derive(Debug)]
pub struct Error(Box<dyn StdError + Send + Sync + 'static>);

impl Error {
    /// Create from any error type.
    #[inline]
    pub fn new<E: StdError + Send + Sync + 'static>(e: E) -> Self {
        Self(Box::new(e))
    }

    /// Create from a boxed error.
    #[inline]
    pub fn from_box(e: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Self(e)
    }

    /// Get the inner error without the `Send + Sync` bounds.
    #[inline]
    pub fn as_dyn_error(&self) -> &(dyn StdError + 'static) {
        self.0.as_ref()
    }

    /// Whether the inner error is of type `T`.
    #[inline]
    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Try to downcast to a specific error type.
    #[inline]
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Try to downcast and consume the error.
    #[inline]
    pub fn downcast<T: StdError + 'static>(self) -> core::result::Result<T, Self> {
        match self.0.downcast::<T>() {
            Ok(e) => Ok(*e),
            Err(e) => Err(Self(e)),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<E: StdError + Send + Sync + 'static> From<E> for Error {
    fn from(e: E) -> Self {
        Error::new(e)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ContextEntry {
    pub(crate) location_idx: u16,
    pub(crate) message: String,
}

/// View into a single frame of the trace.
#[derive(Debug, Clone)]
pub struct FrameView<'a> {
    /// Source file path
    pub file: &'a str,
    /// Line number
    pub line: u32,
    /// Column number
    pub col: u32,
    /// Optional context message
    pub context: Option<&'a str>,
}

/// Iterator over the frames of a [`Failure`], oldest first.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    locations: core::iter::Enumerate<slice::Iter<'a, &'static Location<'static>>>,
    contexts: &'a [ContextEntry],
}

impl<'a> Iterator for Frames<'a> {
    type Item = FrameView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, loc) = self.locations.next()?;
        let context = self
            .contexts
            .iter()
            .find(|c| c.location_idx as usize == idx)
            .map(|c| c.message.as_str());
        Some(FrameView {
            file: loc.file(),
            line: loc.line(),
            col: loc.column(),
            context,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.locations.size_hint()
    }
}

impl ExactSizeIterator for Frames<'_> {}

/// Plain message error used by [`Failure::msg`].
#[derive(Debug)]
pub struct StringError(pub(crate) String);

impl fmt::Display for StringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for StringError {}

// ============================================================
// Failure<E> - generic over error type
// ============================================================

impl<E> Failure<E> {
    /// Create a failure around an error, with an empty trace.
    #[inline]
    pub fn new(source: E) -> Self {
        Self {
            source,
            message: OnceLock::new(),
            locations: SmallVec::new(),
            contexts: None,
        }
    }

    /// Record a location in the trace. Dropped silently past the limit.
    #[inline]
    pub(crate) fn at(mut self, location: &'static Location<'static>) -> Self {
        if self.locations.len() < DEFAULT_LOCATION_LIMIT {
            self.locations.push(location);
        }
        self
    }

    /// Add a frame at the caller's location.
    #[track_caller]
    pub fn here(self) -> Self {
        self.at(Location::caller())
    }

    /// Attach a context message to the most recent frame.
    ///
    /// Replaces any message already attached to that frame. A failure with
    /// an empty trace gets a frame at the caller's location first.
    #[track_caller]
    pub fn context(self, msg: impl Into<String>) -> Self {
        let mut this = if self.locations.is_empty() {
            self.at(Location::caller())
        } else {
            self
        };
        let location_idx = this.locations.len().saturating_sub(1) as u16;
        let contexts = this.contexts.get_or_insert_with(Vec::new);

        if let Some(entry) = contexts.iter_mut().find(|e| e.location_idx == location_idx) {
            entry.message = msg.into();
        } else if contexts.len() < DEFAULT_CONTEXT_LIMIT {
            contexts.push(ContextEntry {
                location_idx,
                message: msg.into(),
            });
        }
        this
    }

    /// Get the error message, computing it lazily on first access.
    pub fn message(&self) -> &str
    where
        E: fmt::Display,
    {
        self.message.get_or_init(|| self.source.to_string())
    }

    /// Get the underlying error.
    pub fn source_ref(&self) -> &E {
        &self.source
    }

    /// Consume and return the underlying error.
    pub fn into_source(self) -> E {
        self.source
    }

    /// Iterate over frames in the trace.
    pub fn frames(&self) -> Frames<'_> {
        Frames {
            locations: self.locations.iter().enumerate(),
            contexts: self.contexts.as_deref().unwrap_or(&[]),
        }
    }

    /// Number of frames in the trace.
    pub fn depth(&self) -> usize {
        self.locations.len()
    }

    /// Convert to a type-erased failure, keeping the trace.
    pub fn erase(self) -> Failure<Error>
    where
        E: StdError + Send + Sync + 'static,
    {
        Failure {
            source: Error::new(self.source),
            message: self.message,
            locations: self.locations,
            contexts: self.contexts,
        }
    }

    /// Map the source while preserving the trace.
    pub fn map_source<F, O>(self, f: F) -> Failure<O>
    where
        F: FnOnce(E) -> O,
    {
        Failure {
            source: f(self.source),
            message: OnceLock::new(),
            locations: self.locations,
            contexts: self.contexts,
        }
    }
}

// ============================================================
// Failure<Error> specific methods (type-erased)
// ============================================================

impl Failure<Error> {
    /// Wrap any error, avoiding double wrapping if it is already a `Failure`.
    ///
    /// A `Failure` passed in is returned as-is, trace included.
    #[inline]
    pub fn wrap<E>(e: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::wrap_box(Box::new(e))
    }

    /// Wrap a boxed error, unwrapping it if it is already a `Failure`.
    #[inline]
    pub fn wrap_box(e: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        match e.downcast::<Self>() {
            Ok(failure) => *failure,
            Err(e) => Self::new(Error::from_box(e)),
        }
    }

    /// Create from a message string.
    #[inline]
    pub fn msg(message: impl Into<String>) -> Self {
        let message = message.into();
        let lock = OnceLock::new();
        let _ = lock.set(message.clone());
        Self {
            source: Error::new(StringError(message)),
            message: lock,
            locations: SmallVec::new(),
            contexts: None,
        }
    }

    /// Get the source as a trait object.
    pub fn root(&self) -> &(dyn StdError + 'static) {
        self.source.as_dyn_error()
    }

    /// Whether this failure is of kind `K`.
    #[inline]
    pub fn is<K: StdError + 'static>(&self) -> bool {
        self.source.is::<K>()
    }

    /// Borrow the source as kind `K`.
    #[inline]
    pub fn downcast_ref<K: StdError + 'static>(&self) -> Option<&K> {
        self.source.downcast_ref::<K>()
    }

    /// Narrow to a typed failure of kind `K`, keeping the trace.
    ///
    /// Hands `self` back unchanged when the kind does not match.
    pub fn downcast<K: StdError + 'static>(self) -> core::result::Result<Failure<K>, Self> {
        if !self.source.is::<K>() {
            return Err(self);
        }
        let Self {
            source,
            message,
            locations,
            contexts,
        } = self;
        match source.downcast::<K>() {
            Ok(source) => Ok(Failure {
                source,
                message,
                locations,
                contexts,
            }),
            Err(source) => Err(Self {
                source,
                message,
                locations,
                contexts,
            }),
        }
    }
}

// ============================================================
// Display and Error implementations
// ============================================================

impl<E: fmt::Display> fmt::Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())?;

        if !self.locations.is_empty() {
            write!(f, "\n\nTrace (most recent last):")?;
            for frame in self.frames() {
                write!(f, "\n  {}:{}:{}", frame.file, frame.line, frame.col)?;
                if let Some(msg) = frame.context {
                    write!(f, "\n    \u{2192} {}", msg)?;
                }
            }
        }

        Ok(())
    }
}

// Only the type-erased form is an `Error`. A blanket impl over `Failure<E>`
// would make `Failure<E>` satisfy the `E: Error` bound in `wrap`.
impl StdError for Failure<Error> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_dyn_error())
    }
}

// ============================================================
// From impls for type-erased Failure
// ============================================================

impl From<&str> for Failure<Error> {
    fn from(s: &str) -> Self {
        Self::msg(s)
    }
}

impl From<String> for Failure<Error> {
    fn from(s: String) -> Self {
        Self::msg(s)
    }
}

impl From<Box<dyn StdError + Send + Sync + 'static>> for Failure<Error> {
    fn from(e: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Self::wrap_box(e)
    }
}

impl From<std::io::Error> for Failure<Error> {
    fn from(e: std::io::Error) -> Self {
        Self::wrap(e)
    }
}

// ============================================================
// Serde support
// ============================================================

#[cfg(feature = "serde")]
mod serde_impl {
    use super::{Error, Failure};
    use serde::{Serialize, Serializer};

    #[derive(Serialize)]
    struct SerializedFrame<'a> {
        file: &'a str,
        line: u32,
        col: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<&'a str>,
    }

    #[derive(Serialize)]
    struct SerializedFailure<'a> {
        message: &'a str,
        trace: Vec<SerializedFrame<'a>>,
    }

    impl Serialize for Failure<Error> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            SerializedFailure {
                message: self.message(),
                trace: self
                    .frames()
                    .map(|frame| SerializedFrame {
                        file: frame.file,
                        line: frame.line,
                        col: frame.col,
                        message: frame.context,
                    })
                    .collect(),
            }
            .serialize(serializer)
        }
    }
}
