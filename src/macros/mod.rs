//! Declarative macros for try-await.

// try_await! is exported at the crate root via #[macro_export]
#[macro_use]
mod try_await;
