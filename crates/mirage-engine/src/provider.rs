//! Value providers for template variables
//!
//! A [`Provider`] produces the string a variable token is replaced with.
//! Its [`Retention`] tells the resolver whether the value may be frozen
//! after the first successful computation (`Cached`) or must be recomputed
//! on every resolution (`Lazy`).
//!
//! Providers do not cache themselves; the resolver holding them enforces
//! retention, so a plain closure is a valid `Cached` provider.

use serde::{Deserialize, Serialize};

/// How long a provider's value is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retention {
    /// Recompute on every resolution
    Lazy,
    /// Compute once, then freeze
    #[default]
    Cached,
}

/// A source of a variable's value
pub trait Provider: Send + Sync {
    /// Produce the value, or `None` when it cannot be produced right now
    fn get(&self) -> Option<String>;

    /// Retention policy for the produced value
    fn retention(&self) -> Retention;
}

/// Provider that always yields the same string
#[derive(Debug, Clone)]
pub struct ConstantProvider(String);

impl Provider for ConstantProvider {
    fn get(&self) -> Option<String> {
        Some(self.0.clone())
    }

    fn retention(&self) -> Retention {
        Retention::Cached
    }
}

/// Provider backed by a closure
pub struct FnProvider<F> {
    f: F,
    retention: Retention,
}

impl<F> Provider for FnProvider<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn get(&self) -> Option<String> {
        (self.f)()
    }

    fn retention(&self) -> Retention {
        self.retention
    }
}

/// A constant, `Cached` provider
pub fn constant(value: impl Into<String>) -> ConstantProvider {
    ConstantProvider(value.into())
}

/// A fallible closure provider with an explicit retention
pub fn from_fn<F>(f: F, retention: Retention) -> FnProvider<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    FnProvider { f, retention }
}

/// A closure provider recomputed on every resolution
pub fn lazy<F, S>(f: F) -> FnProvider<impl Fn() -> Option<String> + Send + Sync>
where
    F: Fn() -> S + Send + Sync,
    S: Into<String>,
{
    from_fn(move || Some(f().into()), Retention::Lazy)
}

/// A closure provider computed once per resolver
pub fn cached<F, S>(f: F) -> FnProvider<impl Fn() -> Option<String> + Send + Sync>
where
    F: Fn() -> S + Send + Sync,
    S: Into<String>,
{
    from_fn(move || Some(f().into()), Retention::Cached)
}
