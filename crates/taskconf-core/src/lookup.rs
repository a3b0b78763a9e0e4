//! Environment lookups
//!
//! An [`EnvLookup`] answers "what is the value of variable `NAME`?" for the
//! interpolation engine. It is queried once per placeholder occurrence and
//! never cached, so a lookup backed by a changing source sees every change.

use std::collections::HashMap;
use std::hash::BuildHasher;

use indexmap::IndexMap;

/// Read-only source of variable values consulted during resolution
pub trait EnvLookup {
    /// Return the value of `name`, or `None` if it is not set
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Lookup backed by the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        // The OS cannot hold such names; report them as unset
        if name.is_empty() || name.contains('=') || name.contains('\0') {
            return None;
        }
        std::env::var(name).ok()
    }
}

impl<T: EnvLookup + ?Sized> EnvLookup for &T {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }
}

impl<T: EnvLookup + ?Sized> EnvLookup for Box<T> {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }
}

impl<S: BuildHasher> EnvLookup for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<S: BuildHasher> EnvLookup for IndexMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// A simple function-based lookup
pub struct FnLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    func: F,
}

impl<F> FnLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Create a new function-based lookup
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> EnvLookup for FnLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, name: &str) -> Option<String> {
        (self.func)(name)
    }
}

/// Two lookups stacked: `upper` wins, `lower` answers whatever `upper` lacks
#[derive(Debug, Clone, Default)]
pub struct Layered<A, B> {
    upper: A,
    lower: B,
}

impl<A: EnvLookup, B: EnvLookup> Layered<A, B> {
    pub fn new(upper: A, lower: B) -> Self {
        Self { upper, lower }
    }
}

impl<A: EnvLookup, B: EnvLookup> EnvLookup for Layered<A, B> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.upper
            .lookup(name)
            .or_else(|| self.lower.lookup(name))
    }
}
