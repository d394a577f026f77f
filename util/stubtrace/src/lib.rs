#![cfg_attr(not(test), no_std)]

//! Bookkeeping store for coverage stubs.
//!
//! A counterfeit implementation of a kernel service should be deterministic
//! and observable: tests need to see how often each stubbed function ran and
//! with which arguments, and they need to make a particular call fail with a
//! chosen status code. [`StubTable`] provides exactly that, keyed by
//! per-function string constants:
//!
//! - every stub funnels through [`StubTable::record`], which bumps the call
//!   counter, stores the call context, and hands back any injected code;
//! - tests arm failures with [`set_deferred`] (fire on the n-th subsequent
//!   call, once) or [`set_forced`] (fire on every call until cleared), and
//!   inspect what happened via [`count`], [`context`] and [`last_context`].
//!
//! Status codes travel as raw `i32` so this crate stays independent of the
//! error type of the layer under test; callers validate codes on the way out.
//!
//! [`set_deferred`]: StubTable::set_deferred
//! [`set_forced`]: StubTable::set_forced
//! [`count`]: StubTable::count
//! [`context`]: StubTable::context
//! [`last_context`]: StubTable::last_context

extern crate alloc;

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use spin::Mutex;

/// A status code armed to fire on a later call.
struct Deferred {
    remaining: u64,
    code: i32,
}

/// Per-function bookkeeping.
#[derive(Default)]
struct StubEntry {
    count: u64,
    contexts: Vec<String>,
    forced: Option<i32>,
    deferred: Option<Deferred>,
}

impl StubEntry {
    fn injected(&mut self) -> Option<i32> {
        if let Some(d) = self.deferred.as_mut() {
            d.remaining -= 1;
            if d.remaining == 0 {
                let code = d.code;
                self.deferred = None;
                return Some(code);
            }
        }
        self.forced
    }
}

/// Call-recording and return-code-injection store, keyed by function name.
///
/// All state sits behind a single lock; entries are created lazily on first
/// touch, so querying a function that never ran reports a count of zero.
pub struct StubTable {
    entries: Mutex<BTreeMap<&'static str, StubEntry>>,
}

impl StubTable {
    /// Creates an empty table, usable as a `static`.
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Records one call of `func` with its formatted arguments.
    ///
    /// Returns the status code injected for this call, if any: a deferred
    /// code whose countdown expired on this call (consumed once), otherwise
    /// the forced code if one is set.
    pub fn record(&self, func: &'static str, context: String) -> Option<i32> {
        let mut entries = self.entries.lock();
        let entry = entries.entry(func).or_default();
        entry.count += 1;
        entry.contexts.push(context);
        let injected = entry.injected();
        if let Some(code) = injected {
            log::debug!("stub {}: injecting status code {}", func, code);
        }
        injected
    }

    /// Returns how many times `func` has been recorded.
    pub fn count(&self, func: &'static str) -> u64 {
        self.entries
            .lock()
            .get(func)
            .map_or(0, |entry| entry.count)
    }

    /// Returns the context recorded for the `index`-th call of `func`
    /// (0-based).
    pub fn context(&self, func: &'static str, index: usize) -> Option<String> {
        self.entries
            .lock()
            .get(func)
            .and_then(|entry| entry.contexts.get(index).cloned())
    }

    /// Returns the context recorded for the most recent call of `func`.
    pub fn last_context(&self, func: &'static str) -> Option<String> {
        self.entries
            .lock()
            .get(func)
            .and_then(|entry| entry.contexts.last().cloned())
    }

    /// Arms `code` to fire on the `calls`-th subsequent call of `func`.
    ///
    /// `calls` counts from 1: `set_deferred(f, 1, code)` fails the very next
    /// call. The code fires exactly once; the countdown of a previous
    /// unexpired arming is replaced. `calls == 0` is treated as 1.
    pub fn set_deferred(&self, func: &'static str, calls: u64, code: i32) {
        let mut entries = self.entries.lock();
        let entry = entries.entry(func).or_default();
        entry.deferred = Some(Deferred {
            remaining: calls.max(1),
            code,
        });
    }

    /// Arms `code` to fire on every call of `func` until cleared.
    pub fn set_forced(&self, func: &'static str, code: i32) {
        let mut entries = self.entries.lock();
        entries.entry(func).or_default().forced = Some(code);
    }

    /// Disarms any deferred or forced code for `func`, keeping its history.
    pub fn clear_codes(&self, func: &'static str) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(func) {
            entry.forced = None;
            entry.deferred = None;
        }
    }

    /// Drops all counters, contexts and armed codes.
    pub fn reset(&self) {
        self.entries.lock().clear();
    }
}

impl Default for StubTable {
    fn default() -> Self {
        Self::new()
    }
}
