#![cfg_attr(not(test), no_std)]

//! Instrumented counterfeit of the native loader.
//!
//! Linking this crate into a test binary satisfies `modload`'s
//! [`NativeLoaderIf`] at link time, so every native-loader dispatch lands
//! here instead of in a real kernel service. The counterfeit is
//! deterministic and fully observable:
//!
//! - each function records itself (call count plus formatted arguments)
//!   under its key from [`funcs`];
//! - tests may arm status codes per function with [`set_retcode`] /
//!   [`set_forced_retcode`], which the counterfeit returns in place of its
//!   default behavior;
//! - defaults are fixed: `load` hands out sequential handles starting at
//!   [`HANDLE_BASE`], `unload` succeeds, `resolve` answers with the address
//!   configured via [`set_resolved_addr`] ([`DEFAULT_SYMBOL_ADDR`] until
//!   changed).
//!
//! Exactly one `NativeLoaderIf` implementation may be linked into a binary,
//! so this crate must never end up in a production link — it is wired up as
//! a dev-dependency of the test suites only.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use core::sync::atomic::{AtomicUsize, Ordering};

use modload::{LoadFlags, NativeHandle, NativeLoaderIf};
use oserr::{OsError, OsResult};
use stubtrace::StubTable;

/// Stub function keys, as recorded in the call store.
pub mod funcs {
    /// Key for [`modload::NativeLoaderIf::load`].
    pub const NATIVE_LOAD: &str = "native_load";
    /// Key for [`modload::NativeLoaderIf::unload`].
    pub const NATIVE_UNLOAD: &str = "native_unload";
    /// Key for [`modload::NativeLoaderIf::resolve`].
    pub const NATIVE_RESOLVE: &str = "native_resolve";
}

/// First handle value the counterfeit loader hands out.
pub const HANDLE_BASE: usize = 0x1000;

/// Address reported for resolved symbols until overridden.
pub const DEFAULT_SYMBOL_ADDR: usize = 0x4000_0000;

static STUBS: StubTable = StubTable::new();
static NEXT_HANDLE: AtomicUsize = AtomicUsize::new(HANDLE_BASE);
static SYMBOL_ADDR: AtomicUsize = AtomicUsize::new(DEFAULT_SYMBOL_ADDR);

/// Maps a code injected through the store back into a typed error.
fn injected(code: Option<i32>) -> Option<OsError> {
    code.map(|code| {
        OsError::try_from_i32(code).unwrap_or_else(|raw| {
            log::error!("stub store held invalid status code {}", raw);
            OsError::InvalidInput
        })
    })
}

/// Counterfeit native loader linked into coverage test binaries.
struct StubLoader;

#[crate_interface::impl_interface]
impl NativeLoaderIf for StubLoader {
    fn load(file: &str, flags: LoadFlags) -> OsResult<NativeHandle> {
        let context = format!("{} flags={:#x}", file, flags.bits());
        if let Some(err) = injected(STUBS.record(funcs::NATIVE_LOAD, context)) {
            return Err(err);
        }
        Ok(NativeHandle::new(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)))
    }

    fn unload(handle: NativeHandle) -> OsResult {
        let context = format!("{:#x}", handle.as_raw());
        if let Some(err) = injected(STUBS.record(funcs::NATIVE_UNLOAD, context)) {
            return Err(err);
        }
        Ok(())
    }

    fn resolve(handle: Option<NativeHandle>, symbol: &str) -> OsResult<usize> {
        let context = match handle {
            Some(handle) => format!("{:#x} {}", handle.as_raw(), symbol),
            None => format!("global {}", symbol),
        };
        if let Some(err) = injected(STUBS.record(funcs::NATIVE_RESOLVE, context)) {
            return Err(err);
        }
        Ok(SYMBOL_ADDR.load(Ordering::Relaxed))
    }
}

/// Returns how many times the stub keyed by `func` has run.
pub fn call_count(func: &'static str) -> u64 {
    STUBS.count(func)
}

/// Returns the arguments recorded for the most recent call of `func`.
pub fn last_context(func: &'static str) -> Option<String> {
    STUBS.last_context(func)
}

/// Returns the arguments recorded for the `index`-th call of `func`
/// (0-based).
pub fn context(func: &'static str, index: usize) -> Option<String> {
    STUBS.context(func, index)
}

/// Arms `err` to be returned by the `calls`-th subsequent call of `func`,
/// once. `calls` counts from 1.
pub fn set_retcode(func: &'static str, calls: u64, err: OsError) {
    STUBS.set_deferred(func, calls, err.code());
}

/// Arms `err` to be returned by every call of `func` until cleared.
pub fn set_forced_retcode(func: &'static str, err: OsError) {
    STUBS.set_forced(func, err.code());
}

/// Disarms any status codes for `func`, keeping its call history.
pub fn clear_retcodes(func: &'static str) {
    STUBS.clear_codes(func);
}

/// Sets the address `resolve` reports for every symbol.
pub fn set_resolved_addr(addr: usize) {
    SYMBOL_ADDR.store(addr, Ordering::Relaxed);
}

/// Drops all recorded calls and armed codes and restores the default
/// handle sequence and symbol address.
pub fn reset_all() {
    STUBS.reset();
    NEXT_HANDLE.store(HANDLE_BASE, Ordering::Relaxed);
    SYMBOL_ADDR.store(DEFAULT_SYMBOL_ADDR, Ordering::Relaxed);
}
