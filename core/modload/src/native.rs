//! Abstract interface to the native kernel loader.

use oserr::OsResult;

use crate::types::{LoadFlags, NativeHandle};

/// Low-level loader operations provided by the execution environment.
///
/// The implementation is selected entirely by the link line: production
/// binaries link a platform crate that drives the real kernel loader, while
/// coverage test binaries link the instrumented counterfeit instead. Callers
/// cannot tell the difference — both sides are held to this signature by the
/// compiler. A binary with no implementation fails to link with an undefined
/// symbol; a binary with two fails with a duplicate symbol.
#[crate_interface::def_interface]
pub trait NativeLoaderIf {
    /// Loads `file` into the address space and returns its native handle.
    fn load(file: &str, flags: LoadFlags) -> OsResult<NativeHandle>;

    /// Unloads the module identified by `handle`.
    fn unload(handle: NativeHandle) -> OsResult;

    /// Resolves `symbol` within the module identified by `handle`, or in
    /// the global symbol table when `handle` is `None`.
    fn resolve(handle: Option<NativeHandle>, symbol: &str) -> OsResult<usize>;
}

#[inline]
pub(crate) fn load(file: &str, flags: LoadFlags) -> OsResult<NativeHandle> {
    crate_interface::call_interface!(NativeLoaderIf::load, file, flags)
}

#[inline]
pub(crate) fn unload(handle: NativeHandle) -> OsResult {
    crate_interface::call_interface!(NativeLoaderIf::unload, handle)
}

#[inline]
pub(crate) fn resolve(handle: Option<NativeHandle>, symbol: &str) -> OsResult<usize> {
    crate_interface::call_interface!(NativeLoaderIf::resolve, handle, symbol)
}
