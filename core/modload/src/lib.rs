#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod native;
mod table;
mod types;

pub use native::NativeLoaderIf;
pub use types::{
    LoadFlags, MAX_MODULES, MAX_NAME_LEN, MAX_PATH_LEN, ModuleId, ModuleInfo, NativeHandle,
};

use oserr::{OsResult, ensure, os_err};
use spin::Mutex;

use crate::table::ModuleTable;

// Unit-test binaries need a linked `NativeLoaderIf` implementation for the
// dispatch wrappers to resolve against.
#[cfg(test)]
use modload_stubs as _;

/// Registry of loaded modules; `None` until [`init`] runs.
static MODULES: Mutex<Option<ModuleTable>> = Mutex::new(None);

fn locked(modules: &mut Option<ModuleTable>) -> OsResult<&mut ModuleTable> {
    match modules.as_mut() {
        Some(table) => Ok(table),
        None => os_err!(BadState, "module subsystem not initialized"),
    }
}

/// Initializes the module subsystem.
///
/// Idempotent: repeated calls keep the current registry.
pub fn init() {
    let mut modules = MODULES.lock();
    if modules.is_none() {
        *modules = Some(ModuleTable::new());
        log::debug!("module subsystem initialized");
    }
}

/// Returns whether the module subsystem is initialized.
pub fn is_initialized() -> bool {
    MODULES.lock().is_some()
}

/// Loads the object file `file` and registers it under `name`.
///
/// The name must be unique among loaded modules. Returns the id all other
/// operations address the module by.
pub fn load(name: &str, file: &str, flags: LoadFlags) -> OsResult<ModuleId> {
    ensure!(!name.is_empty(), os_err!(InvalidInput, "module name is empty"));
    ensure!(name.len() <= MAX_NAME_LEN, os_err!(NameTooLong, name));
    ensure!(!file.is_empty(), os_err!(InvalidInput, "object file path is empty"));
    ensure!(file.len() <= MAX_PATH_LEN, os_err!(NameTooLong, file));

    let mut modules = MODULES.lock();
    let table = locked(&mut modules)?;
    table.check_insert(name)?;

    // The table stays locked across the dispatch; the native loader must
    // not re-enter the module API.
    let native = native::load(file, flags)?;
    let id = table.insert(name, file, flags, native);
    log::debug!("loaded module {:?} ({}) from {}", id, name, file);
    Ok(id)
}

/// Unloads the module identified by `id`.
///
/// The registry entry is removed only after the native loader reports
/// success; a failed unload leaves the module registered.
pub fn unload(id: ModuleId) -> OsResult {
    let mut modules = MODULES.lock();
    let table = locked(&mut modules)?;
    let native = match table.get(id) {
        Some(entry) => entry.native,
        None => return os_err!(NotFound),
    };
    native::unload(native)?;
    table.remove(id);
    log::debug!("unloaded module {:?}", id);
    Ok(())
}

/// Reports the registry entry of the module identified by `id`.
pub fn info(id: ModuleId) -> OsResult<ModuleInfo> {
    let mut modules = MODULES.lock();
    let table = locked(&mut modules)?;
    match table.get(id) {
        Some(entry) => Ok(ModuleInfo {
            name: entry.name.clone(),
            file: entry.file.clone(),
            flags: entry.flags,
            native: entry.native,
        }),
        None => os_err!(NotFound),
    }
}

/// Looks up a loaded module by name.
pub fn find(name: &str) -> OsResult<ModuleId> {
    let mut modules = MODULES.lock();
    let table = locked(&mut modules)?;
    match table.find(name) {
        Some(id) => Ok(id),
        None => os_err!(NotFound, name),
    }
}

/// Resolves `symbol` in the global symbol table.
pub fn resolve(symbol: &str) -> OsResult<usize> {
    ensure!(!symbol.is_empty(), os_err!(InvalidInput, "symbol name is empty"));
    ensure!(
        is_initialized(),
        os_err!(BadState, "module subsystem not initialized")
    );
    native::resolve(None, symbol)
}

/// Resolves `symbol` within the module identified by `id`.
pub fn resolve_in(id: ModuleId, symbol: &str) -> OsResult<usize> {
    ensure!(!symbol.is_empty(), os_err!(InvalidInput, "symbol name is empty"));
    let native = {
        let mut modules = MODULES.lock();
        let table = locked(&mut modules)?;
        match table.get(id) {
            Some(entry) => entry.native,
            None => return os_err!(NotFound),
        }
    };
    native::resolve(Some(native), symbol)
}

/// Returns the number of loaded modules.
pub fn loaded_count() -> usize {
    MODULES.lock().as_ref().map_or(0, ModuleTable::len)
}

/// Unloads every remaining module and de-initializes the subsystem.
///
/// The sweep keeps going past per-module failures and reports the first
/// error once all modules have been visited.
pub fn shutdown() -> OsResult {
    let mut modules = MODULES.lock();
    let table = locked(&mut modules)?;
    let mut first_err = None;
    for entry in table.drain() {
        if let Err(err) = native::unload(entry.native) {
            log::warn!("shutdown: unloading {} failed: {}", entry.name, err);
            first_err.get_or_insert(err);
        }
    }
    *modules = None;
    log::debug!("module subsystem shut down");
    match first_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
