//! Slot registry for loaded modules.

use alloc::string::String;

use oserr::{OsResult, ensure, os_err};
use slab::Slab;

use crate::types::{LoadFlags, MAX_MODULES, ModuleId, NativeHandle};

/// One loaded module.
pub(crate) struct ModuleEntry {
    pub(crate) id: ModuleId,
    pub(crate) name: String,
    pub(crate) file: String,
    pub(crate) flags: LoadFlags,
    pub(crate) native: NativeHandle,
}

/// Fixed-capacity registry of loaded modules.
///
/// Slots are recycled, ids are not: each insertion stamps its entry with a
/// fresh sequence number, and lookups compare the full id so a stale id for
/// a recycled slot misses.
pub(crate) struct ModuleTable {
    slots: Slab<ModuleEntry>,
    seq: u32,
}

impl ModuleTable {
    pub(crate) fn new() -> Self {
        Self {
            slots: Slab::with_capacity(MAX_MODULES),
            seq: 0,
        }
    }

    /// Checks that an entry named `name` could be inserted right now.
    pub(crate) fn check_insert(&self, name: &str) -> OsResult {
        ensure!(self.slots.len() < MAX_MODULES, os_err!(NoFreeSlots));
        ensure!(self.find(name).is_none(), os_err!(AlreadyExists, name));
        Ok(())
    }

    /// Inserts an entry. The caller must have cleared [`Self::check_insert`]
    /// while continuously holding the table.
    pub(crate) fn insert(
        &mut self,
        name: &str,
        file: &str,
        flags: LoadFlags,
        native: NativeHandle,
    ) -> ModuleId {
        debug_assert!(self.check_insert(name).is_ok());
        self.seq = self.seq.wrapping_add(1);
        let seq = self.seq;
        let slot = self.slots.vacant_entry();
        let id = ModuleId::pack(slot.key(), seq);
        slot.insert(ModuleEntry {
            id,
            name: name.into(),
            file: file.into(),
            flags,
            native,
        });
        id
    }

    pub(crate) fn get(&self, id: ModuleId) -> Option<&ModuleEntry> {
        self.slots.get(id.slot()).filter(|entry| entry.id == id)
    }

    pub(crate) fn remove(&mut self, id: ModuleId) -> Option<ModuleEntry> {
        self.get(id)?;
        Some(self.slots.remove(id.slot()))
    }

    pub(crate) fn find(&self, name: &str) -> Option<ModuleId> {
        self.slots
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(_, entry)| entry.id)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = ModuleEntry> + '_ {
        self.slots.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oserr::OsError;

    fn insert(table: &mut ModuleTable, name: &str) -> ModuleId {
        table.check_insert(name).unwrap();
        table.insert(name, "/cf/apps/app.o", LoadFlags::empty(), NativeHandle::new(0x1000))
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = ModuleTable::new();
        let id = insert(&mut table, "app");

        assert_eq!(table.len(), 1);
        assert_eq!(table.find("app"), Some(id));
        let entry = table.get(id).unwrap();
        assert_eq!(entry.name, "app");
        assert_eq!(entry.file, "/cf/apps/app.o");
        assert_eq!(entry.native, NativeHandle::new(0x1000));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut table = ModuleTable::new();
        insert(&mut table, "app");
        assert_eq!(table.check_insert("app"), Err(OsError::AlreadyExists));
        assert_eq!(table.check_insert("other"), Ok(()));
    }

    #[test]
    fn test_capacity_enforced() {
        let mut table = ModuleTable::new();
        for n in 0..MAX_MODULES {
            insert(&mut table, &format!("mod{n}"));
        }
        assert_eq!(table.len(), MAX_MODULES);
        assert_eq!(table.check_insert("extra"), Err(OsError::NoFreeSlots));
    }

    #[test]
    fn test_remove_frees_slot() {
        let mut table = ModuleTable::new();
        let id = insert(&mut table, "app");

        let entry = table.remove(id).unwrap();
        assert_eq!(entry.name, "app");
        assert_eq!(table.len(), 0);
        assert!(table.get(id).is_none());
        assert!(table.remove(id).is_none());
        assert_eq!(table.find("app"), None);
    }

    #[test]
    fn test_stale_id_misses_recycled_slot() {
        let mut table = ModuleTable::new();
        let old = insert(&mut table, "app");
        table.remove(old).unwrap();

        let new = insert(&mut table, "other");
        // Same slot, different sequence.
        assert_eq!(old.slot(), new.slot());
        assert_ne!(old, new);
        assert!(table.get(old).is_none());
        assert!(table.remove(old).is_none());
        assert!(table.get(new).is_some());
    }

    #[test]
    fn test_drain_empties_table() {
        let mut table = ModuleTable::new();
        insert(&mut table, "a");
        insert(&mut table, "b");

        let names: Vec<String> = table.drain().map(|entry| entry.name).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a".to_string()));
        assert!(names.contains(&"b".to_string()));
        assert_eq!(table.len(), 0);
    }
}
