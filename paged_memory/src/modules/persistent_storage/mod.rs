/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

mod file_storage;
mod in_memory;

pub use file_storage::FilePersistentStorageModule;
pub use in_memory::InMemoryStorageModule;

use crate::{
    error::StorageError, frame::Frame, memory_state::MemorySnapshot, page_table::ProcessTableEntry,
    Tier,
};

/// Durable home of both frame stores and the process table.
///
/// The memory manager loads everything at the start of an operation
/// and commits the result once the operation succeeded.
pub trait PersistentStorageModule {
    /// Loads all frames of `tier`, ordered by frame number
    fn load_frame_store(&mut self, tier: Tier) -> Result<Vec<Frame>, StorageError>;

    fn save_frame_store(&mut self, tier: Tier, frames: &[Frame]) -> Result<(), StorageError>;

    fn load_process_table(&mut self) -> Result<Vec<ProcessTableEntry>, StorageError>;

    fn save_process_table(&mut self, processes: &[ProcessTableEntry]) -> Result<(), StorageError>;

    /// Saves a whole snapshot.
    ///
    /// The default implementation saves one part after the other. Implementations
    /// that can fail half way through have to overwrite this so that either
    /// everything or nothing is stored.
    fn commit(&mut self, snapshot: &MemorySnapshot) -> Result<(), StorageError> {
        self.save_frame_store(Tier::Primary, &snapshot.primary)?;
        self.save_frame_store(Tier::Secondary, &snapshot.secondary)?;
        self.save_process_table(&snapshot.processes)?;

        Ok(())
    }
}

impl<S: PersistentStorageModule + ?Sized> PersistentStorageModule for &mut S {
    fn load_frame_store(&mut self, tier: Tier) -> Result<Vec<Frame>, StorageError> {
        (**self).load_frame_store(tier)
    }

    fn save_frame_store(&mut self, tier: Tier, frames: &[Frame]) -> Result<(), StorageError> {
        (**self).save_frame_store(tier, frames)
    }

    fn load_process_table(&mut self) -> Result<Vec<ProcessTableEntry>, StorageError> {
        (**self).load_process_table()
    }

    fn save_process_table(&mut self, processes: &[ProcessTableEntry]) -> Result<(), StorageError> {
        (**self).save_process_table(processes)
    }

    fn commit(&mut self, snapshot: &MemorySnapshot) -> Result<(), StorageError> {
        (**self).commit(snapshot)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::{cell::Cell, env::temp_dir, fs::remove_dir_all, rc::Rc};

    use super::{FilePersistentStorageModule, PersistentStorageModule};
    use crate::{
        error::StorageError, frame::Frame, memory_state::MemorySnapshot,
        page_table::ProcessTableEntry, MemoryConfig, Tier,
    };

    pub(crate) fn get_test_storage(
        test_name: &str,
        config: &MemoryConfig,
    ) -> FilePersistentStorageModule {
        let directory = temp_dir().join(format!("paged_memory_{}", test_name));
        // leftovers of an aborted run
        let _ = remove_dir_all(&directory);

        FilePersistentStorageModule::temporary(directory, config).unwrap()
    }

    /// Switches for [`FaultyStorageModule`], shared with the test
    #[derive(Default)]
    pub(crate) struct Faults {
        pub(crate) load: Cell<bool>,
        pub(crate) commit: Cell<bool>,
    }

    /// Wraps another module and fails on request
    pub(crate) struct FaultyStorageModule<S: PersistentStorageModule> {
        pub(crate) inner: S,
        pub(crate) faults: Rc<Faults>,
    }

    impl<S: PersistentStorageModule> FaultyStorageModule<S> {
        pub(crate) fn new(inner: S) -> Self {
            Self {
                inner,
                faults: Rc::default(),
            }
        }

        fn check(fault: &Cell<bool>) -> Result<(), StorageError> {
            if fault.get() {
                Err(StorageError::Unavailable {
                    reason: "injected fault".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    impl<S: PersistentStorageModule> PersistentStorageModule for FaultyStorageModule<S> {
        fn load_frame_store(&mut self, tier: Tier) -> Result<Vec<Frame>, StorageError> {
            Self::check(&self.faults.load)?;
            self.inner.load_frame_store(tier)
        }

        fn save_frame_store(&mut self, tier: Tier, frames: &[Frame]) -> Result<(), StorageError> {
            Self::check(&self.faults.commit)?;
            self.inner.save_frame_store(tier, frames)
        }

        fn load_process_table(&mut self) -> Result<Vec<ProcessTableEntry>, StorageError> {
            Self::check(&self.faults.load)?;
            self.inner.load_process_table()
        }

        fn save_process_table(
            &mut self,
            processes: &[ProcessTableEntry],
        ) -> Result<(), StorageError> {
            Self::check(&self.faults.commit)?;
            self.inner.save_process_table(processes)
        }

        fn commit(&mut self, snapshot: &MemorySnapshot) -> Result<(), StorageError> {
            Self::check(&self.faults.commit)?;
            self.inner.commit(snapshot)
        }
    }

    /// test if a committed snapshot is loaded again unchanged
    pub(super) fn test_persistent_storage_normal<S: PersistentStorageModule>(
        mut module: S,
        config: &MemoryConfig,
    ) {
        let mut snapshot = MemorySnapshot::formatted(config);
        snapshot.primary[1].is_free = false;
        snapshot.primary[1].process_id = Some(3);
        snapshot.primary[1].segment_id = 2;
        snapshot.primary[1].page_number = 1;
        snapshot.primary[1].content = "ünïcode\n".to_string();
        snapshot.processes.push(ProcessTableEntry {
            process_id: 3,
            segments: Vec::new(),
        });

        module.commit(&snapshot).unwrap();

        assert_eq!(module.load_frame_store(Tier::Primary).unwrap(), snapshot.primary);
        assert_eq!(
            module.load_frame_store(Tier::Secondary).unwrap(),
            snapshot.secondary
        );
        assert_eq!(module.load_process_table().unwrap(), snapshot.processes);

        // single parts can be overwritten on their own
        module.save_process_table(&[]).unwrap();
        assert!(module.load_process_table().unwrap().is_empty());
        assert_eq!(module.load_frame_store(Tier::Primary).unwrap(), snapshot.primary);
    }
}
