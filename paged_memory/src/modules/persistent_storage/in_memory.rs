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

use crate::{
    error::StorageError, frame::Frame, memory_state::MemorySnapshot, page_table::ProcessTableEntry,
    MemoryConfig, Tier,
};

use super::PersistentStorageModule;

/// Keeps the stored state in memory, nothing survives the process
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorageModule {
    primary: Option<Vec<Frame>>,
    secondary: Option<Vec<Frame>>,
    processes: Option<Vec<ProcessTableEntry>>,
}

impl InMemoryStorageModule {
    /// Creates an empty module, loading fails until something was saved
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a module that already holds a store where every frame is free
    pub fn formatted(config: &MemoryConfig) -> Self {
        let snapshot = MemorySnapshot::formatted(config);
        Self {
            primary: Some(snapshot.primary),
            secondary: Some(snapshot.secondary),
            processes: Some(snapshot.processes),
        }
    }

    fn missing(what: &str) -> StorageError {
        StorageError::Missing {
            what: what.to_string(),
        }
    }
}

impl PersistentStorageModule for InMemoryStorageModule {
    fn load_frame_store(&mut self, tier: Tier) -> Result<Vec<Frame>, StorageError> {
        let frames = match tier {
            Tier::Primary => &self.primary,
            Tier::Secondary => &self.secondary,
        };

        frames
            .clone()
            .ok_or_else(|| Self::missing(&format!("{} frame store", tier)))
    }

    fn save_frame_store(&mut self, tier: Tier, frames: &[Frame]) -> Result<(), StorageError> {
        let target = match tier {
            Tier::Primary => &mut self.primary,
            Tier::Secondary => &mut self.secondary,
        };

        *target = Some(frames.to_vec());
        Ok(())
    }

    fn load_process_table(&mut self) -> Result<Vec<ProcessTableEntry>, StorageError> {
        self.processes
            .clone()
            .ok_or_else(|| Self::missing("process table"))
    }

    fn save_process_table(&mut self, processes: &[ProcessTableEntry]) -> Result<(), StorageError> {
        self.processes = Some(processes.to_vec());
        Ok(())
    }
}
