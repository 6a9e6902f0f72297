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

use log::{debug, info, warn};
use serde::Serialize;
use try_lock::TryLock;

use crate::{
    error::{MemoryError, MemoryResult},
    frame::{Frame, Tier},
    memory_calculator::MemoryCalculator,
    memory_state::MemoryState,
    modules::{
        eviction::{EvictionModule, LastResidentEvictionModule},
        persistent_storage::PersistentStorageModule,
    },
    page_table::{PageAddress, ProcessTableEntry},
    AllocationSummary, MemoryConfig, MemorySnapshot, ProcessId, ReleaseSummary, SwapOutcome,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryStatus {
    pub primary_free: usize,
    pub primary_occupied: usize,
    pub secondary_free: usize,
    pub secondary_occupied: usize,
    pub available_primary_capacity: usize,
    pub process_count: usize,
}

struct MemoryManagerInner<S: PersistentStorageModule, E: EvictionModule> {
    storage: S,
    eviction: E,
}

/// Manages a primary and a secondary tier of frames together with
/// the page tables of all processes.
///
/// Every operation loads the state from the storage module, works on that
/// copy and commits it only if it succeeded. Only one operation can run at
/// a time; a concurrent call fails with [`MemoryError::Busy`].
pub struct MemoryManager<S: PersistentStorageModule, E: EvictionModule = LastResidentEvictionModule> {
    config: MemoryConfig,
    inner: TryLock<MemoryManagerInner<S, E>>,
}

impl<S: PersistentStorageModule, E: EvictionModule> MemoryManager<S, E> {
    /// Creates a manager on top of an already formatted storage module.
    ///
    /// Fails if the stored state cannot be loaded or does not match `config`.
    pub fn new(mut storage: S, config: MemoryConfig) -> MemoryResult<Self> {
        config.validate()?;
        MemoryState::load(&mut storage, &config)?;

        Ok(Self::with_storage(storage, config))
    }

    /// Creates a manager and overwrites the content of `storage` with free frames
    pub fn format(mut storage: S, config: MemoryConfig) -> MemoryResult<Self> {
        config.validate()?;
        storage.commit(&MemorySnapshot::formatted(&config))?;

        info!(
            "Formatted storage with {} primary and {} secondary frames",
            config.primary_frame_count, config.secondary_frame_count
        );
        Ok(Self::with_storage(storage, config))
    }

    fn with_storage(storage: S, config: MemoryConfig) -> Self {
        Self {
            config,
            inner: TryLock::new(MemoryManagerInner {
                storage,
                eviction: E::new(),
            }),
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Returns the storage module again
    pub fn into_storage(self) -> S {
        self.inner.into_inner().storage
    }

    /// Runs a read only query on the stored state
    fn query<T, F>(&self, query: F) -> MemoryResult<T>
    where
        F: FnOnce(&MemoryState) -> MemoryResult<T>,
    {
        let mut guard = self.inner.try_lock().ok_or(MemoryError::Busy)?;
        let state = MemoryState::load(&mut guard.storage, &self.config)?;

        query(&state)
    }

    /// Runs `operation` on a copy of the stored state and commits
    /// the copy if the operation succeeded and changed something
    fn modify<T, F>(&self, operation: F) -> MemoryResult<T>
    where
        F: FnOnce(&mut MemoryState, &mut E) -> MemoryResult<T>,
    {
        let mut guard = self.inner.try_lock().ok_or(MemoryError::Busy)?;
        let MemoryManagerInner { storage, eviction } = &mut *guard;

        let original = MemoryState::load(storage, &self.config)?;
        let mut state = original.clone();

        let result = operation(&mut state, eviction)?;

        debug_assert!(
            state.check_consistency().is_ok(),
            "inconsistent state after operation: {:?}",
            state.check_consistency()
        );

        if state != original {
            storage.commit(&state.into_snapshot())?;
        }

        Ok(result)
    }

    /// Places `payload` in memory for `process_id`.
    ///
    /// A process that already has memory assigned gets its old memory released first.
    /// The allocation succeeds as long as every page found a secondary frame, even
    /// if some first pages did not get a primary frame (see [`AllocationSummary`]).
    pub fn allocate(&self, process_id: ProcessId, payload: &str) -> MemoryResult<AllocationSummary> {
        debug!(
            "Allocate {} bytes of payload for process {}",
            payload.len(),
            process_id
        );

        let summary = self.modify(|state, _| state.allocate(process_id, payload, &self.config))?;

        info!(
            "Allocated memory for process {}: {} segment(s), {} page(s), {} resident",
            process_id, summary.segments, summary.pages, summary.resident_pages
        );
        Ok(summary)
    }

    /// Swaps in page `page_number` of segment `segment_id` of `process_id`
    pub fn swap_in(
        &self,
        segment_id: u32,
        page_number: u32,
        process_id: ProcessId,
    ) -> MemoryResult<SwapOutcome> {
        let target = PageAddress::new(segment_id, page_number);
        let outcome = self.modify(|state, eviction| state.swap_in(process_id, target, eviction))?;

        if let SwapOutcome::Swapped { frame_ram, evicted } = outcome {
            info!(
                "Swapped in page {} of process {} (frame: {}, evicted: {:?})",
                target, process_id, frame_ram, evicted
            );
        }
        Ok(outcome)
    }

    /// Frees all memory of `process_id`.
    ///
    /// Releasing an unknown process does nothing.
    pub fn release(&self, process_id: ProcessId) -> MemoryResult<ReleaseSummary> {
        let summary = self.modify(|state, _| Ok(state.release(process_id)))?;

        if summary.is_noop() {
            warn!("Release: process {} has no memory assigned", process_id);
        } else {
            info!(
                "Released memory of process {} ({} primary, {} secondary frame(s))",
                process_id, summary.primary_frames, summary.secondary_frames
            );
        }
        Ok(summary)
    }

    /// Size of all free primary frames
    pub fn available_primary_capacity(&self) -> MemoryResult<usize> {
        self.query(|state| {
            Ok(MemoryCalculator::new(&state.primary, self.config.frame_size).available_capacity())
        })
    }

    /// Size of all primary frames used by `process_id`
    pub fn used_by(&self, process_id: ProcessId) -> MemoryResult<usize> {
        self.query(|state| {
            Ok(MemoryCalculator::new(&state.primary, self.config.frame_size).used_by(process_id))
        })
    }

    /// Reads a page, from the primary tier if it is resident
    pub fn read_page(
        &self,
        segment_id: u32,
        page_number: u32,
        process_id: ProcessId,
    ) -> MemoryResult<String> {
        self.query(|state| state.read_page(process_id, PageAddress::new(segment_id, page_number)))
    }

    pub fn frame(&self, tier: Tier, frame_number: usize) -> MemoryResult<Frame> {
        self.query(|state| state.store(tier).get(frame_number).cloned())
    }

    pub fn process(&self, process_id: ProcessId) -> MemoryResult<ProcessTableEntry> {
        self.query(|state| state.process(process_id).cloned())
    }

    pub fn status(&self) -> MemoryResult<MemoryStatus> {
        self.query(|state| {
            let calculator = MemoryCalculator::new(&state.primary, self.config.frame_size);
            Ok(MemoryStatus {
                primary_free: state.primary.free_count(),
                primary_occupied: state.primary.occupied_count(),
                secondary_free: state.secondary.free_count(),
                secondary_occupied: state.secondary.occupied_count(),
                available_primary_capacity: calculator.available_capacity(),
                process_count: state.processes.len(),
            })
        })
    }

    /// Returns a copy of everything that is currently stored
    pub fn snapshot(&self) -> MemoryResult<MemorySnapshot> {
        self.query(|state| Ok(state.to_snapshot()))
    }
}
