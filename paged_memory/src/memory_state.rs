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

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::{MemoryError, MemoryResult, StorageError},
    frame::{Frame, Tier},
    frame_store::{FirstFitCursor, FrameStore},
    modules::{eviction::EvictionModule, persistent_storage::PersistentStorageModule},
    page_table::{PageAddress, PageTableEntry, ProcessTable, ProcessTableEntry, Segment},
    payload::partition_payload,
    MemoryConfig, ProcessId,
};

/// Everything a persistent storage module has to store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub primary: Vec<Frame>,
    pub secondary: Vec<Frame>,
    pub processes: Vec<ProcessTableEntry>,
}

impl MemorySnapshot {
    /// A snapshot where every frame of both tiers is free
    pub fn formatted(config: &MemoryConfig) -> Self {
        MemoryState::formatted(config).into_snapshot()
    }

    pub fn frames(&self, tier: Tier) -> &[Frame] {
        match tier {
            Tier::Primary => &self.primary,
            Tier::Secondary => &self.secondary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationSummary {
    pub process_id: ProcessId,
    pub segments: usize,
    pub pages: usize,
    pub resident_pages: usize,
    /// segments whose first page did not get a primary frame
    pub non_resident_first_pages: Vec<u32>,
    /// memory of a previous allocation of this process was released first
    pub replaced_previous: bool,
}

impl AllocationSummary {
    /// Did the first page of every non-empty segment become resident?
    pub fn is_fully_resident(&self) -> bool {
        self.non_resident_first_pages.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwapOutcome {
    /// page was resident already, nothing changed
    AlreadyResident { frame_ram: usize },
    Swapped {
        frame_ram: usize,
        evicted: Option<PageAddress>,
    },
}

impl SwapOutcome {
    pub fn frame_ram(&self) -> usize {
        match self {
            SwapOutcome::AlreadyResident { frame_ram } => *frame_ram,
            SwapOutcome::Swapped { frame_ram, .. } => *frame_ram,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReleaseSummary {
    pub process_id: ProcessId,
    pub had_entry: bool,
    pub primary_frames: usize,
    pub secondary_frames: usize,
}

impl ReleaseSummary {
    pub fn is_noop(&self) -> bool {
        !self.had_entry && self.primary_frames == 0 && self.secondary_frames == 0
    }
}

/// Working copy of both tiers and all page tables.
///
/// Operations mutate this copy in place. If an operation fails, the copy
/// may be left half way modified and has to be thrown away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemoryState {
    pub(crate) primary: FrameStore,
    pub(crate) secondary: FrameStore,
    pub(crate) processes: ProcessTable,
}

impl MemoryState {
    pub(crate) fn formatted(config: &MemoryConfig) -> Self {
        Self {
            primary: FrameStore::new(Tier::Primary, config.primary_frame_count),
            secondary: FrameStore::new(Tier::Secondary, config.secondary_frame_count),
            processes: ProcessTable::default(),
        }
    }

    /// Loads the state from `storage` and checks that it is consistent
    pub(crate) fn load<S: PersistentStorageModule>(
        storage: &mut S,
        config: &MemoryConfig,
    ) -> Result<Self, StorageError> {
        let primary = FrameStore::from_frames(
            Tier::Primary,
            storage.load_frame_store(Tier::Primary)?,
            config.primary_frame_count,
        )?;
        let secondary = FrameStore::from_frames(
            Tier::Secondary,
            storage.load_frame_store(Tier::Secondary)?,
            config.secondary_frame_count,
        )?;
        let processes = ProcessTable::from_entries(storage.load_process_table()?);

        let state = Self {
            primary,
            secondary,
            processes,
        };

        state
            .check_consistency()
            .map_err(|reason| StorageError::Inconsistent { reason })?;

        Ok(state)
    }

    pub(crate) fn into_snapshot(self) -> MemorySnapshot {
        MemorySnapshot {
            primary: self.primary.into_frames(),
            secondary: self.secondary.into_frames(),
            processes: self.processes.into_entries(),
        }
    }

    pub(crate) fn to_snapshot(&self) -> MemorySnapshot {
        self.clone().into_snapshot()
    }

    pub(crate) fn store(&self, tier: Tier) -> &FrameStore {
        match tier {
            Tier::Primary => &self.primary,
            Tier::Secondary => &self.secondary,
        }
    }

    pub(crate) fn process(&self, process_id: ProcessId) -> MemoryResult<&ProcessTableEntry> {
        self.processes
            .get(process_id)
            .ok_or_else(|| MemoryError::process_not_found(process_id))
    }

    /// Places `payload` into memory for `process_id`.
    ///
    /// Every page gets a secondary frame, the first page of each segment
    /// additionally gets a primary frame as long as there are free ones.
    pub(crate) fn allocate(
        &mut self,
        process_id: ProcessId,
        payload: &str,
        config: &MemoryConfig,
    ) -> MemoryResult<AllocationSummary> {
        let replaced_previous = self.processes.contains(process_id);
        if replaced_previous {
            debug!(
                "Process {} is already allocated, release its memory first",
                process_id
            );
            self.release(process_id);
        }

        let layout = partition_payload(payload, config.segment_count, config.page_size);

        // validate before claiming anything
        let required = layout.iter().map(Vec::len).sum();
        let available = self.secondary.free_count();
        if required > available {
            return Err(MemoryError::CapacityExceeded {
                tier: Tier::Secondary,
                requested: required,
                available,
            });
        }

        let mut summary = AllocationSummary {
            process_id,
            segments: layout.len(),
            pages: required,
            resident_pages: 0,
            non_resident_first_pages: Vec::new(),
            replaced_previous,
        };

        let mut entry = ProcessTableEntry::new(process_id);
        let mut secondary_cursor = FirstFitCursor::new();
        let mut primary_cursor = FirstFitCursor::new();

        for (segment_id, pages) in (1u32..).zip(layout.iter()) {
            let mut segment = Segment::new(segment_id);

            for (page_number, content) in (1u32..).zip(pages.iter()) {
                let frame_swap = secondary_cursor
                    .claim(
                        &mut self.secondary,
                        process_id,
                        segment_id,
                        page_number,
                        content,
                    )
                    .ok_or(MemoryError::CapacityExceeded {
                        tier: Tier::Secondary,
                        requested: required,
                        available,
                    })?;

                segment
                    .pages
                    .push(PageTableEntry::new(page_number, frame_swap));
            }

            if let (Some(first_page), Some(content)) = (segment.pages.first_mut(), pages.first()) {
                // an exhausted cursor stays exhausted for all following segments
                match primary_cursor.claim(&mut self.primary, process_id, segment_id, 1, content) {
                    Some(frame_ram) => {
                        first_page.mark_resident(frame_ram);
                        summary.resident_pages += 1;
                    }
                    None => summary.non_resident_first_pages.push(segment_id),
                }
            }

            entry.segments.push(segment);
        }

        self.processes.insert(entry);

        if !summary.is_fully_resident() {
            warn!(
                "Primary tier exhausted: first page of segment(s) {:?} of process {} is not resident",
                summary.non_resident_first_pages, process_id
            );
        }

        debug!(
            "Allocated {} page(s) in {} segment(s) for process {} ({} resident)",
            summary.pages, summary.segments, process_id, summary.resident_pages
        );

        Ok(summary)
    }

    /// Brings the page at `target` into the primary tier, evicting
    /// another page of the same process if the eviction module picks one.
    pub(crate) fn swap_in<E: EvictionModule>(
        &mut self,
        process_id: ProcessId,
        target: PageAddress,
        eviction: &mut E,
    ) -> MemoryResult<SwapOutcome> {
        let process = self.process(process_id)?;
        let page = process.page(target).ok_or_else(|| {
            MemoryError::page_not_found(process_id, target.segment_id, target.page_number)
        })?;

        if let (true, Some(frame_ram)) = (page.is_resident(), page.frame_ram) {
            debug!(
                "Page {} of process {} is already resident in frame {}",
                target, process_id, frame_ram
            );
            return Ok(SwapOutcome::AlreadyResident { frame_ram });
        }

        let content = self.secondary.get(page.frame_swap)?.content.clone();

        let victim = match eviction.select_victim(process, target) {
            Some(address) if address != target => match process.page(address) {
                Some(PageTableEntry {
                    presence_bit: true,
                    frame_ram: Some(frame_ram),
                    ..
                }) => Some((address, *frame_ram)),
                _ => {
                    warn!(
                        "Eviction candidate {} of process {} is not resident, ignoring it",
                        address, process_id
                    );
                    None
                }
            },
            _ => None,
        };

        // the frame of the victim counts as free
        let victim_frame = victim.map(|(_, frame_ram)| frame_ram);
        let frame_ram = self
            .primary
            .frames()
            .iter()
            .position(|frame| frame.is_free || Some(frame.frame_number) == victim_frame)
            .ok_or(MemoryError::CapacityExceeded {
                tier: Tier::Primary,
                requested: 1,
                available: 0,
            })?;

        // everything is validated, commit the swap
        if let Some((address, victim_frame)) = victim {
            self.primary.release_frame(victim_frame)?;
            if let Some(page) = self
                .processes
                .get_mut(process_id)
                .and_then(|process| process.page_mut(address))
            {
                page.mark_absent();
            }
        }

        self.primary.get_mut(frame_ram)?.occupy(
            process_id,
            target.segment_id,
            target.page_number,
            content,
        );

        self.processes
            .get_mut(process_id)
            .and_then(|process| process.page_mut(target))
            .ok_or_else(|| {
                MemoryError::page_not_found(process_id, target.segment_id, target.page_number)
            })?
            .mark_resident(frame_ram);

        let evicted = victim.map(|(address, _)| address);
        debug!(
            "Swapped in page {} of process {} into frame {} (evicted: {:?})",
            target, process_id, frame_ram, evicted
        );

        Ok(SwapOutcome::Swapped { frame_ram, evicted })
    }

    /// Frees all frames of `process_id` in both tiers and removes its page tables
    pub(crate) fn release(&mut self, process_id: ProcessId) -> ReleaseSummary {
        let had_entry = self.processes.remove(process_id).is_some();
        let primary_frames = self.primary.release_process(process_id);
        let secondary_frames = self.secondary.release_process(process_id);

        ReleaseSummary {
            process_id,
            had_entry,
            primary_frames,
            secondary_frames,
        }
    }

    /// Returns the content of a page, from the primary tier if it is resident
    pub(crate) fn read_page(
        &self,
        process_id: ProcessId,
        address: PageAddress,
    ) -> MemoryResult<String> {
        let page = self.process(process_id)?.page(address).ok_or_else(|| {
            MemoryError::page_not_found(process_id, address.segment_id, address.page_number)
        })?;

        let frame = match (page.is_resident(), page.frame_ram) {
            (true, Some(frame_ram)) => self.primary.get(frame_ram)?,
            _ => self.secondary.get(page.frame_swap)?,
        };

        Ok(frame.content.clone())
    }

    /// Checks that frame occupancy and page tables agree with each other.
    ///
    /// Returns a description of the first violation found.
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        for store in [&self.primary, &self.secondary] {
            for frame in store.frames() {
                if frame.is_free {
                    if *frame != Frame::free(frame.frame_number) {
                        return Err(format!(
                            "free {} frame {} is not reset",
                            store.tier(),
                            frame.frame_number
                        ));
                    }
                    continue;
                }

                let referenced = frame
                    .process_id
                    .and_then(|process_id| self.processes.get(process_id))
                    .and_then(|process| {
                        process.page(PageAddress::new(frame.segment_id, frame.page_number))
                    })
                    .map(|page| match store.tier() {
                        Tier::Primary => page.is_resident() && page.frame_ram == Some(frame.frame_number),
                        Tier::Secondary => page.frame_swap == frame.frame_number,
                    })
                    .unwrap_or(false);

                if !referenced {
                    return Err(format!(
                        "occupied {} frame {} is not referenced by its page table",
                        store.tier(),
                        frame.frame_number
                    ));
                }
            }
        }

        for process in self.processes.entries() {
            if self
                .processes
                .entries()
                .iter()
                .filter(|other| other.process_id == process.process_id)
                .count()
                > 1
            {
                return Err(format!("process {} has several entries", process.process_id));
            }

            for (address, page) in process.pages() {
                let holds = |store: &FrameStore, frame_number: usize| {
                    store
                        .frames()
                        .get(frame_number)
                        .map(|frame| {
                            frame.holds(process.process_id, address.segment_id, address.page_number)
                        })
                        .unwrap_or(false)
                };

                if !holds(&self.secondary, page.frame_swap) {
                    return Err(format!(
                        "page {} of process {} does not own secondary frame {}",
                        address, process.process_id, page.frame_swap
                    ));
                }

                match (page.presence_bit, page.frame_ram) {
                    (false, None) => {}
                    (true, Some(frame_ram)) if holds(&self.primary, frame_ram) => {}
                    (presence_bit, frame_ram) => {
                        return Err(format!(
                            "page {} of process {} has presence bit {} but primary frame {:?}",
                            address, process.process_id, presence_bit, frame_ram
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}
