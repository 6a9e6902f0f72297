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

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProcessId;

/// Coordinates of a page inside of a process.
///
/// Segment ids and page numbers both start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageAddress {
    pub segment_id: u32,
    pub page_number: u32,
}

impl PageAddress {
    pub const fn new(segment_id: u32, page_number: u32) -> Self {
        Self {
            segment_id,
            page_number,
        }
    }
}

impl fmt::Display for PageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.segment_id, self.page_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTableEntry {
    pub page_number: u32,
    /// primary frame while resident
    pub frame_ram: Option<usize>,
    /// permanent location in the secondary tier
    pub frame_swap: usize,
    pub presence_bit: bool,
}

impl PageTableEntry {
    pub(crate) fn new(page_number: u32, frame_swap: usize) -> Self {
        Self {
            page_number,
            frame_ram: None,
            frame_swap,
            presence_bit: false,
        }
    }

    #[inline]
    pub fn is_resident(&self) -> bool {
        self.presence_bit
    }

    pub(crate) fn mark_resident(&mut self, frame_ram: usize) {
        self.frame_ram = Some(frame_ram);
        self.presence_bit = true;
    }

    pub(crate) fn mark_absent(&mut self) {
        self.frame_ram = None;
        self.presence_bit = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub segment_id: u32,
    pub pages: Vec<PageTableEntry>,
}

impl Segment {
    pub(crate) fn new(segment_id: u32) -> Self {
        Self {
            segment_id,
            pages: Vec::new(),
        }
    }

    pub fn page(&self, page_number: u32) -> Option<&PageTableEntry> {
        self.pages.iter().find(|page| page.page_number == page_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTableEntry {
    pub process_id: ProcessId,
    pub segments: Vec<Segment>,
}

impl ProcessTableEntry {
    pub(crate) fn new(process_id: ProcessId) -> Self {
        Self {
            process_id,
            segments: Vec::new(),
        }
    }

    pub fn segment(&self, segment_id: u32) -> Option<&Segment> {
        self.segments
            .iter()
            .find(|segment| segment.segment_id == segment_id)
    }

    pub fn page(&self, address: PageAddress) -> Option<&PageTableEntry> {
        self.segment(address.segment_id)?.page(address.page_number)
    }

    pub(crate) fn page_mut(&mut self, address: PageAddress) -> Option<&mut PageTableEntry> {
        self.segments
            .iter_mut()
            .find(|segment| segment.segment_id == address.segment_id)?
            .pages
            .iter_mut()
            .find(|page| page.page_number == address.page_number)
    }

    /// Iterates over all pages in segment and page order
    pub fn pages(&self) -> impl Iterator<Item = (PageAddress, &PageTableEntry)> + '_ {
        self.segments.iter().flat_map(|segment| {
            segment.pages.iter().map(move |page| {
                (
                    PageAddress::new(segment.segment_id, page.page_number),
                    page,
                )
            })
        })
    }

    pub fn resident_pages(&self) -> impl Iterator<Item = (PageAddress, &PageTableEntry)> + '_ {
        self.pages().filter(|(_, page)| page.is_resident())
    }

    pub fn page_count(&self) -> usize {
        self.segments.iter().map(|segment| segment.pages.len()).sum()
    }
}

/// All page tables, one entry per process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ProcessTable {
    entries: Vec<ProcessTableEntry>,
}

impl ProcessTable {
    pub(crate) fn from_entries(entries: Vec<ProcessTableEntry>) -> Self {
        Self { entries }
    }

    pub(crate) fn entries(&self) -> &[ProcessTableEntry] {
        &self.entries
    }

    pub(crate) fn into_entries(self) -> Vec<ProcessTableEntry> {
        self.entries
    }

    pub(crate) fn get(&self, process_id: ProcessId) -> Option<&ProcessTableEntry> {
        self.entries
            .iter()
            .find(|entry| entry.process_id == process_id)
    }

    pub(crate) fn get_mut(&mut self, process_id: ProcessId) -> Option<&mut ProcessTableEntry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.process_id == process_id)
    }

    pub(crate) fn contains(&self, process_id: ProcessId) -> bool {
        self.get(process_id).is_some()
    }

    pub(crate) fn insert(&mut self, entry: ProcessTableEntry) {
        debug_assert!(!self.contains(entry.process_id));
        self.entries.push(entry);
    }

    pub(crate) fn remove(&mut self, process_id: ProcessId) -> Option<ProcessTableEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.process_id == process_id)?;
        Some(self.entries.remove(index))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
