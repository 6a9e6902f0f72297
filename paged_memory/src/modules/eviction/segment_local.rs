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

use crate::page_table::{PageAddress, ProcessTableEntry};

use super::EvictionModule;

/// Only evicts pages from the segment of the page that is swapped in.
///
/// Within that segment the last resident page wins. If the segment has no
/// resident page, nothing is evicted.
pub struct SegmentLocalEvictionModule;

impl EvictionModule for SegmentLocalEvictionModule {
    fn new() -> Self {
        Self
    }

    fn select_victim(
        &mut self,
        process: &ProcessTableEntry,
        target: PageAddress,
    ) -> Option<PageAddress> {
        let segment = process.segment(target.segment_id)?;

        segment
            .pages
            .iter()
            .filter(|page| page.is_resident() && page.page_number != target.page_number)
            .last()
            .map(|page| PageAddress::new(segment.segment_id, page.page_number))
    }
}
