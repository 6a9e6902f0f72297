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

mod last_resident;
mod segment_local;

pub use last_resident::LastResidentEvictionModule;
pub use segment_local::SegmentLocalEvictionModule;

/// Decides which resident page has to leave the primary tier
/// when another page of the same process is swapped in.
pub trait EvictionModule {
    fn new() -> Self;

    /// Selects the resident page of `process` that should be evicted
    /// so that `target` can be swapped in.
    ///
    /// Returns `None` if no page should (or can) be evicted. Implementations
    /// must only return resident pages and never `target` itself.
    fn select_victim(
        &mut self,
        process: &ProcessTableEntry,
        target: PageAddress,
    ) -> Option<PageAddress>;
}
