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

mod error;
mod frame;
mod frame_store;
mod memory_calculator;
mod memory_config;
mod memory_manager;
mod memory_state;
mod page_table;
mod payload;
mod util;

#[cfg(test)]
mod test;

pub mod modules;

pub use crate::error::{MemoryError, MemoryResult, StorageError};
pub use crate::frame::{Frame, Tier};
pub use crate::frame_store::FrameStore;
pub use crate::memory_calculator::MemoryCalculator;
pub use crate::memory_manager::{MemoryManager, MemoryStatus};
pub use crate::memory_state::{AllocationSummary, MemorySnapshot, ReleaseSummary, SwapOutcome};
pub use crate::page_table::{PageAddress, PageTableEntry, ProcessTableEntry, Segment};
pub use memory_config::MemoryConfig;

/// Identifies the process that owns frames and page tables
pub type ProcessId = u32;
