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

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use crate::error::{MemoryError, MemoryResult, StorageError};

pub const DEFAULT_PRIMARY_FRAME_COUNT: usize = 16;
pub const DEFAULT_SECONDARY_FRAME_COUNT: usize = 64;
pub const DEFAULT_FRAME_SIZE: usize = 4 * 1024;
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Every allocation is split into this many segments
pub const SEGMENT_COUNT: usize = 3;

const_assert!(DEFAULT_PAGE_SIZE <= DEFAULT_FRAME_SIZE);
const_assert!(DEFAULT_PRIMARY_FRAME_COUNT <= DEFAULT_SECONDARY_FRAME_COUNT);

/// Tuning constants of the simulated memory.
///
/// `frame_size` is the capacity unit reported by the memory calculator,
/// `page_size` is the number of content characters stored in one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub primary_frame_count: usize,
    pub secondary_frame_count: usize,
    pub frame_size: usize,
    pub page_size: usize,
    pub segment_count: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            primary_frame_count: DEFAULT_PRIMARY_FRAME_COUNT,
            secondary_frame_count: DEFAULT_SECONDARY_FRAME_COUNT,
            frame_size: DEFAULT_FRAME_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            segment_count: SEGMENT_COUNT,
        }
    }
}

impl MemoryConfig {
    /// Reads a configuration from a json file.
    ///
    /// Missing fields fall back to their default value.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> MemoryResult<Self> {
        let file = File::open(path).map_err(StorageError::from)?;
        let config: MemoryConfig =
            serde_json::from_reader(BufReader::new(file)).map_err(StorageError::from)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MemoryResult<()> {
        let reason = if self.primary_frame_count == 0 {
            "primary tier needs at least one frame"
        } else if self.secondary_frame_count == 0 {
            "secondary tier needs at least one frame"
        } else if self.frame_size == 0 || self.page_size == 0 {
            "frame and page size have to be non-zero"
        } else if self.page_size > self.frame_size {
            "a page has to fit into a single frame"
        } else if self
            .primary_frame_count
            .checked_mul(self.frame_size)
            .and(self.secondary_frame_count.checked_mul(self.frame_size))
            .is_none()
        {
            "total capacity of a tier does not fit into usize"
        } else if self.segment_count != SEGMENT_COUNT {
            "only three segments per allocation are supported"
        } else {
            return Ok(());
        };

        Err(MemoryError::InvalidConfig {
            reason: reason.to_string(),
        })
    }
}
