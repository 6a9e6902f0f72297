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

use std::io;

use thiserror::Error;

use crate::{frame::Tier, ProcessId};

pub type MemoryResult<T> = Result<T, MemoryError>;

/// Failures reported by a persistent storage module
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no stored {what} found")]
    Missing { what: String },
    #[error("storage i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("stored data could not be decoded: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("stored data is inconsistent: {reason}")]
    Inconsistent { reason: String },
    #[error("storage refused the request: {reason}")]
    Unavailable { reason: String },
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("{tier} tier exhausted: {requested} frame(s) requested, {available} available")]
    CapacityExceeded {
        tier: Tier,
        requested: usize,
        available: usize,
    },
    #[error("no entry for process {process_id} (segment {segment_id:?}, page {page_number:?})")]
    NotFound {
        process_id: ProcessId,
        segment_id: Option<u32>,
        page_number: Option<u32>,
    },
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
    #[error("frame {frame_number} is outside of the {tier} tier")]
    InvalidAddress { tier: Tier, frame_number: usize },
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
    #[error("another memory operation is in progress")]
    Busy,
}

impl MemoryError {
    pub(crate) fn process_not_found(process_id: ProcessId) -> Self {
        MemoryError::NotFound {
            process_id,
            segment_id: None,
            page_number: None,
        }
    }

    pub(crate) fn page_not_found(process_id: ProcessId, segment_id: u32, page_number: u32) -> Self {
        MemoryError::NotFound {
            process_id,
            segment_id: Some(segment_id),
            page_number: Some(page_number),
        }
    }
}
