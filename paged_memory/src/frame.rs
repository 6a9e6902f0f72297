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

/// The two storage tiers of the simulated memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Fast tier, pages in here are resident ("RAM")
    Primary,
    /// Backing store every page has a permanent slot in ("swap")
    Secondary,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Primary => write!(f, "primary"),
            Tier::Secondary => write!(f, "secondary"),
        }
    }
}

/// A single slot of a tier.
///
/// Owner, segment, page and content are only meaningful while the frame is occupied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub frame_number: usize,
    pub is_free: bool,
    pub process_id: Option<ProcessId>,
    pub segment_id: u32,
    pub page_number: u32,
    pub content: String,
}

impl Frame {
    pub(crate) fn free(frame_number: usize) -> Self {
        Self {
            frame_number,
            is_free: true,
            process_id: None,
            segment_id: 0,
            page_number: 0,
            content: String::new(),
        }
    }

    pub(crate) fn occupy(
        &mut self,
        process_id: ProcessId,
        segment_id: u32,
        page_number: u32,
        content: String,
    ) {
        debug_assert!(self.is_free, "frame {} is already occupied", self.frame_number);

        self.is_free = false;
        self.process_id = Some(process_id);
        self.segment_id = segment_id;
        self.page_number = page_number;
        self.content = content;
    }

    /// Resets this frame to its neutral free state
    pub(crate) fn reset(&mut self) {
        *self = Frame::free(self.frame_number);
    }

    #[inline]
    pub fn is_owned_by(&self, process_id: ProcessId) -> bool {
        !self.is_free && self.process_id == Some(process_id)
    }

    /// Is this frame occupied by the given page?
    #[inline]
    pub(crate) fn holds(&self, process_id: ProcessId, segment_id: u32, page_number: u32) -> bool {
        self.is_owned_by(process_id)
            && self.segment_id == segment_id
            && self.page_number == page_number
    }
}
