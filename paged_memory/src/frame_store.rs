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

use log::trace;

use crate::{
    error::{MemoryError, MemoryResult, StorageError},
    frame::{Frame, Tier},
    ProcessId,
};

/// A fixed amount of indexed frames belonging to one tier.
///
/// The number of frames never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameStore {
    tier: Tier,
    frames: Vec<Frame>,
}

impl FrameStore {
    /// Creates a new store where every frame is free
    pub fn new(tier: Tier, frame_count: usize) -> Self {
        Self {
            tier,
            frames: (0..frame_count).map(Frame::free).collect(),
        }
    }

    /// Rebuilds a store from loaded frames.
    ///
    /// Fails if the amount of frames does not match `frame_count` or if
    /// a frame is not stored at the index of its frame number.
    pub(crate) fn from_frames(
        tier: Tier,
        frames: Vec<Frame>,
        frame_count: usize,
    ) -> Result<Self, StorageError> {
        if frames.len() != frame_count {
            return Err(StorageError::Inconsistent {
                reason: format!(
                    "{} tier holds {} frames, expected {}",
                    tier,
                    frames.len(),
                    frame_count
                ),
            });
        }

        if let Some((index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(index, frame)| frame.frame_number != *index)
        {
            return Err(StorageError::Inconsistent {
                reason: format!(
                    "{} frame at index {} has frame number {}",
                    tier, index, frame.frame_number
                ),
            });
        }

        Ok(Self { tier, frames })
    }

    #[inline]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub(crate) fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    pub fn get(&self, frame_number: usize) -> MemoryResult<&Frame> {
        self.frames
            .get(frame_number)
            .ok_or(MemoryError::InvalidAddress {
                tier: self.tier,
                frame_number,
            })
    }

    pub(crate) fn get_mut(&mut self, frame_number: usize) -> MemoryResult<&mut Frame> {
        let tier = self.tier;
        self.frames
            .get_mut(frame_number)
            .ok_or(MemoryError::InvalidAddress { tier, frame_number })
    }

    pub fn free_count(&self) -> usize {
        self.frames.iter().filter(|frame| frame.is_free).count()
    }

    pub fn occupied_count(&self) -> usize {
        self.len() - self.free_count()
    }

    pub fn owned_count(&self, process_id: ProcessId) -> usize {
        self.frames
            .iter()
            .filter(|frame| frame.is_owned_by(process_id))
            .count()
    }

    /// Returns the lowest free frame number at or after `start`
    pub(crate) fn find_free_from(&self, start: usize) -> Option<usize> {
        self.frames
            .iter()
            .skip(start)
            .position(|frame| frame.is_free)
            .map(|pos| start + pos)
    }

    /// Resets the given frame to its neutral free state
    pub(crate) fn release_frame(&mut self, frame_number: usize) -> MemoryResult<()> {
        let tier = self.tier;
        let frame = self.get_mut(frame_number)?;
        trace!(
            "Free {} frame {} (process: {:?}, segment: {}, page: {})",
            tier,
            frame_number,
            frame.process_id,
            frame.segment_id,
            frame.page_number
        );

        frame.reset();
        Ok(())
    }

    /// Frees every frame owned by `process_id` and returns how many were freed
    pub(crate) fn release_process(&mut self, process_id: ProcessId) -> usize {
        let mut freed = 0;
        for frame in self.frames.iter_mut() {
            if frame.is_owned_by(process_id) {
                frame.reset();
                freed += 1;
            }
        }

        if freed > 0 {
            trace!(
                "Freed {} {} frame(s) of process {}",
                freed,
                self.tier,
                process_id
            );
        }

        freed
    }
}

/// Forward scanning first-fit cursor over a [`FrameStore`].
///
/// A cursor only lives for the duration of one operation, so every
/// operation starts scanning at the lowest frame again.
#[derive(Debug, Default)]
pub(crate) struct FirstFitCursor {
    next: usize,
}

impl FirstFitCursor {
    pub(crate) fn new() -> Self {
        Self { next: 0 }
    }

    /// Claims the next free frame for the given page and returns its frame number.
    ///
    /// Returns `None` if no free frame is left behind the cursor.
    /// In that case the cursor stays exhausted.
    pub(crate) fn claim(
        &mut self,
        store: &mut FrameStore,
        process_id: ProcessId,
        segment_id: u32,
        page_number: u32,
        content: &str,
    ) -> Option<usize> {
        let frame_number = match store.find_free_from(self.next) {
            Some(frame_number) => frame_number,
            None => {
                self.next = store.len();
                return None;
            }
        };

        self.next = frame_number + 1;

        trace!(
            "Claim {} frame {} (process: {}, segment: {}, page: {})",
            store.tier(),
            frame_number,
            process_id,
            segment_id,
            page_number
        );

        store.frames[frame_number].occupy(process_id, segment_id, page_number, content.to_string());
        Some(frame_number)
    }
}
