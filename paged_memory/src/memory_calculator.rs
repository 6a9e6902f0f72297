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

use crate::{frame_store::FrameStore, ProcessId};

/// Read only capacity queries over a single tier
pub struct MemoryCalculator<'a> {
    frames: &'a FrameStore,
    frame_size: usize,
}

impl<'a> MemoryCalculator<'a> {
    pub fn new(frames: &'a FrameStore, frame_size: usize) -> Self {
        Self { frames, frame_size }
    }

    /// Size of all free frames
    pub fn available_capacity(&self) -> usize {
        self.frames.free_count() * self.frame_size
    }

    /// Size of all frames occupied by `process_id`
    pub fn used_by(&self, process_id: ProcessId) -> usize {
        self.frames.owned_count(process_id) * self.frame_size
    }
}

#[cfg(test)]
mod test {
    use super::MemoryCalculator;
    use crate::{frame_store::FirstFitCursor, FrameStore, Tier};

    #[test]
    fn test_capacity_accounting() {
        const FRAME_SIZE: usize = 4096;
        let mut store = FrameStore::new(Tier::Primary, 5);

        {
            let calculator = MemoryCalculator::new(&store, FRAME_SIZE);
            assert_eq!(calculator.available_capacity(), 5 * FRAME_SIZE);
            assert_eq!(calculator.used_by(1), 0);
        }

        let mut cursor = FirstFitCursor::new();
        cursor.claim(&mut store, 1, 1, 1, "a").unwrap();
        cursor.claim(&mut store, 2, 1, 1, "b").unwrap();
        cursor.claim(&mut store, 1, 2, 1, "c").unwrap();

        let calculator = MemoryCalculator::new(&store, FRAME_SIZE);
        assert_eq!(calculator.available_capacity(), 2 * FRAME_SIZE);
        assert_eq!(calculator.used_by(1), 2 * FRAME_SIZE);
        assert_eq!(calculator.used_by(2), FRAME_SIZE);
        assert_eq!(calculator.used_by(3), 0);
    }

    #[test]
    fn test_freed_frames_are_not_counted() {
        let mut store = FrameStore::new(Tier::Primary, 2);
        FirstFitCursor::new().claim(&mut store, 7, 1, 1, "a").unwrap();
        store.release_frame(0).unwrap();

        let calculator = MemoryCalculator::new(&store, 50);
        assert_eq!(calculator.available_capacity(), 100);
        assert_eq!(calculator.used_by(7), 0);
    }
}
