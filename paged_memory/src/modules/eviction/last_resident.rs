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

/// Evicts the last resident page that a full scan over
/// all segments and pages of the process finds.
///
/// This is not LRU: the choice only depends on page table order.
pub struct LastResidentEvictionModule;

impl EvictionModule for LastResidentEvictionModule {
    fn new() -> Self {
        Self
    }

    fn select_victim(
        &mut self,
        process: &ProcessTableEntry,
        target: PageAddress,
    ) -> Option<PageAddress> {
        process
            .resident_pages()
            .map(|(address, _)| address)
            .filter(|address| *address != target)
            .last()
    }
}

#[cfg(test)]
mod test {
    use super::LastResidentEvictionModule;
    use crate::{
        modules::eviction::{test::process_with_resident, EvictionModule},
        PageAddress,
    };

    #[test]
    fn test_picks_last_resident_page() {
        let process = process_with_resident(&[PageAddress::new(1, 1), PageAddress::new(2, 1)]);
        let mut module = LastResidentEvictionModule::new();

        assert_eq!(
            module.select_victim(&process, PageAddress::new(3, 1)),
            Some(PageAddress::new(2, 1))
        );

        // segment order matters, not the order in which pages became resident
        let process = process_with_resident(&[PageAddress::new(3, 2), PageAddress::new(1, 2)]);
        assert_eq!(
            module.select_victim(&process, PageAddress::new(2, 1)),
            Some(PageAddress::new(3, 2))
        );
    }

    #[test]
    fn test_never_picks_target() {
        let process = process_with_resident(&[PageAddress::new(1, 1), PageAddress::new(3, 1)]);
        let mut module = LastResidentEvictionModule::new();

        assert_eq!(
            module.select_victim(&process, PageAddress::new(3, 1)),
            Some(PageAddress::new(1, 1))
        );
    }

    #[test]
    fn test_nothing_resident() {
        let process = process_with_resident(&[]);
        let mut module = LastResidentEvictionModule::new();
        assert_eq!(module.select_victim(&process, PageAddress::new(1, 1)), None);
    }
}
