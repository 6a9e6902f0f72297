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

use std::mem;

use crate::util::div_ceil;

/// Splits a payload into `segment_count` segments of pages.
///
/// The lines of the payload are distributed positionally: every segment
/// takes `ceil(lines / segment_count)` consecutive lines. Each line keeps a
/// trailing line break and the joined text of a segment is cut into pages of
/// `page_size` characters. If the lines run out early, the remaining
/// segments stay empty.
pub(crate) fn partition_payload(
    payload: &str,
    segment_count: usize,
    page_size: usize,
) -> Vec<Vec<String>> {
    debug_assert!(segment_count > 0 && page_size > 0);

    let lines: Vec<&str> = payload.lines().collect();
    let mut segments: Vec<Vec<String>> = if lines.is_empty() {
        Vec::new()
    } else {
        let lines_per_segment = div_ceil(lines.len(), segment_count);
        lines
            .chunks(lines_per_segment)
            .map(|group| {
                let text: String = group.iter().flat_map(|line| [*line, "\n"]).collect();
                paginate(&text, page_size)
            })
            .collect()
    };

    segments.resize_with(segment_count, Vec::new);
    segments
}

/// Cuts `text` into chunks of at most `page_size` characters
pub(crate) fn paginate(text: &str, page_size: usize) -> Vec<String> {
    let mut pages = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for c in text.chars() {
        current.push(c);
        current_len += 1;

        if current_len == page_size {
            pages.push(mem::take(&mut current));
            current_len = 0;
        }
    }

    if !current.is_empty() {
        pages.push(current);
    }

    pages
}

#[cfg(test)]
mod test {
    use super::{paginate, partition_payload};

    #[test]
    fn test_paginate() {
        assert_eq!(paginate("", 4), Vec::<String>::new());
        assert_eq!(paginate("abcd", 4), vec!["abcd"]);
        assert_eq!(paginate("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);

        // multi byte characters count as one unit
        assert_eq!(paginate("äöüß", 3), vec!["äöü", "ß"]);
    }

    #[test]
    fn test_one_line_per_segment() {
        let segments = partition_payload("first\nsecond\nthird", 3, 50);
        assert_eq!(
            segments,
            vec![vec!["first\n"], vec!["second\n"], vec!["third\n"]]
        );
    }

    #[test]
    fn test_uneven_lines() {
        // ceil(7 / 3) = 3 lines per segment, the last one gets the remainder
        let payload = "1\n2\n3\n4\n5\n6\n7\n";
        let segments = partition_payload(payload, 3, 50);
        assert_eq!(segments, vec![vec!["1\n2\n3\n"], vec!["4\n5\n6\n"], vec!["7\n"]]);

        // ceil(4 / 3) = 2 lines per segment leaves the third segment empty
        let segments = partition_payload("a\nb\nc\nd", 3, 50);
        assert_eq!(segments, vec![vec!["a\nb\n"], vec!["c\nd\n"], vec![]]);
    }

    #[test]
    fn test_long_lines_span_pages() {
        let line = "x".repeat(12);
        let payload = format!("{line}\n{line}\n{line}");
        let segments = partition_payload(&payload, 3, 5);

        for segment in &segments {
            let lens: Vec<usize> = segment.iter().map(|page| page.chars().count()).collect();
            assert_eq!(lens, vec![5, 5, 3]);
        }
    }

    #[test]
    fn test_empty_payload() {
        let segments = partition_payload("", 3, 50);
        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|segment| segment.is_empty()));
    }

    #[test]
    fn test_windows_line_breaks() {
        let segments = partition_payload("a\r\nb\r\nc\r\n", 3, 50);
        assert_eq!(segments, vec![vec!["a\n"], vec!["b\n"], vec!["c\n"]]);
    }
}
