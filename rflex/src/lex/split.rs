// rflex - token classification for tabular test-specification files.
// Copyright (C) 2025 Free Software Foundation, Inc.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! Splitting lines into cells.
//!
//! Cells are separated by a tab, or by a space followed by another space or a
//! tab.  A single space therefore belongs to the cell it appears in, so that
//! `Run Keyword If` is one cell, while `Log  Hello` and `Log\tHello` are two.
//! A separator extends over the whole run of spaces and tabs that follows it.
//!
//! A cell that begins with `#` is a comment.  It runs to the end of the line,
//! separators and all.

use super::token::Cell;

fn is_blank(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// Returns the byte range of the first separator in `s` at or after `from`.
fn find_separator(s: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = s.as_bytes();
    let start = (from..bytes.len()).find(|&i| match bytes[i] {
        b'\t' => true,
        b' ' => bytes.get(i + 1).is_some_and(|&c| is_blank(c)),
        _ => false,
    })?;
    let end = bytes[start..]
        .iter()
        .position(|&c| !is_blank(c))
        .map_or(bytes.len(), |n| start + n);
    Some((start, end))
}

/// Splits `line`, which begins at byte offset `offset` in its file, into
/// cells.  `line` must not include a line ending.
///
/// A line that is empty or contains only spaces and tabs has no cells.  A
/// line that begins with a separator has an empty first cell, which is how
/// the body of a test case or keyword is distinguished from its name.
pub fn split_line(line: &str, offset: usize) -> Vec<Cell> {
    let trimmed = line.trim_end_matches([' ', '\t']);
    if trimmed.is_empty() {
        return Vec::new();
    }

    // A single leading space is not a separator and is not part of the first
    // cell either.
    let mut start = match trimmed.as_bytes() {
        [b' ', c, ..] if !is_blank(*c) => 1,
        _ => 0,
    };

    let mut cells = Vec::new();
    loop {
        let index = cells.len();
        if trimmed[start..].starts_with('#') {
            let space_after = line[trimmed.len()..].starts_with(' ');
            cells.push(Cell::new(&trimmed[start..], offset + start, index, space_after));
            break;
        }
        match find_separator(trimmed, start) {
            Some((end, next)) => {
                let space_after = trimmed.as_bytes()[end] == b' ';
                cells.push(Cell::new(&trimmed[start..end], offset + start, index, space_after));
                start = next;
            }
            None => {
                let space_after = line[trimmed.len()..].starts_with(' ');
                cells.push(Cell::new(&trimmed[start..], offset + start, index, space_after));
                break;
            }
        }
    }
    cells
}
