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

//! The assembled token stream.
//!
//! A [TokenStream] is the output of classification: one [Line] per physical
//! line of input, each holding its [Cell]s.  Lines and cells are created once
//! by the reader and the splitter; afterward only their types are filled in,
//! each exactly once.

use std::ops::Range;

use serde::Serialize;

use super::{argument::ArgumentType, line_type::LineType, reader::RawLine, split::split_line};

/// The marker that begins a continuation line.
pub const CONTINUATION_MARKER: &str = "...";

/// One separator-delimited cell of a line, with its position in the input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// The cell's contents.
    pub text: String,

    /// Byte offset of the start of the cell within the whole input.
    pub start: usize,

    /// 0-based position of the cell within its line.
    pub index: usize,

    /// Whether the cell was immediately followed by a space in the input.
    ///
    /// Content assist uses this to decide whether text typed after the cell
    /// extends it or starts a new cell.
    pub space_after: bool,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    semantic_type: Option<ArgumentType>,
}

impl Cell {
    pub fn new(text: impl Into<String>, start: usize, index: usize, space_after: bool) -> Self {
        Self {
            text: text.into(),
            start,
            index,
            space_after,
            semantic_type: None,
        }
    }

    /// Byte offset just past the end of the cell.
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Byte range of the cell within the whole input.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// The cell's semantic type, if it has been classified.
    ///
    /// Indentation cells and continuation markers are never classified.
    pub fn semantic_type(&self) -> Option<ArgumentType> {
        self.semantic_type
    }

    /// Sets the cell's semantic type.  A cell may be classified only once; if
    /// it already has a type, returns that type as the error.
    pub(crate) fn classify(&mut self, semantic_type: ArgumentType) -> Result<(), ArgumentType> {
        match self.semantic_type {
            Some(previous) => Err(previous),
            None => {
                self.semantic_type = Some(semantic_type);
                Ok(())
            }
        }
    }

    /// Returns true if the cell is empty, either literally or because it is
    /// the `\` empty-cell marker.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() || self.text == "\\"
    }

    pub fn is_comment(&self) -> bool {
        self.text.starts_with('#')
    }

    /// Returns true if the cell looks like a variable reference, that is, a
    /// potential assignment target.
    pub fn is_variable(&self) -> bool {
        self.text.starts_with(['$', '@', '&'])
    }

    /// Returns true if this is a variable reference that ends in `=`, which
    /// marks the last assignment target before a keyword.
    pub fn is_assignment(&self) -> bool {
        self.is_variable() && self.text.trim_end().ends_with('=')
    }
}

/// One physical line of input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Line {
    /// 1-based line number.
    pub line_no: usize,

    /// Byte offset of the start of the line within the whole input.
    pub start: usize,

    /// The line's text, without its line ending.
    pub text: String,

    /// The line's cells.  Blank lines have none.
    pub cells: Vec<Cell>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    line_type: Option<LineType>,
}

impl Line {
    pub fn new(line_no: usize, start: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            line_no,
            start,
            cells: split_line(&text, start),
            text,
            line_type: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.is_empty()
    }

    /// The line's type.  Blank lines are never classified.
    pub fn line_type(&self) -> Option<LineType> {
        self.line_type
    }

    pub(crate) fn classify(&mut self, line_type: LineType) -> Result<(), LineType> {
        match self.line_type {
            Some(previous) => Err(previous),
            None => {
                self.line_type = Some(line_type);
                Ok(())
            }
        }
    }

    /// If this line begins with a continuation marker (possibly after an
    /// empty first cell), returns the index of the first cell after the
    /// marker.
    pub fn continuation_start(&self) -> Option<usize> {
        match self.cells.as_slice() {
            [first, ..] if first.text == CONTINUATION_MARKER => Some(1),
            [first, second, ..] if first.text.is_empty() && second.text == CONTINUATION_MARKER => {
                Some(2)
            }
            _ => None,
        }
    }

    /// Returns the first cell that is not literally empty.
    pub fn first_content(&self) -> Option<&Cell> {
        self.cells.iter().find(|cell| !cell.text.is_empty())
    }

    /// Returns the cells of this line that belong to a statement continued
    /// from an earlier line: the cells after the marker on a continuation
    /// line, and nothing on any other line.
    pub(crate) fn continued_cells(&self) -> &[Cell] {
        match (self.line_type, self.continuation_start()) {
            (Some(LineType::ContinuationLine), Some(start)) => &self.cells[start..],
            _ => &[],
        }
    }
}

impl From<RawLine<'_>> for Line {
    fn from(raw: RawLine<'_>) -> Self {
        Self::new(raw.line_no, raw.start, raw.text)
    }
}

/// The classified contents of one file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TokenStream {
    lines: Vec<Line>,
}

impl TokenStream {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterates over every cell in the stream, in order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.lines.iter().flat_map(|line| line.cells.iter())
    }

    /// Returns the semantic types of all the classified cells, in order.
    pub fn semantic_types(&self) -> Vec<ArgumentType> {
        self.cells().filter_map(Cell::semantic_type).collect()
    }

    /// Returns the line and cell that contain byte `offset`, if any.  An
    /// offset just past the end of a cell counts as inside it, so that a
    /// cursor at the end of a word finds that word.
    pub fn cell_at(&self, offset: usize) -> Option<(&Line, &Cell)> {
        let index = self
            .lines
            .partition_point(|line| line.start <= offset)
            .checked_sub(1)?;
        let line = &self.lines[index];
        line.cells
            .iter()
            .find(|cell| (cell.start..=cell.end()).contains(&offset))
            .map(|cell| (line, cell))
    }
}
