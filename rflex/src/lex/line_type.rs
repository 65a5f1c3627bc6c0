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

//! Line classification.
//!
//! A file is divided into tables, each introduced by a header line whose first
//! cell begins with `*`.  Within a table, every line gets a [LineType] that
//! depends only on the table and on whether its first cell is empty, except
//! that continuation lines and comment lines are recognized anywhere.

use std::fmt::{Display, Formatter, Result as FmtResult};

use enum_iterator::Sequence;
use log::debug;
use serde::Serialize;

use super::{
    Cancellation, Error, Fault,
    token::{Cell, Line},
    vocabulary::table_for_header,
};

/// The kind of table that a line belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Sequence)]
pub enum TableKind {
    Unknown,
    Setting,
    Variable,
    Testcase,
    Keyword,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Unknown => "unknown",
            TableKind::Setting => "setting",
            TableKind::Variable => "variable",
            TableKind::Testcase => "testcase",
            TableKind::Keyword => "keyword",
        }
    }
}

impl Display for TableKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// The type of a line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Sequence)]
pub enum LineType {
    /// A line outside any known table.
    Ignore,

    /// Header of a table with an unknown name.
    IgnoreTableBegin,

    SettingTableBegin,
    SettingTableLine,
    VariableTableBegin,
    VariableTableLine,
    TestcaseTableBegin,

    /// An indented line in the Test Cases table before the first test case.
    TestcaseTableIgnore,

    /// A line that names a new test case.
    TestcaseBegin,

    /// An indented line in the body of a test case.
    TestcaseLine,

    KeywordTableBegin,

    /// An indented line in the Keywords table before the first keyword.
    KeywordTableIgnore,

    /// A line that names a new keyword.
    KeywordBegin,

    /// An indented line in the body of a keyword.
    KeywordLine,

    /// A line that begins with `...` and continues the previous statement.
    ContinuationLine,

    /// A line that contains only a comment.
    CommentLine,
}

impl LineType {
    /// Returns the kind of table this type of line appears in.  Continuation
    /// and comment lines can appear in any table.
    pub fn table(&self) -> TableKind {
        match self {
            LineType::Ignore
            | LineType::IgnoreTableBegin
            | LineType::ContinuationLine
            | LineType::CommentLine => TableKind::Unknown,
            LineType::SettingTableBegin | LineType::SettingTableLine => TableKind::Setting,
            LineType::VariableTableBegin | LineType::VariableTableLine => TableKind::Variable,
            LineType::TestcaseTableBegin
            | LineType::TestcaseTableIgnore
            | LineType::TestcaseBegin
            | LineType::TestcaseLine => TableKind::Testcase,
            LineType::KeywordTableBegin
            | LineType::KeywordTableIgnore
            | LineType::KeywordBegin
            | LineType::KeywordLine => TableKind::Keyword,
        }
    }

    /// Returns true for table header lines.
    pub fn is_table_begin(&self) -> bool {
        matches!(
            self,
            LineType::IgnoreTableBegin
                | LineType::SettingTableBegin
                | LineType::VariableTableBegin
                | LineType::TestcaseTableBegin
                | LineType::KeywordTableBegin
        )
    }

    /// Returns true for lines that start a new statement (as opposed to
    /// continuation and comment lines, which do not).
    pub fn is_real(&self) -> bool {
        !matches!(self, LineType::ContinuationLine | LineType::CommentLine)
    }

    fn table_begin(table: Option<TableKind>) -> Self {
        match table {
            Some(TableKind::Setting) => LineType::SettingTableBegin,
            Some(TableKind::Variable) => LineType::VariableTableBegin,
            Some(TableKind::Testcase) => LineType::TestcaseTableBegin,
            Some(TableKind::Keyword) => LineType::KeywordTableBegin,
            Some(TableKind::Unknown) | None => LineType::IgnoreTableBegin,
        }
    }

    /// Returns the type of an ordinary line that follows a line of this
    /// type, according to whether its first cell is empty.
    fn next(&self, first_cell_empty: bool) -> Self {
        match (self, first_cell_empty) {
            (LineType::SettingTableBegin | LineType::SettingTableLine, _) => {
                LineType::SettingTableLine
            }
            (LineType::VariableTableBegin | LineType::VariableTableLine, _) => {
                LineType::VariableTableLine
            }
            (
                LineType::TestcaseTableBegin
                | LineType::TestcaseTableIgnore
                | LineType::TestcaseBegin
                | LineType::TestcaseLine,
                false,
            ) => LineType::TestcaseBegin,
            (LineType::TestcaseTableBegin | LineType::TestcaseTableIgnore, true) => {
                LineType::TestcaseTableIgnore
            }
            (LineType::TestcaseBegin | LineType::TestcaseLine, true) => LineType::TestcaseLine,
            (
                LineType::KeywordTableBegin
                | LineType::KeywordTableIgnore
                | LineType::KeywordBegin
                | LineType::KeywordLine,
                false,
            ) => LineType::KeywordBegin,
            (LineType::KeywordTableBegin | LineType::KeywordTableIgnore, true) => {
                LineType::KeywordTableIgnore
            }
            (LineType::KeywordBegin | LineType::KeywordLine, true) => LineType::KeywordLine,
            (
                LineType::Ignore
                | LineType::IgnoreTableBegin
                | LineType::ContinuationLine
                | LineType::CommentLine,
                _,
            ) => LineType::Ignore,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineType::Ignore => "Ignore",
            LineType::IgnoreTableBegin => "IgnoreTableBegin",
            LineType::SettingTableBegin => "SettingTableBegin",
            LineType::SettingTableLine => "SettingTableLine",
            LineType::VariableTableBegin => "VariableTableBegin",
            LineType::VariableTableLine => "VariableTableLine",
            LineType::TestcaseTableBegin => "TestcaseTableBegin",
            LineType::TestcaseTableIgnore => "TestcaseTableIgnore",
            LineType::TestcaseBegin => "TestcaseBegin",
            LineType::TestcaseLine => "TestcaseLine",
            LineType::KeywordTableBegin => "KeywordTableBegin",
            LineType::KeywordTableIgnore => "KeywordTableIgnore",
            LineType::KeywordBegin => "KeywordBegin",
            LineType::KeywordLine => "KeywordLine",
            LineType::ContinuationLine => "ContinuationLine",
            LineType::CommentLine => "CommentLine",
        }
    }
}

impl Display for LineType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

fn is_comment_line(cells: &[Cell]) -> bool {
    match cells {
        [first, ..] if first.is_comment() => true,
        [first, second, ..] => first.text.is_empty() && second.is_comment(),
        _ => false,
    }
}

/// Assigns [LineType]s to lines, one line at a time, in order.
#[derive(Clone, Debug)]
pub struct LineClassifier {
    /// Type of the most recent line other than a continuation or comment line.
    last_real_type: LineType,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LineClassifier {
    pub fn new() -> Self {
        Self {
            last_real_type: LineType::Ignore,
        }
    }

    pub fn last_real_type(&self) -> LineType {
        self.last_real_type
    }

    /// Returns the type of `line`, which must follow the lines previously
    /// passed in, or `None` if it is blank.
    pub fn classify(&mut self, line: &Line) -> Option<LineType> {
        let first = line.cells.first()?;
        let line_type = if first.text.starts_with('*') {
            let table = table_for_header(&first.text);
            debug!(
                "line {}: table {}",
                line.line_no,
                table.unwrap_or(TableKind::Unknown)
            );
            LineType::table_begin(table)
        } else if line.continuation_start().is_some() {
            return Some(LineType::ContinuationLine);
        } else if is_comment_line(&line.cells) {
            return Some(LineType::CommentLine);
        } else {
            self.last_real_type.next(first.text.is_empty())
        };
        self.last_real_type = line_type;
        Some(line_type)
    }

    /// Classifies each of `lines`, which must be all the lines of a file, in
    /// order.  Checks for cancellation before each line.
    pub fn classify_lines(
        &mut self,
        lines: &mut [Line],
        cancellation: &Cancellation,
    ) -> Result<(), Error> {
        for line in lines {
            cancellation.check()?;
            if let Some(line_type) = self.classify(line) {
                if let Err(previous) = line.classify(line_type) {
                    return Err(Fault::new(
                        line,
                        format!("line already has type {previous}, cannot change it to {line_type}"),
                    )
                    .into());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test;
