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

//! Source locations and diagnostics for reporting them to the user.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    ops::Range,
    sync::Arc,
};

use unicode_width::UnicodeWidthStr;

/// A line number and optional column number within a source file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Point {
    /// 1-based line number.
    pub line: i32,

    /// 1-based display column, as measured by `unicode_width`.
    pub column: Option<i32>,
}

impl Display for Point {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.column {
            Some(column) => write!(f, "{}.{column}", self.line),
            None => write!(f, "{}", self.line),
        }
    }
}

/// Location relevant to a diagnostic message.
///
/// The end of `span` is exclusive, so it is displayed one column to the left.
#[derive(Clone, Debug, Default)]
pub struct Location {
    pub file_name: Option<Arc<String>>,
    pub span: Option<Range<Point>>,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.file_name.is_none() && self.span.is_none()
    }

    /// Returns the number of columns to skip and the number of columns to
    /// mark when underlining `text`, which is line `line` of the source.
    fn underline(&self, line: i32, text: &str) -> Option<(usize, usize)> {
        let span = self.span.as_ref()?;
        let first = if span.start.line == line {
            span.start.column?
        } else {
            1
        };
        let end = if span.end.line == line {
            span.end.column?
        } else {
            text.width() as i32 + 1
        };
        let skip = usize::try_from(first - 1).unwrap_or_default();
        let mark = usize::try_from(end - first).unwrap_or_default().max(1);
        Some((skip, mark))
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut separator = "";
        if let Some(file_name) = &self.file_name {
            write!(f, "{file_name}")?;
            separator = ":";
        }
        if let Some(Range { start, end }) = &self.span {
            write!(f, "{separator}{start}")?;
            let last_column = end.column.map(|column| column - 1);
            match (end.line > start.line, last_column) {
                (true, Some(column)) => write!(f, "-{}.{column}", end.line)?,
                (true, None) => write!(f, "-{}", end.line)?,
                (false, Some(column)) if start.column.is_some() => write!(f, "-{column}")?,
                (false, _) => (),
            }
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// A message to the user about a particular place in a source file.
///
/// Displaying it quotes each of the `source` lines under the message, with
/// the part that `location` covers underlined.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: Location,

    /// Line numbers and text of the source lines that `location` covers.
    pub source: Vec<(i32, String)>,

    pub text: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if !self.location.is_empty() {
            write!(f, "{}: ", self.location)?;
        }
        write!(f, "{}: {}", self.severity, self.text)?;
        for (line_number, text) in &self.source {
            write!(f, "\n{line_number:5} | {text}")?;
            if let Some((skip, mark)) = self.location.underline(*line_number, text) {
                write!(f, "\n      | {:skip$}^{:~<tail$}", "", "", tail = mark - 1)?;
            }
        }
        Ok(())
    }
}
