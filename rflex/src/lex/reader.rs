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

//! Reading source files and dividing them into lines.

use std::{fs, path::Path, sync::Arc};

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use log::{debug, warn};
use unicode_width::UnicodeWidthStr;

use crate::message::{Location, Point};

use super::Error;

/// A source file and its contents.
///
/// This holds the entire contents of a file, which are always read into
/// memory in their entirety, recoded into UTF-8 if necessary.  It includes the
/// file name (if any), and an index to make finding lines by line number more
/// efficient.
pub struct SourceFile {
    /// `None` if this source is not associated with a file.
    file_name: Option<Arc<String>>,

    /// Original encoding.
    encoding: &'static Encoding,

    /// Source file contents.
    contents: String,

    /// Byte offsets into `contents` of starts of lines.  The first element is
    /// 0.
    lines: Vec<usize>,
}

impl SourceFile {
    /// Returns a `SourceFile` by reading `path` and recoding it from
    /// `encoding`, or from an encoding guessed from its contents if `encoding`
    /// is `None`.
    pub fn for_file<P>(path: P, encoding: Option<&'static Encoding>) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::for_bytes(&bytes, Some(path.to_string_lossy().to_string()), encoding)
    }

    /// Returns a `SourceFile` for `bytes`, recoding them as for
    /// [SourceFile::for_file].  A byte-order mark, if present, overrides
    /// `encoding` and is removed.
    pub fn for_bytes(
        bytes: &[u8],
        file_name: Option<String>,
        encoding: Option<&'static Encoding>,
    ) -> Result<Self, Error> {
        let declared = encoding;
        let encoding = encoding.unwrap_or_else(|| {
            let mut encoding_detector = EncodingDetector::new();
            encoding_detector.feed(bytes, true);
            let guess = encoding_detector.guess(None, true);
            debug!("guessed encoding {} for {file_name:?}", guess.name());
            guess
        });
        let (contents, encoding, malformed) = encoding.decode(bytes);
        if declared.is_some_and(|declared| declared != encoding) {
            warn!(
                "{}: byte-order mark indicates {} instead of declared {}",
                file_name.as_deref().unwrap_or("<input>"),
                encoding.name(),
                declared.map_or("", |declared| declared.name())
            );
        }
        if malformed {
            return Err(Error::Malformed {
                file: file_name.unwrap_or_else(|| String::from("<input>")),
                encoding: encoding.name(),
            });
        }
        Ok(Self::new(contents.into_owned(), file_name, encoding))
    }

    /// Creates a new `SourceFile` for `contents`, recording that `contents`
    /// was originally encoded in `encoding` and that it was read from
    /// `file_name`.
    pub fn new(contents: String, file_name: Option<String>, encoding: &'static Encoding) -> Self {
        let lines = LineReader::new(&contents)
            .map(|line| line.start)
            .collect::<Vec<_>>();
        Self {
            file_name: file_name.map(Arc::new),
            encoding,
            contents,
            lines,
        }
    }

    /// Returns a `SourceFile` for `contents`.
    pub fn for_string(contents: String) -> Self {
        Self::new(contents, None, UTF_8)
    }

    pub fn file_name(&self) -> Option<&Arc<String>> {
        self.file_name.as_ref()
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Returns the lines in this file.
    pub fn lines(&self) -> LineReader<'_> {
        LineReader::new(&self.contents)
    }

    /// Converts byte `offset` into a 1-based line and display column.
    pub fn offset_to_point(&self, offset: usize) -> Point {
        let line = self
            .lines
            .partition_point(|&line_start| line_start <= offset);
        if line == 0 {
            return Point {
                line: 1,
                column: Some(1),
            };
        }
        Point {
            line: line as i32,
            column: Some(
                self.contents
                    .get(self.lines[line - 1]..offset)
                    .unwrap_or_default()
                    .width() as i32
                    + 1,
            ),
        }
    }

    /// Converts byte `offset` into an offset in characters from the start of
    /// the file.
    pub fn char_offset(&self, offset: usize) -> usize {
        self.contents
            .get(..offset)
            .map_or_else(|| self.contents.chars().count(), |s| s.chars().count())
    }

    /// Returns the text of 1-based line number `line_number`, without its line
    /// ending, or the empty string if there is no such line.
    pub fn get_line(&self, line_number: usize) -> &str {
        if (1..=self.lines.len()).contains(&line_number) {
            let start = self.lines[line_number - 1];
            let end = self
                .lines
                .get(line_number)
                .copied()
                .unwrap_or(self.contents.len());
            self.contents[start..end].strip_newline()
        } else {
            ""
        }
    }

    /// Returns the location of the whole of 1-based line `line_number`.
    pub fn line_location(&self, line_number: usize) -> Location {
        let width = self.get_line(line_number).width() as i32;
        let line = line_number as i32;
        Location {
            file_name: self.file_name.clone(),
            span: Some(
                Point {
                    line,
                    column: Some(1),
                }..Point {
                    line,
                    column: Some(width + 1),
                },
            ),
        }
    }
}

impl Default for SourceFile {
    fn default() -> Self {
        Self::new(String::new(), None, UTF_8)
    }
}

trait StripNewline {
    fn strip_newline(&self) -> &str;
}

impl StripNewline for str {
    fn strip_newline(&self) -> &str {
        self.strip_suffix("\r\n")
            .or_else(|| self.strip_suffix('\n'))
            .or_else(|| self.strip_suffix('\r'))
            .unwrap_or(self)
    }
}

/// One line of input, without its line ending.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawLine<'a> {
    /// 1-based line number.
    pub line_no: usize,

    /// Byte offset of the start of the line within the whole input.
    pub start: usize,

    pub text: &'a str,
}

/// An iterator over the lines in a string.
///
/// Lines may end in `\n`, `\r\n`, or a lone `\r`, in any combination.  A line
/// ending at the very end of the input does not start another line.
pub struct LineReader<'a> {
    input: &'a str,
    offset: usize,
    line_no: usize,
}

impl<'a> LineReader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
            line_no: 0,
        }
    }
}

impl<'a> Iterator for LineReader<'a> {
    type Item = RawLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.input[self.offset..];
        if rest.is_empty() {
            return None;
        }
        let (text, terminator) = match rest.find(['\r', '\n']) {
            Some(end) if rest[end..].starts_with("\r\n") => (&rest[..end], 2),
            Some(end) => (&rest[..end], 1),
            None => (rest, 0),
        };
        self.line_no += 1;
        let line = RawLine {
            line_no: self.line_no,
            start: self.offset,
            text,
        };
        self.offset += text.len() + terminator;
        Some(line)
    }
}
