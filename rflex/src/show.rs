/* rflex - token classification for tabular test-specification files.
 * Copyright (C) 2025 Free Software Foundation, Inc.
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>. */

use crate::parse_encoding;
use anyhow::{Result, anyhow};
use clap::{Args, ValueEnum};
use encoding_rs::Encoding;
use log::debug;
use rflex::lex::{
    ArgumentType, Cancellation, Cell, Error, Line, LineType, SourceFile, TokenStream, Vocabulary,
    classify,
};
use serde::{Deserialize, Serialize};
use std::{
    ffi::OsStr,
    fmt::Write as _,
    fs::{self, File},
    io::{BufWriter, Write, stdout},
    ops::Range,
    path::PathBuf,
};

/// Classify a test-specification file and show the result.
#[derive(Args, Clone, Debug)]
pub struct Show {
    /// File to classify.
    #[arg(required = true)]
    input: PathBuf,

    /// Output file name.  If omitted, output is written to stdout.
    output: Option<PathBuf>,

    /// The encoding to use.  If omitted, the encoding is detected.
    #[arg(long, value_parser = parse_encoding, help_heading = "Input file options")]
    encoding: Option<&'static Encoding>,

    /// TOML file with additional settings and keywords.
    #[arg(long, help_heading = "Input file options")]
    vocabulary: Option<PathBuf>,

    /// Output options, e.g. `-o offsets="char"` or `-o blank=true`.
    #[arg(short = 'o', help_heading = "Output options")]
    output_options: Vec<String>,

    /// Output format.
    #[arg(long, short = 'f', help_heading = "Output options")]
    format: Option<ShowFormat>,
}

/// How much of each line to show.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Detail {
    /// Line types only.
    Lines,

    /// Line types and cells.
    Cells,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Offsets {
    #[default]
    Byte,
    Char,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Options {
    /// Whether to report offsets in bytes or characters.
    offsets: Offsets,

    /// Include blank lines.
    blank: bool,

    /// Include cells without a type.
    untyped: bool,
}

#[derive(Serialize)]
struct CellView<'a> {
    text: &'a str,
    start: usize,
    end: usize,
    index: usize,
    space_after: bool,
    #[serde(rename = "type")]
    semantic_type: Option<ArgumentType>,
}

#[derive(Serialize)]
struct LineView<'a> {
    line_no: usize,
    start: usize,
    #[serde(rename = "type")]
    line_type: Option<LineType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cells: Option<Vec<CellView<'a>>>,
}

struct Viewer<'a> {
    source: &'a SourceFile,
    options: &'a Options,
    detail: Detail,

    /// With character offsets, the character offset of the start of each
    /// line in the stream.
    char_starts: Vec<usize>,
}

impl<'a> Viewer<'a> {
    fn new(source: &'a SourceFile, stream: &TokenStream, options: &'a Options, detail: Detail) -> Self {
        let char_starts = match options.offsets {
            Offsets::Byte => Vec::new(),
            Offsets::Char => {
                let mut chars = 0;
                let mut position = 0;
                stream
                    .lines()
                    .iter()
                    .map(|line| {
                        chars += count_chars(source, position..line.start);
                        position = line.start;
                        chars
                    })
                    .collect()
            }
        };
        Self {
            source,
            options,
            detail,
            char_starts,
        }
    }

    /// Converts byte `offset`, which lies within the line with index `index`
    /// that starts at byte `line_start`.
    fn offset(&self, index: usize, line_start: usize, offset: usize) -> usize {
        match self.char_starts.get(index) {
            Some(chars) => chars + count_chars(self.source, line_start..offset),
            None => offset,
        }
    }

    fn cell(&self, index: usize, line: &Line, cell: &'a Cell) -> Option<CellView<'a>> {
        (self.options.untyped || cell.semantic_type().is_some()).then(|| CellView {
            text: &cell.text,
            start: self.offset(index, line.start, cell.start),
            end: self.offset(index, line.start, cell.end()),
            index: cell.index,
            space_after: cell.space_after,
            semantic_type: cell.semantic_type(),
        })
    }

    fn line(&self, index: usize, line: &'a Line) -> Option<LineView<'a>> {
        (self.options.blank || !line.is_blank()).then(|| LineView {
            line_no: line.line_no,
            start: self.offset(index, line.start, line.start),
            line_type: line.line_type(),
            cells: (self.detail == Detail::Cells).then(|| {
                line.cells
                    .iter()
                    .filter_map(|cell| self.cell(index, line, cell))
                    .collect()
            }),
        })
    }
}

fn count_chars(source: &SourceFile, range: Range<usize>) -> usize {
    source
        .contents()
        .get(range)
        .map_or(0, |text| text.chars().count())
}

fn write_text(writer: &mut dyn Write, lines: &[LineView]) -> Result<()> {
    for line in lines {
        match line.line_type {
            Some(line_type) => writeln!(writer, "{:>5}  {line_type}", line.line_no)?,
            None => writeln!(writer, "{:>5}", line.line_no)?,
        }
        for cell in line.cells.iter().flatten() {
            let semantic_type = cell.semantic_type.map_or("-", |ty| ty.as_str());
            writeln!(
                writer,
                "       {:>6}..{:<6} {semantic_type:<24} {:?}",
                cell.start, cell.end, cell.text
            )?;
        }
    }
    Ok(())
}

impl Show {
    fn options(&self) -> Result<Options> {
        let mut config = String::new();
        for option in &self.output_options {
            writeln!(&mut config, "{option}")?;
        }
        Ok(toml::from_str(&config)?)
    }

    fn vocabulary(&self) -> Result<Vocabulary> {
        match &self.vocabulary {
            Some(path) => {
                let s = fs::read_to_string(path)
                    .map_err(|error| anyhow!("{}: {error}", path.display()))?;
                Vocabulary::from_toml(&s).map_err(|error| anyhow!("{}: {error}", path.display()))
            }
            None => Ok(Vocabulary::default()),
        }
    }

    pub fn run(self, detail: Detail) -> Result<()> {
        let format = if let Some(format) = self.format {
            format
        } else if let Some(output_file) = &self.output {
            match output_file
                .extension()
                .unwrap_or(OsStr::new(""))
                .to_str()
                .unwrap_or("")
            {
                "json" => ShowFormat::Json,
                "ndjson" => ShowFormat::Ndjson,
                _ => ShowFormat::Text,
            }
        } else {
            ShowFormat::Text
        };
        let options = self.options()?;
        let vocabulary = self.vocabulary()?;

        let source = SourceFile::for_file(&self.input, self.encoding)?;
        debug!(
            "{}: read {} bytes as {}",
            self.input.display(),
            source.contents().len(),
            source.encoding().name()
        );
        let stream = match classify(&source, &vocabulary, &Cancellation::new()) {
            Ok(stream) => stream,
            Err(Error::Internal(fault)) => return Err(anyhow!("{}", fault.diagnostic(&source))),
            Err(error) => return Err(error.into()),
        };

        let viewer = Viewer::new(&source, &stream, &options, detail);
        let lines = stream
            .lines()
            .iter()
            .enumerate()
            .filter_map(|(index, line)| viewer.line(index, line))
            .collect::<Vec<_>>();

        let mut writer: Box<dyn Write> = match &self.output {
            Some(output_file) => Box::new(BufWriter::new(File::create(output_file)?)),
            None => Box::new(stdout().lock()),
        };
        match format {
            ShowFormat::Text => write_text(&mut *writer, &lines)?,
            ShowFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, &lines)?;
                writeln!(writer)?;
            }
            ShowFormat::Ndjson => {
                for line in &lines {
                    serde_json::to_writer(&mut *writer, line)?;
                    writeln!(writer)?;
                }
            }
            ShowFormat::Discard => (),
        }
        writer.flush()?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
enum ShowFormat {
    /// Plain text, one line per line of input and per cell.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// Newline-delimited JSON.
    Ndjson,
    /// No output.
    Discard,
}
