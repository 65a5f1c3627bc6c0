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

//! Classification of test-specification files.
//!
//! Classification proceeds in phases:
//!
//! 1. Reading, implemented in the [reader] module, recodes a file into UTF-8
//!    and divides it into lines.
//!
//! 2. Splitting, implemented in the [split] module, divides each line into
//!    [Cell]s at separators.
//!
//! 3. Line classification, implemented in the [line_type] module, assigns a
//!    [LineType] to each line.
//!
//! 4. Argument classification, implemented in the [argument] module, assigns
//!    an [ArgumentType] to each cell.
//!
//! The result is a [TokenStream].  [classify] runs all of the phases.

use std::{
    io::Error as IoError,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use thiserror::Error as ThisError;

use crate::message::{Diagnostic, Severity};

pub mod argument;
pub mod line_type;
pub mod reader;
pub mod split;
pub mod token;
pub mod vocabulary;

pub use argument::ArgumentType;
pub use line_type::{LineType, TableKind};
pub use reader::SourceFile;
pub use token::{Cell, Line, TokenStream};
pub use vocabulary::Vocabulary;

/// An error classifying a file.
#[derive(ThisError, Debug)]
pub enum Error {
    /// The file could not be read.
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: IoError },

    /// The file's contents are not valid in its encoding.
    #[error("{file}: input is not valid {encoding}")]
    Malformed {
        file: String,
        encoding: &'static str,
    },

    /// Classification reached an inconsistent state.  This indicates a bug.
    #[error(transparent)]
    Internal(#[from] Fault),

    /// Classification was cancelled by the caller.
    #[error("classification cancelled")]
    Cancelled,
}

/// An internal inconsistency detected while classifying a line, such as an
/// attempt to assign a type to a cell that already has one.
#[derive(ThisError, Clone, Debug, PartialEq, Eq)]
#[error("line {line_no}: {reason} (line contents: {content:?})")]
pub struct Fault {
    /// 1-based number of the line being classified.
    pub line_no: usize,

    /// Text of the line being classified.
    pub content: String,

    pub reason: String,
}

impl Fault {
    pub fn new(line: &Line, reason: impl Into<String>) -> Self {
        Self {
            line_no: line.line_no,
            content: line.text.clone(),
            reason: reason.into(),
        }
    }

    /// Returns a diagnostic that points to the line in `source` where the
    /// fault occurred.
    pub fn diagnostic(&self, source: &SourceFile) -> Diagnostic {
        Diagnostic {
            severity: Severity::Error,
            location: source.line_location(self.line_no),
            source: vec![(self.line_no as i32, self.content.clone())],
            text: format!("internal error: {}", self.reason),
        }
    }
}

/// A flag for asking a classification in progress to stop.
///
/// Clones share the flag, so that one thread can cancel a classification
/// running in another.
#[derive(Clone, Debug, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Returns [Error::Cancelled] if cancellation has been requested.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Classifies the contents of `source` using `vocabulary`, checking for
/// cancellation before each line of each phase.
pub fn classify(
    source: &SourceFile,
    vocabulary: &Vocabulary,
    cancellation: &Cancellation,
) -> Result<TokenStream, Error> {
    let mut lines = source.lines().map(Line::from).collect::<Vec<_>>();
    line_type::LineClassifier::new().classify_lines(&mut lines, cancellation)?;
    argument::classify_arguments(&mut lines, vocabulary, cancellation)?;
    Ok(TokenStream::new(lines))
}

/// Classifies `text` with the built-in vocabulary.
pub fn classify_str(text: &str) -> Result<TokenStream, Error> {
    classify(
        &SourceFile::for_string(String::from(text)),
        Vocabulary::builtin(),
        &Cancellation::new(),
    )
}
