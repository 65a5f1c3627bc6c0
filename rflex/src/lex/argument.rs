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

//! Argument classification.
//!
//! Argument classification assigns an [ArgumentType] to every cell, given the
//! [LineType]s assigned by [line classification](super::line_type).  It makes
//! a single pass over the lines, one cell at a time, driving a state machine
//! whose state is the statement in progress.  A statement begins on an
//! ordinary line and extends over any following continuation lines, so the
//! state carries over from one line to the next.
//!
//! Most decisions depend only on the cells seen so far.  The exception is the
//! start of a keyword call, where the cells before the keyword name may be
//! assignment targets: `${x}  Get Value` calls keyword `${x}`, but
//! `${x}=  Get Value` assigns to `${x}`.  To tell these apart, the classifier
//! looks ahead through the rest of the statement, which may span lines,
//! without consuming anything.
//!
//! Whether a cell is a keyword also depends on file-wide context.  When a
//! test template is active, test case statements consist only of arguments
//! to the template keyword.  Some keywords, such as `Run Keyword If`, take
//! another keyword as an argument; that argument is classified as a keyword
//! too, and so on recursively.
//!
//! A comment at the end of a line is classified only when the classifier
//! reaches the next line, so that it never disturbs the statement in
//! progress.

use std::fmt::{Display, Formatter, Result as FmtResult};

use bitflags::bitflags;
use enum_iterator::Sequence;
use log::{debug, trace};
use serde::Serialize;

use super::{
    Cancellation, Error, Fault,
    line_type::{LineType, TableKind},
    token::{Cell, Line},
    vocabulary::{self, KeywordArgument, SettingShape, Vocabulary},
};

/// The semantic type of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Sequence)]
pub enum ArgumentType {
    /// Table header, e.g. `*** Settings ***`.
    Table,

    /// Name of a setting, in the Settings table or in brackets in a test case
    /// or keyword.
    SettingKey,

    /// Free-form setting value, such as documentation or a tag.
    SettingVal,

    /// File named by `Library`, `Resource`, or `Variables`.
    SettingFile,

    /// Argument to a library or variable file.
    SettingFileArg,

    /// `WITH NAME`.
    SettingFileWithNameKey,

    /// The alias that follows `WITH NAME`.
    SettingFileWithNameValue,

    /// Variable name in the Variables table.
    VariableKey,

    /// Variable value in the Variables table.
    VariableVal,

    /// Name of a test case being defined.
    NewTestcase,

    /// Name of a keyword being defined.
    NewKeyword,

    /// Variable assigned the value returned by a keyword, or a `:FOR` loop
    /// variable.
    KeywordLvalue,

    /// Name of a keyword being called.
    KeywordCall,

    /// Name of a keyword passed as an argument to another keyword.
    KeywordCallDynamic,

    /// Argument to a keyword.
    KeywordArg,

    /// `:FOR` or `IN`, `IN RANGE`, and the like.
    ForPart,

    Comment,

    /// Cell whose role is unknown or irrelevant.
    Ignored,
}

impl ArgumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgumentType::Table => "Table",
            ArgumentType::SettingKey => "SettingKey",
            ArgumentType::SettingVal => "SettingVal",
            ArgumentType::SettingFile => "SettingFile",
            ArgumentType::SettingFileArg => "SettingFileArg",
            ArgumentType::SettingFileWithNameKey => "SettingFileWithNameKey",
            ArgumentType::SettingFileWithNameValue => "SettingFileWithNameValue",
            ArgumentType::VariableKey => "VariableKey",
            ArgumentType::VariableVal => "VariableVal",
            ArgumentType::NewTestcase => "NewTestcase",
            ArgumentType::NewKeyword => "NewKeyword",
            ArgumentType::KeywordLvalue => "KeywordLvalue",
            ArgumentType::KeywordCall => "KeywordCall",
            ArgumentType::KeywordCallDynamic => "KeywordCallDynamic",
            ArgumentType::KeywordArg => "KeywordArg",
            ArgumentType::ForPart => "ForPart",
            ArgumentType::Comment => "Comment",
            ArgumentType::Ignored => "Ignored",
        }
    }
}

impl Display for ArgumentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    struct CallFlags: u8 {
        /// An active test template takes the place of the keyword.
        const TEMPLATES = 1;

        /// An empty cell before the keyword does not rule out assignment
        /// targets after it.
        const INDENT_INSENSITIVE = 2;
    }
}

/// Progress through `WITH NAME` in a library import.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum WithName {
    None,
    GotKey,
    GotValue,
}

/// Which upcoming argument, if any, is itself a keyword.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Nested {
    None,

    /// The argument this many positions ahead is a keyword (1 means the next
    /// one).
    At(usize),

    /// All the remaining arguments are keywords.
    All,
}

impl From<Option<KeywordArgument>> for Nested {
    fn from(value: Option<KeywordArgument>) -> Self {
        match value {
            None => Nested::None,
            Some(KeywordArgument::At(position)) => Nested::At(position),
            Some(KeywordArgument::All) => Nested::All,
        }
    }
}

/// Progress through a keyword call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Call {
    /// Not yet known whether the call starts with assignment targets.
    Undetermined,

    /// Assignment targets, up to one that ends in `=`.
    Lvalue,

    /// The keyword name comes next.
    Keyword,

    /// `:FOR` loop variables, up to `IN` or similar.
    ForVars,

    /// Arguments.
    Args(Nested),
}

/// The statement in progress.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Statement {
    /// No statement.  Continuation lines are ignored.
    None,

    /// The rest of the statement is ignored.
    Ignore,

    /// A Settings table line, before its setting name.
    SettingKey,

    /// A Variables table line, before its variable name.
    VariableKey,

    /// Variable values.
    VariableValue,

    /// A test case or keyword body line, before its first cell, which decides
    /// between a bracketed setting and a keyword call.
    Body(TableKind),

    /// Free-form setting values.
    String,

    /// A file name comes next, followed by arguments if `args` is true.
    File { args: bool },

    /// Library or variable file arguments.
    FileArgs(WithName),

    Call(Call, CallFlags),
}

impl Statement {
    /// Returns the statement state that follows the name of a setting with
    /// the given `shape`.
    fn after_key(shape: SettingShape) -> Self {
        match shape {
            SettingShape::Unknown => Statement::Ignore,
            SettingShape::String => Statement::String,
            SettingShape::File => Statement::File { args: false },
            SettingShape::FileArgs => Statement::File { args: true },
            SettingShape::KeywordArgs => {
                Statement::Call(Call::Undetermined, CallFlags::INDENT_INSENSITIVE)
            }
        }
    }
}

/// The setting name cell of a template setting.  The template itself is the
/// first non-empty value after it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct TemplateRef {
    line: usize,
    key: usize,
}

/// State that lasts for a single classification pass.
struct Context {
    statement: Statement,

    /// Set by `Test Template` in the Settings table.
    global_template: Option<TemplateRef>,

    /// Set by `[Template]` in the current test case.  Overrides
    /// `global_template`.
    local_template: Option<TemplateRef>,

    /// A comment at the end of the previous nonblank line, not yet
    /// classified.
    pending_comment: Option<(usize, usize)>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            statement: Statement::None,
            global_template: None,
            local_template: None,
            pending_comment: None,
        }
    }
}

struct ArgumentClassifier<'a> {
    vocabulary: &'a Vocabulary,
    lines: &'a mut [Line],
    context: Context,
}

/// Assigns an [ArgumentType] to the cells in `lines`, which must be all the
/// lines of a file, in order, each already assigned a [LineType] (except for
/// blank lines).  Checks for cancellation before each line.
pub fn classify_arguments(
    lines: &mut [Line],
    vocabulary: &Vocabulary,
    cancellation: &Cancellation,
) -> Result<(), Error> {
    ArgumentClassifier {
        vocabulary,
        lines,
        context: Context::default(),
    }
    .run(cancellation)
}

impl ArgumentClassifier<'_> {
    fn run(mut self, cancellation: &Cancellation) -> Result<(), Error> {
        for line in 0..self.lines.len() {
            cancellation.check()?;
            if self.lines[line].is_blank() {
                continue;
            }
            self.flush_comment()?;
            let Some(line_type) = self.lines[line].line_type() else {
                return Err(self.fault(line, "nonblank line has no line type"));
            };
            self.classify_line(line, line_type)?;
        }
        self.flush_comment()
    }

    fn classify_line(&mut self, line: usize, line_type: LineType) -> Result<(), Error> {
        let cells = &self.lines[line].cells;
        let mut end = cells.len();
        if cells.last().is_some_and(Cell::is_comment) {
            end -= 1;
            self.context.pending_comment = Some((line, end));
        }

        match line_type {
            LineType::Ignore | LineType::TestcaseTableIgnore | LineType::KeywordTableIgnore => {
                self.context.statement = Statement::None;
                self.ignore(line, 0, end)
            }
            LineType::IgnoreTableBegin
            | LineType::SettingTableBegin
            | LineType::VariableTableBegin
            | LineType::TestcaseTableBegin
            | LineType::KeywordTableBegin => {
                self.context.statement = Statement::None;
                self.context.local_template = None;
                if end > 0 {
                    self.assign(line, 0, ArgumentType::Table)?;
                }
                self.ignore(line, 1, end)
            }
            LineType::SettingTableLine => self.start(line, 0, end, Statement::SettingKey),
            LineType::VariableTableLine => self.start(line, 0, end, Statement::VariableKey),
            LineType::TestcaseBegin | LineType::KeywordBegin => {
                let table = line_type.table();
                self.context.local_template = None;
                debug!(
                    "line {}: {table} {:?}",
                    self.lines[line].line_no, self.lines[line].cells[0].text
                );
                let new = if table == TableKind::Testcase {
                    ArgumentType::NewTestcase
                } else {
                    ArgumentType::NewKeyword
                };
                self.assign(line, 0, new)?;
                self.start(line, 1, end, Statement::Body(table))
            }
            LineType::TestcaseLine | LineType::KeywordLine => {
                self.start(line, 0, end, Statement::Body(line_type.table()))
            }
            LineType::ContinuationLine => match self.lines[line].continuation_start() {
                Some(start) => self.resume(line, start, end),
                None => Err(self.fault(line, "continuation line lacks continuation marker")),
            },
            LineType::CommentLine => Ok(()),
        }
    }

    /// Starts a new `statement` at cell `from` in `line`.
    fn start(
        &mut self,
        line: usize,
        from: usize,
        end: usize,
        statement: Statement,
    ) -> Result<(), Error> {
        self.context.statement = statement;
        self.resume(line, from, end)
    }

    /// Continues the statement in progress with cells `from..end` in `line`.
    fn resume(&mut self, line: usize, from: usize, end: usize) -> Result<(), Error> {
        for index in from..end {
            self.step(line, index)?;
        }
        Ok(())
    }

    /// Classifies cell `index` in `line` according to the statement in
    /// progress, and advances the statement.
    fn step(&mut self, line: usize, index: usize) -> Result<(), Error> {
        let cell = &self.lines[line].cells[index];
        if cell.text.is_empty() {
            return Ok(());
        }

        let semantic_type = match self.context.statement {
            Statement::None | Statement::Ignore => ArgumentType::Ignored,
            Statement::SettingKey | Statement::VariableKey if cell.is_empty() => return Ok(()),
            Statement::Body(_) if cell.is_empty() && self.setting_follows(line, index) => {
                return Ok(());
            }
            Statement::SettingKey => {
                if vocabulary::is_test_template(&cell.text) {
                    debug!("line {}: global test template", self.lines[line].line_no);
                    self.context.global_template = Some(TemplateRef { line, key: index });
                }
                self.context.statement = Statement::after_key(self.vocabulary.setting(&cell.text));
                ArgumentType::SettingKey
            }
            Statement::VariableKey => {
                self.context.statement = Statement::VariableValue;
                ArgumentType::VariableKey
            }
            Statement::VariableValue => ArgumentType::VariableVal,
            Statement::String => ArgumentType::SettingVal,
            Statement::File { args } => {
                self.context.statement = if args {
                    Statement::FileArgs(WithName::None)
                } else {
                    Statement::Ignore
                };
                ArgumentType::SettingFile
            }
            Statement::FileArgs(WithName::None) => {
                if cell.text == vocabulary::WITH_NAME {
                    self.context.statement = Statement::FileArgs(WithName::GotKey);
                    ArgumentType::SettingFileWithNameKey
                } else {
                    ArgumentType::SettingFileArg
                }
            }
            Statement::FileArgs(WithName::GotKey) => {
                self.context.statement = Statement::FileArgs(WithName::GotValue);
                ArgumentType::SettingFileWithNameValue
            }
            Statement::FileArgs(WithName::GotValue) => ArgumentType::Ignored,
            Statement::Body(table) if cell.text.starts_with('[') => {
                if table == TableKind::Testcase && vocabulary::is_template(&cell.text) {
                    debug!("line {}: local test template", self.lines[line].line_no);
                    self.context.local_template = Some(TemplateRef { line, key: index });
                }
                self.context.statement =
                    Statement::after_key(self.vocabulary.statement_setting(table, &cell.text));
                ArgumentType::SettingKey
            }
            Statement::Body(table) => {
                let flags = if table == TableKind::Testcase {
                    CallFlags::TEMPLATES
                } else {
                    CallFlags::empty()
                };
                return self.step_call(line, index, Call::Undetermined, flags);
            }
            Statement::Call(call, flags) => return self.step_call(line, index, call, flags),
        };
        self.assign(line, index, semantic_type)
    }

    /// Classifies cell `index` in `line`, which is part of a keyword call in
    /// state `call`.
    fn step_call(
        &mut self,
        line: usize,
        index: usize,
        call: Call,
        flags: CallFlags,
    ) -> Result<(), Error> {
        let cell = &self.lines[line].cells[index];
        let (semantic_type, next) = match call {
            Call::Undetermined => {
                let call = self.resolve_call(line, index, flags);
                trace!(
                    "line {}: cell {index} starts keyword call in state {call:?}",
                    self.lines[line].line_no
                );
                self.context.statement = Statement::Call(call, flags);
                return self.step_call(line, index, call, flags);
            }
            Call::Lvalue | Call::Keyword if cell.is_empty() => return Ok(()),
            Call::Lvalue if cell.is_assignment() => (ArgumentType::KeywordLvalue, Call::Keyword),
            Call::Lvalue => (ArgumentType::KeywordLvalue, Call::Lvalue),
            Call::Keyword if vocabulary::is_for_marker(&cell.text) => {
                (ArgumentType::ForPart, Call::ForVars)
            }
            Call::Keyword if flags.contains(CallFlags::TEMPLATES) && self.template_active() => {
                (ArgumentType::KeywordArg, Call::Args(Nested::None))
            }
            Call::Keyword => (
                ArgumentType::KeywordCall,
                Call::Args(self.vocabulary.keyword_argument(&cell.text).into()),
            ),
            Call::ForVars if vocabulary::is_for_in(&cell.text) => {
                (ArgumentType::ForPart, Call::Args(Nested::None))
            }
            Call::ForVars => (ArgumentType::KeywordLvalue, Call::ForVars),
            Call::Args(Nested::None) => (ArgumentType::KeywordArg, Call::Args(Nested::None)),
            Call::Args(Nested::At(position)) if position <= 1 => (
                ArgumentType::KeywordCallDynamic,
                Call::Args(self.vocabulary.keyword_argument(&cell.text).into()),
            ),
            Call::Args(Nested::At(position)) => {
                (ArgumentType::KeywordArg, Call::Args(Nested::At(position - 1)))
            }
            Call::Args(Nested::All) => (ArgumentType::KeywordCallDynamic, Call::Args(Nested::All)),
        };
        self.context.statement = Statement::Call(next, flags);
        self.assign(line, index, semantic_type)
    }

    /// Looks ahead from cell `index` in `line` to decide whether a keyword
    /// call begins with assignment targets.
    fn resolve_call(&self, line: usize, index: usize, flags: CallFlags) -> Call {
        let mut seen_variable = false;
        for cell in self.statement_cells(line, index) {
            if cell.is_empty() {
                if !seen_variable && !flags.contains(CallFlags::INDENT_INSENSITIVE) {
                    return Call::Keyword;
                }
            } else if cell.is_assignment() {
                return Call::Lvalue;
            } else if cell.is_variable() {
                seen_variable = true;
            } else {
                return Call::Keyword;
            }
        }
        Call::Keyword
    }

    /// Returns the cells in the rest of the statement that includes cell
    /// `index` in `line`, starting from that cell, omitting comments.  The
    /// statement extends over following continuation lines, skipping blank
    /// lines and comment lines.
    fn statement_cells(&self, line: usize, index: usize) -> impl Iterator<Item = &Cell> {
        let following = self.lines[line + 1..]
            .iter()
            .take_while(|line| line.line_type().is_none_or(|line_type| !line_type.is_real()))
            .flat_map(Line::continued_cells);
        self.lines[line].cells[index..]
            .iter()
            .chain(following)
            .filter(|cell| !cell.is_comment())
    }

    /// Returns true if the first nonempty cell of the statement, from cell
    /// `index` in `line` on, is a bracketed setting name.
    fn setting_follows(&self, line: usize, index: usize) -> bool {
        self.statement_cells(line, index)
            .find(|cell| !cell.is_empty())
            .is_some_and(|cell| cell.text.starts_with('['))
    }

    /// Returns true if a test template applies to the current test case.
    fn template_active(&self) -> bool {
        self.context
            .local_template
            .or(self.context.global_template)
            .and_then(|template| self.template_name(template))
            .is_some_and(|name| !vocabulary::is_no_template(name))
    }

    fn template_name(&self, template: TemplateRef) -> Option<&str> {
        self.statement_cells(template.line, template.key + 1)
            .find(|cell| !cell.is_empty())
            .map(|cell| cell.text.as_str())
    }

    fn flush_comment(&mut self) -> Result<(), Error> {
        match self.context.pending_comment.take() {
            Some((line, index)) => self.assign(line, index, ArgumentType::Comment),
            None => Ok(()),
        }
    }

    /// Classifies the nonempty cells among `from..end` in `line` as ignored.
    fn ignore(&mut self, line: usize, from: usize, end: usize) -> Result<(), Error> {
        for index in from..end {
            if !self.lines[line].cells[index].text.is_empty() {
                self.assign(line, index, ArgumentType::Ignored)?;
            }
        }
        Ok(())
    }

    fn assign(&mut self, line: usize, index: usize, semantic_type: ArgumentType) -> Result<(), Error> {
        match self.lines[line].cells[index].classify(semantic_type) {
            Ok(()) => Ok(()),
            Err(previous) => Err(self.fault(
                line,
                format!("cell {index} already has type {previous}, cannot change it to {semantic_type}"),
            )),
        }
    }

    fn fault(&self, line: usize, reason: impl Into<String>) -> Error {
        Fault::new(&self.lines[line], reason).into()
    }
}

#[cfg(test)]
mod test;
