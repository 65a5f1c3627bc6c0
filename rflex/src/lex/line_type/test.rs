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

use crate::lex::{
    Cancellation, Error,
    reader::{LineReader, SourceFile},
    token::Line,
};

use super::{LineClassifier, LineType, TableKind};

fn read(input: &str) -> Vec<Line> {
    LineReader::new(input).map(Line::from).collect()
}

#[track_caller]
fn check_line_types(input: &str, expected: &[Option<LineType>]) {
    let mut lines = read(input);
    LineClassifier::new()
        .classify_lines(&mut lines, &Cancellation::new())
        .unwrap();
    let line_types = lines.iter().map(Line::line_type).collect::<Vec<_>>();
    if line_types != expected {
        eprintln!("line types differ from expected:");
        let input_lines = input.lines().collect::<Vec<_>>();
        for result in diff::slice(expected, &line_types) {
            match result {
                diff::Result::Left(left) => eprintln!("-{left:?}"),
                diff::Result::Both(left, _right) => eprintln!(" {left:?}"),
                diff::Result::Right(right) => eprintln!("+{right:?}"),
            }
        }
        eprintln!("input:");
        for (index, line) in input_lines.iter().enumerate() {
            eprintln!("{:>4}: {line:?}", index + 1);
        }
        panic!();
    }
}

#[test]
fn settings_and_variables() {
    check_line_types(
        r#"*** Settings ***
Library    Collections
  Documentation  indented

*** Variables ***
${NAME}    value
"#,
        &[
            Some(LineType::SettingTableBegin),
            Some(LineType::SettingTableLine),
            Some(LineType::SettingTableLine),
            None,
            Some(LineType::VariableTableBegin),
            Some(LineType::VariableTableLine),
        ],
    );
}

#[test]
fn test_cases() {
    check_line_types(
        r#"*** Test Cases ***
    Log    before any test case
First Test
    Log    Hello
    ...    world
Second Test    Log    inline
    No Operation
"#,
        &[
            Some(LineType::TestcaseTableBegin),
            Some(LineType::TestcaseTableIgnore),
            Some(LineType::TestcaseBegin),
            Some(LineType::TestcaseLine),
            Some(LineType::ContinuationLine),
            Some(LineType::TestcaseBegin),
            Some(LineType::TestcaseLine),
        ],
    );
}

#[test]
fn keywords() {
    check_line_types(
        r#"*** Keywords ***
    [Documentation]    orphan
My Keyword
    [Arguments]    ${x}
    Log    ${x}
"#,
        &[
            Some(LineType::KeywordTableBegin),
            Some(LineType::KeywordTableIgnore),
            Some(LineType::KeywordBegin),
            Some(LineType::KeywordLine),
            Some(LineType::KeywordLine),
        ],
    );
}

#[test]
fn lines_outside_tables() {
    check_line_types(
        r#"Some preamble
*** Comments ***
Anything    at all
    indented
"#,
        &[
            Some(LineType::Ignore),
            Some(LineType::IgnoreTableBegin),
            Some(LineType::Ignore),
            Some(LineType::Ignore),
        ],
    );
}

#[test]
fn comments_and_continuations_do_not_change_context() {
    // After the comment and continuation lines, the next indented line is
    // still part of the test case.
    check_line_types(
        r#"*** Test Cases ***
Test
# full-line comment
    # indented comment
    Log    a
...    b
    ...    c
    Log    d
"#,
        &[
            Some(LineType::TestcaseTableBegin),
            Some(LineType::TestcaseBegin),
            Some(LineType::CommentLine),
            Some(LineType::CommentLine),
            Some(LineType::TestcaseLine),
            Some(LineType::ContinuationLine),
            Some(LineType::ContinuationLine),
            Some(LineType::TestcaseLine),
        ],
    );
}

#[test]
fn table_switches() {
    check_line_types(
        r#"*Test Cases
Test
    Log    x
*Keywords
    Log    y
Kw
*Settings
Test Timeout    1 min
"#,
        &[
            Some(LineType::TestcaseTableBegin),
            Some(LineType::TestcaseBegin),
            Some(LineType::TestcaseLine),
            Some(LineType::KeywordTableBegin),
            Some(LineType::KeywordTableIgnore),
            Some(LineType::KeywordBegin),
            Some(LineType::SettingTableBegin),
            Some(LineType::SettingTableLine),
        ],
    );
}

#[test]
fn last_real_type() {
    let lines = read("*** Test Cases ***\nTest\n...    more\n# note\n");
    let mut classifier = LineClassifier::new();
    assert_eq!(classifier.last_real_type(), LineType::Ignore);
    let types = lines
        .iter()
        .map(|line| classifier.classify(line))
        .collect::<Vec<_>>();
    assert_eq!(
        types,
        vec![
            Some(LineType::TestcaseTableBegin),
            Some(LineType::TestcaseBegin),
            Some(LineType::ContinuationLine),
            Some(LineType::CommentLine),
        ]
    );
    assert_eq!(classifier.last_real_type(), LineType::TestcaseBegin);
    assert_eq!(classifier.last_real_type().table(), TableKind::Testcase);
}

#[test]
fn every_nonblank_line_is_classified() {
    let input = "x\n\n*Settings\n  \n\t\nLibrary  X\n*Unknown\n...\n#\n";
    let mut lines = read(input);
    LineClassifier::new()
        .classify_lines(&mut lines, &Cancellation::new())
        .unwrap();
    for line in &lines {
        assert_eq!(line.is_blank(), line.line_type().is_none(), "{line:?}");
    }
}

#[test]
fn already_classified() {
    let mut lines = read("*Settings\nLibrary  X\n");
    lines[1].classify(LineType::Ignore).unwrap();
    let error = LineClassifier::new()
        .classify_lines(&mut lines, &Cancellation::new())
        .unwrap_err();
    match error {
        Error::Internal(fault) => {
            assert_eq!(fault.line_no, 2);
            assert_eq!(fault.content, "Library  X");
            let source = SourceFile::for_string(String::from("*Settings\nLibrary  X\n"));
            let diagnostic = fault.diagnostic(&source).to_string();
            assert!(diagnostic.starts_with("2.1-10: error: internal error: "), "{diagnostic}");
            assert!(
                diagnostic.ends_with("\n    2 | Library  X\n      | ^~~~~~~~~"),
                "{diagnostic}"
            );
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn cancelled() {
    let mut lines = read("*Settings\nLibrary  X\n");
    let cancellation = Cancellation::new();
    cancellation.cancel();
    assert!(matches!(
        LineClassifier::new().classify_lines(&mut lines, &cancellation),
        Err(Error::Cancelled)
    ));
}
