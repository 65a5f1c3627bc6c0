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
    Cancellation, Error, Vocabulary, classify, classify_str,
    reader::{LineReader, SourceFile},
    token::Line,
};

use super::{ArgumentType, classify_arguments};

use ArgumentType::*;

fn print_diff<T>(expected: &[T], actual: &[T])
where
    T: std::fmt::Debug + PartialEq,
{
    eprintln!("cell types differ from expected:");
    for result in diff::slice(expected, actual) {
        match result {
            diff::Result::Left(left) => eprintln!("-{left:?}"),
            diff::Result::Both(left, _right) => eprintln!(" {left:?}"),
            diff::Result::Right(right) => eprintln!("+{right:?}"),
        }
    }
}

/// Classifies `input` and checks the text and type of each classified cell,
/// in order.  Cells without a type are not included.
#[track_caller]
fn check_types(input: &str, expected: &[(&str, ArgumentType)]) {
    let stream = classify_str(input).unwrap();
    let actual = stream
        .cells()
        .filter_map(|cell| cell.semantic_type().map(|ty| (cell.text.clone(), ty)))
        .collect::<Vec<_>>();
    let expected = expected
        .iter()
        .map(|(text, ty)| (text.to_string(), *ty))
        .collect::<Vec<_>>();
    if actual != expected {
        print_diff(&expected, &actual);
        panic!();
    }
}

/// Classifies `input` and checks only the sequence of cell types.
#[track_caller]
fn check_type_sequence(input: &str, expected: &[ArgumentType]) {
    let actual = classify_str(input).unwrap().semantic_types();
    if actual != expected {
        print_diff(expected, &actual);
        panic!();
    }
}

#[test]
fn resource_and_keyword_call() {
    check_type_sequence(
        "*Settings\nResource  foo.txt\n*Test Cases\nTC1  Log  Hello\n",
        &[
            Table,
            SettingKey,
            SettingFile,
            Table,
            NewTestcase,
            KeywordCall,
            KeywordArg,
        ],
    );
}

#[test]
fn local_template() {
    check_type_sequence(
        "*Test Cases\nTC1  [Template]  Log\n  Hello\n",
        &[Table, NewTestcase, SettingKey, KeywordCall, KeywordArg],
    );
}

#[test]
fn trailing_comment() {
    check_type_sequence(
        "*Settings\nResource  foo.txt  # comment\n",
        &[Table, SettingKey, SettingFile, Comment],
    );
    check_types(
        "*Test Cases\nTC\n    Log    x    # why\n    # alone\n# flush left\n",
        &[
            ("*Test Cases", Table),
            ("TC", NewTestcase),
            ("Log", KeywordCall),
            ("x", KeywordArg),
            ("# why", Comment),
            ("# alone", Comment),
            ("# flush left", Comment),
        ],
    );
}

#[test]
fn library_import() {
    check_types(
        "*Settings\nLibrary  Remote  http://localhost:8270  timeout=5  WITH NAME  Api  extra\n",
        &[
            ("*Settings", Table),
            ("Library", SettingKey),
            ("Remote", SettingFile),
            ("http://localhost:8270", SettingFileArg),
            ("timeout=5", SettingFileArg),
            ("WITH NAME", SettingFileWithNameKey),
            ("Api", SettingFileWithNameValue),
            ("extra", Ignored),
        ],
    );
}

#[test]
fn file_settings() {
    check_types(
        "*Settings\nResource  common.txt  extra\nVariables  vars.py  prod\n",
        &[
            ("*Settings", Table),
            ("Resource", SettingKey),
            ("common.txt", SettingFile),
            ("extra", Ignored),
            ("Variables", SettingKey),
            ("vars.py", SettingFile),
            ("prod", SettingFileArg),
        ],
    );
}

#[test]
fn string_settings_and_continuation() {
    check_types(
        "*Settings\nDocumentation  First part\n...  second part\nForce Tags  smoke  regression\nFrobnicate  a  b\n",
        &[
            ("*Settings", Table),
            ("Documentation", SettingKey),
            ("First part", SettingVal),
            ("second part", SettingVal),
            ("Force Tags", SettingKey),
            ("smoke", SettingVal),
            ("regression", SettingVal),
            ("Frobnicate", SettingKey),
            ("a", Ignored),
            ("b", Ignored),
        ],
    );
}

#[test]
fn variables() {
    check_types(
        "*** Variables ***\n${HOST}    localhost\n@{USERS}    alice    bob\n...    carol\n",
        &[
            ("*** Variables ***", Table),
            ("${HOST}", VariableKey),
            ("localhost", VariableVal),
            ("@{USERS}", VariableKey),
            ("alice", VariableVal),
            ("bob", VariableVal),
            ("carol", VariableVal),
        ],
    );
}

#[test]
fn setup_keyword_call() {
    check_types(
        "*Settings\nSuite Setup  Run Keywords  Open  AND  Close\nTest Teardown  \\  ${x}=  Get State\n",
        &[
            ("*Settings", Table),
            ("Suite Setup", SettingKey),
            ("Run Keywords", KeywordCall),
            ("Open", KeywordCallDynamic),
            ("AND", KeywordCallDynamic),
            ("Close", KeywordCallDynamic),
            ("Test Teardown", SettingKey),
            ("${x}=", KeywordLvalue),
            ("Get State", KeywordCall),
        ],
    );
}

/// An empty cell ahead of assignment targets keeps them targets in a setup
/// setting, but in an ordinary step it means the keyword comes next.
#[test]
fn empty_cell_before_assignment() {
    check_types(
        "*Test Cases\nTC\n  [Setup]  \\  ${x}=  Kw\n  \\  ${x}=  Kw\n  \\  [Tags]  t\n",
        &[
            ("*Test Cases", Table),
            ("TC", NewTestcase),
            ("[Setup]", SettingKey),
            ("${x}=", KeywordLvalue),
            ("Kw", KeywordCall),
            ("${x}=", KeywordCall),
            ("Kw", KeywordArg),
            ("[Tags]", SettingKey),
            ("t", SettingVal),
        ],
    );
}

#[test]
fn nested_keyword_argument() {
    check_types(
        "*Test Cases\nTC  Run Keyword If  ${x} == 1  Log  message\n",
        &[
            ("*Test Cases", Table),
            ("TC", NewTestcase),
            ("Run Keyword If", KeywordCall),
            ("${x} == 1", KeywordArg),
            ("Log", KeywordCallDynamic),
            ("message", KeywordArg),
        ],
    );
}

#[test]
fn chained_nested_keywords() {
    check_types(
        "*Keywords\nKw\n    Run Keyword If  ${ok}  Run Keyword  Wait Until Keyword Succeeds  3x  1s  Click  id=go\n",
        &[
            ("*Keywords", Table),
            ("Kw", NewKeyword),
            ("Run Keyword If", KeywordCall),
            ("${ok}", KeywordArg),
            ("Run Keyword", KeywordCallDynamic),
            ("Wait Until Keyword Succeeds", KeywordCallDynamic),
            ("3x", KeywordArg),
            ("1s", KeywordArg),
            ("Click", KeywordCallDynamic),
            ("id=go", KeywordArg),
        ],
    );
}

#[test]
fn nested_keyword_on_continuation_line() {
    check_types(
        "*Test Cases\nTC\n    Run Keyword If  ${x}\n    ...  Log  message\n",
        &[
            ("*Test Cases", Table),
            ("TC", NewTestcase),
            ("Run Keyword If", KeywordCall),
            ("${x}", KeywordArg),
            ("Log", KeywordCallDynamic),
            ("message", KeywordArg),
        ],
    );
}

#[test]
fn assignments() {
    check_types(
        "*Test Cases\nTC\n    ${a}  ${b}=  Get Values\n    ${c}  Log\n    &{d} =  Create Dictionary\n",
        &[
            ("*Test Cases", Table),
            ("TC", NewTestcase),
            ("${a}", KeywordLvalue),
            ("${b}=", KeywordLvalue),
            ("Get Values", KeywordCall),
            // Without `=`, the variable is the keyword.
            ("${c}", KeywordCall),
            ("Log", KeywordArg),
            ("&{d} =", KeywordLvalue),
            ("Create Dictionary", KeywordCall),
        ],
    );
}

#[test]
fn assignment_spans_lines() {
    check_types(
        "*Test Cases\nTC\n    ${a}\n    # between\n\n    ...  ${b}=  Get Values\n",
        &[
            ("*Test Cases", Table),
            ("TC", NewTestcase),
            ("${a}", KeywordLvalue),
            ("# between", Comment),
            ("${b}=", KeywordLvalue),
            ("Get Values", KeywordCall),
        ],
    );
}

#[test]
fn for_loop() {
    check_types(
        "*Test Cases\nTC\n    :FOR  ${i}  IN RANGE  10\n    \\  Log  ${i}\n    : for  ${a}  ${b}  IN ZIP  ${x}  ${y}\n",
        &[
            ("*Test Cases", Table),
            ("TC", NewTestcase),
            (":FOR", ForPart),
            ("${i}", KeywordLvalue),
            ("IN RANGE", ForPart),
            ("10", KeywordArg),
            ("Log", KeywordCall),
            ("${i}", KeywordArg),
            (": for", ForPart),
            ("${a}", KeywordLvalue),
            ("${b}", KeywordLvalue),
            ("IN ZIP", ForPart),
            ("${x}", KeywordArg),
            ("${y}", KeywordArg),
        ],
    );
}

#[test]
fn bracketed_settings() {
    check_types(
        "*Keywords\nKw  [Documentation]  Does things.\n    [Arguments]  ${a}  ${b}\n    [Teardown]  Log  done\n    [Frobnicate]  x\n    [Return]  ${a}\n",
        &[
            ("*Keywords", Table),
            ("Kw", NewKeyword),
            ("[Documentation]", SettingKey),
            ("Does things.", SettingVal),
            ("[Arguments]", SettingKey),
            ("${a}", SettingVal),
            ("${b}", SettingVal),
            ("[Teardown]", SettingKey),
            ("Log", KeywordCall),
            ("done", KeywordArg),
            ("[Frobnicate]", SettingKey),
            ("x", Ignored),
            ("[Return]", SettingKey),
            ("${a}", SettingVal),
        ],
    );
}

#[test]
fn global_template() {
    check_types(
        "*Settings\nTest Template  Check Login\n*Test Cases\nValid  alice  secret\nEmpty\n    \\  ${EMPTY}\n",
        &[
            ("*Settings", Table),
            ("Test Template", SettingKey),
            ("Check Login", KeywordCall),
            ("*Test Cases", Table),
            ("Valid", NewTestcase),
            ("alice", KeywordArg),
            ("secret", KeywordArg),
            ("Empty", NewTestcase),
            ("${EMPTY}", KeywordArg),
        ],
    );
}

#[test]
fn template_cancellation() {
    check_types(
        "*Settings\nTest Template  Check\n*Test Cases\nTC1  a  b\nTC2  [Template]  NONE\n    Log  x\nTC3  c\n",
        &[
            ("*Settings", Table),
            ("Test Template", SettingKey),
            ("Check", KeywordCall),
            ("*Test Cases", Table),
            ("TC1", NewTestcase),
            ("a", KeywordArg),
            ("b", KeywordArg),
            ("TC2", NewTestcase),
            ("[Template]", SettingKey),
            ("NONE", KeywordCall),
            ("Log", KeywordCall),
            ("x", KeywordArg),
            // The local setting does not outlive its test case.
            ("TC3", NewTestcase),
            ("c", KeywordArg),
        ],
    );
    check_types(
        "*Settings\nTest Template  none\n*Test Cases\nTC  Log  x\n",
        &[
            ("*Settings", Table),
            ("Test Template", SettingKey),
            ("none", KeywordCall),
            ("*Test Cases", Table),
            ("TC", NewTestcase),
            ("Log", KeywordCall),
            ("x", KeywordArg),
        ],
    );
}

#[test]
fn empty_local_template_cancels_global() {
    check_types(
        "*Settings\nTest Template  Check\n*Test Cases\nTC  [Template]\n    Log  x\n",
        &[
            ("*Settings", Table),
            ("Test Template", SettingKey),
            ("Check", KeywordCall),
            ("*Test Cases", Table),
            ("TC", NewTestcase),
            ("[Template]", SettingKey),
            ("Log", KeywordCall),
            ("x", KeywordArg),
        ],
    );
}

#[test]
fn local_template_applies_from_where_it_appears() {
    check_types(
        "*Test Cases\nTC\n    Log  before\n    [Template]  Check\n    after\nNext\n    Log  x\n",
        &[
            ("*Test Cases", Table),
            ("TC", NewTestcase),
            ("Log", KeywordCall),
            ("before", KeywordArg),
            ("[Template]", SettingKey),
            ("Check", KeywordCall),
            ("after", KeywordArg),
            ("Next", NewTestcase),
            ("Log", KeywordCall),
            ("x", KeywordArg),
        ],
    );
}

#[test]
fn templates_do_not_apply_to_keywords() {
    check_types(
        "*Settings\nTest Template  Check\n*Keywords\nKw\n    Log  x\n",
        &[
            ("*Settings", Table),
            ("Test Template", SettingKey),
            ("Check", KeywordCall),
            ("*Keywords", Table),
            ("Kw", NewKeyword),
            ("Log", KeywordCall),
            ("x", KeywordArg),
        ],
    );
}

#[test]
fn ignored_lines() {
    check_types(
        "preamble  text\n...  more\n*** Test Cases ***  Value\n    Log  orphan\n...  continued\n*** Comments ***\nanything  here\n",
        &[
            ("preamble", Ignored),
            ("text", Ignored),
            ("more", Ignored),
            ("*** Test Cases ***", Table),
            ("Value", Ignored),
            ("Log", Ignored),
            ("orphan", Ignored),
            ("continued", Ignored),
            ("*** Comments ***", Table),
            ("anything", Ignored),
            ("here", Ignored),
        ],
    );
}

#[test]
fn continuation_after_header_is_ignored() {
    check_types(
        "*Settings\n...  stray\nLibrary  X\n",
        &[
            ("*Settings", Table),
            ("stray", Ignored),
            ("Library", SettingKey),
            ("X", SettingFile),
        ],
    );
}

#[test]
fn empty_cells_are_not_classified() {
    let stream = classify_str("*Test Cases\nTC\n    Log  \\  x\n").unwrap();
    let line = &stream.lines()[2];
    assert_eq!(line.cells[0].text, "");
    assert_eq!(line.cells[0].semantic_type(), None);
    assert_eq!(line.cells[1].semantic_type(), Some(KeywordCall));
    assert_eq!(line.cells[2].semantic_type(), Some(KeywordArg));
    assert_eq!(line.cells[3].semantic_type(), Some(KeywordArg));
}

#[test]
fn idempotent() {
    let input = "*Settings\nTest Template  T\nLibrary  L  WITH NAME  M\n*Test Cases\nA  x  # c\n  [Template]  NONE\n  ${v}=  K  Run Keyword  Y\n*Keywords\nK\n  :FOR  ${i}  IN  a\n  \\  Log  ${i}\n";
    let first = classify_str(input).unwrap();
    let second = classify_str(input).unwrap();
    assert_eq!(first, second);
}

#[test]
fn custom_vocabulary() {
    let vocabulary = Vocabulary::from_toml(
        "[settings]\n\"Task Setup\" = \"keyword_args\"\n\n[keyword_arguments]\n\"Retry\" = 2\n",
    )
    .unwrap();
    let source = SourceFile::for_string(String::from(
        "*Settings\nTask Setup  Retry  3  Log  hi\n",
    ));
    let stream = classify(&source, &vocabulary, &Cancellation::new()).unwrap();
    assert_eq!(
        stream.semantic_types(),
        vec![Table, SettingKey, KeywordCall, KeywordArg, KeywordCallDynamic, KeywordArg]
    );
}

#[test]
fn unclassified_lines_are_a_fault() {
    let mut lines = LineReader::new("*Settings\nLibrary  X\n")
        .map(Line::from)
        .collect::<Vec<_>>();
    let error = classify_arguments(&mut lines, Vocabulary::builtin(), &Cancellation::new())
        .unwrap_err();
    match error {
        Error::Internal(fault) => {
            assert_eq!(fault.line_no, 1);
            assert_eq!(fault.content, "*Settings");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn cancelled() {
    let source = SourceFile::for_string(String::from("*Settings\nLibrary  X\n"));
    let cancellation = Cancellation::new();
    cancellation.cancel();
    assert!(matches!(
        classify(&source, Vocabulary::builtin(), &cancellation),
        Err(Error::Cancelled)
    ));
}
