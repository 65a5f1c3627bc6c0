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

//! Vocabulary.
//!
//! The classifier needs to recognize a few fixed sets of names:
//!
//! - Table names in table headers, such as `*** Test Cases ***`.
//!
//! - Setting names in the Settings table, such as `Library`, and in the
//!   bracketed settings of test cases and keywords, such as `[Setup]`.  Each
//!   setting has a [SettingShape] that says how its values are classified.
//!
//! - Names of keywords that take another keyword as one of their arguments,
//!   such as `Run Keyword If`, with the position of that argument.
//!
//! - A few reserved words: `:FOR`, `IN`, `WITH NAME`, and `NONE`.
//!
//! The built-in tables may be extended from a TOML file, so that keywords from
//! libraries that run other keywords can be recognized too.

use std::{collections::BTreeMap, sync::OnceLock};

use hashbrown::HashMap;
use serde::Deserialize;
use unicase::UniCase;

use super::line_type::TableKind;

/// How the values of a setting are classified.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingShape {
    /// Not a known setting.  Its values are ignored.
    #[default]
    Unknown,

    /// Free text, such as documentation or tags.
    String,

    /// A single file name.
    File,

    /// A file name followed by arguments and an optional `WITH NAME` alias.
    FileArgs,

    /// A keyword call, such as a setup or teardown.
    KeywordArgs,
}

/// The argument position at which a keyword takes another keyword.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawKeywordArgument")]
pub enum KeywordArgument {
    /// The argument at this 1-based position is a keyword.  Arguments before
    /// it are ordinary, and so are the ones after it, except that they are
    /// the arguments of the nested keyword.
    At(usize),

    /// Every argument is a keyword.
    All,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawKeywordArgument {
    Position(usize),
    Word(String),
}

impl TryFrom<RawKeywordArgument> for KeywordArgument {
    type Error = String;

    fn try_from(raw: RawKeywordArgument) -> Result<Self, Self::Error> {
        match raw {
            RawKeywordArgument::Position(0) => {
                Err(String::from("keyword argument positions start at 1"))
            }
            RawKeywordArgument::Position(position) => Ok(Self::At(position)),
            RawKeywordArgument::Word(word) if word.eq_ignore_ascii_case("all") => Ok(Self::All),
            RawKeywordArgument::Word(word) => Err(format!(
                "{word:?} is not a keyword argument position (expected a number or \"all\")"
            )),
        }
    }
}

const TABLE_NAMES: &[(&str, TableKind)] = &[
    ("setting", TableKind::Setting),
    ("settings", TableKind::Setting),
    ("metadata", TableKind::Setting),
    ("variable", TableKind::Variable),
    ("variables", TableKind::Variable),
    ("testcase", TableKind::Testcase),
    ("testcases", TableKind::Testcase),
    ("keyword", TableKind::Keyword),
    ("keywords", TableKind::Keyword),
    ("userkeyword", TableKind::Keyword),
    ("userkeywords", TableKind::Keyword),
];

const SETTINGS: &[(&str, SettingShape)] = &[
    ("Library", SettingShape::FileArgs),
    ("Resource", SettingShape::File),
    ("Variables", SettingShape::FileArgs),
    ("Documentation", SettingShape::String),
    ("Metadata", SettingShape::String),
    ("Suite Setup", SettingShape::KeywordArgs),
    ("Suite Precondition", SettingShape::KeywordArgs),
    ("Suite Teardown", SettingShape::KeywordArgs),
    ("Suite Postcondition", SettingShape::KeywordArgs),
    ("Test Setup", SettingShape::KeywordArgs),
    ("Test Precondition", SettingShape::KeywordArgs),
    ("Test Teardown", SettingShape::KeywordArgs),
    ("Test Postcondition", SettingShape::KeywordArgs),
    ("Test Template", SettingShape::KeywordArgs),
    ("Force Tags", SettingShape::String),
    ("Default Tags", SettingShape::String),
    ("Test Timeout", SettingShape::String),
];

const TESTCASE_SETTINGS: &[(&str, SettingShape)] = &[
    ("[Documentation]", SettingShape::String),
    ("[Tags]", SettingShape::String),
    ("[Setup]", SettingShape::KeywordArgs),
    ("[Precondition]", SettingShape::KeywordArgs),
    ("[Teardown]", SettingShape::KeywordArgs),
    ("[Postcondition]", SettingShape::KeywordArgs),
    ("[Template]", SettingShape::KeywordArgs),
    ("[Timeout]", SettingShape::String),
];

const KEYWORD_SETTINGS: &[(&str, SettingShape)] = &[
    ("[Documentation]", SettingShape::String),
    ("[Arguments]", SettingShape::String),
    ("[Return]", SettingShape::String),
    ("[Teardown]", SettingShape::KeywordArgs),
    ("[Timeout]", SettingShape::String),
    ("[Tags]", SettingShape::String),
];

const KEYWORD_ARGUMENTS: &[(&str, KeywordArgument)] = &[
    ("Run Keyword", KeywordArgument::At(1)),
    ("Run Keyword And Continue On Failure", KeywordArgument::At(1)),
    ("Run Keyword And Ignore Error", KeywordArgument::At(1)),
    ("Run Keyword And Return Status", KeywordArgument::At(1)),
    ("Run Keyword And Expect Error", KeywordArgument::At(2)),
    ("Run Keyword And Return", KeywordArgument::At(1)),
    ("Run Keyword And Return If", KeywordArgument::At(2)),
    ("Run Keyword If", KeywordArgument::At(2)),
    ("Run Keyword Unless", KeywordArgument::At(2)),
    ("Run Keyword If All Critical Tests Passed", KeywordArgument::At(1)),
    ("Run Keyword If All Tests Passed", KeywordArgument::At(1)),
    ("Run Keyword If Any Critical Tests Failed", KeywordArgument::At(1)),
    ("Run Keyword If Any Tests Failed", KeywordArgument::At(1)),
    ("Run Keyword If Test Failed", KeywordArgument::At(1)),
    ("Run Keyword If Test Passed", KeywordArgument::At(1)),
    ("Run Keyword If Timeout Occurred", KeywordArgument::At(1)),
    ("Repeat Keyword", KeywordArgument::At(2)),
    ("Wait Until Keyword Succeeds", KeywordArgument::At(3)),
    ("Register Keyword To Run On Failure", KeywordArgument::At(1)),
    ("Run Keywords", KeywordArgument::All),
];

/// The Settings-table setting that names the global test template.
pub const TEST_TEMPLATE: &str = "Test Template";

/// The test case setting that names the local test template.
pub const TEMPLATE: &str = "[Template]";

/// The separator between a library and its alias.
pub const WITH_NAME: &str = "WITH NAME";

const FOR_IN: &[&str] = &["IN", "IN RANGE", "IN ENUMERATE", "IN ZIP"];

/// Normalizes keyword name `name` the way keyword names are compared: case,
/// spaces, and underscores are insignificant.
pub fn normalize_keyword(name: &str) -> String {
    name.chars()
        .filter(|&c| !c.is_whitespace() && c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Returns the kind of table introduced by a header cell containing
/// `header`, such as `*** Test Cases ***`, or `None` if `header` does not name
/// a known table.
pub fn table_for_header(header: &str) -> Option<TableKind> {
    let name = header
        .trim_matches(|c: char| c == '*' || c.is_whitespace())
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect::<String>();
    TABLE_NAMES
        .iter()
        .find(|(table_name, _)| *table_name == name)
        .map(|(_, kind)| *kind)
}

/// Returns true if `text` begins a `:FOR` loop.
pub fn is_for_marker(text: &str) -> bool {
    normalize_keyword(text) == ":for"
}

/// Returns true if `text` separates the variables of a `:FOR` loop from the
/// values it iterates over.
pub fn is_for_in(text: &str) -> bool {
    let words = text.split_whitespace().collect::<Vec<_>>().join(" ");
    FOR_IN.iter().any(|s| s.eq_ignore_ascii_case(&words))
}

/// Returns true if `text` is the template name that cancels a template.
pub fn is_no_template(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("NONE")
}

pub fn is_test_template(name: &str) -> bool {
    UniCase::new(name.trim()) == UniCase::new(TEST_TEMPLATE)
}

pub fn is_template(name: &str) -> bool {
    UniCase::new(name.trim()) == UniCase::new(TEMPLATE)
}

/// Additions to the built-in vocabulary, as read from a TOML file, e.g.:
///
/// ```toml
/// [settings]
/// "Task Setup" = "keyword_args"
///
/// [keyword_arguments]
/// "Run Keyword Twice" = 1
/// "Run In Parallel" = "all"
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Extension {
    pub settings: BTreeMap<String, SettingShape>,
    pub testcase_settings: BTreeMap<String, SettingShape>,
    pub keyword_settings: BTreeMap<String, SettingShape>,
    pub keyword_arguments: BTreeMap<String, KeywordArgument>,
}

type SettingMap = HashMap<UniCase<String>, SettingShape>;

fn setting_map(settings: &[(&str, SettingShape)]) -> SettingMap {
    settings
        .iter()
        .map(|(name, shape)| (UniCase::new(String::from(*name)), *shape))
        .collect()
}

fn lookup_setting(map: &SettingMap, name: &str) -> SettingShape {
    map.get(&UniCase::new(String::from(name.trim())))
        .copied()
        .unwrap_or_default()
}

/// The names the classifier recognizes.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    settings: SettingMap,
    testcase_settings: SettingMap,
    keyword_settings: SettingMap,

    /// Indexed by [normalize_keyword].
    keyword_arguments: HashMap<String, KeywordArgument>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            settings: setting_map(SETTINGS),
            testcase_settings: setting_map(TESTCASE_SETTINGS),
            keyword_settings: setting_map(KEYWORD_SETTINGS),
            keyword_arguments: KEYWORD_ARGUMENTS
                .iter()
                .map(|(name, argument)| (normalize_keyword(name), *argument))
                .collect(),
        }
    }
}

impl Vocabulary {
    /// Returns the built-in vocabulary.
    pub fn builtin() -> &'static Self {
        static BUILTIN: OnceLock<Vocabulary> = OnceLock::new();
        BUILTIN.get_or_init(Self::default)
    }

    /// Returns the built-in vocabulary extended by the TOML in `s`.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        let mut vocabulary = Self::default();
        vocabulary.extend(toml::from_str(s)?);
        Ok(vocabulary)
    }

    /// Adds the names in `extension`, replacing any built-in entries with the
    /// same names.
    pub fn extend(&mut self, extension: Extension) {
        fn add(map: &mut SettingMap, names: BTreeMap<String, SettingShape>) {
            map.extend(
                names
                    .into_iter()
                    .map(|(name, shape)| (UniCase::new(name.trim().to_string()), shape)),
            );
        }
        add(&mut self.settings, extension.settings);
        add(&mut self.testcase_settings, extension.testcase_settings);
        add(&mut self.keyword_settings, extension.keyword_settings);
        self.keyword_arguments.extend(
            extension
                .keyword_arguments
                .into_iter()
                .map(|(name, argument)| (normalize_keyword(&name), argument)),
        );
    }

    /// Returns the shape of Settings-table setting `name`.
    pub fn setting(&self, name: &str) -> SettingShape {
        lookup_setting(&self.settings, name)
    }

    /// Returns the shape of bracketed setting `name` in a test case or
    /// keyword, according to `table`.
    pub fn statement_setting(&self, table: TableKind, name: &str) -> SettingShape {
        match table {
            TableKind::Testcase => lookup_setting(&self.testcase_settings, name),
            TableKind::Keyword => lookup_setting(&self.keyword_settings, name),
            TableKind::Unknown | TableKind::Setting | TableKind::Variable => {
                SettingShape::Unknown
            }
        }
    }

    /// If keyword `name` takes another keyword as an argument, returns where.
    pub fn keyword_argument(&self, name: &str) -> Option<KeywordArgument> {
        self.keyword_arguments.get(&normalize_keyword(name)).copied()
    }
}
