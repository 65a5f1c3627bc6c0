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

#![no_main]

use libfuzzer_sys::fuzz_target;
use rflex::lex::{Cancellation, SourceFile, Vocabulary, classify};

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = SourceFile::for_bytes(data, None, None) {
        let stream = classify(&source, Vocabulary::builtin(), &Cancellation::new()).unwrap();
        for line in stream.lines() {
            assert_eq!(line.is_blank(), line.line_type().is_none());
            for cell in &line.cells {
                assert_eq!(&source.contents()[cell.range()], cell.text);
            }
        }
    }
});
