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

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use encoding_rs::Encoding;
use rflex::lex::{ArgumentType, LineType, TableKind};
use thiserror::Error as ThisError;

use crate::show::{Detail, Show};

mod show;

/// rflex, a classifier for tabular test-specification files.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, Debug)]
enum Command {
    /// Classify a file and show its lines and cells.
    Show(Show),

    /// Classify a file and show only its line types.
    Lines(Show),

    /// List the types that classification assigns.
    Types(Types),
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Command::Show(show) => show.run(Detail::Cells),
            Command::Lines(show) => show.run(Detail::Lines),
            Command::Types(types) => types.run(),
        }
    }
}

#[derive(Args, Clone, Debug)]
struct Types {
    /// List line types and table kinds too.
    #[arg(long)]
    all: bool,
}

impl Types {
    fn run(self) -> Result<()> {
        for argument_type in enum_iterator::all::<ArgumentType>() {
            println!("{argument_type}");
        }
        if self.all {
            println!();
            for line_type in enum_iterator::all::<LineType>() {
                println!("{line_type} ({})", line_type.table());
            }
            println!();
            for table in enum_iterator::all::<TableKind>() {
                println!("{table}");
            }
        }
        Ok(())
    }
}

#[derive(ThisError, Debug)]
#[error("{0}: unknown encoding")]
struct UnknownEncodingError(String);

fn parse_encoding(arg: &str) -> Result<&'static Encoding, UnknownEncodingError> {
    match Encoding::for_label_no_replacement(arg.as_bytes()) {
        Some(encoding) => Ok(encoding),
        None => Err(UnknownEncodingError(arg.to_string())),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    Cli::parse().command.run()
}
