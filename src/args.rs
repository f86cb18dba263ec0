//! Shell-style splitting of free-form option strings.
//!
//! `AdditionalOptions` in `.vcxproj` files and `OTHER_CFLAGS`-like settings
//! in `.pbxproj` files are whitespace-separated, with double-quoted runs kept
//! together: `/D"NAME=a b" /W4` yields `NAME=a b` glued to `/D`, then `/W4`.

use chumsky::prelude::*;

fn args_parser<'a>() -> impl Parser<'a, &'a str, Vec<String>, extra::Err<Simple<'a, char>>> {
    let quoted = just('"')
        .ignore_then(none_of('"').repeated().to_slice())
        .then_ignore(just('"'));

    let bare = none_of(" \t\r\n\"").repeated().at_least(1).to_slice();

    let token = quoted
        .or(bare)
        .repeated()
        .at_least(1)
        .collect::<Vec<&str>>()
        .map(|pieces| pieces.concat());

    token.padded().repeated().collect::<Vec<String>>()
}

/// Split `input` into arguments.  Quotes are removed; a quoted run is never
/// split on whitespace.  Input with an unterminated quote falls back to
/// plain whitespace splitting.
pub fn split_args(input: &str) -> Vec<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match args_parser().parse(trimmed).into_result() {
        Ok(args) => args,
        Err(_) => {
            tracing::debug!(input = trimmed, "unbalanced quotes in option string");
            trimmed.split_whitespace().map(String::from).collect()
        }
    }
}
