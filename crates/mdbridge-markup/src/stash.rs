//! Opaque placeholders for already-converted fragments.
//!
//! Code and math are converted first and replaced by a token built from
//! private-use characters, so later pattern passes (emphasis, strikethrough,
//! tag stripping) cannot touch their content. Tokens are swapped back at the end.

use std::sync::LazyLock;

use regex::{Captures, Regex};

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").unwrap());

#[derive(Default)]
pub(crate) struct Stash {
    fragments: Vec<String>,
}

impl Stash {
    /// Remove token delimiters from input so stray characters cannot forge a token.
    pub(crate) fn sanitize(text: &str) -> String {
        text.replace([OPEN, CLOSE], "")
    }

    /// Store a fragment and return the token standing in for it.
    pub(crate) fn put(&mut self, fragment: String) -> String {
        self.fragments.push(fragment);
        format!("{OPEN}{}{CLOSE}", self.fragments.len() - 1)
    }

    /// Replace every token with its fragment.
    pub(crate) fn restore(&self, text: &str) -> String {
        TOKEN_RE
            .replace_all(text, |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.fragments.get(i))
                    .cloned()
                    .unwrap_or_default()
            })
            .into_owned()
    }
}
