//! Comma-separated directive lists as used by the `WWW-Authenticate` and
//! `Authorization` headers (`Scheme name="value", name=token, ...`).

use crate::{Error, Result};

/// Directives that are written bare; every other value is quoted
const UNQUOTED: &[&str] = &["qop", "algorithm", "nc", "stale"];

/// Directive map that keeps the order in which names first appeared
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Directives {
    entries: Vec<(String, String)>,
}

impl Directives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a directive. Names are case-insensitive; re-inserting a name replaces
    /// the value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a header value into its directives, dropping a leading `scheme` token.
///
/// # Errors
/// If a quoted value is not terminated, or a directive name has no value.
pub fn split_csl(scheme: &str, input: &str) -> Result<Directives> {
    let mut input = input.trim();
    if input.len() >= scheme.len()
        && input.is_char_boundary(scheme.len())
        && input[..scheme.len()].eq_ignore_ascii_case(scheme)
    {
        input = &input[scheme.len()..];
    }

    parse_directives(input)
}

/// Parse the `name=value, name="quoted value"` body of a header
fn parse_directives(input: &str) -> Result<Directives> {
    #[derive(Debug)]
    enum State {
        White,
        Name(usize),
        ValueBegin,
        ValueQuoted,
        ValueQuotedNextLiteral,
        ValuePlain,
    }

    let mut state = State::White;

    let mut parsed = Directives::new();
    let mut current_name = "";
    let mut current_value = String::new();

    for (pos, c) in input.char_indices() {
        match state {
            State::White => {
                if c.is_alphabetic() {
                    state = State::Name(pos);
                }
            }
            State::Name(start) => {
                if c == '=' {
                    current_name = input[start..pos].trim();
                    state = State::ValueBegin;
                } else if c == ',' {
                    return Err(Error::InvalidHeaderSyntax(input.into()));
                }
            }
            State::ValueBegin => {
                current_value.clear();
                state = match c {
                    '"' => State::ValueQuoted,
                    ',' => {
                        parsed.insert(current_name, "");
                        State::White
                    }
                    c if c.is_ascii_whitespace() => State::ValueBegin,
                    _ => {
                        current_value.push(c);
                        State::ValuePlain
                    }
                };
            }
            State::ValueQuoted => match c {
                '"' => {
                    parsed.insert(current_name, current_value.as_str());
                    current_value.clear();
                    state = State::White;
                }
                '\\' => state = State::ValueQuotedNextLiteral,
                _ => current_value.push(c),
            },
            State::ValuePlain => {
                if c == ',' || c.is_ascii_whitespace() {
                    parsed.insert(current_name, current_value.as_str());
                    current_value.clear();
                    state = State::White;
                } else {
                    current_value.push(c);
                }
            }
            State::ValueQuotedNextLiteral => {
                current_value.push(c);
                state = State::ValueQuoted
            }
        }
    }

    match state {
        State::ValuePlain => parsed.insert(current_name, current_value),
        State::ValueBegin => parsed.insert(current_name, ""),
        State::White => {}
        State::Name(_) | State::ValueQuoted | State::ValueQuotedNextLiteral => {
            return Err(Error::InvalidHeaderSyntax(input.into()))
        }
    }

    Ok(parsed)
}

/// Render directives after `scheme`, quoting values except the bare tokens
/// (`qop`, `algorithm`, `nc`, `stale`).
pub fn merge_csl<'a, I>(scheme: &str, directives: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::from(scheme);
    for (i, (name, value)) in directives.into_iter().enumerate() {
        out.push_str(if i == 0 { " " } else { ", " });
        out.push_str(name);
        out.push('=');
        if UNQUOTED.iter().any(|u| u.eq_ignore_ascii_case(name)) {
            out.push_str(value);
        } else {
            out.push('"');
            out.push_str(&quote(value));
            out.push('"');
        }
    }
    out
}

/// Backslash-escape a value for use inside a quoted string
fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
