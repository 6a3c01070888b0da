/// Parser for the line-oriented text record format.
///
/// A record is a CRLF-separated sequence of content lines of the form
/// `[GROUP.]NAME(;PARAM=VALUE)*:VALUE`. Long lines may be folded: a CRLF
/// followed by a single space or tab continues the previous line.
///
/// Property and parameter names are upper-cased at parse time so that all
/// later comparisons on names are exact. Groups, parameter values (including
/// any surrounding double quotes) and property values are kept verbatim.
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches a group, property or parameter name at the start of the input.
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9-]+").unwrap_or_else(|_| unreachable!("name pattern is valid"))
});

/// Matches a line fold: CRLF followed by one whitespace character.
static FOLD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\r\n[ \t]").unwrap_or_else(|_| unreachable!("fold pattern is valid"))
});

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single `NAME=VALUE` parameter of a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Upper-cased parameter name.
    pub name: String,
    /// Raw value, including surrounding quotes if the line had them.
    pub value: String,
}

impl Parameter {
    /// Builds a parameter, upper-casing `name`.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_uppercase(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// One content line of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Group prefix, without the trailing dot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Upper-cased property name.
    pub name: String,
    /// Parameters in line order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Parameter>,
    /// Raw value: everything after the first unquoted colon.
    pub value: String,
}

impl Property {
    /// Builds a property without group or parameters.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            group: None,
            name: name.to_uppercase(),
            params: Vec::new(),
            value: value.into(),
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push(Parameter::new(name, value));
        self
    }

    /// Sets the group prefix.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Iterates the parameters named `name` (already upper-cased).
    pub fn params_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Parameter> {
        self.params.iter().filter(move |p| p.name == name)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(group) = &self.group {
            write!(f, "{group}.")?;
        }
        f.write_str(&self.name)?;
        for param in &self.params {
            write!(f, ";{param}")?;
        }
        write!(f, ":{}", self.value)
    }
}

/// An ordered sequence of properties parsed from one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    /// Properties in payload order.
    pub properties: Vec<Property>,
}

impl Record {
    /// Wraps a property list.
    pub fn new(properties: Vec<Property>) -> Self {
        Self { properties }
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if the record holds no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for prop in &self.properties {
            write!(f, "{prop}\r\n")?;
        }
        Ok(())
    }
}

/// A content line that does not follow the record grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse error on line {line}: {message}: {input:?}")]
pub struct ParseError {
    /// 1-based line number after unfolding.
    pub line: usize,
    /// What the parser expected.
    pub message: String,
    /// The remaining, unparsed part of the line.
    pub input: String,
}

impl ParseError {
    fn new(line: usize, message: &str, input: &str) -> Self {
        Self {
            line,
            message: message.to_owned(),
            input: input.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses a complete payload into a [`Record`].
///
/// The payload is unfolded first, then split on CRLF. A single trailing
/// empty line (from a terminating CRLF) is ignored; any other empty line is
/// a [`ParseError`].
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered. No partial record is
/// returned.
pub fn parse_record(text: &str) -> Result<Record, ParseError> {
    let unfolded = FOLD_RE.replace_all(text, "");
    let mut lines: Vec<&str> = unfolded.split("\r\n").collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let properties = lines
        .iter()
        .enumerate()
        .map(|(idx, line)| parse_property(line, idx + 1))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Record { properties })
}

/// Parses one unfolded content line.
///
/// # Errors
///
/// Returns [`ParseError`] if the line does not match the grammar.
pub fn parse_property(line: &str, line_no: usize) -> Result<Property, ParseError> {
    let first = take_name(line).ok_or_else(|| ParseError::new(line_no, "expected name", line))?;
    let mut rest = &line[first.len()..];

    let (group, name) = match rest.strip_prefix('.') {
        Some(after) => {
            let name = take_name(after)
                .ok_or_else(|| ParseError::new(line_no, "expected name after group", after))?;
            rest = &after[name.len()..];
            (Some(first.to_owned()), name)
        }
        None => (None, first),
    };

    let mut params = Vec::new();
    while let Some(after) = rest.strip_prefix(';') {
        let (param, remainder) = parse_parameter(after)
            .ok_or_else(|| ParseError::new(line_no, "malformed parameter", rest))?;
        params.push(param);
        rest = remainder;
    }

    let value = rest
        .strip_prefix(':')
        .ok_or_else(|| ParseError::new(line_no, "expected ':' before value", rest))?;

    Ok(Property {
        group,
        name: name.to_uppercase(),
        params,
        value: value.to_owned(),
    })
}

/// Returns the leading `[A-Za-z0-9-]+` token of `s`, if any.
fn take_name(s: &str) -> Option<&str> {
    NAME_RE.find(s).map(|m| m.as_str())
}

/// Parses `NAME=VALUE` at the start of `s` (the leading `;` already
/// consumed) and returns the parameter plus the unparsed remainder.
fn parse_parameter(s: &str) -> Option<(Parameter, &str)> {
    let name = take_name(s)?;
    let after_name = s[name.len()..].strip_prefix('=')?;
    let value_len = if after_name.starts_with('"') {
        closing_quote_end(after_name)?
    } else {
        after_name
            .find(|c| matches!(c, '"' | ';' | ':'))
            .unwrap_or(after_name.len())
    };
    let (value, remainder) = after_name.split_at(value_len);
    Some((Parameter::new(name, value), remainder))
}

/// Given `s` starting with `"`, returns the byte length up to and including
/// the first closing quote that is not preceded by a backslash.
fn closing_quote_end(s: &str) -> Option<usize> {
    let mut prev = '"';
    for (idx, c) in s.char_indices().skip(1) {
        if c == '"' && prev != '\\' {
            return Some(idx + 1);
        }
        prev = c;
    }
    None
}

/// Splits `s` on every `sep` that is not immediately preceded by a
/// backslash. The backslash escape is left in place in the parts.
pub fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev = None;
    for (idx, c) in s.char_indices() {
        if c == sep && prev != Some('\\') {
            parts.push(&s[start..idx]);
            start = idx + c.len_utf8();
        }
        prev = Some(c);
    }
    parts.push(&s[start..]);
    parts
}
