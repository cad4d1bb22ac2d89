//! Parser for the catalog service query micro-language.
//!
//! Components are stripped from the outside in: `~near` first, then `@dc`,
//! then `?options`, and finally the `tag.` prefix. Splitting on textual
//! position in this order is what lets `~near` trail a full expression that
//! already carries its own options and datacenter.

use super::ServiceQuery;
use crate::error::ParseError;

const NEAR_SEPARATOR: char = '~';
const DC_SEPARATOR: char = '@';
const OPTIONS_SEPARATOR: char = '?';
const OPTION_JOINER: char = '&';
const OPTION_ASSIGN: char = '=';
const TAG_SEPARATOR: char = '.';

const OPTION_NAMESPACE: &str = "ns";
const OPTION_PARTITION: &str = "partition";

/// Parse query text into a [`ServiceQuery`] with a fresh cancellation signal.
pub fn parse(input: &str) -> Result<ServiceQuery, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut remaining = input;

    let near = take_suffix(input, &mut remaining, NEAR_SEPARATOR)?;
    let dc = take_suffix(input, &mut remaining, DC_SEPARATOR)?;

    let options = match remaining.split_once(OPTIONS_SEPARATOR) {
        Some((rest, raw)) => {
            remaining = rest;
            parse_options(input, raw)?
        }
        None => Options::default(),
    };

    let (tag, name) = match remaining.split_once(TAG_SEPARATOR) {
        Some(("", _)) => {
            return Err(missing(input, TAG_SEPARATOR));
        }
        Some((tag, name)) => (tag, name),
        None => ("", remaining),
    };

    if name.is_empty() {
        return Err(ParseError::NameRequired {
            input: input.to_string(),
        });
    }

    Ok(ServiceQuery::new(
        name.to_string(),
        tag.to_string(),
        dc.unwrap_or_default().to_string(),
        near.unwrap_or_default().to_string(),
        options.namespace.unwrap_or_default().to_string(),
        options.partition.unwrap_or_default().to_string(),
    ))
}

#[derive(Default)]
struct Options<'a> {
    namespace: Option<&'a str>,
    partition: Option<&'a str>,
}

/// Remove the text after the last `separator` from `remaining` and return it.
/// A separator followed by nothing is an error.
fn take_suffix<'a>(
    input: &str,
    remaining: &mut &'a str,
    separator: char,
) -> Result<Option<&'a str>, ParseError> {
    let Some(idx) = remaining.rfind(separator) else {
        return Ok(None);
    };

    let value = &remaining[idx + separator.len_utf8()..];
    if value.is_empty() {
        return Err(missing(input, separator));
    }

    *remaining = &remaining[..idx];
    Ok(Some(value))
}

/// Parse `key=value&key=value`. Only `ns` and `partition` are recognised.
fn parse_options<'a>(input: &str, raw: &'a str) -> Result<Options<'a>, ParseError> {
    if raw.is_empty() {
        return Err(missing(input, OPTIONS_SEPARATOR));
    }

    let mut options = Options::default();

    for pair in raw.split(OPTION_JOINER) {
        if pair.is_empty() {
            return Err(missing(input, OPTION_JOINER));
        }

        let (key, value) = pair.split_once(OPTION_ASSIGN).unwrap_or((pair, ""));

        let slot = match key {
            OPTION_NAMESPACE => &mut options.namespace,
            OPTION_PARTITION => &mut options.partition,
            _ => {
                return Err(ParseError::UnsupportedOption {
                    input: input.to_string(),
                    key: key.to_string(),
                })
            }
        };

        if value.is_empty() {
            return Err(missing(input, OPTION_ASSIGN));
        }

        if slot.is_some() {
            return Err(ParseError::DuplicateOption {
                input: input.to_string(),
                key: key.to_string(),
            });
        }

        *slot = Some(value);
    }

    Ok(options)
}

fn missing(input: &str, separator: char) -> ParseError {
    ParseError::MissingOperand {
        input: input.to_string(),
        separator,
    }
}
