use std::str::{self, Utf8Error};

use crate::line::Line;

/// Invalid text found while decoding a field line.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid UTF-8 in field name: {0}")]
    Name(#[source] Utf8Error),

    #[error("invalid UTF-8 in value of field `{field}`: {source}")]
    Value {
        field: String,
        #[source]
        source: Utf8Error,
    },
}

/// One decoded line of an event stream.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldPart {
    /// A blank line, which dispatches the message being assembled.
    Empty,
    Data(String),
    Event(String),
    Id(String),
    /// Reconnection time in milliseconds.
    Retry(i64),
}

impl FieldPart {
    /// Decodes a line into a field part.
    ///
    /// Comments, lines without a colon, unknown field names and `retry` values that
    /// are not a base 10 integer give `Ok(None)`. Only text that is not valid UTF-8
    /// is an error.
    pub fn parse(line: &Line) -> Result<Option<Self>, DecodeError> {
        let bs = line.as_bytes();

        if bs.is_empty() {
            return Ok(Some(Self::Empty));
        }

        // Lines starting with a colon are comments.
        let i = match line.separator() {
            Some(i) if i > 0 => i,
            _ => return Ok(None),
        };

        let name = str::from_utf8(&bs[..i]).map_err(DecodeError::Name)?;

        // A single space after the colon is not part of the value.
        let value = &bs[i + 1..];
        let value = value.strip_prefix(b" ").unwrap_or(value);
        let value = str::from_utf8(value).map_err(|source| DecodeError::Value {
            field: name.to_owned(),
            source,
        })?;

        let part = match name {
            "data" => Self::Data(value.to_owned()),
            "event" => Self::Event(value.to_owned()),
            "id" => Self::Id(value.to_owned()),
            "retry" => match value.parse() {
                Ok(ms) => Self::Retry(ms),
                Err(err) => {
                    tracing::trace!(value, error = %err, "ignoring unparsable retry");
                    return Ok(None);
                }
            },
            _ => {
                tracing::trace!(field = name, "ignoring unknown field");
                return Ok(None);
            }
        };

        Ok(Some(part))
    }
}
