//! Incremental parsing of `text/event-stream` bodies.
//!
//! Chunks of bytes, cut anywhere, go through three stages that are each
//! available on their own:
//!
//! - [`lines`] splits them into [`Line`]s on LF, CR or CRLF.
//! - [`field_parts`] decodes those lines into [`FieldPart`]s.
//! - [`events`] folds the field parts into [`Event`]s.
//!
//! Every stage is a `Stream` when the source is a `Stream` of chunks, and an
//! `Iterator` when the source is an `Iterator` of chunks. Nothing is read from the
//! source before it is needed.
//!
//! ```
//! use std::convert::Infallible;
//!
//! let chunks = vec![
//!     Ok::<_, Infallible>(&b"event: add\nda"[..]),
//!     Ok(&b"ta: 1\n\n"[..]),
//! ];
//!
//! let mut events = sse_pipeline::events(chunks.into_iter());
//! let ev = events.next().unwrap().unwrap();
//! assert_eq!(ev.event, "add");
//! assert_eq!(ev.data, "1");
//! ```
use futures_core::Stream;

mod body;
mod error;
mod event;
mod field;
mod line;

pub use {
    body::{Events, FieldParts, Lines},
    error::{Error, ErrorKind},
    event::{Event, EventBuilder},
    field::{DecodeError, FieldPart},
    line::{Line, LineSplitter},
};

/// Lines of a source of chunks.
pub fn lines<S>(source: S) -> Lines<S> {
    Lines::new(source)
}

/// Field parts of a source of chunks.
pub fn field_parts<S>(source: S) -> FieldParts<S> {
    FieldParts::new(source)
}

/// Messages of a source of chunks.
pub fn events<S>(source: S) -> Events<S> {
    Events::new(source)
}

/// Parse a `Stream` of byte chunks, such as an HTTP response body, as an event
/// stream.
pub trait SseBody: Stream + Sized {
    /// Splits the body into lines.
    fn into_lines(self) -> Lines<Self> {
        lines(self)
    }

    /// Decodes the body into field parts, skipping comments and unknown fields.
    fn into_field_parts(self) -> FieldParts<Self> {
        field_parts(self)
    }

    /// Assembles the body into messages.
    fn into_sse(self) -> Events<Self> {
        events(self)
    }
}

impl<S: Stream> SseBody for S {}
