use bytes::Buf;
use futures_core::{ready, Stream};
use std::{
    error::Error as StdError,
    ops::ControlFlow,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    event::{Event, EventBuilder},
    field::FieldPart,
    line::{Line, LineSplitter},
    Error,
};

type Step<T> = ControlFlow<Option<Result<T, Error>>>;

/// Lines of a chunk source.
///
/// A `Stream` over a `Stream` of chunks, or an `Iterator` over an `Iterator` of
/// chunks. The source is only pulled when no complete line is buffered.
#[derive(Debug)]
pub struct Lines<S> {
    inner: S,

    splitter: LineSplitter,
    done: bool,
}

impl<S> Lines<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self {
            inner,
            splitter: LineSplitter::new(),
            done: false,
        }
    }

    /// The chunk source being read.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    fn buffered(&mut self) -> Step<Line> {
        if self.done {
            return ControlFlow::Break(None);
        }

        match self.splitter.next_line() {
            Some(line) => ControlFlow::Break(Some(Ok(line))),
            None => ControlFlow::Continue(()),
        }
    }

    fn absorb<B, E>(&mut self, pulled: Option<Result<B, E>>) -> Step<Line>
    where
        B: Buf,
        E: StdError + Send + Sync + 'static,
    {
        match pulled {
            Some(Ok(chunk)) => {
                tracing::trace!(len = chunk.remaining(), "received chunk");
                self.splitter.put(chunk);
                ControlFlow::Continue(())
            }

            Some(Err(err)) => {
                tracing::debug!(error = %err, "chunk source failed");
                self.done = true;
                ControlFlow::Break(Some(Err(Error::inner(err))))
            }

            None => {
                tracing::trace!(pending = self.splitter.pending(), "chunk source exhausted");
                self.done = true;
                ControlFlow::Break(self.splitter.finish().map(Ok))
            }
        }
    }
}

impl<S, B, E> Stream for Lines<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: Buf,
    E: StdError + Send + Sync + 'static,
{
    type Item = Result<Line, Error>;

    fn poll_next(mut self: Pin<&mut Self>, ctx: &mut Context) -> Poll<Option<Self::Item>> {
        // Always start from what is already buffered, and only poll the
        // underlying Stream when that holds no complete line.
        loop {
            if let ControlFlow::Break(item) = self.buffered() {
                return Poll::Ready(item);
            }

            let pulled = ready!(Pin::new(&mut self.inner).poll_next(ctx));

            if let ControlFlow::Break(item) = self.absorb(pulled) {
                return Poll::Ready(item);
            }
        }
    }
}

impl<S, B, E> Iterator for Lines<S>
where
    S: Iterator<Item = Result<B, E>>,
    B: Buf,
    E: StdError + Send + Sync + 'static,
{
    type Item = Result<Line, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let ControlFlow::Break(item) = self.buffered() {
                return item;
            }

            let pulled = self.inner.next();

            if let ControlFlow::Break(item) = self.absorb(pulled) {
                return item;
            }
        }
    }
}

/// Field parts of a chunk source. Lines that decode to nothing are skipped.
#[derive(Debug)]
pub struct FieldParts<S> {
    lines: Lines<S>,

    done: bool,
}

impl<S> FieldParts<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self {
            lines: Lines::new(inner),
            done: false,
        }
    }

    /// The chunk source being read.
    pub fn get_ref(&self) -> &S {
        self.lines.get_ref()
    }

    fn absorb(&mut self, line: Option<Result<Line, Error>>) -> Step<FieldPart> {
        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(err)) => {
                self.done = true;
                return ControlFlow::Break(Some(Err(err)));
            }
            None => {
                self.done = true;
                return ControlFlow::Break(None);
            }
        };

        match FieldPart::parse(&line) {
            Ok(Some(part)) => ControlFlow::Break(Some(Ok(part))),
            Ok(None) => ControlFlow::Continue(()),
            Err(err) => {
                tracing::debug!(error = %err, "failed to decode line");
                self.done = true;
                ControlFlow::Break(Some(Err(Error::decode(err))))
            }
        }
    }
}

impl<S, B, E> Stream for FieldParts<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: Buf,
    E: StdError + Send + Sync + 'static,
{
    type Item = Result<FieldPart, Error>;

    fn poll_next(mut self: Pin<&mut Self>, ctx: &mut Context) -> Poll<Option<Self::Item>> {
        loop {
            if self.done {
                return Poll::Ready(None);
            }

            let line = ready!(Pin::new(&mut self.lines).poll_next(ctx));

            if let ControlFlow::Break(item) = self.absorb(line) {
                return Poll::Ready(item);
            }
        }
    }
}

impl<S, B, E> Iterator for FieldParts<S>
where
    S: Iterator<Item = Result<B, E>>,
    B: Buf,
    E: StdError + Send + Sync + 'static,
{
    type Item = Result<FieldPart, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            let line = self.lines.next();

            if let ControlFlow::Break(item) = self.absorb(line) {
                return item;
            }
        }
    }
}

/// Messages of a chunk source.
///
/// A message is yielded for every blank line, and once more when the source ends,
/// even if that last message has no fields set. Nothing follows an error.
#[derive(Debug)]
pub struct Events<S> {
    parts: FieldParts<S>,

    builder: EventBuilder,
    done: bool,
}

impl<S> Events<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self {
            parts: FieldParts::new(inner),
            builder: EventBuilder::new(),
            done: false,
        }
    }

    /// The chunk source being read.
    pub fn get_ref(&self) -> &S {
        self.parts.get_ref()
    }

    fn absorb(&mut self, part: Option<Result<FieldPart, Error>>) -> Step<Event> {
        match part {
            Some(Ok(part)) => match self.builder.apply(part) {
                Some(ev) => ControlFlow::Break(Some(Ok(ev))),
                None => ControlFlow::Continue(()),
            },

            Some(Err(err)) => {
                self.done = true;
                ControlFlow::Break(Some(Err(err)))
            }

            None => {
                self.done = true;
                ControlFlow::Break(Some(Ok(self.builder.finish())))
            }
        }
    }
}

impl<S, B, E> Stream for Events<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: Buf,
    E: StdError + Send + Sync + 'static,
{
    type Item = Result<Event, Error>;

    fn poll_next(mut self: Pin<&mut Self>, ctx: &mut Context) -> Poll<Option<Self::Item>> {
        loop {
            if self.done {
                return Poll::Ready(None);
            }

            let part = ready!(Pin::new(&mut self.parts).poll_next(ctx));

            if let ControlFlow::Break(item) = self.absorb(part) {
                return Poll::Ready(item);
            }
        }
    }
}

impl<S, B, E> Iterator for Events<S>
where
    S: Iterator<Item = Result<B, E>>,
    B: Buf,
    E: StdError + Send + Sync + 'static,
{
    type Item = Result<Event, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            let part = self.parts.next();

            if let ControlFlow::Break(item) = self.absorb(part) {
                return item;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{convert::Infallible, io};

    fn chunks<'a>(
        parts: &'a [&'static str],
    ) -> impl Iterator<Item = Result<&'static [u8], Infallible>> + 'a {
        parts.iter().map(|s| Ok(s.as_bytes()))
    }

    fn ev(event: &str, data: &str) -> Event {
        Event {
            event: event.into(),
            data: data.into(),
            ..Event::default()
        }
    }

    #[test]
    fn lines_keep_the_tail() {
        let lines: Vec<_> = Lines::new(chunks(&["a\nb", "c"]))
            .map(|l| l.expect("line").into_bytes())
            .collect();
        assert_eq!(lines, [&b"a"[..], b"bc"]);
    }

    #[test]
    fn lines_pull_only_when_needed() {
        let mut pulled = 0;
        let input = ["a\nb\n", "c\n"];
        let source = input.iter().map(|s| {
            pulled += 1;
            Ok::<_, Infallible>(s.as_bytes())
        });

        let mut lines = Lines::new(source);
        lines.next().expect("a").expect("line");
        lines.next().expect("b").expect("line");
        drop(lines);

        assert_eq!(pulled, 1);
    }

    #[test]
    fn field_parts_skip_comments_and_unknown_fields() {
        let parts: Vec<_> = FieldParts::new(chunks(&[": hi\nfoo: bar\nretry: x\ndata: 1\n\n"]))
            .map(|p| p.expect("part"))
            .collect();
        assert_eq!(parts, [FieldPart::Data("1".into()), FieldPart::Empty]);
    }

    #[test]
    fn two_events_and_a_trailing_message() {
        let events: Vec<_> =
            Events::new(chunks(&["event: add\ndata: 1\n\nevent: remove\ndata: 2\n\n"]))
                .map(|e| e.expect("event"))
                .collect();
        assert_eq!(
            events,
            [ev("add", "1"), ev("remove", "2"), Event::default()]
        );
    }

    #[test]
    fn message_without_blank_line_is_emitted_at_end() {
        let mut events = Events::new(chunks(&["id: abc\ndata: def\n"]));
        let last = events.next().expect("event").expect("parses");
        assert_eq!(
            last,
            Event {
                id: "abc".into(),
                data: "def".into(),
                ..Event::default()
            }
        );
        assert!(events.next().is_none());
        assert!(events.next().is_none());
    }

    #[test]
    fn source_error_ends_every_stage() {
        let source = vec![
            Ok(&b"data: 1\n\ndata: 2\n"[..]),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
            Ok(&b"data: 3\n\n"[..]),
        ];

        let mut events = Events::new(source.into_iter());
        assert_eq!(events.next().expect("first").expect("parses"), ev("", "1"));

        let err = events.next().expect("error").expect_err("source failed");
        assert_eq!(err.kind(), crate::ErrorKind::Source);
        assert!(events.next().is_none());
    }

    #[test]
    fn decode_error_ends_field_parts() {
        let source = vec![Ok::<_, Infallible>(&b"data: \xff\ndata: ok\n"[..])];

        let mut parts = FieldParts::new(source.into_iter());
        let err = parts.next().expect("error").expect_err("bad utf8");
        assert_eq!(err.kind(), crate::ErrorKind::Decode);
        assert!(parts.next().is_none());
    }
}
