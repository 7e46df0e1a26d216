use bytes::{Buf, BufMut, Bytes, BytesMut};
use memchr::{memchr, memchr2};

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const COLON: u8 = b':';

/// A single logical line of an event stream, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    bytes: Bytes,
    separator: Option<usize>,
}

impl Line {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Offset of the first colon in the line, if there is one.
    pub fn separator(&self) -> Option<usize> {
        self.separator
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl From<Bytes> for Line {
    fn from(bytes: Bytes) -> Self {
        let separator = memchr(COLON, &bytes);
        Self { bytes, separator }
    }
}

impl From<&'static str> for Line {
    fn from(s: &'static str) -> Self {
        Self::from(Bytes::from_static(s.as_bytes()))
    }
}

/// Reassembles lines from chunks that may be cut at any byte.
///
/// Chunks are appended with [`put`](LineSplitter::put). Every complete line is then
/// taken with [`next_line`](LineSplitter::next_line), and whatever remains once the
/// source is exhausted with [`finish`](LineSplitter::finish).
#[derive(Debug, Default)]
pub struct LineSplitter {
    buf: BytesMut,

    // Set when the last buffered byte was a CR, so a LF at the head of the
    // next chunk belongs to the same terminator.
    skip_lf: bool,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, chunk: impl Buf) {
        self.buf.put(chunk)
    }

    /// Number of buffered bytes that are not yet part of a yielded line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Takes the next terminated line out of the buffer.
    ///
    /// Ways a line can end: CRLF, a lone LF or a lone CR. A CRLF pair counts as a
    /// single terminator even when the CR and the LF arrive in different chunks.
    pub fn next_line(&mut self) -> Option<Line> {
        if self.skip_lf && !self.buf.is_empty() {
            self.skip_lf = false;
            if self.buf[0] == LF {
                self.buf.advance(1);
            }
        }

        let i = memchr2(CR, LF, &self.buf)?;
        let line = self.buf.split_to(i).freeze();

        let terminator = self.buf[0];
        self.buf.advance(1);

        if terminator == CR {
            match self.buf.first() {
                Some(&LF) => self.buf.advance(1),
                Some(_) => (),
                None => self.skip_lf = true,
            }
        }

        Some(Line::from(line))
    }

    /// Yields the unterminated tail of the stream, if any bytes are left.
    pub fn finish(&mut self) -> Option<Line> {
        self.skip_lf = false;

        if self.buf.is_empty() {
            return None;
        }

        Some(Line::from(self.buf.split().freeze()))
    }
}
