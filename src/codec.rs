//! Line codec: CR LF line assembly and chunked line encoding
//!
//! Inbound bytes accumulate in a per-connection [`LineBuffer`]; complete
//! lines are split out with the terminator stripped (bare LF is tolerated
//! from sloppy clients). Outbound text is encoded with the connection's
//! current [`Charset`] and split into fixed-size chunks so no single buffer
//! write grows unbounded; the logical line always ends in exactly one CR LF
//! regardless of where the splits fall.

use bytes::{Bytes, BytesMut};
use tracing::error;

/// Chunk size for encoded output, matching the classic NNTP line bound.
pub const CHUNK_SIZE: usize = 512;

/// The two-byte line terminator the wire protocol requires.
pub const CRLF: &[u8] = b"\r\n";

/// Character set used to decode received lines and encode responses.
///
/// UTF-8 is the session default and is restored whenever a command
/// finishes. ASCII exists for peers that negotiate it down; it is the one
/// charset that can actually fail to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    Ascii,
}

impl Charset {
    /// Decode a received raw line. Bytes that do not form valid text in
    /// this charset are replaced rather than rejected; a command line with
    /// mojibake still deserves a proper `500` instead of a dropped line.
    #[must_use]
    pub fn decode(&self, raw: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(raw).into_owned(),
            Self::Ascii => raw
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
                .collect(),
        }
    }

    /// Encode text, returning `None` if this charset cannot represent it.
    #[must_use]
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        match self {
            Self::Utf8 => Some(text.as_bytes().to_vec()),
            Self::Ascii => {
                if text.is_ascii() {
                    Some(text.as_bytes().to_vec())
                } else {
                    None
                }
            }
        }
    }
}

impl std::fmt::Display for Charset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Utf8 => f.write_str("UTF-8"),
            Self::Ascii => f.write_str("US-ASCII"),
        }
    }
}

/// Growable input window that assembles raw bytes into protocol lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(CHUNK_SIZE),
        }
    }

    /// Append freshly read bytes to the window.
    pub fn append(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Split off the next complete line, terminator stripped.
    ///
    /// Lines end at LF; a preceding CR is removed as well, so both CR LF
    /// and bare LF delimited input yield the same line content. Returns
    /// `None` while no full line is buffered.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line = self.buf.split_to(pos + 1);
        line.truncate(pos);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Some(line.to_vec())
    }

    /// Number of buffered bytes not yet assembled into a line.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Encode one logical line into CR LF terminated, chunk-bounded output.
///
/// Returns the encoded chunks, each at most [`CHUNK_SIZE`] bytes, with the
/// terminator guaranteed to be the final two bytes of the final chunk. An
/// unencodable line is logged and yields `None`; the codec contract says
/// this must never surface as an error to the caller.
#[must_use]
pub fn encode_line(line: &str, charset: Charset) -> Option<Vec<Bytes>> {
    let mut encoded = match charset.encode(line) {
        Some(bytes) => bytes,
        None => {
            error!("charset {} cannot encode outgoing line, dropping write", charset);
            return None;
        }
    };
    encoded.extend_from_slice(CRLF);

    let mut chunks = Vec::with_capacity(encoded.len() / CHUNK_SIZE + 1);
    let mut rest = Bytes::from(encoded);
    while rest.len() > CHUNK_SIZE {
        chunks.push(rest.split_to(CHUNK_SIZE));
    }
    chunks.push(rest);
    Some(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crlf_line_split() {
        let mut buf = LineBuffer::new();
        buf.append(b"CAPABILITIES\r\nQUIT\r\n");
        assert_eq!(buf.next_line().unwrap(), b"CAPABILITIES");
        assert_eq!(buf.next_line().unwrap(), b"QUIT");
        assert!(buf.next_line().is_none());
        assert_eq!(buf.pending(), 0);
    }

    #[test]
    fn test_bare_lf_tolerated() {
        let mut buf = LineBuffer::new();
        buf.append(b"GROUP alt.test\n");
        assert_eq!(buf.next_line().unwrap(), b"GROUP alt.test");
    }

    #[test]
    fn test_partial_line_waits_for_terminator() {
        let mut buf = LineBuffer::new();
        buf.append(b"GRO");
        assert!(buf.next_line().is_none());
        buf.append(b"UP alt.test\r");
        assert!(buf.next_line().is_none());
        buf.append(b"\n");
        assert_eq!(buf.next_line().unwrap(), b"GROUP alt.test");
    }

    #[test]
    fn test_leading_whitespace_preserved() {
        // Continuation lines of folded headers start with whitespace that
        // must survive assembly.
        let mut buf = LineBuffer::new();
        buf.append(b"  folded continuation\r\n");
        assert_eq!(buf.next_line().unwrap(), b"  folded continuation");
    }

    #[test]
    fn test_empty_line() {
        let mut buf = LineBuffer::new();
        buf.append(b"\r\n");
        assert_eq!(buf.next_line().unwrap(), b"");
    }

    #[test]
    fn test_encode_short_line_single_chunk() {
        let chunks = encode_line("200 ready", Charset::Utf8).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][..], b"200 ready\r\n");
    }

    #[test]
    fn test_encode_long_line_chunked_single_terminator() {
        let line = "x".repeat(1500);
        let chunks = encode_line(&line, Charset::Utf8).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= CHUNK_SIZE);
        }
        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
        assert_eq!(joined.len(), 1502);
        assert!(joined.ends_with(b"\r\n"));
        // Exactly one terminator, at the very end.
        let crlf_count = joined.windows(2).filter(|w| *w == b"\r\n").count();
        assert_eq!(crlf_count, 1);
    }

    #[test]
    fn test_encode_boundary_line() {
        // Line whose encoded form plus CRLF lands exactly on a chunk edge.
        let line = "y".repeat(CHUNK_SIZE - 2);
        let chunks = encode_line(&line, Charset::Utf8).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), CHUNK_SIZE);
    }

    #[test]
    fn test_unencodable_is_none() {
        assert!(encode_line("héllo", Charset::Ascii).is_none());
        assert!(encode_line("hello", Charset::Ascii).is_some());
    }

    #[test]
    fn test_decode_ascii_replaces_high_bytes() {
        let s = Charset::Ascii.decode(&[b'o', b'k', 0xff]);
        assert!(s.starts_with("ok"));
        assert!(!s.is_ascii());
    }
}
