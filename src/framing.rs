//! RFC 6242 framing tokenizers.
//!
//! Both NETCONF framing modes are implemented as pure, incremental
//! tokenizers over a caller-supplied scan window: given `(buffer, at_eof)`
//! they report how many bytes to consume, append any decoded payload to an
//! output buffer, and flag end-of-message tokens. All blocking I/O lives in
//! the transport layer; see [`crate::transport`].

use crate::error::FrameError;
use memmem::{Searcher, TwoWaySearcher};

/// The NETCONF 1.0 end-of-message token.
/// See [RFC6242](https://tools.ietf.org/html/rfc6242#section-4.1)
pub(crate) const TOKEN_EOM: &[u8] = b"]]>]]>";

/// Maximum allowed chunk-size defined by RFC 6242 section 4.2.
pub const MAXIMUM_CHUNK_SIZE: u32 = 4_294_967_295;

/// Wire length of `MAXIMUM_CHUNK_SIZE` in decimal digits.
const CHUNK_SIZE_DIGITS_MAX: usize = 10;

/// NETCONF transport framing modes.
///
/// Sessions always start in [`FramingMode::EndOfMessage`] and may switch to
/// [`FramingMode::Chunked`] exactly once, after the `<hello>` exchange has
/// shown that both peers support `:base:1.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingMode {
    EndOfMessage,
    Chunked,
}

/// Outcome of one tokenizer step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scan {
    /// Input bytes consumed.
    pub advance: usize,
    /// An end-of-message token was consumed. The tokenizer stops at the
    /// message boundary so the caller can switch framing modes before the
    /// next message is decoded.
    pub end_of_message: bool,
}

impl Scan {
    fn advance(advance: usize) -> Scan {
        Scan {
            advance,
            end_of_message: false,
        }
    }
}

/// The current framing tokenizer of a transport reader.
#[derive(Debug)]
pub(crate) enum Framer {
    Eom(EomFramer),
    Chunked(ChunkedFramer),
}

impl Framer {
    pub(crate) fn eom() -> Framer {
        Framer::Eom(EomFramer::default())
    }

    pub(crate) fn chunked() -> Framer {
        Framer::Chunked(ChunkedFramer::default())
    }

    pub(crate) fn mode(&self) -> FramingMode {
        match self {
            Framer::Eom(_) => FramingMode::EndOfMessage,
            Framer::Chunked(_) => FramingMode::Chunked,
        }
    }

    /// Runs one tokenizer step over `b`, appending decoded payload to `out`.
    ///
    /// A result of `Scan { advance: 0, end_of_message: false }` with nothing
    /// appended means more input is required (or, with `at_eof` and an empty
    /// buffer, that the stream ended cleanly).
    pub(crate) fn split(
        &mut self,
        b: &[u8],
        at_eof: bool,
        out: &mut Vec<u8>,
    ) -> Result<Scan, FrameError> {
        match self {
            Framer::Eom(f) => f.split(b, at_eof, out),
            Framer::Chunked(f) => f.split(b, at_eof, out),
        }
    }
}

/// End-of-message delimited decoding, RFC 6242 section 4.1.
#[derive(Debug, Default)]
pub(crate) struct EomFramer {
    /// A transport EOF arriving now would be a clean close.
    eof_ok: bool,
    /// Any input byte has been observed. Distinguishes a stream that ends
    /// mid-message from one that was empty from the start.
    seen: bool,
}

impl EomFramer {
    fn split(&mut self, b: &[u8], at_eof: bool, out: &mut Vec<u8>) -> Result<Scan, FrameError> {
        if b.is_empty() {
            if at_eof && !self.eof_ok && self.seen {
                return Err(FrameError::UnexpectedEof);
            }
            return Ok(Scan::default());
        }
        self.seen = true;
        if b.len() < TOKEN_EOM.len() && !at_eof {
            return Ok(Scan::default());
        }
        if let Some(idx) = TwoWaySearcher::new(TOKEN_EOM).search_in(b) {
            out.extend_from_slice(&b[..idx]);
            self.eof_ok = true;
            return Ok(Scan {
                advance: idx + TOKEN_EOM.len(),
                end_of_message: true,
            });
        }
        self.eof_ok = false;
        if at_eof {
            // residual bytes can no longer complete a message; flush them
            // and report unexpected EOF on the next call
            out.extend_from_slice(b);
            return Ok(Scan::advance(b.len()));
        }
        if b.len() <= TOKEN_EOM.len() * 2 {
            return Ok(Scan::default());
        }
        // emit everything except a tail that could begin an end-of-message
        // token straddling two scan windows
        let cut = b.len() - partial_eom_suffix(b);
        out.extend_from_slice(&b[..cut]);
        Ok(Scan::advance(cut))
    }
}

/// Length of the longest suffix of `b` that is a proper prefix of the
/// end-of-message token.
fn partial_eom_suffix(b: &[u8]) -> usize {
    for keep in (1..TOKEN_EOM.len()).rev() {
        if b.len() >= keep && b[b.len() - keep..] == TOKEN_EOM[..keep] {
            return keep;
        }
    }
    0
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    #[default]
    HeaderStart,
    HeaderSize,
    Data,
    EndOfChunks,
}

/// Chunked framing decoding, RFC 6242 section 4.2.
#[derive(Debug, Default)]
pub(crate) struct ChunkedFramer {
    state: ChunkState,
    /// Bytes of chunk-data still to be copied out.
    data_left: u64,
    /// Chunks completed in the current message; reset at end-of-chunks.
    chunks: u64,
}

impl ChunkedFramer {
    fn split(&mut self, b: &[u8], at_eof: bool, out: &mut Vec<u8>) -> Result<Scan, FrameError> {
        let mut advance = 0;
        while advance < b.len() {
            let cur = &b[advance..];
            // a chunk header needs at least "\n#" plus a digit and LF before
            // a decision can be made; chunk data and the end-of-chunks LF
            // are consumed byte by byte
            let need = match self.state {
                ChunkState::HeaderStart | ChunkState::HeaderSize => 4,
                ChunkState::Data | ChunkState::EndOfChunks => 1,
            };
            if cur.len() < need && !at_eof {
                return Ok(Scan::advance(advance));
            }
            match self.state {
                ChunkState::HeaderStart => {
                    let n = cur.len().min(2);
                    if cur[..n] != b"\n#"[..n] {
                        return Err(FrameError::InvalidChunkHeader);
                    }
                    if cur.len() < 4 {
                        // at_eof: header truncated by end of stream
                        return Err(FrameError::UnexpectedEof);
                    }
                    match cur[2] {
                        b'#' => {
                            advance += 3;
                            self.state = ChunkState::EndOfChunks;
                        }
                        b'1'..=b'9' => {
                            advance += 2;
                            self.state = ChunkState::HeaderSize;
                        }
                        _ => return Err(FrameError::InvalidChunkSize),
                    }
                }
                ChunkState::HeaderSize => match cur.iter().position(|&c| c == b'\n') {
                    Some(idx) if (1..=CHUNK_SIZE_DIGITS_MAX).contains(&idx) => {
                        let size = parse_chunk_size(&cur[..idx])?;
                        advance += idx + 1;
                        self.data_left = size;
                        self.state = ChunkState::Data;
                    }
                    Some(0) => return Err(FrameError::InvalidChunkSize),
                    Some(_) => return Err(FrameError::ChunkSizeTooLong),
                    None if cur.len() <= CHUNK_SIZE_DIGITS_MAX && !at_eof => {
                        return Ok(Scan::advance(advance));
                    }
                    None if !at_eof => return Err(FrameError::ChunkSizeTooLong),
                    None => return Err(FrameError::UnexpectedEof),
                },
                ChunkState::Data => {
                    let take = cur.len().min(self.data_left as usize);
                    out.extend_from_slice(&cur[..take]);
                    advance += take;
                    self.data_left -= take as u64;
                    if self.data_left == 0 {
                        self.state = ChunkState::HeaderStart;
                        self.chunks += 1;
                    }
                    // deliver chunk data promptly rather than scanning on
                    return Ok(Scan::advance(advance));
                }
                ChunkState::EndOfChunks => {
                    if cur[0] != b'\n' {
                        return Err(FrameError::InvalidChunkHeader);
                    }
                    if self.chunks == 0 {
                        return Err(FrameError::ZeroChunks);
                    }
                    advance += 1;
                    self.state = ChunkState::HeaderStart;
                    self.chunks = 0;
                    return Ok(Scan {
                        advance,
                        end_of_message: true,
                    });
                }
            }
        }
        if at_eof && (self.state != ChunkState::HeaderStart || self.chunks > 0) {
            return Err(FrameError::UnexpectedEof);
        }
        Ok(Scan::advance(advance))
    }
}

fn parse_chunk_size(digits: &[u8]) -> Result<u64, FrameError> {
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(FrameError::InvalidChunkSize);
    }
    let mut size: u64 = 0;
    for &d in digits {
        size = size * 10 + u64::from(d - b'0');
    }
    if size > u64::from(MAXIMUM_CHUNK_SIZE) {
        return Err(FrameError::ChunkSizeTooLarge);
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn split_all(framer: &mut Framer, input: &[u8]) -> Result<(Vec<u8>, usize), FrameError> {
        let mut out = Vec::new();
        let mut rest = input;
        let mut messages = 0;
        loop {
            let scan = framer.split(rest, true, &mut out)?;
            rest = &rest[scan.advance..];
            if scan.end_of_message {
                messages += 1;
            }
            if scan.advance == 0 && !scan.end_of_message {
                if rest.is_empty() {
                    return Ok((out, messages));
                }
                panic!("tokenizer stalled with {} bytes left", rest.len());
            }
        }
    }

    #[test]
    fn test_eom_messages() {
        for (input, want, messages) in [
            ("]]>]]>", "", 1),
            ("foo]]>]]>", "foo", 1),
            ("foo]]>]]>bar]]>]]>bazoopa]]>]]>", "foobarbazoopa", 3),
            ("]]>]]foo]]>]]>bar]]]>]]>", "]]>]]foobar]", 2),
            ("foo>]]>bar]]>]]>bazoopa]]>]]>", "foo>]]>barbazoopa", 2),
            ("]]>]]>]]>]]>baz]]>]]>", "baz", 3),
            ("]]>]]>foo]]>]]>]]>]]>", "foo", 3),
        ] {
            let mut framer = Framer::eom();
            let (out, got_messages) = split_all(&mut framer, input.as_bytes()).unwrap();
            assert_eq!(want.as_bytes(), &out[..], "input {:?}", input);
            assert_eq!(messages, got_messages, "input {:?}", input);
        }
    }

    #[test]
    fn test_eom_unexpected_eof() {
        for input in ["foo", "foo]]>]]>bar]]>]]>bazoopa", "a]]>]]>b]]>]]>c"] {
            let mut framer = Framer::eom();
            assert_eq!(
                split_all(&mut framer, input.as_bytes()),
                Err(FrameError::UnexpectedEof),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_eom_partial_token_held_back() {
        // a sentinel split across two scan windows must still be recognized
        let mut framer = Framer::eom();
        let mut out = Vec::new();
        let scan = framer
            .split(b"0123456789abc]]>]]", false, &mut out)
            .unwrap();
        assert!(!scan.end_of_message);
        assert_eq!(b"0123456789abc".as_slice(), &out[..]);
        assert_eq!(13, scan.advance);

        let scan = framer.split(b"]]>]]>", false, &mut out).unwrap();
        assert!(scan.end_of_message);
        assert_eq!(b"0123456789abc".as_slice(), &out[..]);
    }

    #[test]
    fn test_chunked_messages() {
        for (input, want, messages) in [
            ("\n#1\na\n##\n", "a", 1),
            ("\n#1\na\n#1\nb\n#1\nc\n##\n", "abc", 1),
            ("\n#2\nab\n#2\ncd\n#2\nef\n##\n", "abcdef", 1),
            ("\n#3\nfoo\n#4\nfood\n##\n", "foofood", 1),
            ("\n#4\nabc\n\n#4\ndef\n\n##\n", "abc\ndef\n", 1),
            ("\n#3\nABC\n##\n\n#3\nABC\n##\n\n#3\nABC\n##\n", "ABCABCABC", 3),
        ] {
            let mut framer = Framer::chunked();
            let (out, got_messages) = split_all(&mut framer, input.as_bytes()).unwrap();
            assert_eq!(want.as_bytes(), &out[..], "input {:?}", input);
            assert_eq!(messages, got_messages, "input {:?}", input);
        }
    }

    #[test]
    fn test_chunked_errors() {
        for (input, want) in [
            ("\n##\n", FrameError::ZeroChunks),
            ("foo]]>]]>bar", FrameError::InvalidChunkHeader),
            ("\n#03\nfoo\n##\n", FrameError::InvalidChunkSize),
            ("\n#\na\n##\n", FrameError::InvalidChunkSize),
            ("\n#1a\na\n##\n", FrameError::InvalidChunkSize),
            ("\n#12345678901\nf", FrameError::ChunkSizeTooLong),
            ("\n#4294967296\nxx", FrameError::ChunkSizeTooLarge),
            ("\n#9\n012", FrameError::UnexpectedEof),
            ("\n#1\na\n##", FrameError::UnexpectedEof),
            ("\n#1\na\n#", FrameError::UnexpectedEof),
            ("\n#1\na\n##\n ", FrameError::InvalidChunkHeader),
            ("\n#12345", FrameError::UnexpectedEof),
        ] {
            let mut framer = Framer::chunked();
            assert_eq!(
                split_all(&mut framer, input.as_bytes()),
                Err(want),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_chunked_zero_chunks_per_message() {
        // the chunk count resets between messages, so an empty second
        // message is rejected too
        let mut framer = Framer::chunked();
        assert_eq!(
            split_all(&mut framer, b"\n#1\na\n##\n\n##\n"),
            Err(FrameError::ZeroChunks)
        );
    }

    #[test]
    fn test_chunk_size_bounds() {
        assert_eq!(parse_chunk_size(b"1"), Ok(1));
        assert_eq!(parse_chunk_size(b"4294967295"), Ok(4294967295));
        assert_eq!(
            parse_chunk_size(b"4294967296"),
            Err(FrameError::ChunkSizeTooLarge)
        );
    }
}
