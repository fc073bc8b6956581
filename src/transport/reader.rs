use super::bucker::Bucker;
use crate::error::{FrameError, Result};
use crate::framing::{Framer, FramingMode};
use tokio::io::AsyncRead;

/// Default scan buffer capacity.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Scan buffer capacity floor. The buffer must be able to hold a complete
/// chunk header plus a few bytes of lookahead.
pub const MIN_BUFFER_SIZE: usize = 16;

/// One decoded transport read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEvent {
    /// Decoded payload bytes were copied into the caller's buffer.
    Data(usize),
    /// The current message ended. Reported after all of the message's
    /// payload has been drained and before any byte of the next message
    /// is decoded.
    EndOfMessage,
    /// The transport stream ended cleanly at a message boundary.
    Eof,
}

/// A NETCONF transport decoder over a raw byte source.
///
/// NETCONF sessions exchange messages encoded according to the framing
/// mode presently chosen; initially (and always, for `:base:1.0`
/// sessions) messages are sent verbatim and terminated by the
/// end-of-message token. After the `<hello>` exchange, `:base:1.1`
/// sessions use chunked framing with the same message semantics.
/// See [RFC6242](https://tools.ietf.org/html/rfc6242#section-4)
///
/// The reader decodes input using the current framing mode, delivering
/// payload bytes and message boundaries via [`TransportReader::read`].
#[derive(Debug)]
pub struct TransportReader<R> {
    src: Bucker<R>,
    framer: Framer,
    buf: Vec<u8>,
    capacity: usize,
    at_eof: bool,
    overflow: Vec<u8>,
    pending_eom: bool,
    latched: Option<FrameError>,
}

impl<R: AsyncRead + Unpin> TransportReader<R> {
    pub fn new(src: R) -> TransportReader<R> {
        TransportReader::with_buffer_size(src, DEFAULT_BUFFER_SIZE)
    }

    /// Creates a reader with a scan buffer of `size` bytes, raised to
    /// [`MIN_BUFFER_SIZE`] if below it.
    pub fn with_buffer_size(src: R, size: usize) -> TransportReader<R> {
        TransportReader {
            src: Bucker::new(src),
            framer: Framer::eom(),
            buf: Vec::new(),
            capacity: size.max(MIN_BUFFER_SIZE),
            at_eof: false,
            overflow: Vec::new(),
            pending_eom: false,
            latched: None,
        }
    }

    pub fn framing_mode(&self) -> FramingMode {
        self.framer.mode()
    }

    /// Switches the reader to chunked framing (`chunked == true`) or keeps
    /// end-of-message framing, and disables the input guard either way.
    ///
    /// Must be called exactly once, after the end-of-message upcall for the
    /// `<hello>` message and before the next read.
    ///
    /// # Panics
    ///
    /// Panics when called a second time.
    pub fn set_framing_mode(&mut self, chunked: bool) {
        if self.src.is_passthrough() {
            panic!("set_framing_mode must only be called once");
        }
        if chunked {
            self.framer = Framer::chunked();
        }
        self.src.set_passthrough();
    }

    /// Reads decoded payload into `out`, stripping all framing.
    ///
    /// Framing protocol errors are reported only once any payload decoded
    /// before the violation has been drained, and are then latched: every
    /// subsequent call returns the same error.
    pub async fn read(&mut self, out: &mut [u8]) -> Result<ReadEvent> {
        if !self.overflow.is_empty() {
            let n = out.len().min(self.overflow.len());
            out[..n].copy_from_slice(&self.overflow[..n]);
            self.overflow.drain(..n);
            return Ok(ReadEvent::Data(n));
        }
        if self.pending_eom {
            self.pending_eom = false;
            return Ok(ReadEvent::EndOfMessage);
        }
        if let Some(err) = self.latched {
            return Err(err.into());
        }
        let mut token = Vec::new();
        loop {
            let scan = match self.framer.split(&self.buf, self.at_eof, &mut token) {
                Ok(scan) => scan,
                Err(err) => {
                    self.latched = Some(err);
                    if token.is_empty() {
                        return Err(err.into());
                    }
                    // surface the valid payload prefix first; the error is
                    // returned by the next call
                    return Ok(self.deliver(token, out));
                }
            };
            self.buf.drain(..scan.advance);
            if scan.end_of_message {
                if token.is_empty() {
                    return Ok(ReadEvent::EndOfMessage);
                }
                self.pending_eom = true;
                return Ok(self.deliver(token, out));
            }
            if !token.is_empty() {
                return Ok(self.deliver(token, out));
            }
            if scan.advance > 0 {
                continue;
            }
            if self.at_eof {
                return Ok(ReadEvent::Eof);
            }
            self.fill().await?;
        }
    }

    fn deliver(&mut self, token: Vec<u8>, out: &mut [u8]) -> ReadEvent {
        let n = out.len().min(token.len());
        out[..n].copy_from_slice(&token[..n]);
        if n < token.len() {
            self.overflow.extend_from_slice(&token[n..]);
        }
        ReadEvent::Data(n)
    }

    async fn fill(&mut self) -> std::io::Result<()> {
        let start = self.buf.len();
        if start >= self.capacity {
            // held-back lookahead is bounded well below MIN_BUFFER_SIZE,
            // but never risk a zero-length source read
            self.capacity *= 2;
        }
        self.buf.resize(self.capacity, 0);
        let n = self.src.read(&mut self.buf[start..]).await?;
        self.buf.truncate(start + n);
        if n == 0 {
            self.at_eof = true;
        }
        Ok(())
    }
}
