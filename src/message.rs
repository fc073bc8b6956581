//! NETCONF message layer.
//!
//! The message layer splits the transport session into a series of NETCONF
//! messages, each a complete XML document. [`Splitter`] hands out the
//! current message's [`Incoming`] reader and [`Outgoing`] writer; after a
//! message completes, the next call produces a fresh handle bound to the
//! next message.
//!
//! An [`Incoming`] handle reports the end of its message by returning
//! `Ok(0)` from [`Incoming::read`], masking the true end of the session
//! input stream, which is instead signalled by [`Error::EndOfStream`] on
//! the first read of a handle. An [`Outgoing`] handle emits the
//! end-of-message marker when closed.

use crate::error::{Error, Result};
use crate::framing::FramingMode;
use crate::transport::{ReadEvent, TransportReader, TransportWriter};
use tokio::io::{AsyncRead, AsyncWrite};

#[derive(Debug)]
struct ReadState {
    closed: bool,
    first: bool,
    done: bool,
}

impl ReadState {
    fn new() -> ReadState {
        ReadState {
            closed: false,
            first: true,
            done: false,
        }
    }
}

#[derive(Debug)]
struct WriteState {
    closed: bool,
    written: bool,
    done: bool,
}

impl WriteState {
    fn new() -> WriteState {
        WriteState {
            closed: false,
            written: false,
            done: false,
        }
    }
}

/// Presents the NETCONF transport as a sequence of per-message handles.
///
/// The splitter owns both transport halves. It keeps at most one active
/// incoming and one active outgoing message; a handle that has completed
/// is replaced lazily by the next call to [`Splitter::incoming`] or
/// [`Splitter::outgoing`].
#[derive(Debug)]
pub struct Splitter<R, W> {
    reader: TransportReader<R>,
    writer: TransportWriter<W>,
    rx: ReadState,
    tx: WriteState,
    received: u64,
}

impl<R, W> Splitter<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: TransportReader<R>, writer: TransportWriter<W>) -> Splitter<R, W> {
        Splitter {
            reader,
            writer,
            rx: ReadState::new(),
            tx: WriteState::new(),
            received: 0,
        }
    }

    /// Returns the current incoming message handle, allocating a fresh one
    /// if the previous message has completed.
    pub fn incoming(&mut self) -> Incoming<'_, R> {
        if self.rx.done {
            self.rx = ReadState::new();
        }
        Incoming {
            reader: &mut self.reader,
            state: &mut self.rx,
            received: &mut self.received,
        }
    }

    /// Returns the current outgoing message handle, allocating a fresh one
    /// if the previous message has been closed.
    pub fn outgoing(&mut self) -> Outgoing<'_, W> {
        if self.tx.done {
            self.tx = WriteState::new();
        }
        Outgoing {
            writer: &mut self.writer,
            state: &mut self.tx,
        }
    }

    /// Number of complete messages received on the session.
    pub fn messages_received(&self) -> u64 {
        self.received
    }

    pub fn framing_mode(&self) -> FramingMode {
        self.reader.framing_mode()
    }

    /// Switches decoder and encoder to the negotiated framing mode in one
    /// step. Must be called at a message boundary, and at most once.
    pub fn set_framing_mode(&mut self, chunked: bool) {
        self.reader.set_framing_mode(chunked);
        self.writer.set_framing_mode(chunked);
    }

    pub fn writer(&self) -> &TransportWriter<W> {
        &self.writer
    }

    pub(crate) fn writer_mut(&mut self) -> &mut TransportWriter<W> {
        &mut self.writer
    }

    pub(crate) fn close_incoming(&mut self) {
        self.rx.closed = true;
    }
}

/// The incoming (from peer) message channel.
///
/// The handle's lifetime is bounded by one message: once the transport
/// reports the message's end, reads return `Ok(0)` and the splitter will
/// hand out a new handle for the next message.
#[derive(Debug)]
pub struct Incoming<'a, R> {
    reader: &'a mut TransportReader<R>,
    state: &'a mut ReadState,
    received: &'a mut u64,
}

impl<R: AsyncRead + Unpin> Incoming<'_, R> {
    /// Reads decoded message payload into `buf`.
    ///
    /// Returns `Ok(0)` at the end of the message (and on any read after
    /// it). Returns [`Error::EndOfStream`] only on the very first read of
    /// the handle, when the transport ended cleanly before this message
    /// produced any data.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.state.closed {
            return Ok(0);
        }
        let first = std::mem::replace(&mut self.state.first, false);
        match self.reader.read(buf).await? {
            ReadEvent::Data(n) => Ok(n),
            ReadEvent::EndOfMessage => {
                self.state.closed = true;
                self.state.done = true;
                *self.received += 1;
                Ok(0)
            }
            ReadEvent::Eof => {
                self.state.closed = true;
                if first {
                    return Err(Error::EndOfStream);
                }
                self.state.done = true;
                Ok(0)
            }
        }
    }

    /// Marks the handle closed; subsequent reads return `Ok(0)`.
    pub fn close(&mut self) {
        self.state.closed = true;
    }
}

/// The outgoing (to peer) message channel.
///
/// Closing the handle ends the message: the end-of-message marker is
/// emitted if (and only if) any data was written, and the splitter will
/// hand out a new handle for the next message.
#[derive(Debug)]
pub struct Outgoing<'a, W> {
    writer: &'a mut TransportWriter<W>,
    state: &'a mut WriteState,
}

impl<W: AsyncWrite + Unpin> Outgoing<'_, W> {
    pub async fn write(&mut self, b: &[u8]) -> Result<usize> {
        if self.state.closed {
            return Err(Error::ClosedPipe);
        }
        if !b.is_empty() {
            self.state.written = true;
        }
        self.writer.write(b).await?;
        Ok(b.len())
    }

    /// Ends the message. Idempotent; the first call emits the
    /// end-of-message marker if data was written.
    pub async fn close(&mut self) -> Result<()> {
        if self.state.closed {
            return Ok(());
        }
        self.state.closed = true;
        self.state.done = true;
        if self.state.written {
            self.writer.write_end().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn splitter(input: &[u8]) -> Splitter<Cursor<Vec<u8>>, Vec<u8>> {
        Splitter::new(
            TransportReader::new(Cursor::new(input.to_vec())),
            TransportWriter::new(Vec::new()),
        )
    }

    async fn read_all(incoming: &mut Incoming<'_, Cursor<Vec<u8>>>) -> Result<String> {
        let mut doc = Vec::new();
        let mut buf = [0u8; 8];
        loop {
            match incoming.read(&mut buf).await? {
                0 => return Ok(String::from_utf8(doc).unwrap()),
                n => doc.extend_from_slice(&buf[..n]),
            }
        }
    }

    #[tokio::test]
    async fn test_incoming_rotates_per_message() {
        let mut s = splitter(b"foo]]>]]>bar]]>]]>");
        assert_eq!("foo", read_all(&mut s.incoming()).await.unwrap());
        assert_eq!("bar", read_all(&mut s.incoming()).await.unwrap());
        assert_eq!(2, s.messages_received());

        // transport ended; a fresh handle reports end of stream
        match read_all(&mut s.incoming()).await {
            Err(Error::EndOfStream) => {}
            other => panic!("wanted end of stream, got {:?}", other),
        }
        assert_eq!(2, s.messages_received());
    }

    #[tokio::test]
    async fn test_closed_incoming_reads_nothing() {
        let mut s = splitter(b"foo]]>]]>");
        let mut incoming = s.incoming();
        assert_eq!("foo", read_all(&mut incoming).await.unwrap());
        // the handle stays at end of message once complete
        let mut buf = [0u8; 8];
        assert_eq!(0, incoming.read(&mut buf).await.unwrap());
    }

    #[tokio::test]
    async fn test_incoming_close() {
        let mut s = splitter(b"foobar]]>]]>");
        let mut incoming = s.incoming();
        let mut buf = [0u8; 3];
        let n = incoming.read(&mut buf).await.unwrap();
        assert!(n > 0);
        incoming.close();
        assert_eq!(0, incoming.read(&mut buf).await.unwrap());
    }

    #[tokio::test]
    async fn test_end_of_stream_on_empty_transport() {
        let mut s = splitter(b"");
        let mut buf = [0u8; 8];
        match s.incoming().read(&mut buf).await {
            Err(Error::EndOfStream) => {}
            other => panic!("wanted end of stream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_outgoing_close_emits_marker_only_when_written() {
        let mut s = splitter(b"");
        {
            let mut outgoing = s.outgoing();
            outgoing.write(b"foo").await.unwrap();
            outgoing.close().await.unwrap();
            // idempotent: no second marker
            outgoing.close().await.unwrap();
        }
        {
            let mut outgoing = s.outgoing();
            outgoing.close().await.unwrap();
        }
        assert_eq!(b"foo]]>]]>".as_slice(), s.writer().get_ref());
    }

    #[tokio::test]
    async fn test_outgoing_write_after_close() {
        let mut s = splitter(b"");
        let mut outgoing = s.outgoing();
        outgoing.close().await.unwrap();
        match outgoing.write(b"foo").await {
            Err(Error::ClosedPipe) => {}
            other => panic!("wanted closed pipe, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_outgoing_rotates_per_message() {
        let mut s = splitter(b"");
        {
            let mut outgoing = s.outgoing();
            outgoing.write(b"one").await.unwrap();
            outgoing.close().await.unwrap();
        }
        {
            let mut outgoing = s.outgoing();
            outgoing.write(b"two").await.unwrap();
            outgoing.close().await.unwrap();
        }
        assert_eq!(b"one]]>]]>two]]>]]>".as_slice(), s.writer().get_ref());
    }
}
