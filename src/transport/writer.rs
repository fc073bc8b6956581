use crate::error::Result;
use crate::framing::{FramingMode, MAXIMUM_CHUNK_SIZE, TOKEN_EOM};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A NETCONF transport encoder over a raw byte sink.
///
/// The writer presents a consistent API no matter the current framing
/// mode: [`TransportWriter::write`] frames payload bytes and
/// [`TransportWriter::write_end`] emits the mode-appropriate
/// end-of-message marker. It supports both NETCONF 1.0 end-of-message
/// framing and NETCONF 1.1 chunked framing.
/// See [RFC6242](https://tools.ietf.org/html/rfc6242#section-4)
#[derive(Debug)]
pub struct TransportWriter<W> {
    dst: W,
    chunked: bool,
    max_chunk_size: u32,
}

impl<W: AsyncWrite + Unpin> TransportWriter<W> {
    pub fn new(dst: W) -> TransportWriter<W> {
        TransportWriter {
            dst,
            chunked: false,
            max_chunk_size: MAXIMUM_CHUNK_SIZE,
        }
    }

    pub fn framing_mode(&self) -> FramingMode {
        if self.chunked {
            FramingMode::Chunked
        } else {
            FramingMode::EndOfMessage
        }
    }

    /// Caps the size of chunks emitted in chunked framing mode. Passing 0
    /// restores the RFC 6242 maximum.
    pub fn set_max_chunk_size(&mut self, size: u32) {
        self.max_chunk_size = if size == 0 { MAXIMUM_CHUNK_SIZE } else { size };
    }

    /// Switches the writer to chunked framing (`chunked == true`).
    ///
    /// Called after receiving `</hello>` when the `:base:1.1` capability
    /// was advertised by both peers. Takes effect from the next write; it
    /// must only be called at a message boundary.
    pub fn set_framing_mode(&mut self, chunked: bool) {
        self.chunked = chunked;
    }

    pub fn get_ref(&self) -> &W {
        &self.dst
    }

    /// Writes `b` to the destination using the current framing mode.
    pub async fn write(&mut self, b: &[u8]) -> Result<()> {
        if b.is_empty() {
            return Ok(());
        }
        if !self.chunked {
            self.dst.write_all(b).await?;
            return Ok(());
        }
        for chunk in b.chunks(self.max_chunk_size as usize) {
            self.dst
                .write_all(format!("\n#{}\n", chunk.len()).as_bytes())
                .await?;
            self.dst.write_all(chunk).await?;
        }
        Ok(())
    }

    /// Writes the end-of-message marker for the current framing mode and
    /// flushes the destination. Must be called at the end of each message
    /// sent by a NETCONF client or server.
    pub async fn write_end(&mut self) -> Result<()> {
        if self.chunked {
            self.dst.write_all(b"\n##\n").await?;
        } else {
            self.dst.write_all(TOKEN_EOM).await?;
        }
        self.dst.flush().await?;
        Ok(())
    }

    /// Shuts the underlying sink down.
    pub async fn close(&mut self) -> Result<()> {
        self.dst.shutdown().await?;
        Ok(())
    }
}
