//! NETCONF session establishment and execution.
//!
//! A [`Session`] owns the transport byte source and sink for its lifetime
//! and drives the initial `<hello>`/`<capabilities>` exchange, including
//! classifying the session as client or server, selecting the framing
//! mode for the rest of the session, and switching the transport codec
//! over at the message boundary after `</hello>`.
//!
//! Client and server applications implement the [`Handler`] trait and run
//! the session with [`Session::run`].

use crate::capability::Capabilities;
use crate::error::{Error, Result};
use crate::hello::Hello;
use crate::message::{Incoming, Outgoing, Splitter};
use crate::transport::{TransportReader, TransportWriter};
use crate::{NETCONF_BASE_10_CAP, NETCONF_BASE_11_CAP};
use async_trait::async_trait;
use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncWrite};

/// Session configuration.
#[derive(Debug, Default, Clone)]
pub struct Config {
    /// The configured session-id. Must be 0 for client sessions and
    /// non-zero for server sessions.
    pub id: u32,
    /// The local session capabilities.
    pub capabilities: Capabilities,
}

/// A session's present state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Initial state; I/O has not yet been started.
    #[default]
    Inactive,
    /// The `<hello>` exchange is in progress.
    CapabilitiesExchange,
    /// Capabilities exchange finished and the session was established.
    Established,
    /// The session encountered an error.
    Error,
    /// The session closed.
    Closed,
}

/// Runtime session state.
#[derive(Debug, Default)]
pub struct State {
    /// The established session-id: the configured id for server sessions,
    /// the id received from the peer for client sessions. Populated during
    /// capabilities exchange.
    pub id: u32,
    /// The remote peer's capabilities.
    pub capabilities: Capabilities,
    pub status: Status,
    errors: Vec<Error>,
}

impl State {
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }
}

/// The session event handler interface, implemented by NETCONF client
/// and/or server applications. See [`Session::run`] for the calling
/// sequence.
#[async_trait]
pub trait Handler<R, W>: Send
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Called once the session is established, after capabilities
    /// processing has completed.
    async fn on_establish(&mut self, session: &mut Session<R, W>);
    /// Called repeatedly while the session remains established. Expected
    /// to consume the current incoming message; observing
    /// [`Error::EndOfStream`] it should move the session status to
    /// [`Status::Closed`].
    async fn on_message(&mut self, session: &mut Session<R, W>);
    /// Called once if the session transitions to [`Status::Error`],
    /// either instead of `on_establish` or after it.
    async fn on_error(&mut self, session: &mut Session<R, W>);
    /// Called immediately after the session's transport is closed.
    async fn on_close(&mut self, session: &mut Session<R, W>);
}

/// A NETCONF session over a byte source and sink.
#[derive(Debug)]
pub struct Session<R, W> {
    pub config: Config,
    pub state: State,
    pub message: Splitter<R, W>,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a new session owning `src` and `dst` for its lifetime.
    pub fn new(src: R, dst: W, config: Config) -> Session<R, W> {
        Session {
            config,
            state: State::default(),
            message: Splitter::new(TransportReader::new(src), TransportWriter::new(dst)),
        }
    }

    /// The incoming (from peer) message channel.
    pub fn incoming(&mut self) -> Incoming<'_, R> {
        self.message.incoming()
    }

    /// The outgoing (to peer) message channel.
    pub fn outgoing(&mut self) -> Outgoing<'_, W> {
        self.message.outgoing()
    }

    pub fn add_error(&mut self, err: Error) {
        self.state.errors.push(err);
    }

    pub fn errors(&self) -> &[Error] {
        self.state.errors()
    }

    /// Performs the session handshake: hello exchange, capabilities
    /// validation and framing mode selection.
    ///
    /// Returns true if the handshake completed and the session status is
    /// [`Status::Established`]; otherwise the status is [`Status::Error`]
    /// and [`Session::errors`] reports the cause. Calling this again after
    /// the handshake is a no-op.
    pub async fn initial_handshake(&mut self) -> bool {
        if self.state.status != Status::Inactive {
            return self.state.status == Status::Established;
        }
        self.state.status = Status::CapabilitiesExchange;
        let result = match self.send_hello().await {
            Ok(()) => self.recv_hello().await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            self.add_error(err);
            self.state.status = Status::Error;
            return false;
        }
        true
    }

    /// Reads the current incoming message to its end, returning the
    /// message body.
    pub async fn read_message(&mut self) -> Result<String> {
        let mut doc = Vec::new();
        let mut buf = [0u8; 4096];
        let mut incoming = self.message.incoming();
        loop {
            match incoming.read(&mut buf).await? {
                0 => return Ok(String::from_utf8_lossy(&doc).into_owned()),
                n => doc.extend_from_slice(&buf[..n]),
            }
        }
    }

    /// Closes the session. Idempotent; closing an already closed transport
    /// is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        self.state.status = Status::Closed;
        let _ = self.message.outgoing().close().await;
        self.message.close_incoming();
        match self.message.writer_mut().close().await {
            Err(Error::Io(err)) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }

    async fn send_hello(&mut self) -> Result<()> {
        let hello = Hello::new(&self.config.capabilities, self.config.id);
        let doc = hello.to_string();
        trace!("sending hello:\n{}", doc);
        let mut outgoing = self.message.outgoing();
        outgoing.write(doc.as_bytes()).await?;
        outgoing.close().await
    }

    async fn recv_hello(&mut self) -> Result<()> {
        let doc = self.read_message().await?;
        trace!("received hello:\n{}", doc);
        let hello = Hello::parse(&doc)?;
        if !hello.is_netconf() {
            return Err(Error::MissingHello);
        }
        let capabilities = hello.capabilities();
        if capabilities.is_empty() {
            // the peer must advertise at least :base:1.0 or :base:1.1
            return Err(Error::MissingCapabilities);
        }
        self.state.capabilities = capabilities;

        // only a client session may receive a <session-id> element
        match hello.session_id() {
            None if self.config.id == 0 => return Err(Error::SessionIdExpected),
            Some(_) if self.config.id != 0 => return Err(Error::SessionIdUnexpected),
            Some(value) => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(Error::MissingSessionIdValue);
                }
                self.state.id = value.parse().map_err(|_| Error::InvalidSessionId)?;
            }
            None => self.state.id = self.config.id,
        }
        self.capabilities_exchange()
    }

    /// Selects the framing mode from the shared `:base:1.x` capabilities
    /// and switches the transport codec over.
    fn capabilities_exchange(&mut self) -> Result<()> {
        let local = &self.config.capabilities;
        let peer = &self.state.capabilities;
        let base11 = local.has(NETCONF_BASE_11_CAP) && peer.has(NETCONF_BASE_11_CAP);
        let base10 = local.has(NETCONF_BASE_10_CAP) && peer.has(NETCONF_BASE_10_CAP);
        if !(base11 || base10) {
            return Err(Error::FramingNegotiation);
        }
        if base11 {
            debug!("session {}: upgrading to chunked framing", self.state.id);
        }
        self.message.set_framing_mode(base11);
        self.state.status = Status::Established;
        Ok(())
    }
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Executes the session using `handler`.
    ///
    /// Performs the hello exchange, then calls `on_establish` followed by
    /// `on_message` while the session remains established (or `on_error`
    /// if the session moved to the error state), closes the transport and
    /// finally calls `on_close`.
    pub async fn run<H: Handler<R, W>>(&mut self, handler: &mut H) {
        if self.initial_handshake().await {
            handler.on_establish(self).await;
            while self.state.status == Status::Established {
                handler.on_message(self).await;
            }
        }
        if self.state.status == Status::Error {
            handler.on_error(self).await;
        }
        let _ = self.close().await;
        handler.on_close(self).await;
    }
}
