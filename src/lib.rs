//! # netconf-transport
//!
//! NETCONF ([RFC6241]) transport framing, message layer and session
//! bootstrap over a secure byte stream ([RFC6242]).
//!
//! The crate does the heavy lifting beneath an XML parser: decoding and
//! encoding both RFC 6242 framing modes (end-of-message delimited and
//! chunked), splitting the transport into per-message read and write
//! handles, and performing the initial `<hello>`/`<capabilities>`
//! exchange with automatic framing mode selection. NETCONF operation
//! semantics, XML processing beyond the hello exchange and the secure
//! transport itself (SSH or TLS) are left to the application.
//!
//! ```toml
//! netconf-transport = "^0.1.0"
//! ```
//!
//! A session is created from any `AsyncRead` source and `AsyncWrite`
//! sink, and is driven by a [`session::Handler`] implementation via
//! [`session::Session::run`].
//!
//! [RFC6241]: https://tools.ietf.org/html/rfc6241
//! [RFC6242]: https://tools.ietf.org/html/rfc6242

pub mod capability;
pub mod error;
pub mod framing;
pub mod hello;
pub mod message;
pub mod rpc_error;
pub mod session;
pub mod transport;

pub use capability::Capabilities;
pub use error::{Error, Result};
pub use session::{Config, Handler, Session, Status};

pub const NETCONF_URN: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";
pub const NETCONF_BASE_10_CAP: &str = "urn:ietf:params:netconf:base:1.0";
pub const NETCONF_BASE_11_CAP: &str = "urn:ietf:params:netconf:base:1.1";
