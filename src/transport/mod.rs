//! NETCONF transport layer.
//!
//! The transport layer binds the RFC 6242 framing codec to a raw byte
//! source and sink, offering "clean" reader and writer halves to the
//! message layer: [`TransportReader`] strips framing from input and
//! reports message boundaries, [`TransportWriter`] applies framing to
//! output. Both expose the one-shot framing mode switch performed after
//! the `<hello>` exchange.

mod bucker;
mod reader;
mod writer;

pub use reader::{ReadEvent, TransportReader, DEFAULT_BUFFER_SIZE, MIN_BUFFER_SIZE};
pub use writer::TransportWriter;
