//! # fcgi-wire
//!
//! FastCGI message codec over caller-supplied fixed-size buffers.
//!
//! Records are encoded and decoded directly inside one borrowed byte region -
//! no intermediate allocation, no copying. A [`MessageBuilder`] writes a
//! chain of self-describing records into its buffer (coalescing same-type
//! appends and recovering from overflow by emitting a minimal valid
//! terminator), and a [`MessageView`] walks a received byte range yielding
//! validated records without ever mutating it.
//!
//! ## Architecture
//!
//! - **Codec** ([`protocol`]): header wire format, record chain traversal,
//!   name/value parameter codec, in-place message builder. Pure in-memory
//!   arithmetic; single-threaded by construction; never raises - failure is
//!   a validity predicate or the builder's `good()` flag.
//! - **Connection** ([`connection`]): read-until-complete / write-all
//!   helpers that shuttle byte ranges between the codec and a stream.
//! - **Transport** ([`transport`], Unix only): thin bind/accept/connect
//!   wrappers over Unix domain sockets.
//!
//! ## Example
//!
//! ```
//! use fcgi_wire::protocol::{record_type, request_flags, role, MessageBuilder, MessageView};
//!
//! // Build a request in place.
//! let mut buf = [0u8; 4096];
//! let mut msg = MessageBuilder::new(1, &mut buf);
//! msg.begin_request(role::RESPONDER, request_flags::KEEP_CONN)
//!     .add_param(b"REQUEST_METHOD", b"POST")
//!     .add_param(b"HTTP_HOST", b"localhost")
//!     .append(record_type::STDIN, b"v=1")
//!     .end_stream(record_type::STDIN);
//! assert!(msg.good());
//!
//! // Parse it back, zero-copy.
//! let view = MessageView::new(msg.as_bytes());
//! assert!(view.is_complete_request());
//! for record in view.records() {
//!     assert_eq!(record.request_id(), 1);
//! }
//! ```

pub mod connection;
pub mod error;
pub mod protocol;
#[cfg(unix)]
pub mod transport;

pub use error::FcgiWireError;
pub use protocol::{MessageBuilder, MessageView};
