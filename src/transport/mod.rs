//! Transport module - Unix domain socket handling.
//!
//! FastCGI clients and responders usually meet on a Unix domain socket at a
//! well-known path; these are the thin bind/accept/connect wrappers around
//! that. The codec never touches them - it only consumes and produces byte
//! ranges that travel over a [`SocketStream`].

mod socket;

pub use socket::{SocketCleanup, SocketListener, SocketStream};
