//! Record views - zero-copy traversal of a received record chain.
//!
//! A [`MessageView`] wraps a borrowed byte range and yields validated
//! [`RecordView`]s. Each traversal step re-validates that the next record
//! fits inside the range before anything is dereferenced: iteration ends as
//! soon as fewer bytes than one header remain, the header fails the validity
//! predicate, or the declared content plus padding would cross the end of the
//! range. A truncated tail therefore yields no partial record - the
//! undecoded bytes belong to a record that has not fully arrived yet and stay
//! reachable through [`Records::trailing`].
//!
//! Views never mutate and are safe to share across read-only observers of
//! the same immutable range.

use super::params::ParamsView;
use super::wire_format::{record_type, BeginRequestBody, EndRequestBody, Header, HEADER_SIZE};

/// Read-only view over the byte range of a received message.
///
/// # Example
///
/// ```
/// use fcgi_wire::protocol::{record_type, MessageBuilder, MessageView};
///
/// let mut buf = [0u8; 256];
/// let mut msg = MessageBuilder::new(7, &mut buf);
/// msg.append(record_type::STDOUT, b"Status: 200\r\n\r\n")
///     .end_stream(record_type::STDOUT)
///     .end_request(0, 0);
///
/// let view = MessageView::new(msg.as_bytes());
/// assert!(view.is_complete_response());
/// for record in view.records() {
///     assert_eq!(record.request_id(), 7);
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MessageView<'a> {
    buf: &'a [u8],
}

impl<'a> MessageView<'a> {
    /// Create a view over a received byte range.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// The underlying byte range.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.buf
    }

    /// Iterate over the validated records in the range.
    pub fn records(&self) -> Records<'a> {
        Records {
            buf: self.buf,
            pos: 0,
        }
    }

    /// True once an empty STDIN record has been decoded - the condition a
    /// server waits for before acting on a request.
    pub fn is_complete_request(&self) -> bool {
        self.records()
            .any(|r| r.record_type() == record_type::STDIN && r.content().is_empty())
    }

    /// True once an END_REQUEST record has been decoded - the condition a
    /// client waits for before acting on a response.
    pub fn is_complete_response(&self) -> bool {
        self.records()
            .any(|r| r.record_type() == record_type::END_REQUEST)
    }
}

impl<'a> IntoIterator for MessageView<'a> {
    type Item = RecordView<'a>;
    type IntoIter = Records<'a>;

    fn into_iter(self) -> Records<'a> {
        self.records()
    }
}

impl<'a> IntoIterator for &MessageView<'a> {
    type Item = RecordView<'a>;
    type IntoIter = Records<'a>;

    fn into_iter(self) -> Records<'a> {
        self.records()
    }
}

/// Iterator over the records of a [`MessageView`].
#[derive(Debug, Clone)]
pub struct Records<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Records<'a> {
    /// Byte offset of the next undecoded position.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// The bytes not consumed by any validated record so far.
    ///
    /// After the iterator is drained this distinguishes a clean end (empty),
    /// a record still in flight (a valid but incomplete head), and a corrupt
    /// head (a decodable header that fails validation).
    pub fn trailing(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = RecordView<'a>;

    fn next(&mut self) -> Option<RecordView<'a>> {
        let rest = &self.buf[self.pos..];
        let header = Header::decode(rest)?;
        if !header.is_valid() {
            return None;
        }
        let frame_len = header.frame_len();
        if frame_len > rest.len() {
            return None;
        }
        let content = &rest[HEADER_SIZE..HEADER_SIZE + header.content_length as usize];
        self.pos += frame_len;
        Some(RecordView { header, content })
    }
}

/// One validated record: its header plus a borrowed content slice.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    header: Header,
    content: &'a [u8],
}

impl<'a> RecordView<'a> {
    /// The decoded header.
    pub fn header(&self) -> Header {
        self.header
    }

    /// The record type.
    #[inline]
    pub fn record_type(&self) -> u8 {
        self.header.record_type
    }

    /// The request id.
    #[inline]
    pub fn request_id(&self) -> u16 {
        self.header.request_id
    }

    /// The content bytes (padding excluded).
    #[inline]
    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    /// The content length in bytes.
    #[inline]
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// True for an empty stream-type record, the end-of-stream marker.
    #[inline]
    pub fn is_stream_end(&self) -> bool {
        record_type::is_stream(self.header.record_type) && self.content.is_empty()
    }

    /// Decode the content according to the record type.
    ///
    /// Returns `None` when a fixed-size body is shorter than its wire layout
    /// requires.
    pub fn body(&self) -> Option<RecordBody<'a>> {
        match self.header.record_type {
            record_type::BEGIN_REQUEST => {
                BeginRequestBody::decode(self.content).map(RecordBody::BeginRequest)
            }
            record_type::END_REQUEST => {
                EndRequestBody::decode(self.content).map(RecordBody::EndRequest)
            }
            record_type::PARAMS => Some(RecordBody::Params(ParamsView::new(self.content))),
            ty if record_type::is_stream(ty) => Some(RecordBody::Stream(self.content)),
            _ => Some(RecordBody::Other(self.content)),
        }
    }
}

/// Tagged decode of a record's content, selected by the type field.
#[derive(Debug, Clone, Copy)]
pub enum RecordBody<'a> {
    /// A BEGIN_REQUEST body.
    BeginRequest(BeginRequestBody),
    /// An END_REQUEST body.
    EndRequest(EndRequestBody),
    /// PARAMS content, ready for entry traversal.
    Params(ParamsView<'a>),
    /// Content of one of the stream types (STDIN/STDOUT/STDERR/DATA).
    Stream(&'a [u8]),
    /// Content of a management or otherwise unhandled record type.
    Other(&'a [u8]),
}
