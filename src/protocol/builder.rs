//! Message builder - in-place construction of a record chain.
//!
//! A [`MessageBuilder`] borrows one fixed-size buffer for one request id and
//! writes records sequentially into it. Consecutive appends of the same type
//! coalesce into a single growing record; a different type (or a forced open)
//! starts a new one. Capacity is never fully consumable: trailing space for
//! one header, plus an end-request body unless the message opened with
//! BEGIN_REQUEST, stays reserved so that a running-out message can always be
//! finished off as a well-formed one.
//!
//! When a write would cross that reservation the builder degrades instead of
//! failing hard: a message that opened with BEGIN_REQUEST gets a forced STDIN
//! terminator (a truncated but valid request), any other message gets a
//! forced END_REQUEST with the "overloaded" status (a valid but degraded
//! response). Either way [`good`](MessageBuilder::good) latches false and the
//! builder accepts no further growth until [`clear`](MessageBuilder::clear).
//!
//! No operation here allocates, suspends, or panics on untrusted sizes;
//! failure is observable only through `good()`.

use super::params;
use super::wire_format::record_type::{BEGIN_REQUEST, END_REQUEST, PARAMS, STDIN};
use super::wire_format::{
    padding_for, protocol_status, BeginRequestBody, EndRequestBody, Header,
    BEGIN_REQUEST_BODY_SIZE, END_REQUEST_BODY_SIZE, HEADER_SIZE,
};

/// Stateful writer that builds a FastCGI message inside a borrowed buffer.
///
/// # Example
///
/// ```
/// use fcgi_wire::protocol::{record_type, request_flags, role, MessageBuilder, MessageView};
///
/// let mut buf = [0u8; 4096];
/// let mut msg = MessageBuilder::new(1, &mut buf);
/// msg.begin_request(role::RESPONDER, request_flags::KEEP_CONN)
///     .add_param(b"REQUEST_METHOD", b"GET")
///     .append(record_type::STDIN, b"hello")
///     .end_stream(record_type::STDIN);
/// assert!(msg.good());
///
/// let kinds: Vec<u8> = MessageView::new(msg.as_bytes())
///     .records()
///     .map(|r| r.record_type())
///     .collect();
/// assert_eq!(kinds, [record_type::BEGIN_REQUEST, record_type::PARAMS,
///                    record_type::STDIN, record_type::STDIN]);
/// ```
#[derive(Debug)]
pub struct MessageBuilder<'a> {
    request_id: u16,
    buf: &'a mut [u8],
    /// Offset of the record currently being written.
    cur: usize,
    /// Type of the record at `cur`; zero means nothing written yet.
    cur_type: u8,
    good: bool,
    terminated: bool,
}

impl<'a> MessageBuilder<'a> {
    /// Bind a builder to a buffer and a request id.
    ///
    /// A buffer smaller than one header plus one end-request body starts out
    /// with `good() == false` and accepts nothing.
    pub fn new(request_id: u16, buf: &'a mut [u8]) -> Self {
        let good = buf.len() >= HEADER_SIZE + END_REQUEST_BODY_SIZE;
        Self {
            request_id,
            buf,
            cur: 0,
            cur_type: 0,
            good,
            terminated: false,
        }
    }

    /// Reset to the initial empty state, keeping the buffer and the id.
    pub fn clear(&mut self) {
        self.cur = 0;
        self.cur_type = 0;
        self.good = self.buf.len() >= HEADER_SIZE + END_REQUEST_BODY_SIZE;
        self.terminated = false;
    }

    /// Change the request id used for records opened from now on.
    pub fn set_request_id(&mut self, request_id: u16) -> &mut Self {
        self.request_id = request_id;
        self
    }

    /// The request id records are stamped with.
    pub fn request_id(&self) -> u16 {
        self.request_id
    }

    /// False once an overflow or a rejected write has latched the builder
    /// into its dead state. The bytes written so far stay readable.
    #[inline]
    pub fn good(&self) -> bool {
        self.good
    }

    /// Capacity of the bound buffer.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Byte length of everything written so far.
    pub fn len(&self) -> usize {
        if self.cur_type == 0 {
            0
        } else {
            self.cur + self.frame_len_at(self.cur)
        }
    }

    /// True while nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The written portion of the buffer, ready to hand to a transport.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    /// Open a request: always starts a fresh BEGIN_REQUEST record carrying
    /// the role and flags. Must come first when building a client request -
    /// it is what exempts the message from the end-request reservation.
    pub fn begin_request(&mut self, role: u16, flags: u8) -> &mut Self {
        if let Some(off) = self.open_record(BEGIN_REQUEST, true, BEGIN_REQUEST_BODY_SIZE as u16) {
            BeginRequestBody::new(role, flags).encode_into(&mut self.buf[off + HEADER_SIZE..]);
        }
        self
    }

    /// Finish a response: always starts a fresh END_REQUEST record carrying
    /// the statuses.
    pub fn end_request(&mut self, app_status: u32, protocol_status: u8) -> &mut Self {
        if let Some(off) = self.open_record(END_REQUEST, true, END_REQUEST_BODY_SIZE as u16) {
            EndRequestBody::new(app_status, protocol_status)
                .encode_into(&mut self.buf[off + HEADER_SIZE..]);
        }
        self
    }

    /// Append payload bytes to a record of the given type.
    ///
    /// If the current record already has this type the bytes concatenate into
    /// it; otherwise a new record opens first. A write that would cross the
    /// terminator reservation triggers overflow handling instead.
    pub fn append(&mut self, record_type: u8, data: &[u8]) -> &mut Self {
        if let Some(off) = self.open_record(record_type, false, 0) {
            let len = self.content_len_at(off);
            let payload_end = off + HEADER_SIZE + len;
            if len + data.len() > u16::MAX as usize
                || payload_end + data.len() > self.terminator()
            {
                self.overflow();
            } else {
                self.buf[payload_end..payload_end + data.len()].copy_from_slice(data);
                self.set_content_len_at(off, (len + data.len()) as u16);
            }
        }
        self
    }

    /// Append one name/value entry to the PARAMS record, opening one if the
    /// current record has a different type.
    pub fn add_param(&mut self, name: &[u8], value: &[u8]) -> &mut Self {
        if let Some(off) = self.open_record(PARAMS, false, 0) {
            let len = self.content_len_at(off);
            let payload_end = off + HEADER_SIZE + len;
            let pair = params::pair_len(name, value);
            if len + pair > u16::MAX as usize || payload_end + pair > self.terminator() {
                self.overflow();
            } else {
                let written =
                    params::encode_pair_into(&mut self.buf[payload_end..payload_end + pair], name, value);
                debug_assert_eq!(written, pair);
                self.set_content_len_at(off, (len + pair) as u16);
            }
        }
        self
    }

    /// Guarantee an explicit empty record of the given stream type, writing
    /// one if the current record of that type carries data.
    ///
    /// Ending STDIN terminates the message: afterwards only STDIN and
    /// END_REQUEST are tolerated, anything else latches `good` false.
    pub fn end_stream(&mut self, record_type: u8) -> &mut Self {
        let mut opened = self.open_record(record_type, false, 0).is_some();
        if opened && self.content_len_at(self.cur) != 0 {
            opened = self.open_record(record_type, true, 0).is_some();
        }
        if opened && record_type == STDIN {
            self.terminated = true;
        }
        self
    }

    /// Content length of the record at `off`.
    fn content_len_at(&self, off: usize) -> usize {
        u16::from_be_bytes([self.buf[off + 4], self.buf[off + 5]]) as usize
    }

    /// Total length of the record at `off`, padding included.
    fn frame_len_at(&self, off: usize) -> usize {
        HEADER_SIZE + self.content_len_at(off) + self.buf[off + 6] as usize
    }

    /// Rewrite the length fields of the record at `off`, re-deriving padding
    /// and zeroing the padding bytes.
    fn set_content_len_at(&mut self, off: usize, content_length: u16) {
        let padding = padding_for(content_length);
        self.buf[off + 4..off + 6].copy_from_slice(&content_length.to_be_bytes());
        self.buf[off + 6] = padding;
        let pad_start = off + HEADER_SIZE + content_length as usize;
        self.buf[pad_start..pad_start + padding as usize].fill(0);
    }

    /// Type of the first record in the buffer; zero while nothing is written.
    fn first_type(&self) -> u8 {
        if self.cur_type == 0 {
            0
        } else {
            self.buf[1]
        }
    }

    /// Offset of the reserved trailing region. Writes must stay at or below
    /// this boundary so a terminating record always fits. Recomputed per
    /// write because the reservation depends on the first record's type.
    fn terminator(&self) -> usize {
        let mut reserved = HEADER_SIZE;
        if self.first_type() != BEGIN_REQUEST {
            reserved += END_REQUEST_BODY_SIZE;
        }
        self.buf.len().saturating_sub(reserved)
    }

    /// Make the current record one of type `ty`, opening a new record when
    /// the type differs or `force` is set. Returns the offset of the current
    /// record's header, or `None` when nothing may be written.
    fn open_record(&mut self, ty: u8, force: bool, body_len: u16) -> Option<usize> {
        if !self.good {
            return None;
        }
        if self.terminated {
            // Stream-end and end-request traffic after termination is
            // tolerated without effect; anything else is a caller error.
            if ty != END_REQUEST && ty != STDIN {
                self.good = false;
            }
            return None;
        }
        if self.cur_type == ty && !force {
            return Some(self.cur);
        }
        if self.cur_type != 0 {
            let next = self.cur + self.frame_len_at(self.cur);
            if ty == END_REQUEST || ty == STDIN {
                // Terminating records may consume the reservation itself,
                // but header and body must still fit inside the buffer.
                if next > self.terminator()
                    || next + HEADER_SIZE + body_len as usize > self.buf.len()
                {
                    self.good = false;
                    return None;
                }
            } else {
                match self.terminator().checked_sub(HEADER_SIZE + body_len as usize) {
                    Some(limit) if next <= limit => {}
                    _ => {
                        self.overflow();
                        return None;
                    }
                }
            }
            self.cur = next;
        }
        Header::new(ty, self.request_id, body_len).encode_into(&mut self.buf[self.cur..]);
        self.cur_type = ty;
        Some(self.cur)
    }

    /// Degrade on overflow: finish the message off as the smallest valid one
    /// for its role, then latch the dead state.
    fn overflow(&mut self) {
        if !self.good {
            return;
        }
        if self.first_type() == BEGIN_REQUEST {
            self.end_stream(STDIN);
        } else {
            self.end_request(0, protocol_status::OVERLOADED);
        }
        self.good = false;
    }
}
