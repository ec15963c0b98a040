//! Protocol module - wire format, record views, parameters, message builder.
//!
//! This module implements the FastCGI record codec over caller-supplied
//! buffers:
//! - 8-byte header encoding/decoding and the fixed record bodies
//! - zero-copy record chain traversal with per-step bounds validation
//! - name/value parameter codec with 1-or-4-byte length prefixes
//! - in-place message builder with coalescing and overflow recovery

mod builder;
mod params;
mod record;
mod wire_format;

pub use builder::MessageBuilder;
pub use params::{encode_pair_into, pair_len, Param, Params, ParamsView, MAX_PARAM_LENGTH};
pub use record::{MessageView, RecordBody, RecordView, Records};
pub use wire_format::{
    padding_for, protocol_status, record_type, request_flags, role, BeginRequestBody,
    EndRequestBody, Header, BEGIN_REQUEST_BODY_SIZE, END_REQUEST_BODY_SIZE, HEADER_SIZE,
    NULL_REQUEST_ID, VERSION_1,
};
