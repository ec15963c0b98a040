//! Integration tests for fcgi-wire.
//!
//! These tests verify the full build -> send -> parse -> respond cycle
//! across modules, the way a client and a responder would use the crate.

use bytes::BytesMut;
use fcgi_wire::connection::{read_request, read_response, write_message};
use fcgi_wire::protocol::{
    protocol_status, record_type, request_flags, role, MessageBuilder, MessageView, RecordBody,
};

/// Build the documented sample request: responder role, CGI-ish params, a
/// two-chunk stdin body, and the stream terminator.
fn build_sample_request(buf: &mut [u8]) -> usize {
    let mut msg = MessageBuilder::new(1, buf);
    msg.begin_request(role::RESPONDER, request_flags::KEEP_CONN)
        .add_param(b"GATEWAY_INTERFACE", b"CGI/1.1")
        .add_param(b"REQUEST_METHOD", b"POST")
        .add_param(b"HTTP_HOST", b"localhost")
        .append(record_type::STDIN, b"v=1&text=")
        .append(record_type::STDIN, b"the+test")
        .end_stream(record_type::STDIN);
    assert!(msg.good());
    msg.len()
}

/// Test that a server sees exactly what the client built.
#[test]
fn test_request_build_and_parse() {
    let mut buf = [0u8; 64 * 1024];
    let len = build_sample_request(&mut buf);

    let view = MessageView::new(&buf[..len]);
    assert!(view.is_complete_request());

    let mut params = Vec::new();
    let mut stdin = Vec::new();
    let mut begin = None;
    for record in view.records() {
        assert_eq!(record.request_id(), 1);
        match record.body().unwrap() {
            RecordBody::BeginRequest(body) => begin = Some(body),
            RecordBody::Params(entries) => {
                for p in entries {
                    params.push((p.name.to_vec(), p.value.to_vec()));
                }
            }
            RecordBody::Stream(data) if record.record_type() == record_type::STDIN => {
                stdin.extend_from_slice(data);
            }
            _ => {}
        }
    }

    let begin = begin.expect("begin-request record");
    assert_eq!(begin.role, role::RESPONDER);
    assert!(begin.keep_conn());

    assert_eq!(
        params,
        [
            (b"GATEWAY_INTERFACE".to_vec(), b"CGI/1.1".to_vec()),
            (b"REQUEST_METHOD".to_vec(), b"POST".to_vec()),
            (b"HTTP_HOST".to_vec(), b"localhost".to_vec()),
        ]
    );

    // Chunks coalesced in call order.
    assert_eq!(stdin, b"v=1&text=the+test");
}

/// Test building the response in the same buffer the request arrived in.
#[test]
fn test_response_reuses_request_buffer() {
    let mut buf = [0u8; 64 * 1024];
    let request_len = build_sample_request(&mut buf);

    let request_id = MessageView::new(&buf[..request_len])
        .records()
        .next()
        .unwrap()
        .request_id();

    let mut msg = MessageBuilder::new(request_id, &mut buf);
    msg.append(record_type::STDOUT, b"Status: 200\r\n")
        .append(record_type::STDOUT, b"Content-Length: 2\r\n\r\n")
        .append(record_type::STDOUT, b"Ok")
        .end_stream(record_type::STDOUT)
        .end_request(0, protocol_status::REQUEST_COMPLETE);
    assert!(msg.good());
    let response_len = msg.len();

    let view = MessageView::new(&buf[..response_len]);
    assert!(view.is_complete_response());

    let records: Vec<_> = view.records().collect();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].record_type(), record_type::STDOUT);
    assert_eq!(
        records[0].content(),
        b"Status: 200\r\nContent-Length: 2\r\n\r\nOk"
    );
    assert!(records[1].is_stream_end());
    assert!(matches!(
        records[2].body().unwrap(),
        RecordBody::EndRequest(end)
            if end.app_status == 0 && end.protocol_status == protocol_status::REQUEST_COMPLETE
    ));
}

/// Test that an oversized response degrades into a valid, parseable message.
#[test]
fn test_overflowed_response_still_parses_end_to_end() {
    let mut buf = [0u8; 256];
    let mut msg = MessageBuilder::new(3, &mut buf);
    msg.append(record_type::STDOUT, &[b'A'; 1024])
        .end_stream(record_type::STDOUT)
        .end_request(0, protocol_status::REQUEST_COMPLETE);
    assert!(!msg.good());

    // Every record in the degraded output is still valid and the message is
    // terminated for the client's completion check.
    let view = MessageView::new(msg.as_bytes());
    assert!(view.is_complete_response());
    let last = view.records().last().unwrap();
    assert!(matches!(
        last.body().unwrap(),
        RecordBody::EndRequest(end) if end.protocol_status == protocol_status::OVERLOADED
    ));
}

/// Test a full client/server exchange over an in-memory stream.
#[tokio::test]
async fn test_exchange_over_duplex() {
    let (mut client, mut server) = tokio::io::duplex(64 * 1024);

    let server_task = tokio::spawn(async move {
        let mut recv = BytesMut::new();
        read_request(&mut server, &mut recv).await.unwrap();

        let request_id = MessageView::new(&recv)
            .records()
            .next()
            .unwrap()
            .request_id();

        let mut buf = [0u8; 4096];
        let mut msg = MessageBuilder::new(request_id, &mut buf);
        msg.append(record_type::STDOUT, b"Status: 200\r\n\r\nOk")
            .end_stream(record_type::STDOUT)
            .end_request(0, protocol_status::REQUEST_COMPLETE);
        assert!(msg.good());
        write_message(&mut server, msg.as_bytes()).await.unwrap();
    });

    let mut buf = [0u8; 4096];
    let len = build_sample_request(&mut buf);
    write_message(&mut client, &buf[..len]).await.unwrap();

    let mut recv = BytesMut::new();
    read_response(&mut client, &mut recv).await.unwrap();
    server_task.await.unwrap();

    let view = MessageView::new(&recv);
    let stdout: Vec<u8> = view
        .records()
        .filter(|r| r.record_type() == record_type::STDOUT)
        .flat_map(|r| r.content().to_vec())
        .collect();
    assert_eq!(stdout, b"Status: 200\r\n\r\nOk");
    assert_eq!(
        view.records().map(|r| r.request_id()).collect::<Vec<_>>(),
        [1, 1, 1]
    );
}

/// Test that every record a builder emits is 8-byte aligned after its
/// header, for a spread of payload sizes.
#[test]
fn test_emitted_records_are_aligned() {
    for payload_len in [0usize, 1, 7, 8, 9, 63, 64, 100] {
        let mut buf = [0u8; 1024];
        let payload = vec![b'z'; payload_len];
        let mut msg = MessageBuilder::new(1, &mut buf);
        msg.append(record_type::STDOUT, &payload);
        assert!(msg.good());

        let record = MessageView::new(msg.as_bytes()).records().next().unwrap();
        let header = record.header();
        assert_eq!(header.content_length as usize, payload_len);
        assert_eq!(header.padded_content_len() % 8, 0);
        assert_eq!(msg.len() % 8, 0);
    }
}

/// Test clearing and rebuilding in one buffer across several exchanges.
#[test]
fn test_builder_reuse_across_messages() {
    let mut buf = [0u8; 1024];
    let mut msg = MessageBuilder::new(1, &mut buf);

    for round in 1..=3u16 {
        msg.clear();
        msg.set_request_id(round)
            .append(record_type::STDOUT, b"Ok")
            .end_stream(record_type::STDOUT)
            .end_request(round as u32, protocol_status::REQUEST_COMPLETE);
        assert!(msg.good());

        let view = MessageView::new(msg.as_bytes());
        let records: Vec<_> = view.records().collect();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.request_id() == round));
        assert!(matches!(
            records[2].body().unwrap(),
            RecordBody::EndRequest(end) if end.app_status == u32::from(round)
        ));
    }
}
