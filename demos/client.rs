//! FastCGI client demo.
//!
//! Builds a responder request in a stack buffer, sends it over a Unix
//! domain socket, then reads and dumps every record of the response.
//!
//! ```sh
//! cargo run --example server /tmp/fcgi.sock   # in another terminal
//! cargo run --example client /tmp/fcgi.sock
//! ```

use std::env;

use bytes::BytesMut;
use fcgi_wire::connection::{read_response, write_message};
use fcgi_wire::protocol::{record_type, request_flags, role, MessageBuilder, MessageView, RecordBody};
use fcgi_wire::transport::SocketStream;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let path = env::args().nth(1).unwrap_or_else(|| "sock".to_string());
    let mut stream = SocketStream::connect(&path).await?;

    let mut buf = [0u8; 64 * 1024];
    let mut msg = MessageBuilder::new(1, &mut buf);
    msg.begin_request(role::RESPONDER, request_flags::KEEP_CONN)
        .add_param(b"GATEWAY_INTERFACE", b"CGI/1.1")
        .add_param(b"REQUEST_METHOD", b"POST")
        .add_param(b"CONTENT_TYPE", b"application/x-www-form-urlencoded")
        .add_param(b"REQUEST_URI", b"/test.cgi?v=1&type=test")
        .add_param(b"HTTP_HOST", b"localhost")
        .append(record_type::STDIN, b"v=1&text=the+test")
        .end_stream(record_type::STDIN);
    tracing::debug!(bytes = msg.len(), good = msg.good(), "request built");

    write_message(&mut stream, msg.as_bytes()).await?;

    let mut recv = BytesMut::new();
    read_response(&mut stream, &mut recv).await?;

    for record in MessageView::new(&recv).records() {
        print!(
            "fcgi record {}; size {}",
            record.record_type(),
            record.content_len()
        );
        match record.body() {
            Some(RecordBody::Stream(data)) if !data.is_empty() => {
                print!(": {}", String::from_utf8_lossy(data));
            }
            Some(RecordBody::EndRequest(end)) => {
                print!("; status {}", end.app_status);
            }
            _ => {}
        }
        println!();
    }

    Ok(())
}
