//! FastCGI responder demo.
//!
//! Accepts connections on a Unix domain socket, dumps each request's
//! parameters and stdin, and answers with a minimal CGI response. The
//! response is built in the same fixed buffer for every request on the
//! connection.
//!
//! ```sh
//! cargo run --example server /tmp/fcgi.sock
//! ```

use std::env;

use bytes::BytesMut;
use fcgi_wire::connection::{read_request, write_message};
use fcgi_wire::error::Result;
use fcgi_wire::protocol::{protocol_status, record_type, MessageBuilder, MessageView, RecordBody};
use fcgi_wire::transport::{SocketListener, SocketStream};
use fcgi_wire::FcgiWireError;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let path = env::args().nth(1).unwrap_or_else(|| "sock".to_string());
    let listener = SocketListener::bind(&path)?;
    let _cleanup = listener.cleanup_guard();

    loop {
        let mut stream = listener.accept().await?;
        tokio::spawn(async move {
            if let Err(e) = serve(&mut stream).await {
                tracing::error!("connection error: {e}");
            }
        });
    }
}

async fn serve(stream: &mut SocketStream) -> Result<()> {
    let mut recv = BytesMut::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        recv.clear();
        match read_request(stream, &mut recv).await {
            Ok(_) => {}
            Err(FcgiWireError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        }

        let mut request_id = 1;
        for record in MessageView::new(&recv).records() {
            match record.body() {
                Some(RecordBody::BeginRequest(begin)) => {
                    request_id = record.request_id();
                    tracing::info!(role = begin.role, keep_conn = begin.keep_conn(), "begin request");
                }
                Some(RecordBody::Params(params)) => {
                    for p in params {
                        tracing::info!(
                            "  {} = {}",
                            String::from_utf8_lossy(p.name),
                            String::from_utf8_lossy(p.value)
                        );
                    }
                }
                Some(RecordBody::Stream(data))
                    if record.record_type() == record_type::STDIN && !data.is_empty() =>
                {
                    tracing::info!("stdin: {}", String::from_utf8_lossy(data));
                }
                _ => {}
            }
        }

        let mut msg = MessageBuilder::new(request_id, &mut buf);
        msg.append(
            record_type::STDOUT,
            b"Status: 200\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nOk",
        )
        .end_stream(record_type::STDOUT)
        .end_request(0, protocol_status::REQUEST_COMPLETE);
        write_message(stream, msg.as_bytes()).await?;
    }
}
