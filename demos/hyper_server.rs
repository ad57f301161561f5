use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::{convert::Infallible, net::SocketAddr};

use bytes::Bytes;
use futures_util::StreamExt;
use http_body_util::{BodyStream, Full};
use hyper::{body::Incoming, Request, Response, StatusCode};
// Import the streaming-form-data types.
use streaming_form_data::{CallbackTarget, SpooledTarget, StreamingParser, TargetRegistry, ValueTarget};

// A handler for incoming requests.
async fn handle(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let title = ValueTarget::new();
    let uploads = SpooledTarget::new(64 * 1024);
    let checksum_bytes = Arc::new(AtomicUsize::new(0));

    let counter = checksum_bytes.clone();
    let registry = TargetRegistry::new()
        .with("title", title.clone())
        .with("upload", uploads.clone())
        .with(
            "upload",
            CallbackTarget::new(move |chunk: &[u8]| {
                counter.fetch_add(chunk.len(), Ordering::Relaxed);
                Ok(())
            }),
        );

    // Send `BAD_REQUEST` status if the content-type is not multipart/form-data.
    let mut parser = match StreamingParser::from_headers(req.headers(), registry) {
        Ok(parser) => parser,
        Err(_) => {
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .body(Full::from("BAD REQUEST"))
                .unwrap())
        }
    };

    // Convert the body into a stream of data frames.
    let body_stream = BodyStream::new(req.into_body())
        .filter_map(|result| async move { result.map(|frame| frame.into_data().ok()).transpose() });

    // Feed the body to the parser, the targets see the data as it arrives.
    if let Err(err) = parser.feed_stream(body_stream).await {
        let status = if err.is_parse_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        return Ok(Response::builder()
            .status(status)
            .body(Full::from(format!("ERROR: {}", err)))
            .unwrap());
    }

    println!("Title: {:?}", title.text());
    for part in uploads.parts() {
        println!(
            "Upload: FileName: {:?}, Content-Type: {:?}, Size: {}",
            part.file_name,
            part.content_type,
            part.data.len()
        );
    }
    println!("Upload Bytes Total: {}", checksum_bytes.load(Ordering::Relaxed));

    Ok(Response::new(Full::from("Success")))
}

#[tokio::main]
async fn main() {
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    println!("Server running at: {}", addr);

    let service = hyper::service::service_fn(handle);

    loop {
        let (socket, _remote_addr) = listener.accept().await.unwrap();
        let socket = hyper_util::rt::TokioIo::new(socket);
        tokio::spawn(async move {
            if let Err(e) = hyper::server::conn::http1::Builder::new()
                .serve_connection(socket, service)
                .await
            {
                eprintln!("server error: {}", e);
            }
        });
    }
}
