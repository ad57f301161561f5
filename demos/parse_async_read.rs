use tokio::io::AsyncRead;
// Import streaming-form-data types.
use streaming_form_data::{ListTarget, StreamingParser, TargetRegistry, ValueTarget};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate an `AsyncRead` and the boundary from somewhere e.g. server request body.
    let (reader, boundary) = get_async_reader_from_somewhere().await;

    let field = ValueTarget::new();
    let files = ListTarget::new();

    // Register a target for each field name of interest, other fields are skipped.
    let mut registry = TargetRegistry::new();
    registry.register("My Field", field.clone());
    registry.register("File Field", files.clone());

    // Read the whole body, the targets are filled while it is read.
    let mut parser = StreamingParser::new(boundary, registry)?;
    parser.feed_reader(reader).await?;

    println!("My Field: {:?}", field.text());
    for content in files.values() {
        println!("File Field: {:?}", String::from_utf8_lossy(&content));
    }

    Ok(())
}

// Generate an `AsyncRead` and the boundary from somewhere e.g. server request body.
async fn get_async_reader_from_somewhere() -> (impl AsyncRead, &'static str) {
    let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\nHello\r\nWorld\rAgain\r\n--X-BOUNDARY--\r\n";

    (data.as_bytes(), "X-BOUNDARY")
}
