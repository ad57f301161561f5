use crate::error::BoxError;
use crate::StreamingParser;
use futures_util::stream::{Stream, StreamExt};
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;
#[cfg(feature = "tokio-io")]
use tokio_util::io::ReaderStream;

impl StreamingParser {
    /// Feeds every chunk of `stream` to the parser, then calls
    /// [`end_of_stream`](StreamingParser::end_of_stream).
    ///
    /// A stream error is returned as
    /// [`Error::StreamReadFailed`](crate::Error::StreamReadFailed) and doesn't
    /// fail the parser.
    ///
    /// # Examples
    ///
    /// ```
    /// use streaming_form_data::{StreamingParser, TargetRegistry, ValueTarget};
    /// use bytes::Bytes;
    /// use std::convert::Infallible;
    /// use futures_util::stream::once;
    ///
    /// # async fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
    ///
    /// let value = ValueTarget::new();
    /// let registry = TargetRegistry::new().with("my_text_field", value.clone());
    /// let mut parser = StreamingParser::new("X-BOUNDARY", registry).unwrap();
    ///
    /// parser.feed_stream(stream).await.unwrap();
    /// assert_eq!(value.value(), "abcd");
    /// # }
    /// # tokio::runtime::Runtime::new().unwrap().block_on(run());
    /// ```
    pub async fn feed_stream<S, O, E>(&mut self, stream: S) -> crate::Result<()>
    where
        S: Stream<Item = Result<O, E>>,
        O: AsRef<[u8]>,
        E: Into<BoxError>,
    {
        futures_util::pin_mut!(stream);

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| crate::Error::StreamReadFailed(err.into()))?;
            self.data_received(chunk.as_ref())?;
        }

        self.end_of_stream()
    }

    /// Feeds everything read from `reader` to the parser, then calls
    /// [`end_of_stream`](StreamingParser::end_of_stream).
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use streaming_form_data::{StreamingParser, TargetRegistry, ValueTarget};
    ///
    /// # async fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let reader = data.as_bytes();
    ///
    /// let value = ValueTarget::new();
    /// let registry = TargetRegistry::new().with("my_text_field", value.clone());
    /// let mut parser = StreamingParser::new("X-BOUNDARY", registry).unwrap();
    ///
    /// parser.feed_reader(reader).await.unwrap();
    /// assert_eq!(value.value(), "abcd");
    /// # }
    /// # tokio::runtime::Runtime::new().unwrap().block_on(run());
    /// ```
    #[cfg(feature = "tokio-io")]
    #[cfg_attr(nightly, doc(cfg(feature = "tokio-io")))]
    pub async fn feed_reader<R: AsyncRead>(&mut self, reader: R) -> crate::Result<()> {
        self.feed_stream(ReaderStream::new(reader)).await
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, StreamingParser, TargetRegistry, ValueTarget};
    use bytes::Bytes;
    use futures_util::stream;
    use std::io;

    const DATA: &str = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"f\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";

    #[tokio::test]
    async fn test_feed_stream_by_char() {
        let stream = stream::iter(
            DATA.chars()
                .map(|ch| ch.to_string())
                .map(|part| Result::<Bytes, io::Error>::Ok(Bytes::copy_from_slice(part.as_bytes()))),
        );

        let value = ValueTarget::new();
        let mut parser = StreamingParser::new("X-BOUNDARY", TargetRegistry::new().with("f", value.clone())).unwrap();

        parser.feed_stream(stream).await.unwrap();
        assert_eq!(value.value(), "abcd");
        assert!(parser.is_terminated());
    }

    #[tokio::test]
    async fn test_feed_stream_incomplete() {
        let stream = stream::iter(vec![Result::<&[u8], io::Error>::Ok(&DATA.as_bytes()[..60])]);
        let mut parser = StreamingParser::new("X-BOUNDARY", TargetRegistry::new()).unwrap();

        assert_eq!(
            parser.feed_stream(stream).await,
            Err(Error::IncompleteFieldData {
                field_name: Some("f".to_owned())
            })
        );
    }

    #[tokio::test]
    async fn test_feed_stream_read_error() {
        let stream = stream::iter(vec![
            Ok(Bytes::from_static(b"--X-BOUNDARY\r\n")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ]);
        let mut parser = StreamingParser::new("X-BOUNDARY", TargetRegistry::new()).unwrap();

        let err = parser.feed_stream(stream).await.unwrap_err();
        assert!(matches!(err, Error::StreamReadFailed(_)));
        assert!(parser.data_received(b"").is_ok());
    }

    #[cfg(feature = "tokio-io")]
    #[tokio::test]
    async fn test_feed_reader() {
        let value = ValueTarget::new();
        let mut parser = StreamingParser::new("X-BOUNDARY", TargetRegistry::new().with("f", value.clone())).unwrap();

        parser.feed_reader(DATA.as_bytes()).await.unwrap();
        assert_eq!(value.value(), "abcd");
    }
}
