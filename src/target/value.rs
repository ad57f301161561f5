use crate::error::BoxError;
use crate::{Part, Target};
use bytes::{Bytes, BytesMut};
use encoding_rs::{Encoding, UTF_8};
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;
use spin::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct ValueState {
    data: BytesMut,
    file_name: Option<String>,
    content_type: Option<mime::Mime>,
    finished: bool,
}

/// Keeps part data in memory.
///
/// `ValueTarget` is a handle: clones share the same value, so keep one clone
/// and register another. When several parts resolve to the same target their
/// data is concatenated; use [`ListTarget`] to keep them apart.
///
/// # Examples
///
/// ```
/// use streaming_form_data::{StreamingParser, TargetRegistry, ValueTarget};
///
/// # fn run() -> streaming_form_data::Result<()> {
/// let value = ValueTarget::new();
///
/// let mut registry = TargetRegistry::new();
/// registry.register("my_text_field", value.clone());
///
/// let mut parser = StreamingParser::new("X-BOUNDARY", registry)?;
/// parser.data_received(b"--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n")?;
///
/// assert_eq!(value.value(), "abcd");
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[derive(Debug, Default, Clone)]
pub struct ValueTarget {
    state: Arc<Mutex<ValueState>>,
}

impl ValueTarget {
    /// Creates an empty `ValueTarget`.
    pub fn new() -> ValueTarget {
        ValueTarget::default()
    }

    /// The bytes received so far.
    pub fn value(&self) -> Bytes {
        Bytes::copy_from_slice(&self.state.lock().data)
    }

    /// The file name of the last part started on this target.
    pub fn file_name(&self) -> Option<String> {
        self.state.lock().file_name.clone()
    }

    /// The content type of the last part started on this target.
    pub fn content_type(&self) -> Option<mime::Mime> {
        self.state.lock().content_type.clone()
    }

    /// Whether the last part started on this target has been finished.
    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    /// Decodes the value as text, using the `charset` of the part's content
    /// type and falling back to `utf-8`.
    pub fn text(&self) -> String {
        self.text_with_charset("utf-8")
    }

    /// Decodes the value as text with the `charset` of the part's content type,
    /// or `default_encoding` when the part didn't name one.
    ///
    /// Malformed sequences are replaced with `U+FFFD`.
    pub fn text_with_charset(&self, default_encoding: &str) -> String {
        let state = self.state.lock();

        let encoding_name = state
            .content_type
            .as_ref()
            .and_then(|mime| mime.get_param(mime::CHARSET))
            .map(|charset| charset.as_str())
            .unwrap_or(default_encoding);

        let encoding = Encoding::for_label(encoding_name.as_bytes()).unwrap_or(UTF_8);
        let (text, _, _) = encoding.decode(&state.data);

        text.into_owned()
    }

    /// Deserializes the value as JSON.
    ///
    /// # Optional
    ///
    /// This requires the optional `json` feature to be enabled.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub fn json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_slice(&self.state.lock().data).map_err(crate::Error::DecodeJson)
    }
}

impl Target for ValueTarget {
    fn on_start(&mut self, part: &Part) -> Result<(), BoxError> {
        let mut state = self.state.lock();
        state.file_name = part.file_name().map(ToOwned::to_owned);
        state.content_type = part.content_type().cloned();
        state.finished = false;
        Ok(())
    }

    fn on_data(&mut self, chunk: &[u8]) -> Result<(), BoxError> {
        self.state.lock().data.extend_from_slice(chunk);
        Ok(())
    }

    fn on_finish(&mut self) -> Result<(), BoxError> {
        self.state.lock().finished = true;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ListState {
    current: BytesMut,
    values: Vec<Bytes>,
}

/// Keeps the data of every part in memory, one value per part.
///
/// Like [`ValueTarget`], clones share the same list.
#[derive(Debug, Default, Clone)]
pub struct ListTarget {
    state: Arc<Mutex<ListState>>,
}

impl ListTarget {
    /// Creates an empty `ListTarget`.
    pub fn new() -> ListTarget {
        ListTarget::default()
    }

    /// The values of the finished parts, in order.
    pub fn values(&self) -> Vec<Bytes> {
        self.state.lock().values.clone()
    }
}

impl Target for ListTarget {
    fn on_start(&mut self, _: &Part) -> Result<(), BoxError> {
        self.state.lock().current.clear();
        Ok(())
    }

    fn on_data(&mut self, chunk: &[u8]) -> Result<(), BoxError> {
        self.state.lock().current.extend_from_slice(chunk);
        Ok(())
    }

    fn on_finish(&mut self) -> Result<(), BoxError> {
        let mut state = self.state.lock();
        let value = state.current.split().freeze();
        state.values.push(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers;

    fn part(headers: &str) -> Part {
        let headers = helpers::parse_header_block(headers.as_bytes()).unwrap();
        Part::from_headers(headers, 0).unwrap()
    }

    #[test]
    fn test_value_target_shares_state() {
        let value = ValueTarget::new();
        let mut registered = value.clone();

        registered
            .on_start(&part("Content-Disposition: form-data; name=\"f\"; filename=\"a.txt\"\r\n\r\n"))
            .unwrap();
        registered.on_data(b"ab").unwrap();
        assert!(!value.is_finished());
        registered.on_data(b"cd").unwrap();
        registered.on_finish().unwrap();

        assert_eq!(value.value(), "abcd");
        assert_eq!(value.file_name().as_deref(), Some("a.txt"));
        assert!(value.is_finished());
    }

    #[test]
    fn test_value_target_text_with_charset() {
        let mut value = ValueTarget::new();
        value
            .on_start(&part(
                "Content-Disposition: form-data; name=\"f\"\r\nContent-Type: text/plain; charset=iso-8859-1\r\n\r\n",
            ))
            .unwrap();
        value.on_data(b"caf\xe9").unwrap();
        value.on_finish().unwrap();

        assert_eq!(value.text(), "café");
        assert_eq!(value.content_type().unwrap().essence_str(), "text/plain");
    }

    #[test]
    fn test_value_target_text_defaults_to_utf8() {
        let mut value = ValueTarget::new();
        value.on_start(&part("Content-Disposition: form-data; name=\"f\"\r\n\r\n")).unwrap();
        value.on_data("你好".as_bytes()).unwrap();
        assert_eq!(value.text(), "你好");
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_value_target_json() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Point {
            x: i32,
            y: i32,
        }

        let mut value = ValueTarget::new();
        value.on_data(br#"{"x": 1, "y": -2}"#).unwrap();
        assert_eq!(value.json::<Point>().unwrap(), Point { x: 1, y: -2 });
        assert!(value.json::<Vec<u8>>().is_err());
    }

    #[test]
    fn test_list_target_keeps_parts_apart() {
        let list = ListTarget::new();
        let mut registered = list.clone();
        let p = part("Content-Disposition: form-data; name=\"files\"\r\n\r\n");

        registered.on_start(&p).unwrap();
        registered.on_data(b"one").unwrap();
        registered.on_finish().unwrap();
        registered.on_start(&p).unwrap();
        registered.on_finish().unwrap();
        registered.on_start(&p).unwrap();
        registered.on_data(b"th").unwrap();
        registered.on_data(b"ree").unwrap();
        registered.on_finish().unwrap();

        assert_eq!(list.values(), vec![Bytes::from("one"), Bytes::new(), Bytes::from("three")]);
    }
}
