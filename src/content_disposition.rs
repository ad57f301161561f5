use crate::constants;
use http::header::{self, HeaderMap};

/// The parameters of a part's `Content-Disposition` header that matter for
/// `multipart/form-data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ContentDisposition {
    pub(crate) field_name: String,
    pub(crate) file_name: Option<String>,
}

impl ContentDisposition {
    pub fn parse(headers: &HeaderMap) -> crate::Result<ContentDisposition> {
        let value = headers
            .get(header::CONTENT_DISPOSITION)
            .ok_or_else(|| malformed("missing Content-Disposition header"))?;

        let value = std::str::from_utf8(value.as_bytes())
            .map_err(|_| malformed("Content-Disposition header is not valid UTF-8"))?;

        ContentDisposition::parse_value(value)
    }

    /// Parses `form-data; name="field"; filename="file.txt"`.
    pub fn parse_value(value: &str) -> crate::Result<ContentDisposition> {
        let (disposition, mut rest) = match value.find(';') {
            Some(idx) => (&value[..idx], &value[idx..]),
            None => (value, ""),
        };

        if !disposition.trim().eq_ignore_ascii_case(constants::FORM_DATA) {
            return Err(malformed(format!(
                "disposition type is {:?}, expected {:?}",
                disposition.trim(),
                constants::FORM_DATA
            )));
        }

        let mut field_name = None;
        let mut file_name = None;

        loop {
            rest = rest.trim_start();
            rest = match rest.strip_prefix(';') {
                Some(r) => r.trim_start(),
                None if rest.is_empty() => break,
                None => return Err(malformed("expected ';' between parameters")),
            };
            if rest.is_empty() {
                break;
            }

            let (key, value, remaining) = next_param(rest)?;
            rest = remaining;

            if key.eq_ignore_ascii_case(constants::PARAM_NAME) {
                field_name.get_or_insert(value);
            } else if key.eq_ignore_ascii_case(constants::PARAM_FILE_NAME) {
                file_name.get_or_insert(value);
            }
        }

        let field_name = field_name.ok_or_else(|| malformed("missing `name` parameter"))?;

        Ok(ContentDisposition { field_name, file_name })
    }
}

/// Splits one `key=value` or `key="quoted value"` parameter off the front of
/// `input`.
fn next_param(input: &str) -> crate::Result<(&str, String, &str)> {
    let eq = input
        .find(|c: char| c == '=' || c == ';')
        .filter(|&idx| input.as_bytes()[idx] == b'=')
        .ok_or_else(|| malformed(format!("parameter without value: {:?}", input)))?;

    let key = input[..eq].trim();
    let rest = input[eq + 1..].trim_start();

    if let Some(quoted) = rest.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = quoted.char_indices();

        while let Some((idx, c)) = chars.next() {
            match c {
                '"' => return Ok((key, value, &quoted[idx + 1..])),
                '\\' => match chars.next() {
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                c => value.push(c),
            }
        }

        Err(malformed(format!("unterminated quoted value for parameter {:?}", key)))
    } else {
        let end = rest.find(';').unwrap_or(rest.len());
        Ok((key, rest[..end].trim_end().to_owned(), &rest[end..]))
    }
}

fn malformed<R: Into<String>>(reason: R) -> crate::Error {
    crate::Error::MalformedHeader { reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn parse(value: &str) -> crate::Result<ContentDisposition> {
        ContentDisposition::parse_value(value)
    }

    #[test]
    fn test_field_name() {
        let cd = parse(r#"form-data; name="my_field""#).unwrap();
        assert_eq!(cd.field_name, "my_field");
        assert_eq!(cd.file_name, None);

        let cd = parse(r#"form-data; name="my field""#).unwrap();
        assert_eq!(cd.field_name, "my field");

        let cd = parse("form-data; name=\"你好\"; filename=\"file abc.txt\"").unwrap();
        assert_eq!(cd.field_name, "你好");
        assert_eq!(cd.file_name.as_deref(), Some("file abc.txt"));
    }

    #[test]
    fn test_file_name() {
        let cd = parse(r#"form-data; name="my_field"; filename="file_name.txt""#).unwrap();
        assert_eq!(cd.file_name.as_deref(), Some("file_name.txt"));

        let cd = parse("form-data; filename=\"কখগ-你好.txt\"; name=f").unwrap();
        assert_eq!(cd.file_name.as_deref(), Some("কখগ-你好.txt"));
        assert_eq!(cd.field_name, "f");

        let cd = parse(r#"form-data; name="upload"; filename="""#).unwrap();
        assert_eq!(cd.file_name.as_deref(), Some(""));
    }

    #[test]
    fn test_case_insensitive_and_unquoted() {
        let cd = parse(r#"Form-Data; NAME=plain ; FileName="a.txt""#).unwrap();
        assert_eq!(cd.field_name, "plain");
        assert_eq!(cd.file_name.as_deref(), Some("a.txt"));
    }

    #[test]
    fn test_quoted_escapes() {
        let cd = parse(r#"form-data; name="say \"hi\""; filename="C:\\dir\\a;b.txt""#).unwrap();
        assert_eq!(cd.field_name, r#"say "hi""#);
        assert_eq!(cd.file_name.as_deref(), Some(r"C:\dir\a;b.txt"));
    }

    #[test]
    fn test_does_not_confuse_filename_with_name() {
        let cd = parse(r#"form-data; filename="x.bin"; name="real""#).unwrap();
        assert_eq!(cd.field_name, "real");
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            parse(r#"form-data; filename="a.txt""#),
            Err(crate::Error::MalformedHeader { .. })
        ));
        assert!(parse(r#"attachment; name="a""#).is_err());
        assert!(parse(r#"form-data; name="a"#).is_err());
        assert!(parse(r#"form-data; name"#).is_err());
        assert!(parse(r#"form-data; name="a" junk"#).is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_parse_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(ContentDisposition::parse(&headers).is_err());

        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("form-data; name=\"a\""),
        );
        assert_eq!(ContentDisposition::parse(&headers).unwrap().field_name, "a");

        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_bytes("form-data; name=\"ü\"".as_bytes()).unwrap(),
        );
        assert_eq!(ContentDisposition::parse(&headers).unwrap().field_name, "ü");
    }
}
