#![no_main]

use libfuzzer_sys::fuzz_target;
use streaming_form_data::{State, StreamingParser, TargetRegistry, ValueTarget};

fn parse<'a, I>(name: &str, chunks: I) -> (State, ValueTarget)
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let target = ValueTarget::new();
    let registry = TargetRegistry::new().with(name, target.clone());
    let mut parser = StreamingParser::new("X-BOUNDARY", registry).expect("valid boundary");

    for chunk in chunks {
        if parser.data_received(chunk).is_err() {
            break;
        }
    }

    (parser.state(), target)
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let chunk_size = usize::from(data[0]) + 1;
    let name = match data[1] % 3 {
        0 => "file",
        1 => "name",
        _ => "",
    };
    let body = &data[2..];

    let (whole_state, whole) = parse(name, Some(body));
    let (chunked_state, chunked) = parse(name, body.chunks(chunk_size));

    assert_eq!(whole_state, chunked_state);
    assert_eq!(whole.value(), chunked.value());
});
