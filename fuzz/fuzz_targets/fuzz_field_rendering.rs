#![no_main]

use gqlerr::ring_buffer::RingBufferSink;
use gqlerr::{ErrorPresenter, Field, GqlError, RequestContext};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data).into_owned();
    let err = GqlError::internal(&RequestContext::background(), text.clone(), [
        Field::string("payload", text.clone()),
        Field::int("len", data.len() as i64),
    ]);

    let sink = RingBufferSink::new(1, 128);
    ErrorPresenter::new(sink.clone()).log_error(&err);

    for entry in sink.get_all() {
        assert!(entry.message.len() <= 128);
        assert!(std::str::from_utf8(entry.message.as_bytes()).is_ok());
    }
});
