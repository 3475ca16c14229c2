#![no_main]

use gqlerr::ring_buffer::RingBufferSink;
use gqlerr::{Code, ErrorPresenter, Field, GqlError, Path, RequestContext};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let text = String::from_utf8_lossy(rest).into_owned();
    let code = Code::ALL[selector as usize % Code::ALL.len()];

    let path: Path = text.split('/').filter(|s| !s.is_empty()).collect();
    let ctx = RequestContext::with_path(path);

    let mut err = GqlError::new(&ctx, code, text.clone(), [Field::string("input", text.clone())]);
    if selector & 0x10 != 0 {
        err = err.with_message(text.clone());
    }
    if selector & 0x20 != 0 {
        err = err.at_info();
    }

    let presenter = ErrorPresenter::new(RingBufferSink::new(4, 256));
    let response = presenter.present(&ctx, Some(err));

    let response = response.expect("a present error always produces a response");
    assert_eq!(response.extensions.code, code);
    if selector & 0x10 == 0 {
        assert_eq!(response.message, code.default_message());
    }
    assert_eq!(presenter.sink().len(), 1);
});
