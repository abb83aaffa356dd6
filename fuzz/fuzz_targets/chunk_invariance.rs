#![no_main]
use hexview::reader::render_chunk;
use hexview::ViewSinks;
use libfuzzer_sys::fuzz_target;

// First byte picks the chunk length, the rest is the document.
fuzz_target!(|data: &[u8]| {
    let Some((&split, doc)) = data.split_first() else {
        return;
    };
    let step = usize::from(split).max(1);

    let (mut whole, expected) = ViewSinks::in_memory();
    render_chunk(&mut whole, 0, doc, false);

    let (mut chunked, actual) = ViewSinks::in_memory();
    for (i, chunk) in doc.chunks(step).enumerate() {
        render_chunk(&mut chunked, (i * step) as u64, chunk, false);
    }

    assert_eq!(expected.address(), actual.address());
    assert_eq!(expected.hex(), actual.hex());
    assert_eq!(expected.ascii(), actual.ascii());
});
