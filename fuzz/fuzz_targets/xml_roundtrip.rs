#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlsubst::{from_xml_bytes, to_xml_string};

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = from_xml_bytes(data) {
        let written = to_xml_string(&doc);
        let reparsed = from_xml_bytes(written.as_bytes());
        assert_eq!(reparsed.as_ref().ok(), Some(&doc));
    }
});
