#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlsubst::{from_xml_str, substitute_str, SectionTagSet, VariableMap};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    // first line holds `key=value` pairs separated by spaces
    let (header, document) = s.split_once('\n').unwrap_or(("", s));
    let vars: VariableMap = header
        .split(' ')
        .filter_map(|pair| pair.split_once('='))
        .collect();
    let tags: SectionTagSet = ["appSettings", "connectionStrings"].into_iter().collect();

    if let Ok(output) = substitute_str(document, &tags, &vars) {
        assert!(from_xml_str(&output).is_ok());
    }
});
