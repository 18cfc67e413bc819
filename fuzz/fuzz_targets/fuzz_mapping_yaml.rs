#![no_main]
use libfuzzer_sys::fuzz_target;
use upsbridge::Registry;
use upsbridge::convert::ConverterCatalog;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = Registry::from_yaml_str(text, &ConverterCatalog::builtin());
    }
});
