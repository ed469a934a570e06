#![no_main]

use libfuzzer_sys::fuzz_target;
use rdfio::RdfFormat;
use rdfio_fuzz::check_parse_contract;

fuzz_target!(|data: &[u8]| {
    check_parse_contract(RdfFormat::NTriples, data);
});
