#![no_main]

use abdesign::population::{weights_from_json, Population};
use abdesign::stratified::split_stratified;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary JSON must never panic the population or weight parsers
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let _ = weights_from_json(&value);

    if let Ok(population) = Population::from_json(&value, "id") {
        let columns = vec!["segment".to_string()];
        let _ = split_stratified(&population, &columns, 4, None, Some(0));
    }
});
