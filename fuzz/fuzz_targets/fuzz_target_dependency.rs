#![no_main]

use dpkg_engine::dependency::{RelationKind, Relationship};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let _ = Relationship::parse_field(RelationKind::Depends, data);
});
