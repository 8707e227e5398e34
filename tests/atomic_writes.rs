//! Atomicity property: a concurrent reader never observes a partial write.

use confmirror::artifact::AtomicFileWriter;
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;

/// Interleave a writer alternating between two contents with a reader
/// sampling the file as fast as it can. Every sample must equal one of the
/// two complete contents — never a prefix, suffix, or mixture.
fn interleave_and_check(old_content: &str, new_content: &str, rounds: usize) {
    let dir = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(dir.path());
    let target = writer.target_path("artifact.json");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(writer.write("artifact.json", old_content)).unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let reader = {
        let stop = Arc::clone(&stop);
        let old = old_content.to_string();
        let new = new_content.to_string();
        std::thread::spawn(move || {
            let mut samples = 0usize;
            while !stop.load(Ordering::Relaxed) {
                let seen = std::fs::read_to_string(&target).unwrap();
                assert!(
                    seen == old || seen == new,
                    "observed partial content ({} bytes, expected {} or {})",
                    seen.len(),
                    old.len(),
                    new.len()
                );
                samples += 1;
            }
            samples
        })
    };

    for i in 0..rounds {
        let content = if i % 2 == 0 { new_content } else { old_content };
        rt.block_on(writer.write("artifact.json", content)).unwrap();
    }

    stop.store(true, Ordering::Relaxed);
    let samples = reader.join().unwrap();
    assert!(samples > 0, "reader never got to sample the file");
}

#[test]
fn reader_sees_old_or_new_never_mixed() {
    let old = "{\"allow_list\": {\"aaaaaaaaaaaaaaaaaaaaaaaa\": true}}".repeat(50);
    let new = "{\"allow_list\": {\"b\": true}}".to_string();
    interleave_and_check(&old, &new, 200);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    // Disjoint alphabets so the two contents can never be equal, which
    // would let a mixed read masquerade as a valid one.
    #[test]
    fn atomicity_holds_for_arbitrary_contents(
        old in "[a-z\n]{1,4096}",
        new in "[A-Z0-9]{1,4096}",
    ) {
        interleave_and_check(&old, &new, 40);
    }
}
