//! Fuzz target for decoding arbitrary bytes as an archive.
//!
//! Walks every entry and drains its payload, exercising format detection,
//! compression filters and the entry conversion on the read side.
//!
//! Run with: cargo +nightly fuzz run image_decode

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut reader) = iso_archiver::Reader::from_memory(data) else {
        return;
    };
    // Bounded so a hostile image cannot keep the target busy forever.
    for _ in 0..10_000 {
        match reader.next_entry() {
            Ok(Some(entry)) => {
                let _ = entry.mode_string();
                if reader.copy_to(std::io::sink(), entry.size()).is_err() {
                    break;
                }
            }
            _ => break,
        }
    }
});
