#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let (start, end) = s.split_once('|').unwrap_or((s, s));
        if let Ok(info) = voorafbetaling::parse_book_year(start, end) {
            // Accepted periods must yield consistent due dates.
            let _ = info.due_dates();
            assert!(!info.active_slots().is_empty());
        }
    }
});
