#![no_main]

use libfuzzer_sys::fuzz_target;
use voorafbetaling::prepayment::{Concentration, Goal};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Errors are fine, panics are bugs.
        let _ = s.parse::<Goal>();
        if let Ok(c) = s.parse::<Concentration>() {
            assert_eq!(c.to_string().parse::<Concentration>().ok(), Some(c));
        }
    }
});
