#![no_main]

use libfuzzer_sys::fuzz_target;
use rust_decimal::Decimal;
use voorafbetaling::prepayment::{Concentration, Goal, advise};
use voorafbetaling::*;

fn amount(bytes: &[u8]) -> Decimal {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    // Keep within the accepted magnitude so the cascade itself is exercised.
    Decimal::new(i64::from_le_bytes(buf) % 100_000_000_000_000, 2)
}

fuzz_target!(|data: &[u8]| {
    let codes = ["1080", "1240", "1420", "1433", "1443", "1508", "1830", "1840"];
    let mut builder = DeclarationBuilder::new();
    for (code, chunk) in codes.iter().zip(data.chunks(8)) {
        builder = builder.value(code, amount(chunk));
    }
    let declaration = builder.build();
    let flags = data.first().copied().unwrap_or_default();
    let eligibility = Eligibility {
        reduced_rate: flags & 1 != 0,
        small_company_first_years: flags & 2 != 0,
    };

    let calculation = TaxCalculation::new(&declaration, "2025").eligibility(eligibility);
    if let Ok(out) = calculation.compute() {
        assert!(out.surcharge_amount() >= Decimal::ZERO);
    }
    let _ = advise(&calculation, Goal::ZeroBalance, Concentration::Spread);
});
