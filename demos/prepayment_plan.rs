//! Compute the tax for a straddling book year, ask for the prepayments that
//! avoid the surcharge and print the schedule.
//!
//! Run with: `cargo run --example prepayment_plan --features all`
//! Set `RUST_LOG=voorafbetaling=debug` to see the engine's trace output.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

use voorafbetaling::core::*;
use voorafbetaling::prepayment::*;
use voorafbetaling::report::{build_report, format_amount};

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let declaration = DeclarationBuilder::new()
        .value("1080", dec!(420_000))
        .value("1240", dec!(18_500))
        .value("1443", dec!(60_000))
        .value("1830", dec!(750))
        .build();
    let book_year = parse_book_year("2024-07-01", "2025-06-30")?;

    let calculation = TaxCalculation::new(&declaration, "2025")
        .book_year(&book_year)
        .eligibility(Eligibility::default());

    let advice = advise(&calculation, Goal::NoSurcharge, Concentration::Spread)?;

    println!("Zonder voorafbetalingen\n");
    println!("{}\n", build_report(&advice.baseline));

    let today = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap_or(book_year.start_date);
    let plan = plan_prepayments(&advice.prepayments, &book_year, today);
    println!("Voorafbetalingen ({})", advice.goal);
    for payment in &plan.payments {
        println!(
            "  {} vóór {}: {}",
            payment.slot,
            payment.due_date.format("%d/%m/%Y"),
            format_amount(payment.amount)
        );
    }
    println!("  Totaal: {}\n", format_amount(plan.total()));

    println!("{}", build_report(&advice.outcome));
    Ok(())
}
