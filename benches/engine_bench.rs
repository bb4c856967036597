use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_decimal_macros::dec;

use voorafbetaling::core::*;
use voorafbetaling::prepayment::*;

fn full_declaration() -> Declaration {
    DeclarationBuilder::new()
        .value("1080", dec!(1_850_000))
        .value("1240", dec!(42_500))
        .value("1420", dec!(15_000))
        .value("1433", dec!(120_000))
        .value("1443", dec!(2_400_000))
        .value("1508", dec!(75_000))
        .value("1830", dec!(3_200))
        .value("1840", dec!(1_100))
        .build()
}

fn bench_compute_tax(c: &mut Criterion) {
    let declaration = full_declaration();
    let prepayments = Prepayments::new(dec!(50_000), dec!(50_000), dec!(25_000), dec!(0));
    c.bench_function("compute_tax", |b| {
        b.iter(|| {
            black_box(compute_tax(
                black_box(&declaration),
                "2025",
                None,
                Eligibility::default(),
                black_box(&prepayments),
            ))
        });
    });
}

fn bench_classify_book_year(c: &mut Criterion) {
    c.bench_function("parse_book_year", |b| {
        b.iter(|| black_box(parse_book_year(black_box("2024-07-01"), black_box("2025-06-30"))));
    });
}

fn bench_suggest(c: &mut Criterion) {
    let info = parse_book_year("2025-04-01", "2025-12-31").unwrap();
    c.bench_function("suggest_prepayments_zero_balance", |b| {
        b.iter(|| {
            black_box(suggest_prepayments(
                Goal::ZeroBalance,
                Concentration::Spread,
                black_box(dec!(412_345.67)),
                dec!(7_500),
                false,
                "2025",
                Some(&info),
            ))
        });
    });
}

fn bench_advise(c: &mut Criterion) {
    let declaration = full_declaration();
    let calculation = TaxCalculation::new(&declaration, "2025");
    c.bench_function("advise_no_surcharge", |b| {
        b.iter(|| {
            black_box(advise(
                black_box(&calculation),
                Goal::NoSurcharge,
                Concentration::Quarter(Slot::Va2),
            ))
        });
    });
}

criterion_group!(
    benches,
    bench_compute_tax,
    bench_classify_book_year,
    bench_suggest,
    bench_advise,
);
criterion_main!(benches);
