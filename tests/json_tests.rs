#![cfg(feature = "json")]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use voorafbetaling::core::*;

const CUSTOM_TABLE: &str = r#"{
  "2027": {
    "reduced_rate": "0.20",
    "standard_rate": "0.25",
    "reduced_rate_threshold": "100000",
    "basket_limit_threshold": "1000000",
    "basket_limit_rate": "0.70",
    "de_minimis_threshold": "50",
    "de_minimis_percentage": "0.005",
    "standard_increase_rate": "0.08",
    "quarterly_rates": { "q1": "0.11", "q2": "0.09", "q3": "0.07", "q4": "0.05" },
    "liquidation_reserve_rate": "0.10",
    "required_prepayments_percentage": "1"
  }
}"#;

#[test]
fn builtin_table_survives_json() {
    let json = ParameterTable::builtin().to_json().unwrap();
    let table = ParameterTable::from_json(&json).unwrap();
    assert_eq!(table, ParameterTable::builtin());
}

#[test]
fn custom_table_drives_computation() {
    let table = ParameterTable::from_json(CUSTOM_TABLE).unwrap();
    assert_eq!(table.years().collect::<Vec<_>>(), vec![2027]);

    let d = DeclarationBuilder::new().value("1080", dec!(500_000)).build();
    let out = TaxCalculation::new(&d, "2027")
        .parameters(&table)
        .compute()
        .unwrap();
    assert_eq!(out.surcharge.raw_surcharge, dec!(10_000));
    assert!(out.warnings.is_empty());
}

#[test]
fn invalid_json_is_rejected() {
    let err = ParameterTable::from_json("{ not json").unwrap_err();
    assert!(matches!(err, EngineError::InvalidParameters(_)));

    let err = ParameterTable::from_json("{}").unwrap_err();
    assert!(err.to_string().contains("empty"));
}

#[test]
fn invalid_rates_in_json_are_rejected() {
    let broken = CUSTOM_TABLE.replace(r#""q3": "0.07""#, r#""q3": "0.10""#);
    let err = ParameterTable::from_json(&broken).unwrap_err();
    assert!(err.to_string().contains("quarterly_rates"));

    // Plain serde goes through the same validation.
    assert!(serde_json::from_str::<ParameterTable>(&broken).is_err());
    assert!(serde_json::from_str::<ParameterTable>(CUSTOM_TABLE).is_ok());
}

#[test]
fn output_serializes_amounts_as_strings() {
    let d = DeclarationBuilder::new().value("1080", dec!(500_000)).build();
    let out = compute_tax(
        &d,
        "2025",
        None,
        Eligibility::default(),
        &Prepayments::zero(),
    )
    .unwrap();
    let value = serde_json::to_value(&out).unwrap();
    let total: Decimal = value["calculation_total"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, dec!(125_000));
    assert_eq!(value["tax_year"], 2025);
}
