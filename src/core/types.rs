use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Elements of the result subject to the deduction limitation.
pub const CODE_DEDUCTION_LIMITED: &str = "1420";
/// Remaining result (resterend resultaat).
pub const CODE_REMAINING_RESULT: &str = "1430";
/// Base for the deduction basket (grondslag voor de korf).
pub const CODE_BASKET_BASE: &str = "1440";
/// Taxable profit after the basket (belastbare winst).
pub const CODE_TAXABLE_PROFIT: &str = "1460";
/// Liquidation reserve, taxed separately.
pub const CODE_LIQUIDATION_RESERVE: &str = "1508";
/// Non-refundable withholdings.
pub const CODE_NON_REFUNDABLE_WITHHOLDING: &str = "1830";
/// Refundable withholdings.
pub const CODE_REFUNDABLE_WITHHOLDING: &str = "1840";
/// Reason code reported when a small company is exempt from the surcharge.
pub const CODE_SMALL_COMPANY_EXEMPTION: &str = "1801";

/// Economic role of a declaration section.
///
/// Sections are addressed by role rather than by their position in the form,
/// so reordering the form never changes which figures feed the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SectionRole {
    /// Result of the taxable period (reserves, disallowed expenses, dividends).
    ResultOfPeriod,
    /// Elements subject to the deduction limitation (code 1420).
    DeductionLimitedElements,
    /// Deductions from the remaining result.
    RemainingResultDeductions,
    /// Deductions limited by the basket (korfbeperking).
    BasketDeductions,
    /// Items subject to a separate assessment (liquidation reserve).
    SeparateAssessments,
    /// Prepayments and withholdings credited against the tax.
    Withholdings,
}

impl SectionRole {
    /// All roles in form order.
    pub const ALL: [SectionRole; 6] = [
        Self::ResultOfPeriod,
        Self::DeductionLimitedElements,
        Self::RemainingResultDeductions,
        Self::BasketDeductions,
        Self::SeparateAssessments,
        Self::Withholdings,
    ];

    /// Dutch section heading as printed on the return.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ResultOfPeriod => "Resultaat van het belastbare tijdperk",
            Self::DeductionLimitedElements => {
                "Bestanddelen van het resultaat waarop de aftrekbeperking van toepassing is"
            }
            Self::RemainingResultDeductions => "Aftrekken van de resterende winst",
            Self::BasketDeductions => "Aftrekken beperkt door de korf",
            Self::SeparateAssessments => "Afzonderlijke aanslagen",
            Self::Withholdings => "Voorheffingen",
        }
    }

    /// Whether the section carries a total on the return.
    pub fn has_total(&self) -> bool {
        !matches!(self, Self::DeductionLimitedElements)
    }
}

/// One editable monetary line of the declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarationField {
    /// Form code (e.g. "1420").
    pub code: String,
    /// Dutch label as printed on the return.
    pub label: String,
    /// Amount entered by the caller.
    pub value: Decimal,
}

impl DeclarationField {
    pub fn new(code: impl Into<String>, label: impl Into<String>, value: Decimal) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            value,
        }
    }
}

/// Ordered group of declaration fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarationSection {
    pub role: SectionRole,
    pub label: String,
    pub fields: Vec<DeclarationField>,
    /// Whether the section reports a total of its fields.
    pub has_total: bool,
}

impl DeclarationSection {
    /// Create an empty section with the role's default label and total flag.
    pub fn new(role: SectionRole) -> Self {
        Self {
            role,
            label: role.label().to_string(),
            fields: Vec::new(),
            has_total: role.has_total(),
        }
    }

    /// Sum of all field values.
    pub fn sum(&self) -> Decimal {
        self.fields.iter().map(|f| f.value).sum()
    }

    /// The section total, if the section declares one.
    pub fn total(&self) -> Option<Decimal> {
        self.has_total.then(|| self.sum())
    }

    /// Value of the field with the given code, if present.
    pub fn field(&self, code: &str) -> Option<&DeclarationField> {
        self.fields.iter().find(|f| f.code == code)
    }
}

/// The declaration figures, keyed by section role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    sections: BTreeMap<SectionRole, DeclarationSection>,
}

impl Declaration {
    /// An empty declaration. Every figure reads as zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard section layout with every field at zero.
    pub fn standard() -> Self {
        let mut declaration = Self::new();
        for role in SectionRole::ALL {
            let mut section = DeclarationSection::new(role);
            section.fields = standard_fields(role)
                .iter()
                .map(|(code, label)| DeclarationField::new(*code, *label, Decimal::ZERO))
                .collect();
            declaration.insert_section(section);
        }
        declaration
    }

    /// Insert or replace the section for its role.
    pub fn insert_section(&mut self, section: DeclarationSection) {
        self.sections.insert(section.role, section);
    }

    pub fn section(&self, role: SectionRole) -> Option<&DeclarationSection> {
        self.sections.get(&role)
    }

    /// Sections in form order.
    pub fn sections(&self) -> impl Iterator<Item = &DeclarationSection> {
        self.sections.values()
    }

    /// Sum of a section's fields; zero when the section is absent.
    pub fn section_sum(&self, role: SectionRole) -> Decimal {
        self.section(role).map(|s| s.sum()).unwrap_or_default()
    }

    /// Value of a field looked up by code across all sections; zero when absent.
    pub fn value(&self, code: &str) -> Decimal {
        self.sections
            .values()
            .find_map(|s| s.field(code))
            .map(|f| f.value)
            .unwrap_or_default()
    }

    /// Set the value of an existing field. Returns `false` if no field has that code.
    pub fn set_value(&mut self, code: &str, value: Decimal) -> bool {
        for section in self.sections.values_mut() {
            if let Some(field) = section.fields.iter_mut().find(|f| f.code == code) {
                field.value = value;
                return true;
            }
        }
        false
    }

    /// All fields in form order.
    pub fn fields(&self) -> impl Iterator<Item = &DeclarationField> {
        self.sections.values().flat_map(|s| s.fields.iter())
    }
}

fn standard_fields(role: SectionRole) -> &'static [(&'static str, &'static str)] {
    match role {
        SectionRole::ResultOfPeriod => &[
            ("1080", "Belastbare gereserveerde winst"),
            ("1240", "Verworpen uitgaven"),
            ("1320", "Uitgekeerde dividenden"),
        ],
        SectionRole::DeductionLimitedElements => &[(
            CODE_DEDUCTION_LIMITED,
            "Bestanddelen waarop de aftrekbeperking van toepassing is",
        )],
        SectionRole::RemainingResultDeductions => &[
            ("1432", "Niet-belastbare bestanddelen"),
            ("1433", "Definitief belaste inkomsten"),
            ("1434", "Aftrek voor octrooi-inkomsten"),
        ],
        SectionRole::BasketDeductions => &[
            ("1441", "Overgedragen definitief belaste inkomsten"),
            ("1442", "Overgedragen innovatieaftrek"),
            ("1443", "Vorige verliezen"),
            ("1444", "Investeringsaftrek"),
            ("1445", "Overgedragen aftrek voor risicokapitaal"),
        ],
        SectionRole::SeparateAssessments => &[(CODE_LIQUIDATION_RESERVE, "Liquidatiereserve")],
        SectionRole::Withholdings => &[
            (
                CODE_NON_REFUNDABLE_WITHHOLDING,
                "Niet-terugbetaalbare voorheffingen",
            ),
            (CODE_REFUNDABLE_WITHHOLDING, "Terugbetaalbare voorheffingen"),
        ],
    }
}

/// Quarterly advance payment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Slot {
    Va1,
    Va2,
    Va3,
    Va4,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Self::Va1, Self::Va2, Self::Va3, Self::Va4];

    /// Zero-based position (VA1 = 0).
    pub fn index(&self) -> usize {
        match self {
            Self::Va1 => 0,
            Self::Va2 => 1,
            Self::Va3 => 2,
            Self::Va4 => 3,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Va1 => "VA1",
            Self::Va2 => "VA2",
            Self::Va3 => "VA3",
            Self::Va4 => "VA4",
        }
    }

    /// Parse "VA1".."VA4" (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "VA1" => Some(Self::Va1),
            "VA2" => Some(Self::Va2),
            "VA3" => Some(Self::Va3),
            "VA4" => Some(Self::Va4),
            _ => None,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// The four quarterly advance payments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prepayments {
    pub va1: Decimal,
    pub va2: Decimal,
    pub va3: Decimal,
    pub va4: Decimal,
}

impl Prepayments {
    pub fn new(va1: Decimal, va2: Decimal, va3: Decimal, va4: Decimal) -> Self {
        Self { va1, va2, va3, va4 }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: Slot) -> Decimal {
        match slot {
            Slot::Va1 => self.va1,
            Slot::Va2 => self.va2,
            Slot::Va3 => self.va3,
            Slot::Va4 => self.va4,
        }
    }

    pub fn set(&mut self, slot: Slot, amount: Decimal) {
        match slot {
            Slot::Va1 => self.va1 = amount,
            Slot::Va2 => self.va2 = amount,
            Slot::Va3 => self.va3 = amount,
            Slot::Va4 => self.va4 = amount,
        }
    }

    /// Copy with one slot replaced.
    pub fn with(mut self, slot: Slot, amount: Decimal) -> Self {
        self.set(slot, amount);
        self
    }

    pub fn total(&self) -> Decimal {
        self.va1 + self.va2 + self.va3 + self.va4
    }

    /// Copy with negative amounts raised to zero.
    pub fn clamped(&self) -> Self {
        Self {
            va1: self.va1.max(Decimal::ZERO),
            va2: self.va2.max(Decimal::ZERO),
            va3: self.va3.max(Decimal::ZERO),
            va4: self.va4.max(Decimal::ZERO),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, Decimal)> + '_ {
        Slot::ALL.into_iter().map(|slot| (slot, self.get(slot)))
    }
}

/// Company-level flags that switch rules of the cascade on or off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    /// The company qualifies for the reduced rate on the first bracket.
    pub reduced_rate: bool,
    /// Small company in its first three book years: no surcharge is due.
    pub small_company_first_years: bool,
}
