//! Book year classification.
//!
//! A book year (boekjaar) is Normal when it spans exactly twelve months,
//! Short below that and Long above. Short book years only have the
//! trailing quarterly slots active; Long book years only count the last
//! twelve months for advance payments.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult};
use super::params::TaxYearParameters;
use super::types::Slot;

static SLOTS: [Slot; 4] = Slot::ALL;

/// Length class of a book year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookYearKind {
    Short,
    Normal,
    Long,
}

/// Classification of a fiscal period, derived once per period change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookYearInfo {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_in_months: u32,
    /// Inclusive of both start and end date.
    pub duration_in_days: u32,
    pub is_short_book_year: bool,
    pub is_normal_book_year: bool,
    pub is_long_book_year: bool,
    /// Distinct calendar quarters touched by the period.
    pub quarters_in_book_year: u32,
    due_dates: [NaiveDate; 4],
}

/// Classify the period `[start, end]`.
pub fn classify_book_year(start: NaiveDate, end: NaiveDate) -> EngineResult<BookYearInfo> {
    if end < start {
        return Err(EngineError::period_order(start, end));
    }

    let after_end = end
        .succ_opt()
        .ok_or_else(|| EngineError::invalid_period(start, end, "end date out of range"))?;
    let duration_in_months = full_months(start, after_end);
    let duration_in_days = u32::try_from((end - start).num_days() + 1)
        .map_err(|_| EngineError::invalid_period(start, end, "period too long"))?;

    let quarters_in_book_year = (quarter_ordinal(end) - quarter_ordinal(start) + 1) as u32;

    let due_dates = due_dates_for(end)
        .ok_or_else(|| EngineError::invalid_period(start, end, "due dates out of range"))?;

    Ok(BookYearInfo {
        start_date: start,
        end_date: end,
        duration_in_months,
        duration_in_days,
        is_short_book_year: duration_in_months < 12,
        is_normal_book_year: duration_in_months == 12,
        is_long_book_year: duration_in_months > 12,
        quarters_in_book_year,
        due_dates,
    })
}

/// Classify a period given as ISO dates ("2025-01-01").
pub fn parse_book_year(start: &str, end: &str) -> EngineResult<BookYearInfo> {
    let parse = |s: &str| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d");
    let (Ok(start_date), Ok(end_date)) = (parse(start), parse(end)) else {
        return Err(EngineError::invalid_period(
            start,
            end,
            "dates must be formatted as YYYY-MM-DD",
        ));
    };
    classify_book_year(start_date, end_date)
}

impl BookYearInfo {
    /// The calendar year Jan 1 - Dec 31.
    pub fn calendar_year(year: i32) -> EngineResult<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1);
        let end = NaiveDate::from_ymd_opt(year, 12, 31);
        match (start, end) {
            (Some(start), Some(end)) => classify_book_year(start, end),
            _ => Err(EngineError::invalid_period(
                format!("{year}-01-01"),
                format!("{year}-12-31"),
                "year out of range",
            )),
        }
    }

    pub fn kind(&self) -> BookYearKind {
        if self.is_short_book_year {
            BookYearKind::Short
        } else if self.is_long_book_year {
            BookYearKind::Long
        } else {
            BookYearKind::Normal
        }
    }

    /// Slots in which an advance payment can legally be made.
    ///
    /// Short book years keep only the trailing slots, one per quarter
    /// touched; Normal and Long book years have all four.
    pub fn active_slots(&self) -> &'static [Slot] {
        if !self.is_short_book_year {
            return &SLOTS;
        }
        let count = self.quarters_in_book_year.clamp(1, 4) as usize;
        &SLOTS[4 - count..]
    }

    pub fn is_active(&self, slot: Slot) -> bool {
        self.active_slots().contains(&slot)
    }

    /// Whether the trailing twelve-month window coincides with a calendar year.
    /// When it does not, the company keeps its books "te paard".
    pub fn is_calendar_aligned(&self) -> bool {
        self.end_date.month() == 12 && self.end_date.day() == 31
    }

    /// Due date of a slot, counted back from the last month of the period.
    pub fn due_date(&self, slot: Slot) -> NaiveDate {
        self.due_dates[slot.index()]
    }

    /// Surcharge rate that applies to the book year as a whole: the mean
    /// of the active slots' quarterly rates.
    pub fn effective_surcharge_rate(&self, params: &TaxYearParameters) -> Decimal {
        let slots = self.active_slots();
        params.quarterly_rates.sum_of(slots) / Decimal::from(slots.len())
    }
}

// Months between `from` and `until`, counting a month only when the day of
// month has been reached.
fn full_months(from: NaiveDate, until: NaiveDate) -> u32 {
    let mut months = (until.year() - from.year()) * 12 + until.month() as i32 - from.month() as i32;
    if until.day() < from.day() {
        months -= 1;
    }
    months.max(0) as u32
}

fn quarter_ordinal(date: NaiveDate) -> i32 {
    date.year() * 4 + (date.month0() / 3) as i32
}

// VA1..VA3 fall on the 10th of the 9th, 6th and 3rd month before the end
// (the end month counting as the first); VA4 on the 20th of the end month.
fn due_dates_for(end: NaiveDate) -> Option<[NaiveDate; 4]> {
    let end_month = end.with_day(1)?;
    let at = |months_back: u32, day: u32| {
        end_month
            .checked_sub_months(Months::new(months_back))?
            .with_day(day)
    };
    Some([at(8, 10)?, at(5, 10)?, at(2, 10)?, at(0, 20)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn calendar_year_is_normal() {
        let info = classify_book_year(date(2025, 1, 1), date(2025, 12, 31)).unwrap();
        assert_eq!(info.duration_in_months, 12);
        assert_eq!(info.duration_in_days, 365);
        assert!(info.is_normal_book_year);
        assert_eq!(info.kind(), BookYearKind::Normal);
        assert_eq!(info.quarters_in_book_year, 4);
        assert!(info.is_calendar_aligned());
    }

    #[test]
    fn mid_month_twelve_months_is_normal() {
        let info = classify_book_year(date(2024, 7, 15), date(2025, 7, 14)).unwrap();
        assert_eq!(info.duration_in_months, 12);
        assert!(info.is_normal_book_year);
        assert_eq!(info.quarters_in_book_year, 5);
    }

    #[test]
    fn one_day_short_of_full_months() {
        let info = classify_book_year(date(2025, 1, 1), date(2025, 12, 30)).unwrap();
        assert_eq!(info.duration_in_months, 11);
        assert!(info.is_short_book_year);
    }

    #[test]
    fn single_day_period() {
        let info = classify_book_year(date(2025, 3, 5), date(2025, 3, 5)).unwrap();
        assert_eq!(info.duration_in_months, 0);
        assert_eq!(info.duration_in_days, 1);
        assert_eq!(info.quarters_in_book_year, 1);
        assert_eq!(info.active_slots(), &[Slot::Va4]);
    }

    #[test]
    fn long_book_year() {
        let info = classify_book_year(date(2024, 7, 1), date(2025, 12, 31)).unwrap();
        assert_eq!(info.duration_in_months, 18);
        assert!(info.is_long_book_year);
        assert_eq!(info.quarters_in_book_year, 6);
        assert_eq!(info.active_slots(), &Slot::ALL);
    }

    #[test]
    fn short_year_slots_follow_quarters() {
        let q1 = classify_book_year(date(2025, 10, 1), date(2025, 12, 31)).unwrap();
        assert_eq!(q1.active_slots(), &[Slot::Va4]);
        let q2 = classify_book_year(date(2025, 1, 1), date(2025, 6, 30)).unwrap();
        assert_eq!(q2.active_slots(), &[Slot::Va3, Slot::Va4]);
        let q3 = classify_book_year(date(2025, 4, 1), date(2025, 12, 31)).unwrap();
        assert_eq!(q3.active_slots(), &[Slot::Va2, Slot::Va3, Slot::Va4]);
        assert!(!q3.is_active(Slot::Va1));
    }

    #[test]
    fn calendar_due_dates() {
        let info = BookYearInfo::calendar_year(2025).unwrap();
        assert_eq!(info.due_date(Slot::Va1), date(2025, 4, 10));
        assert_eq!(info.due_date(Slot::Va2), date(2025, 7, 10));
        assert_eq!(info.due_date(Slot::Va3), date(2025, 10, 10));
        assert_eq!(info.due_date(Slot::Va4), date(2025, 12, 20));
    }

    #[test]
    fn straddling_due_dates() {
        let info = classify_book_year(date(2024, 7, 1), date(2025, 6, 30)).unwrap();
        assert!(!info.is_calendar_aligned());
        assert_eq!(info.due_date(Slot::Va1), date(2024, 10, 10));
        assert_eq!(info.due_date(Slot::Va2), date(2025, 1, 10));
        assert_eq!(info.due_date(Slot::Va3), date(2025, 4, 10));
        assert_eq!(info.due_date(Slot::Va4), date(2025, 6, 20));
    }

    #[test]
    fn short_year_due_dates_count_back_from_end() {
        let info = classify_book_year(date(2025, 1, 1), date(2025, 6, 30)).unwrap();
        assert_eq!(info.due_date(Slot::Va3), date(2025, 4, 10));
        assert_eq!(info.due_date(Slot::Va4), date(2025, 6, 20));
    }

    #[test]
    fn effective_rate_averages_active_slots() {
        let params = TaxYearParameters::tax_year_2025();
        let short = classify_book_year(date(2025, 1, 1), date(2025, 6, 30)).unwrap();
        assert_eq!(short.effective_surcharge_rate(&params), dec!(0.07));
        let normal = BookYearInfo::calendar_year(2025).unwrap();
        assert_eq!(normal.effective_surcharge_rate(&params), dec!(0.09));
    }

    #[test]
    fn rejects_reversed_period() {
        let err = classify_book_year(date(2025, 12, 31), date(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPeriod { .. }));
    }

    #[test]
    fn parses_iso_dates() {
        let info = parse_book_year("2025-01-01", " 2025-12-31 ").unwrap();
        assert!(info.is_normal_book_year);
        let err = parse_book_year("01/01/2025", "2025-12-31").unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }
}
