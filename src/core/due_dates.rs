use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::period::BookYearInfo;
use super::types::Slot;

/// Due date of one active advance payment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDate {
    pub slot: Slot,
    pub date: NaiveDate,
}

impl DueDate {
    /// A payment is overdue once `now` is past its due date.
    /// `now` is supplied by the caller; the engine never reads the clock.
    pub fn is_overdue(&self, now: NaiveDate) -> bool {
        self.date < now
    }
}

impl BookYearInfo {
    /// Due dates of the active slots, in slot order.
    pub fn due_dates(&self) -> Vec<DueDate> {
        self.active_slots()
            .iter()
            .map(|&slot| DueDate {
                slot,
                date: self.due_date(slot),
            })
            .collect()
    }

    /// Active slots whose due date has passed at `now`.
    pub fn overdue_slots(&self, now: NaiveDate) -> Vec<Slot> {
        self.due_dates()
            .into_iter()
            .filter(|d| d.is_overdue(now))
            .map(|d| d.slot)
            .collect()
    }
}
