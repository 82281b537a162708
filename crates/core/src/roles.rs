use serde::{Deserialize, Serialize};

use crate::date::NormalizedDate;

/// Outcome of deciding which detected date is which.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateRoles {
    Found {
        manufacturing_date: NormalizedDate,
        expiration_date: Option<NormalizedDate>,
        /// Every detected date, in the order it was pooled (not sorted).
        all_detected_dates: Vec<NormalizedDate>,
    },
    /// Nothing in the recognized text normalized to a date. A normal outcome,
    /// not an error.
    NoValidDates,
}

impl DateRoles {
    /// Earliest date is manufacturing, the next one (by chronology) is
    /// expiration.
    ///
    /// Equal dates keep their pooled order and are not deduplicated, so two
    /// copies of one date fill both roles.
    pub fn assign(dates: Vec<NormalizedDate>) -> Self {
        if dates.is_empty() {
            return DateRoles::NoValidDates;
        }

        let mut sorted = dates.clone();
        sorted.sort(); // stable

        DateRoles::Found {
            manufacturing_date: sorted[0],
            expiration_date: sorted.get(1).copied(),
            all_detected_dates: dates,
        }
    }

    pub fn manufacturing_date(&self) -> Option<NormalizedDate> {
        match self {
            DateRoles::Found { manufacturing_date, .. } => Some(*manufacturing_date),
            DateRoles::NoValidDates => None,
        }
    }

    pub fn expiration_date(&self) -> Option<NormalizedDate> {
        match self {
            DateRoles::Found { expiration_date, .. } => *expiration_date,
            DateRoles::NoValidDates => None,
        }
    }

    pub fn all_detected_dates(&self) -> &[NormalizedDate] {
        match self {
            DateRoles::Found { all_detected_dates, .. } => all_detected_dates,
            DateRoles::NoValidDates => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DateRoles::NoValidDates)
    }
}
