use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::date::{expand_two_digit_year, month_abbr_to_num, NormalizedDate};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(
    re_dd_mon_yyyy_dash,
    r"\b([0-9]{2})-((?i:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec))-([0-9]{4})\b"
);
re!(re_dd_mm_yy_slash, r"\b([0-9]{2})/([0-9]{2})/([0-9]{2})\b");
re!(re_dd_mm_yyyy_slash, r"\b([0-9]{2})/([0-9]{2})/([0-9]{4})\b");
re!(
    re_dd_mon_yyyy_slash,
    r"\b([0-9]{2})/((?i:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec))/([0-9]{4})\b"
);
re!(re_mm_yyyy_slash, r"\b([0-9]{2})/([0-9]{4})\b");
re!(re_mon_yy_slash, r"\b((?i:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec))/([0-9]{2})\b");
re!(re_mm_yy_slash, r"\b([0-9]{2})/([0-9]{2})\b");
re!(re_dd_mm_yyyy_dash, r"\b([0-9]{2})-([0-9]{2})-([0-9]{4})\b");

/// One accepted source notation for a printed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateNotation {
    /// `15-JAN-2023`
    DayMonYearDash,
    /// `07/08/21`
    DayMonthShortYear,
    /// `15/06/2023`
    DayMonthYear,
    /// `15/JAN/2023`
    DayMonYearSlash,
    /// `12/2023`
    MonthYear,
    /// `JAN/24`
    MonShortYear,
    /// `03/24`. The first group is always read as the month, never the day.
    MonthShortYear,
    /// `15-06-2023`
    DayMonthYearDash,
}

impl DateNotation {
    /// Matchers in the order they are tried at a given text position.
    ///
    /// Reordering this list changes how ambiguous tokens are read: `DayMonthYear`
    /// must stay ahead of `MonthShortYear`, or `15/06/2023` gets consumed as the
    /// two-group `15/06`.
    pub const PRIORITY: [DateNotation; 8] = [
        DateNotation::DayMonYearDash,
        DateNotation::DayMonthShortYear,
        DateNotation::DayMonthYear,
        DateNotation::DayMonYearSlash,
        DateNotation::MonthYear,
        DateNotation::MonShortYear,
        DateNotation::MonthShortYear,
        DateNotation::DayMonthYearDash,
    ];

    pub fn pattern(self) -> &'static Regex {
        match self {
            DateNotation::DayMonYearDash => re_dd_mon_yyyy_dash(),
            DateNotation::DayMonthShortYear => re_dd_mm_yy_slash(),
            DateNotation::DayMonthYear => re_dd_mm_yyyy_slash(),
            DateNotation::DayMonYearSlash => re_dd_mon_yyyy_slash(),
            DateNotation::MonthYear => re_mm_yyyy_slash(),
            DateNotation::MonShortYear => re_mon_yy_slash(),
            DateNotation::MonthShortYear => re_mm_yy_slash(),
            DateNotation::DayMonthYearDash => re_dd_mm_yyyy_dash(),
        }
    }

    /// Human-readable shape, e.g. `DD-Mon-YYYY`.
    pub fn shape(self) -> &'static str {
        match self {
            DateNotation::DayMonYearDash => "DD-Mon-YYYY",
            DateNotation::DayMonthShortYear => "DD/MM/YY",
            DateNotation::DayMonthYear => "DD/MM/YYYY",
            DateNotation::DayMonYearSlash => "DD/Mon/YYYY",
            DateNotation::MonthYear => "MM/YYYY",
            DateNotation::MonShortYear => "Mon/YY",
            DateNotation::MonthShortYear => "MM/YY",
            DateNotation::DayMonthYearDash => "DD-MM-YYYY",
        }
    }

    /// Normalize a token previously matched by this notation.
    ///
    /// Returns `None` when the text does not have this notation's shape or the
    /// fields do not form a calendar date. Two-group notations default the day
    /// to the 1st.
    pub fn parse(self, token: &str) -> Option<NormalizedDate> {
        let c = self.pattern().captures(token)?;
        let (day, month, year) = match self {
            DateNotation::DayMonYearDash | DateNotation::DayMonYearSlash => {
                (num(&c, 1)?, month_abbr_to_num(c.get(2)?.as_str())?, num(&c, 3)? as i32)
            }
            DateNotation::DayMonthShortYear => {
                (num(&c, 1)?, num(&c, 2)?, expand_two_digit_year(num(&c, 3)?))
            }
            DateNotation::DayMonthYear | DateNotation::DayMonthYearDash => {
                (num(&c, 1)?, num(&c, 2)?, num(&c, 3)? as i32)
            }
            DateNotation::MonthYear => (1, num(&c, 1)?, num(&c, 2)? as i32),
            DateNotation::MonShortYear => {
                (1, month_abbr_to_num(c.get(1)?.as_str())?, expand_two_digit_year(num(&c, 2)?))
            }
            DateNotation::MonthShortYear => (1, num(&c, 1)?, expand_two_digit_year(num(&c, 2)?)),
        };
        NormalizedDate::from_dmy(day, month, year)
    }
}

impl fmt::Display for DateNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.shape())
    }
}

fn num(c: &Captures<'_>, group: usize) -> Option<u32> {
    c.get(group)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(n: DateNotation, token: &str) -> Option<String> {
        n.parse(token).map(|d| d.to_string())
    }

    #[test]
    fn each_notation_normalizes_to_canonical_form() {
        let cases = [
            (DateNotation::DayMonYearDash, "15-JAN-2023", "15/01/2023"),
            (DateNotation::DayMonthShortYear, "07/08/21", "07/08/2021"),
            (DateNotation::DayMonthYear, "15/06/2023", "15/06/2023"),
            (DateNotation::DayMonYearSlash, "01/Mar/2025", "01/03/2025"),
            (DateNotation::MonthYear, "12/2023", "01/12/2023"),
            (DateNotation::MonShortYear, "AUG/26", "01/08/2026"),
            (DateNotation::MonthShortYear, "03/24", "01/03/2024"),
            (DateNotation::DayMonthYearDash, "31-12-2024", "31/12/2024"),
        ];
        for (notation, token, expected) in cases {
            assert_eq!(
                parsed(notation, token).as_deref(),
                Some(expected),
                "{notation} on {token}"
            );
        }
    }

    #[test]
    fn month_abbreviation_is_case_insensitive() {
        assert_eq!(
            parsed(DateNotation::DayMonYearDash, "15-jul-2023").as_deref(),
            Some("15/07/2023")
        );
        assert_eq!(parsed(DateNotation::MonShortYear, "Sep/25").as_deref(), Some("01/09/2025"));
    }

    #[test]
    fn two_digit_first_group_is_month_not_day() {
        // "11/12" could be 11 December on a label; it is read as November 2012.
        assert_eq!(parsed(DateNotation::MonthShortYear, "11/12").as_deref(), Some("01/11/2012"));
    }

    #[test]
    fn invalid_calendar_values_yield_none() {
        assert_eq!(parsed(DateNotation::DayMonYearDash, "31-FEB-2023"), None);
        assert_eq!(parsed(DateNotation::MonthShortYear, "13/24"), None);
        assert_eq!(parsed(DateNotation::MonthYear, "00/2024"), None);
        assert_eq!(parsed(DateNotation::DayMonthYearDash, "32-01-2024"), None);
        assert_eq!(parsed(DateNotation::DayMonthYear, "01/01/0000"), None);
    }

    #[test]
    fn wrong_shape_yields_none() {
        assert_eq!(parsed(DateNotation::MonthYear, "15-JAN-2023"), None);
        assert_eq!(parsed(DateNotation::MonShortYear, "ABC/24"), None);
    }

    #[test]
    fn priority_order_is_fixed() {
        let shapes: Vec<_> = DateNotation::PRIORITY.iter().map(|n| n.shape()).collect();
        assert_eq!(
            shapes,
            [
                "DD-Mon-YYYY", "DD/MM/YY", "DD/MM/YYYY", "DD/Mon/YYYY",
                "MM/YYYY", "Mon/YY", "MM/YY", "DD-MM-YYYY",
            ]
        );
    }
}
