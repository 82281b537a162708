use std::borrow::Cow;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::date::NormalizedDate;
use crate::notation::DateNotation;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(
    re_fused_dd_mon_yyyy,
    r"([0-9]{2}-(?i:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)-[0-9]{4})([0-9]{2}-(?i:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)-[0-9]{4})"
);
re!(re_fused_dd_mm_yyyy, r"([0-9]{2}/[0-9]{2}/[0-9]{4})([0-9]{2}/[0-9]{2}/[0-9]{4})");

/// A date-shaped substring found in recognized text, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDateToken {
    pub text: String,
    /// Byte range within the repaired text.
    pub span: Range<usize>,
    pub notation: DateNotation,
}

impl RawDateToken {
    pub fn normalize(&self) -> Option<NormalizedDate> {
        self.notation.parse(&self.text)
    }
}

pub struct DateExtractor;

impl DateExtractor {
    /// Extract every normalizable date from one text blob, in discovery order.
    /// Tokens that do not form a calendar date are dropped.
    pub fn extract(text: &str) -> Vec<NormalizedDate> {
        Self::tokens(text)
            .into_iter()
            .filter_map(|token| {
                let date = token.normalize();
                if date.is_none() {
                    tracing::debug!(token = %token.text, notation = %token.notation, "dropping unparseable date token");
                }
                date
            })
            .collect()
    }

    /// Extract from several blobs and pool the results, blob order first.
    pub fn extract_all<I, S>(texts: I) -> Vec<NormalizedDate>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        texts
            .into_iter()
            .flat_map(|t| Self::extract(t.as_ref()))
            .collect()
    }

    /// Scan repaired text for non-overlapping date tokens.
    ///
    /// At every position the leftmost match wins; matchers starting at the
    /// same position are ranked by [`DateNotation::PRIORITY`].
    pub fn tokens(text: &str) -> Vec<RawDateToken> {
        let text = repair_fused_dates(text);
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < text.len() {
            let best = DateNotation::PRIORITY
                .iter()
                .filter_map(|&n| n.pattern().find_at(&text, pos).map(|m| (m.start(), m.end(), n)))
                // min_by_key keeps the first of equal starts, i.e. the higher-priority matcher
                .min_by_key(|&(start, _, _)| start);

            let Some((start, end, notation)) = best else {
                break;
            };
            tokens.push(RawDateToken {
                text: text[start..end].to_string(),
                span: start..end,
                notation,
            });
            pos = end;
        }

        tokens
    }
}

/// Split dates that recognition fused together without a separator, e.g.
/// `15-JAN-202315-JUL-2023` → `15-JAN-2023 15-JUL-2023`.
pub fn repair_fused_dates(text: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(text);
    for re in [re_fused_dd_mon_yyyy(), re_fused_dd_mm_yyyy()] {
        // A run of three or more fused dates needs more than one pass.
        while re.is_match(&out) {
            out = Cow::Owned(re.replace_all(&out, "$1 $2").into_owned());
        }
    }
    out
}
