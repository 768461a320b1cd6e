//! Reference month of a CNES base.

use std::fmt;
use std::str::FromStr;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Placeholder replaced by [`render_template`].
pub const PERIOD_PLACEHOLDER: &str = "{period}";

/// A calendar month, written `YYYYMM`.
///
/// DATASUS publishes one base per month and names the archive after it,
/// e.g. `BASE_DE_DADOS_CNES_202304.ZIP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Period {
    year: i16,
    month: i8,
}

impl Period {
    /// Creates a period, rejecting months outside `1..=12` and years outside
    /// `1..=9999`.
    pub fn new(year: i16, month: i8) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::invalid_input().with_message(format!("month {month} is out of range")));
        }
        if !(1..=9999).contains(&year) {
            return Err(Error::invalid_input().with_message(format!("year {year} is out of range")));
        }
        Ok(Self { year, month })
    }

    /// Month that contains `date`.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Month before the one that contains `date`.
    pub fn previous_month(date: Date) -> Self {
        Self::of(date).previous()
    }

    /// Previous month relative to today in the system time zone.
    pub fn current_default() -> Self {
        Self::previous_month(jiff::Zoned::now().date())
    }

    /// The month before this one.
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Year component.
    pub fn year(self) -> i16 {
        self.year
    }

    /// Month component, `1..=12`.
    pub fn month(self) -> i8 {
        self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::invalid_input().with_message(format!(
                "period `{s}` must be six digits in YYYYMM form"
            )));
        }

        let year = s[..4].parse::<i16>().map_err(|e| {
            Error::invalid_input()
                .with_message(format!("period `{s}` has an invalid year"))
                .with_source(e)
        })?;
        let month = s[4..].parse::<i8>().map_err(|e| {
            Error::invalid_input()
                .with_message(format!("period `{s}` has an invalid month"))
                .with_source(e)
        })?;

        Self::new(year, month)
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

impl TryFrom<String> for Period {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Replaces every [`PERIOD_PLACEHOLDER`] in `template` with `period`.
pub fn render_template(template: &str, period: Period) -> String {
    template.replace(PERIOD_PLACEHOLDER, &period.to_string())
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn parses_and_displays() {
        let period: Period = "202304".parse().unwrap();
        assert_eq!(period.year(), 2023);
        assert_eq!(period.month(), 4);
        assert_eq!(period.to_string(), "202304");
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["2023-04", "20234", "202313", "202300", "abcdef", ""] {
            let err = input.parse::<Period>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "input {input:?}");
        }
    }

    #[test]
    fn previous_month_rolls_over_year() {
        assert_eq!(Period::previous_month(date(2024, 1, 15)).to_string(), "202312");
        assert_eq!(Period::previous_month(date(2023, 5, 1)).to_string(), "202304");
    }

    #[test]
    fn renders_every_placeholder() {
        let period = Period::new(2023, 4).unwrap();
        let url = render_template(
            "ftp://ftp.datasus.gov.br/cnes/BASE_DE_DADOS_CNES_{period}.ZIP",
            period,
        );
        assert_eq!(url, "ftp://ftp.datasus.gov.br/cnes/BASE_DE_DADOS_CNES_202304.ZIP");
        assert_eq!(render_template("{period}/{period}", period), "202304/202304");
    }
}
