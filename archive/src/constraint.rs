//! Query constraints in the archive's web-form syntax.
//!
//! The ALMA query forms accept short constraint strings: `"<0.1"` for an
//! upper limit, `">1000"` for a lower limit, `"1..2"` for a closed range and
//! a bare value for equality. Dates use `dd-mm-yyyy` and are compared against
//! MJD columns. Constraints parse from strings (so they work as clap
//! arguments), display back in the same syntax, and render ADQL.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Value that can appear in a [`Constraint`].
pub trait ConstraintValue: Copy + PartialOrd + FromStr + fmt::Display {
    /// Literal used in the ADQL comparison
    fn adql_literal(&self) -> String;
}

impl ConstraintValue for f64 {
    fn adql_literal(&self) -> String {
        format!("{self}")
    }
}

/// Calendar date written `dd-mm-yyyy`, compared as MJD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArchiveDate(pub NaiveDate);

impl ArchiveDate {
    const FORMAT: &'static str = "%d-%m-%Y";

    /// Modified Julian Date at 00:00 UTC.
    pub fn mjd(&self) -> f64 {
        let epoch = NaiveDate::from_ymd_opt(1858, 11, 17).unwrap_or(NaiveDate::MIN);
        (self.0 - epoch).num_days() as f64
    }
}

impl FromStr for ArchiveDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), Self::FORMAT)
            .map(ArchiveDate)
            .map_err(|e| format!("Invalid date '{s}' (expected dd-mm-yyyy): {e}"))
    }
}

impl fmt::Display for ArchiveDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl ConstraintValue for ArchiveDate {
    fn adql_literal(&self) -> String {
        format!("{:.1}", self.mjd())
    }
}

/// Comparison against a single column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint<T> {
    /// `"<v"`: column at most v
    AtMost(T),
    /// `">v"`: column at least v
    AtLeast(T),
    /// `"a..b"`: column within [a, b]
    Between(T, T),
    /// `"v"`: column equal to v
    Equal(T),
}

/// Constraint on a numeric column
pub type NumericConstraint = Constraint<f64>;

/// Constraint on a date column
pub type DateConstraint = Constraint<ArchiveDate>;

fn parse_value<T: ConstraintValue>(s: &str) -> Result<T, String> {
    let s = s.trim();
    s.parse::<T>()
        .map_err(|_| format!("Invalid constraint value '{s}'"))
}

impl<T: ConstraintValue> FromStr for Constraint<T> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Constraint cannot be empty".to_string());
        }

        if let Some(rest) = s.strip_prefix('<') {
            return Ok(Constraint::AtMost(parse_value(rest.trim_start_matches('='))?));
        }
        if let Some(rest) = s.strip_prefix('>') {
            return Ok(Constraint::AtLeast(parse_value(rest.trim_start_matches('='))?));
        }
        if let Some((low, high)) = s.split_once("..") {
            let low: T = parse_value(low)?;
            let high: T = parse_value(high)?;
            if low > high {
                return Err(format!("Range start {low} is after range end {high}"));
            }
            return Ok(Constraint::Between(low, high));
        }

        Ok(Constraint::Equal(parse_value(s)?))
    }
}

impl<T: ConstraintValue> fmt::Display for Constraint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::AtMost(v) => write!(f, "<{v}"),
            Constraint::AtLeast(v) => write!(f, ">{v}"),
            Constraint::Between(a, b) => write!(f, "{a}..{b}"),
            Constraint::Equal(v) => write!(f, "{v}"),
        }
    }
}

impl<T: ConstraintValue> Constraint<T> {
    /// ADQL condition on `column`.
    pub fn to_adql(&self, column: &str) -> String {
        match self {
            Constraint::AtMost(v) => format!("{column}<={}", v.adql_literal()),
            Constraint::AtLeast(v) => format!("{column}>={}", v.adql_literal()),
            Constraint::Between(a, b) => format!(
                "({column} BETWEEN {} AND {})",
                a.adql_literal(),
                b.adql_literal()
            ),
            Constraint::Equal(v) => format!("{column}={}", v.adql_literal()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric() {
        assert_eq!(
            "<0.1".parse::<NumericConstraint>(),
            Ok(Constraint::AtMost(0.1))
        );
        assert_eq!(
            ">1000".parse::<NumericConstraint>(),
            Ok(Constraint::AtLeast(1000.0))
        );
        assert_eq!(
            "0.5..1.5".parse::<NumericConstraint>(),
            Ok(Constraint::Between(0.5, 1.5))
        );
        assert_eq!(
            " 2 ".parse::<NumericConstraint>(),
            Ok(Constraint::Equal(2.0))
        );
        assert_eq!(
            "<=3".parse::<NumericConstraint>(),
            Ok(Constraint::AtMost(3.0))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<NumericConstraint>().is_err());
        assert!("<abc".parse::<NumericConstraint>().is_err());
        assert!("5..1".parse::<NumericConstraint>().is_err());
        assert!(">2015-01-01".parse::<DateConstraint>().is_err());
    }

    #[test]
    fn test_display_round_trips_syntax() {
        let c: NumericConstraint = "<0.1".parse().unwrap();
        assert_eq!(c.to_string(), "<0.1");
        let d: DateConstraint = ">01-01-2015".parse().unwrap();
        assert_eq!(d.to_string(), ">01-01-2015");
    }

    #[test]
    fn test_numeric_adql() {
        let c: NumericConstraint = "<2".parse().unwrap();
        assert_eq!(c.to_adql("pwv"), "pwv<=2");
        let c: NumericConstraint = "1..3".parse().unwrap();
        assert_eq!(c.to_adql("pwv"), "(pwv BETWEEN 1 AND 3)");
    }

    #[test]
    fn test_date_to_mjd() {
        let date: ArchiveDate = "01-01-2015".parse().unwrap();
        assert_eq!(date.mjd(), 57023.0);
        let epoch: ArchiveDate = "17-11-1858".parse().unwrap();
        assert_eq!(epoch.mjd(), 0.0);
    }

    #[test]
    fn test_date_adql() {
        let d: DateConstraint = ">01-01-2015".parse().unwrap();
        assert_eq!(d.to_adql("t_min"), "t_min>=57023.0");
    }
}
