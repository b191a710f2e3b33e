use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::Error;

const NUMBER_PATTERN: &str = r"-?\d+(?:\.\d+)?|~";

static THRESHOLD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(@)?(?:({NUMBER_PATTERN}):)?({NUMBER_PATTERN})?$"))
        .expect("valid threshold regex")
});

/// An alert range for a numeric value.
///
/// Format: `[@]start:end`
///
/// | Threshold | Generate an alert if x...                  |
/// |-----------|--------------------------------------------|
/// | `10`      | < 0 or > 10, (outside the range of {0 .. 10}) |
/// | `10:`     | < 10, (outside {10 .. ∞})                  |
/// | `~:10`    | > 10, (outside the range of {-∞ .. 10})    |
/// | `10:20`   | < 10 or > 20, (outside the range of {10 .. 20}) |
/// | `@10:20`  | ≥ 10 and ≤ 20, (inside the range of {10 .. 20}) |
///
/// ```rust
/// # use checkplugin::Threshold;
/// let threshold: Threshold = "@10:20".parse().unwrap();
/// assert!(threshold.does_violate(15.0));
/// assert!(!threshold.does_violate(21.0));
/// assert_eq!(threshold.to_string(), "@10:20");
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Threshold {
    lower: f64,
    upper: f64,
    inside: bool,
}

impl Threshold {
    pub fn new(lower: f64, upper: f64, inside: bool) -> Self {
        Threshold {
            lower,
            upper,
            inside,
        }
    }

    /// Alert if the value leaves `0..=upper`.
    pub fn upper(upper: f64) -> Self {
        Threshold::new(0.0, upper, false)
    }

    /// Alert if the value leaves `lower..=upper`.
    pub fn range(lower: f64, upper: f64) -> Self {
        Threshold::new(lower, upper, false)
    }

    /// Returns the same range with the alert condition flipped between
    /// "outside" and "inside".
    pub fn inverted(self) -> Self {
        Threshold {
            inside: !self.inside,
            ..self
        }
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// Parses a threshold from its `[@]start:end` notation.
    pub fn parse(spec: &str) -> Result<Threshold, Error> {
        let invalid = |reason: &str| Error::InvalidThreshold {
            spec: spec.to_owned(),
            reason: reason.to_owned(),
        };

        let caps = THRESHOLD_RE
            .captures(spec)
            .ok_or_else(|| invalid("does not match [@]start:end"))?;

        let inside = caps.get(1).is_some();
        let lower = caps.get(2).map(|m| m.as_str());
        let upper = caps.get(3).map(|m| m.as_str());

        if lower.is_none() && upper.is_none() {
            return Err(invalid("no boundaries given"));
        }

        let parse_bound = |name: &str, s: &str| -> Result<f64, Error> {
            let value = s
                .parse::<f64>()
                .map_err(|e| invalid(&format!("can not parse {name} bound '{s}': {e}")))?;

            // too large for f64, parse() rounds these to infinity
            if !value.is_finite() {
                return Err(invalid(&format!("{name} bound '{s}' out of range")));
            }
            Ok(value)
        };

        let lower = match lower {
            None => 0.0,
            Some("~") => f64::NEG_INFINITY,
            Some(s) => parse_bound("lower", s)?,
        };

        let upper = match upper {
            None | Some("~") => f64::INFINITY,
            Some(s) => parse_bound("upper", s)?,
        };

        Ok(Threshold::new(lower, upper, inside))
    }

    /// Compares a value against the threshold, and returns true if the value violates it.
    pub fn does_violate(&self, value: f64) -> bool {
        if self.inside {
            value >= self.lower && value <= self.upper
        } else {
            value < self.lower || value > self.upper
        }
    }
}

impl FromStr for Threshold {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Threshold::parse(s)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inside {
            f.write_str("@")?;
        }

        // +inf is the default upper bound and left out
        let upper = if self.upper == f64::INFINITY {
            String::new()
        } else {
            boundary_to_string(self.upper)
        };

        if self.lower != 0.0 || upper.is_empty() {
            write!(f, "{}:", boundary_to_string(self.lower))?;
        }

        f.write_str(&upper)
    }
}

/// Returns the string representation of a threshold boundary.
///
/// The sign of an infinite boundary follows from its position, so both
/// infinities are written as `~`.
pub fn boundary_to_string(value: f64) -> String {
    if value.is_infinite() {
        "~".to_owned()
    } else {
        value.to_string()
    }
}

/// Formats a float with at most 3 decimals, without scientific notation and
/// without trailing zeros.
///
/// ```rust
/// # use checkplugin::format_float;
/// assert_eq!(format_float(10.1), "10.1");
/// assert_eq!(format_float(1234567890.9877), "1234567890.988");
/// assert_eq!(format_float(100.0), "100");
/// ```
pub fn format_float(value: f64) -> String {
    let s = format!("{value:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_owned()
}
