use std::fmt;

use tracing::warn;

use crate::threshold::format_float;
use crate::{Error, ServiceState, Threshold};

/// The purpose of ToPerfString is only so one can define the perfdata
/// representation of a type without using the ToString trait so we don't
/// interfere with that.
///
/// Used internally for the single `;` separated fields of a perfdata token.
pub trait ToPerfString {
    fn to_perf_string(&self) -> String;
}

impl<T> ToPerfString for Option<T>
where
    T: ToPerfString,
{
    fn to_perf_string(&self) -> String {
        match self {
            Some(ref s) => s.to_perf_string(),
            None => String::new(),
        }
    }
}

impl ToPerfString for Threshold {
    fn to_perf_string(&self) -> String {
        self.to_string()
    }
}

/// A numeric perfdata value.
///
/// Integers keep their kind so they are printed without any decimals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PerfValue {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl_perf_value_from!(Int as i64: i8, i16, i32, i64, isize);
impl_perf_value_from!(Uint as u64: u8, u16, u32, u64, usize);
impl_perf_value_from!(Float as f64: f32, f64);

impl PerfValue {
    /// Returns the perfdata text of the value, or `None` for NaN and infinite floats.
    pub fn format(&self) -> Option<String> {
        match *self {
            PerfValue::Int(v) => Some(v.to_string()),
            PerfValue::Uint(v) => Some(v.to_string()),
            PerfValue::Float(v) if v.is_finite() => Some(format_float(v)),
            PerfValue::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            PerfValue::Int(v) => v as f64,
            PerfValue::Uint(v) => v as f64,
            PerfValue::Float(v) => v,
        }
    }
}

/// Faulty limits are left empty instead of invalidating the whole point.
impl ToPerfString for PerfValue {
    fn to_perf_string(&self) -> String {
        self.format().unwrap_or_default()
    }
}

/// Unit of measurement of a perfdata value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Unit {
    #[default]
    None,
    Seconds,
    Milliseconds,
    Microseconds,
    Percentage,
    Bytes,
    KiloBytes,
    MegaBytes,
    GigaBytes,
    TeraBytes,
    Counter,
    Other(String),
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unit::None => "",
            Unit::Seconds => "s",
            Unit::Milliseconds => "ms",
            Unit::Microseconds => "us",
            Unit::Percentage => "%",
            Unit::Bytes => "B",
            Unit::KiloBytes => "KB",
            Unit::MegaBytes => "MB",
            Unit::GigaBytes => "GB",
            Unit::TeraBytes => "TB",
            Unit::Counter => "c",
            Unit::Other(s) => s,
        };
        f.write_str(s)
    }
}

impl From<&str> for Unit {
    fn from(s: &str) -> Self {
        match s {
            "" => Unit::None,
            "s" => Unit::Seconds,
            "ms" => Unit::Milliseconds,
            "us" => Unit::Microseconds,
            "%" => Unit::Percentage,
            "B" => Unit::Bytes,
            "KB" => Unit::KiloBytes,
            "MB" => Unit::MegaBytes,
            "GB" => Unit::GigaBytes,
            "TB" => Unit::TeraBytes,
            "c" => Unit::Counter,
            other => Unit::Other(other.to_owned()),
        }
    }
}

/// Returns a perfdata label with `=`, `'`, `"` and backticks replaced by `_`,
/// quoted if it contains whitespace.
pub fn format_label(label: &str) -> String {
    let label: String = label
        .chars()
        .map(|c| match c {
            '=' | '\'' | '"' | '`' => '_',
            c => c,
        })
        .collect();

    if label.contains([' ', '\t', '\n', '\r', '\x0c']) {
        format!("'{label}'")
    } else {
        label
    }
}

/// A single performance data point: `label=value[unit][;warn[;crit[;min[;max]]]]`.
///
/// ```rust
/// # use checkplugin::{Perfdata, Threshold, Unit};
/// let perfdata = Perfdata::new("test", 10.1)
///     .with_unit(Unit::Percentage)
///     .with_thresholds(Threshold::upper(80.0), Threshold::upper(90.0))
///     .with_min(0)
///     .with_max(100);
/// assert_eq!(perfdata.to_string(), "test=10.1%;80;90;0;100");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Perfdata {
    label: String,
    value: PerfValue,
    unit: Unit,
    warning: Option<Threshold>,
    critical: Option<Threshold>,
    min: Option<PerfValue>,
    max: Option<PerfValue>,
}

impl Perfdata {
    pub fn new(label: &str, value: impl Into<PerfValue>) -> Self {
        Perfdata {
            label: label.to_owned(),
            value: value.into(),
            unit: Unit::None,
            warning: None,
            critical: None,
            min: None,
            max: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<Unit>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_warning(mut self, warning: Threshold) -> Self {
        self.warning = Some(warning);
        self
    }

    pub fn with_critical(mut self, critical: Threshold) -> Self {
        self.critical = Some(critical);
        self
    }

    pub fn with_thresholds(
        self,
        warning: impl Into<Option<Threshold>>,
        critical: impl Into<Option<Threshold>>,
    ) -> Self {
        Perfdata {
            warning: warning.into(),
            critical: critical.into(),
            ..self
        }
    }

    pub fn with_min(mut self, min: impl Into<PerfValue>) -> Self {
        self.min = Some(min.into());
        self
    }

    pub fn with_max(mut self, max: impl Into<PerfValue>) -> Self {
        self.max = Some(max.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> PerfValue {
        self.value
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn warning(&self) -> Option<&Threshold> {
        self.warning.as_ref()
    }

    pub fn critical(&self) -> Option<&Threshold> {
        self.critical.as_ref()
    }

    pub fn min(&self) -> Option<PerfValue> {
        self.min
    }

    pub fn max(&self) -> Option<PerfValue> {
        self.max
    }

    /// Determines the state of the value against the critical and warning
    /// thresholds, critical first. A value that is not a finite number is `Unknown`.
    pub fn evaluate(&self) -> ServiceState {
        let value = self.value.as_f64();
        if !value.is_finite() {
            return ServiceState::Unknown;
        }

        if self.critical.is_some_and(|c| c.does_violate(value)) {
            ServiceState::Critical
        } else if self.warning.is_some_and(|w| w.does_violate(value)) {
            ServiceState::Warning
        } else {
            ServiceState::Ok
        }
    }

    /// Returns the perfdata token, or an error if the point can't be represented.
    pub fn validated_string(&self) -> Result<String, Error> {
        if self.label.is_empty() {
            return Err(Error::EmptyLabel);
        }

        let value = self
            .value
            .format()
            .ok_or_else(|| Error::UnrepresentableValue {
                label: self.label.clone(),
                value: self.value.as_f64(),
            })?;

        // ';' separates the fields and whitespace the tokens
        let unit: String = self
            .unit
            .to_string()
            .chars()
            .map(|c| if c == ';' || c.is_whitespace() { '_' } else { c })
            .collect();
        let head = format!("{}={}{}", format_label(&self.label), value, unit);

        Ok(perf_fields!(
            head,
            self.warning,
            self.critical,
            self.min,
            self.max
        ))
    }
}

/// Renders the token, or nothing at all if the point is invalid.
impl fmt::Display for Perfdata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.validated_string().unwrap_or_default())
    }
}

/// An ordered list of perfdata points.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerfdataList(Vec<Perfdata>);

impl PerfdataList {
    pub fn new() -> Self {
        PerfdataList(Vec::new())
    }

    pub fn push(&mut self, perfdata: Perfdata) {
        self.0.push(perfdata)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Perfdata> {
        self.0.iter()
    }

    /// Renders every point, skipping (and logging) the ones that can't be represented.
    pub fn tokens(&self) -> Vec<String> {
        self.0
            .iter()
            .filter_map(|p| match p.validated_string() {
                Ok(token) => Some(token),
                Err(err) => {
                    warn!(label = %p.label, error = %err, "dropping perfdata point");
                    None
                }
            })
            .collect()
    }
}

impl fmt::Display for PerfdataList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join(" "))
    }
}

impl FromIterator<Perfdata> for PerfdataList {
    fn from_iter<I: IntoIterator<Item = Perfdata>>(iter: I) -> Self {
        PerfdataList(iter.into_iter().collect())
    }
}

impl Extend<Perfdata> for PerfdataList {
    fn extend<I: IntoIterator<Item = Perfdata>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl IntoIterator for PerfdataList {
    type Item = Perfdata;
    type IntoIter = std::vec::IntoIter<Perfdata>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PerfdataList {
    type Item = &'a Perfdata;
    type IntoIter = std::slice::Iter<'a, Perfdata>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfdata() {
        let perfdata = Perfdata::new("test", 10.1)
            .with_unit("%")
            .with_warning(Threshold::upper(80.0))
            .with_critical(Threshold::upper(90.0))
            .with_min(0)
            .with_max(100);

        assert_eq!(&perfdata.to_string(), "test=10.1%;80;90;0;100");
    }

    #[test]
    fn test_perfdata_trailing_fields() {
        assert_eq!(&Perfdata::new("test", 23).to_string(), "test=23");
        assert_eq!(
            &Perfdata::new("test", 12).with_warning(Threshold::upper(14.0)).with_min(0).to_string(),
            "test=12;14;;0"
        );
        assert_eq!(
            &Perfdata::new("test", 12).with_max(50).to_string(),
            "test=12;;;;50"
        );
        assert_eq!(
            &Perfdata::new("load", 0.5)
                .with_warning(Threshold::parse("@1:2").unwrap())
                .to_string(),
            "load=0.5;@1:2"
        );
    }

    #[test]
    fn test_perfdata_value_kinds() {
        assert_eq!(&Perfdata::new("a", -10).to_string(), "a=-10");
        assert_eq!(&Perfdata::new("a", u64::MAX).to_string(), "a=18446744073709551615");
        assert_eq!(&Perfdata::new("a", 10.0).to_string(), "a=10");
        assert_eq!(&Perfdata::new("a", 1234.5678f64).to_string(), "a=1234.568");
        assert_eq!(&Perfdata::new("a", 7u8).to_string(), "a=7");
    }

    #[test]
    fn test_perfdata_units() {
        let perfdata = Perfdata::new("foo", 12).with_unit(Unit::Microseconds);
        assert_eq!(&perfdata.to_string(), "foo=12us");

        let perfdata = perfdata.with_unit(Unit::Other("bar".to_owned()));
        assert_eq!(&perfdata.to_string(), "foo=12bar");

        let perfdata = Perfdata::new("foo", 12)
            .with_unit("a;b;")
            .with_warning(Threshold::upper(80.0));
        assert_eq!(&perfdata.to_string(), "foo=12a_b_;80");

        let perfdata = Perfdata::new("foo", 12).with_unit(Unit::Other("per sec".to_owned()));
        assert_eq!(&perfdata.to_string(), "foo=12per_sec");

        assert_eq!(Unit::from("MB"), Unit::MegaBytes);
        assert_eq!(Unit::from("km"), Unit::Other("km".to_owned()));
    }

    #[test]
    fn test_format_label() {
        let test_data = [
            ("test", "test"),
            ("test=a", "test_a"),
            ("te'st", "te_st"),
            ("te\"st`", "te_st_"),
            ("te st", "'te st'"),
            ("te\tst", "'te\tst'"),
            ("te st=", "'te st_'"),
        ];
        for (label, expected) in test_data {
            assert_eq!(format_label(label), expected);
        }
    }

    #[test]
    fn test_unrepresentable_values() {
        let perfdata = Perfdata::new("inf", f64::INFINITY);
        assert!(matches!(
            perfdata.validated_string(),
            Err(Error::UnrepresentableValue { .. })
        ));
        assert_eq!(&perfdata.to_string(), "");

        let perfdata = Perfdata::new("nan", f64::NAN);
        assert!(perfdata.validated_string().is_err());

        let perfdata = Perfdata::new("", 1);
        assert!(matches!(perfdata.validated_string(), Err(Error::EmptyLabel)));
    }

    #[test]
    fn test_faulty_limits_are_left_empty() {
        let perfdata = Perfdata::new("x", 1).with_min(0).with_max(f64::INFINITY);
        assert_eq!(perfdata.validated_string().unwrap(), "x=1;;;0");

        let perfdata = Perfdata::new("x", 1).with_min(f64::NAN);
        assert_eq!(perfdata.validated_string().unwrap(), "x=1");
    }

    #[test]
    fn test_evaluate() {
        let perfdata = |value: f64| {
            Perfdata::new("used", value)
                .with_thresholds(Threshold::upper(80.0), Threshold::upper(90.0))
        };
        assert_eq!(perfdata(10.0).evaluate(), ServiceState::Ok);
        assert_eq!(perfdata(80.0).evaluate(), ServiceState::Ok);
        assert_eq!(perfdata(85.0).evaluate(), ServiceState::Warning);
        assert_eq!(perfdata(95.0).evaluate(), ServiceState::Critical);
        assert_eq!(perfdata(-1.0).evaluate(), ServiceState::Critical);
        assert_eq!(perfdata(f64::NAN).evaluate(), ServiceState::Unknown);
        assert_eq!(Perfdata::new("free", 3).evaluate(), ServiceState::Ok);
    }

    #[test]
    fn test_perfdata_list() {
        let mut list = PerfdataList::new();
        list.push(Perfdata::new("test1", 23));
        list.push(Perfdata::new("broken", f64::NAN));
        list.push(Perfdata::new("test2", 42));

        assert_eq!(list.len(), 3);
        assert_eq!(list.tokens(), vec!["test1=23", "test2=42"]);
        assert_eq!(&list.to_string(), "test1=23 test2=42");
        assert_eq!(&PerfdataList::new().to_string(), "");
    }
}
