use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::Error;

/// Represents a service state from nagios.
///
/// The discriminants are the plugin exit codes. Comparisons between states do
/// NOT follow the discriminants: they follow the urgency of the state, where
/// `Critical > Unknown > Warning > Ok`. That way `max()` over some states
/// yields the worst one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "i32")]
pub enum ServiceState {
    Ok = 0,
    Warning = 1,
    Critical = 2,
    Unknown = 3,
}

impl ServiceState {
    pub const ALL: [ServiceState; 4] = [
        ServiceState::Ok,
        ServiceState::Warning,
        ServiceState::Critical,
        ServiceState::Unknown,
    ];

    /// Returns the corresponding nagios exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        *self as i32
    }

    /// The canonical upper case name, e.g. `WARNING`.
    pub fn name(&self) -> &'static str {
        match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        }
    }

    /// Maps an exit code to a state. Anything outside `0..=3` is `Unknown`.
    pub fn from_int(code: i64) -> ServiceState {
        ServiceState::try_from(code).unwrap_or(ServiceState::Unknown)
    }

    fn priority(&self) -> u8 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Unknown => 2,
            ServiceState::Critical => 3,
        }
    }
}

impl PartialOrd for ServiceState {
    fn partial_cmp(&self, other: &ServiceState) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServiceState {
    fn cmp(&self, other: &ServiceState) -> Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ServiceState> for i32 {
    fn from(state: ServiceState) -> i32 {
        state.exit_code()
    }
}

impl TryFrom<i64> for ServiceState {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ServiceState::Ok),
            1 => Ok(ServiceState::Warning),
            2 => Ok(ServiceState::Critical),
            3 => Ok(ServiceState::Unknown),
            other => Err(Error::InvalidState(other.to_string())),
        }
    }
}

/// Accepts the canonical names in any case as well as the exit codes `0` to `3`.
impl FromStr for ServiceState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return ServiceState::try_from(code);
        }

        ServiceState::ALL
            .into_iter()
            .find(|state| state.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidState(s.to_owned()))
    }
}

/// Determines the worst state from a list of states.
///
/// Order of preference: Critical, Unknown, Warning, Ok. An empty list has no
/// information and results in `Unknown`.
///
/// ```rust
/// # use checkplugin::{worst_state, ServiceState};
/// let states = [ServiceState::Unknown, ServiceState::Critical, ServiceState::Ok];
/// assert_eq!(worst_state(states), ServiceState::Critical);
/// assert_eq!(worst_state(std::iter::empty()), ServiceState::Unknown);
/// ```
pub fn worst_state<I>(states: I) -> ServiceState
where
    I: IntoIterator<Item = ServiceState>,
{
    states.into_iter().max().unwrap_or(ServiceState::Unknown)
}

/// Like [worst_state], but for raw exit codes. A single code outside `0..=3`
/// turns the whole result into `Unknown`.
pub fn worst_state_of_codes(codes: &[i64]) -> ServiceState {
    let states: Result<Vec<_>, _> = codes
        .iter()
        .map(|c| ServiceState::try_from(*c))
        .collect();

    match states {
        Ok(states) => worst_state(states),
        Err(_) => ServiceState::Unknown,
    }
}
