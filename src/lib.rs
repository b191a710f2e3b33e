//! The checkplugin crate provides the building blocks for writing nagios/icinga check plugins.
//!
//! A check collects its findings as [PartialResult]s, optionally nested, attached to a
//! single [Overall]. The overall result knows the final [ServiceState] and renders the
//! plugin output, including the performance data line.
//!
//! ```rust
//! # use checkplugin::{Overall, PartialResult, Perfdata, ServiceState, Threshold};
//! let warning = Threshold::upper(80.0);
//! let critical = Threshold::upper(90.0);
//!
//! let usage = Perfdata::new("usage", 85)
//!     .with_unit("%")
//!     .with_thresholds(warning, critical);
//!
//! let mut overall = Overall::new();
//! overall.add_subcheck(
//!     PartialResult::new("Disk usage is high")
//!         .with_state(usage.evaluate())
//!         .with_perfdata(usage),
//! );
//!
//! assert_eq!(overall.status(), ServiceState::Warning);
//! assert_eq!(
//!     overall.output(),
//!     "states: warning=1\n\\_ [WARNING] Disk usage is high\n|usage=85%;80;90\n"
//! );
//! ```

#[macro_use]
mod macros;

mod error;
mod exit;
mod mpi;
mod perfdata;
mod result;
mod runner;
mod state;
mod threshold;

pub use crate::error::{Error, Result};
pub use crate::exit::{ExitStrategy, ProcessExit, RecordedExit, Reporter};
pub use crate::perfdata::{format_label, PerfValue, Perfdata, PerfdataList, ToPerfString, Unit};
pub use crate::result::{Overall, PartialResult, MAX_DEPTH};
pub use crate::runner::{safe_run, Runner, RunnerResult};
pub use crate::state::{worst_state, worst_state_of_codes, ServiceState};
pub use crate::threshold::{boundary_to_string, format_float, Threshold};
