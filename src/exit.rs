use std::io::{self, Stdout, Write};

use crate::{Error, Overall, ServiceState};

/// Decides what happens once a plugin has printed its result.
///
/// Production plugins use [ProcessExit]; tests inject [RecordedExit] or a closure.
pub trait ExitStrategy {
    fn exit(&mut self, code: i32);
}

/// Terminates the process with the given exit code.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessExit;

impl ExitStrategy for ProcessExit {
    fn exit(&mut self, code: i32) {
        std::process::exit(code)
    }
}

/// Remembers the exit code instead of exiting.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordedExit {
    code: Option<i32>,
}

impl RecordedExit {
    pub fn code(&self) -> Option<i32> {
        self.code
    }
}

impl ExitStrategy for RecordedExit {
    fn exit(&mut self, code: i32) {
        self.code = Some(code);
    }
}

impl<F> ExitStrategy for F
where
    F: FnMut(i32),
{
    fn exit(&mut self, code: i32) {
        self(code)
    }
}

/// Prints the final plugin output and exits with the matching code.
///
/// ```rust
/// # use checkplugin::{RecordedExit, Reporter, ServiceState};
/// let mut reporter = Reporter::new(Vec::new(), RecordedExit::default());
/// reporter.exit_raw(ServiceState::Warning, "disk almost full").unwrap();
///
/// let (out, exit) = reporter.into_parts();
/// assert_eq!(String::from_utf8(out).unwrap(), "[WARNING] - disk almost full\n");
/// assert_eq!(exit.code(), Some(1));
/// ```
pub struct Reporter<W, X> {
    out: W,
    exit: X,
}

impl Reporter<Stdout, ProcessExit> {
    pub fn stdout() -> Self {
        Reporter::new(io::stdout(), ProcessExit)
    }
}

impl<W, X> Reporter<W, X>
where
    W: Write,
    X: ExitStrategy,
{
    pub fn new(out: W, exit: X) -> Self {
        Reporter { out, exit }
    }

    /// Prints `[<STATE>] - <text>` and exits with the code of the state.
    pub fn exit_raw(&mut self, state: ServiceState, text: &str) -> Result<(), Error> {
        writeln!(self.out, "[{state}] - {text}")?;
        self.out.flush()?;

        self.exit.exit(state.exit_code());
        Ok(())
    }

    /// Prints the multi line output of the overall result and exits with its state.
    pub fn exit_overall(&mut self, overall: &Overall) -> Result<(), Error> {
        let output = overall.output();
        self.exit_raw(overall.status(), output.trim_end_matches('\n'))
    }

    /// Reports an error that prevented the check from running as `Unknown`.
    pub fn exit_error(&mut self, err: &dyn std::error::Error) -> Result<(), Error> {
        self.exit_raw(ServiceState::Unknown, &err.to_string())
    }

    pub fn into_parts(self) -> (W, X) {
        (self.out, self.exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PartialResult, Perfdata};

    fn recording() -> Reporter<Vec<u8>, RecordedExit> {
        Reporter::new(Vec::new(), RecordedExit::default())
    }

    fn finish(reporter: Reporter<Vec<u8>, RecordedExit>) -> (String, Option<i32>) {
        let (out, exit) = reporter.into_parts();
        (String::from_utf8(out).unwrap(), exit.code())
    }

    #[test]
    fn test_exit_raw() {
        for state in ServiceState::ALL {
            let mut reporter = recording();
            reporter.exit_raw(state, "everything is fine").unwrap();

            let (out, code) = finish(reporter);
            assert_eq!(out, format!("[{state}] - everything is fine\n"));
            assert_eq!(code, Some(state.exit_code()));
        }
    }

    #[test]
    fn test_exit_overall() {
        let mut overall = Overall::new();
        overall.add_subcheck(
            PartialResult::new("Check1")
                .with_state(ServiceState::Critical)
                .with_perfdata(Perfdata::new("foo", 23)),
        );

        let mut reporter = recording();
        reporter.exit_overall(&overall).unwrap();

        let (out, code) = finish(reporter);
        assert_eq!(
            out,
            "[CRITICAL] - states: critical=1\n\\_ [CRITICAL] Check1\n|foo=23\n"
        );
        assert_eq!(code, Some(2));
    }

    #[test]
    fn test_exit_error() {
        let err = crate::Threshold::parse("nope").unwrap_err();

        let mut reporter = recording();
        reporter.exit_error(&err).unwrap();

        let (out, code) = finish(reporter);
        assert!(out.starts_with("[UNKNOWN] - could not parse threshold 'nope'"));
        assert_eq!(code, Some(3));
    }

    #[test]
    fn test_closure_exit_strategy() {
        let mut codes = Vec::new();
        {
            let mut reporter = Reporter::new(io::sink(), |code: i32| codes.push(code));
            reporter.exit_raw(ServiceState::Ok, "a").unwrap();
            reporter.exit_raw(ServiceState::Warning, "b").unwrap();
        }
        assert_eq!(codes, vec![0, 1]);
    }
}
