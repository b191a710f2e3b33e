use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt::Display;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use crate::{Error, ExitStrategy, Overall, Reporter, ServiceState};

thread_local! {
    static PANIC_STACK: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Runs a check and turns its outcome into something that can be reported,
/// no matter if it succeeded, failed or panicked.
///
/// ```rust
/// # use checkplugin::{Overall, RecordedExit, Reporter, Runner, ServiceState};
/// let result = Runner::<std::io::Error>::new()
///     .on_error(|_| ServiceState::Unknown)
///     .safe_run(|| Err(std::io::Error::other("connection refused")));
/// assert_eq!(result.state(), ServiceState::Unknown);
///
/// let mut reporter = Reporter::new(Vec::new(), RecordedExit::default());
/// result.report(&mut reporter).unwrap();
/// ```
pub struct Runner<E> {
    on_error: Option<Box<dyn FnOnce(&E) -> ServiceState>>,
    panic_state: ServiceState,
    with_stack: bool,
}

impl<E: Display> Runner<E> {
    pub fn new() -> Self {
        Self {
            on_error: None,
            panic_state: ServiceState::Unknown,
            with_stack: false,
        }
    }

    /// Chooses the state to report for an error returned by the check. Errors
    /// are reported as `Critical` otherwise.
    pub fn on_error(mut self, f: impl FnOnce(&E) -> ServiceState + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// The state to report if the check panics, `Unknown` by default.
    pub fn on_panic_state(mut self, state: ServiceState) -> Self {
        self.panic_state = state;
        self
    }

    /// Appends the stack trace of a panic to the reported message.
    ///
    /// The panic hook is replaced while the check runs, so the default hook
    /// does not print to stderr during that time.
    pub fn with_stack(mut self, with_stack: bool) -> Self {
        self.with_stack = with_stack;
        self
    }

    pub fn safe_run(self, f: impl FnOnce() -> Result<Overall, E>) -> RunnerResult<E> {
        let outcome = if self.with_stack {
            PANIC_STACK.with(|stack| *stack.borrow_mut() = None);

            let previous_hook = panic::take_hook();
            panic::set_hook(Box::new(|_| {
                let trace = Backtrace::force_capture().to_string();
                PANIC_STACK.with(|stack| *stack.borrow_mut() = Some(trace));
            }));
            let outcome = panic::catch_unwind(AssertUnwindSafe(f));
            panic::set_hook(previous_hook);
            outcome
        } else {
            panic::catch_unwind(AssertUnwindSafe(f))
        };

        match outcome {
            Ok(Ok(overall)) => RunnerResult::Ok(overall),
            Ok(Err(err)) => {
                let state = self
                    .on_error
                    .map(|f| f(&err))
                    .unwrap_or(ServiceState::Critical);

                debug!(%state, error = %err, "check returned an error");
                RunnerResult::Err(state, err)
            }
            Err(payload) => {
                let mut msg = panic_message(payload.as_ref());
                if self.with_stack {
                    if let Some(trace) = PANIC_STACK.with(|stack| stack.borrow_mut().take()) {
                        msg = format!("{msg}\n\n{trace}");
                    }
                }
                debug!(state = %self.panic_state, panic = %msg, "check panicked");
                RunnerResult::Panic(self.panic_state, msg)
            }
        }
    }
}

impl<E: Display> Default for Runner<E> {
    fn default() -> Self {
        Runner::new()
    }
}

/// Runs the given closure and reports errors with the given state.
pub fn safe_run<E: Display>(
    f: impl FnOnce() -> Result<Overall, E>,
    error_state: ServiceState,
) -> RunnerResult<E> {
    Runner::new().on_error(move |_| error_state).safe_run(f)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("check panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("check panicked: {s}")
    } else {
        "check panicked".to_owned()
    }
}

pub enum RunnerResult<E> {
    Ok(Overall),
    Err(ServiceState, E),
    Panic(ServiceState, String),
}

impl<E: Display> RunnerResult<E> {
    /// The state the plugin is going to exit with.
    pub fn state(&self) -> ServiceState {
        match self {
            RunnerResult::Ok(overall) => overall.status(),
            RunnerResult::Err(state, _) | RunnerResult::Panic(state, _) => *state,
        }
    }

    pub fn report<W, X>(self, reporter: &mut Reporter<W, X>) -> Result<(), Error>
    where
        W: Write,
        X: ExitStrategy,
    {
        match self {
            RunnerResult::Ok(overall) => reporter.exit_overall(&overall),
            RunnerResult::Err(state, err) => reporter.exit_raw(state, &err.to_string()),
            RunnerResult::Panic(state, msg) => reporter.exit_raw(state, &msg),
        }
    }

    pub fn print_and_exit(self) -> ! {
        if let Err(err) = self.report(&mut Reporter::stdout()) {
            eprintln!("could not write plugin output: {err}");
        }
        std::process::exit(ServiceState::Unknown.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PartialResult, RecordedExit};

    #[derive(Debug, thiserror::Error)]
    #[error("woops")]
    struct EmptyError;

    fn run_and_report<E: Display>(result: RunnerResult<E>) -> (String, Option<i32>) {
        let mut reporter = Reporter::new(Vec::new(), RecordedExit::default());
        result.report(&mut reporter).unwrap();

        let (out, exit) = reporter.into_parts();
        (String::from_utf8(out).unwrap(), exit.code())
    }

    #[test]
    fn test_runner_ok() {
        let result = Runner::<EmptyError>::new()
            .on_error(|_| panic!("on_error must not be called"))
            .safe_run(|| {
                let mut overall = Overall::new();
                overall.add_subcheck(PartialResult::new("test").with_state(ServiceState::Ok));
                Ok(overall)
            });

        assert!(matches!(result, RunnerResult::Ok(_)));
        assert_eq!(result.state(), ServiceState::Ok);
        assert_eq!(
            run_and_report(result),
            ("[OK] - states: ok=1\n\\_ [OK] test\n".to_owned(), Some(0))
        );
    }

    #[test]
    fn test_runner_error() {
        let result = Runner::new()
            .on_error(|_: &EmptyError| ServiceState::Unknown)
            .safe_run(|| Err(EmptyError {}));

        assert!(matches!(result, RunnerResult::Err(ServiceState::Unknown, _)));
        assert_eq!(
            run_and_report(result),
            ("[UNKNOWN] - woops\n".to_owned(), Some(3))
        );
    }

    #[test]
    fn test_runner_error_defaults_to_critical() {
        let result = Runner::new().safe_run(|| Err::<Overall, _>(EmptyError {}));
        assert_eq!(result.state(), ServiceState::Critical);
    }

    #[test]
    fn test_safe_run() {
        let result = safe_run(|| Err::<Overall, _>(EmptyError {}), ServiceState::Warning);
        assert_eq!(result.state(), ServiceState::Warning);
    }

    #[test]
    fn test_runner_panic() {
        let result = Runner::<EmptyError>::new().safe_run(|| panic!("boom"));

        assert_eq!(result.state(), ServiceState::Unknown);
        assert_eq!(
            run_and_report(result),
            ("[UNKNOWN] - check panicked: boom\n".to_owned(), Some(3))
        );

        let result = Runner::<EmptyError>::new()
            .on_panic_state(ServiceState::Critical)
            .safe_run(|| panic!("{} went wrong", "something"));
        assert!(matches!(
            result,
            RunnerResult::Panic(ServiceState::Critical, ref msg) if msg == "check panicked: something went wrong"
        ));
    }

    #[test]
    fn test_runner_panic_with_stack() {
        let result = Runner::<EmptyError>::new()
            .with_stack(true)
            .safe_run(|| panic!("boom"));

        let RunnerResult::Panic(state, msg) = result else {
            panic!("expected a panic result");
        };
        assert_eq!(state, ServiceState::Unknown);
        assert!(msg.starts_with("check panicked: boom\n\n"), "{msg}");
        assert!(msg.len() > "check panicked: boom\n\n".len());

        let result = Runner::<EmptyError>::new()
            .with_stack(false)
            .safe_run(|| panic!("boom"));
        assert!(matches!(
            result,
            RunnerResult::Panic(_, ref msg) if msg == "check panicked: boom"
        ));
    }
}
