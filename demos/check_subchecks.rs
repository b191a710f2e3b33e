use checkplugin::{Overall, PartialResult, Perfdata, Reporter, ServiceState};

// Usage: cargo run --example check_subchecks

fn main() {
    let mut reporter = Reporter::stdout();

    let mut check1 = PartialResult::new("Check1");
    if let Err(err) = check1.set_state_code(0) {
        let _ = reporter.exit_error(&err);
        return;
    }
    check1.add_perfdata(Perfdata::new("foo", 23u64));

    let check2 = PartialResult::new("Check2")
        .with_state(ServiceState::Warning)
        .with_perfdata(Perfdata::new("bar", 42u64))
        .with_perfdata(Perfdata::new("foo2 bar", 46u64));

    let mut overall = Overall::new();
    overall.add_subcheck(check1);
    overall.add_subcheck(check2);

    // [WARNING] - states: warning=1 ok=1
    // \_ [OK] Check1
    // \_ [WARNING] Check2
    // |foo=23 bar=42 'foo2 bar'=46
    if let Err(err) = reporter.exit_overall(&overall) {
        eprintln!("could not write plugin output: {err}");
        std::process::exit(ServiceState::Unknown.exit_code());
    }
}
