use clap::Parser;
use tracing_subscriber::EnvFilter;

use checkplugin::{Overall, PartialResult, Perfdata, Runner, Threshold, Unit};

// Usage: cargo run --example check_example -- --value 85 --warning 80 --critical 90

#[derive(Parser)]
struct Cli {
    /// The measured value to check
    #[clap(long)]
    value: f64,
    /// Warning threshold, e.g. "80" or "@10:20"
    #[clap(long, default_value = "80")]
    warning: Threshold,
    /// Critical threshold
    #[clap(long, default_value = "90")]
    critical: Threshold,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    Runner::new().safe_run(|| do_check(&cli)).print_and_exit()
}

fn do_check(cli: &Cli) -> Result<Overall, anyhow::Error> {
    if cli.value.is_nan() {
        anyhow::bail!("value is not a number");
    }

    let usage = Perfdata::new("usage", cli.value)
        .with_unit(Unit::Percentage)
        .with_thresholds(cli.warning, cli.critical)
        .with_min(0)
        .with_max(100);

    let mut overall = Overall::new();
    overall.add_subcheck(
        PartialResult::new(&format!("usage is {}%", cli.value))
            .with_state(usage.evaluate())
            .with_perfdata(usage),
    );

    Ok(overall)
}
