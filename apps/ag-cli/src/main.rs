use ag_core::{Engine, StdPlatform};
use ag_patch::{Patch, PatchInstance, PatchResult, instantiate};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "ag-cli")]
#[command(about = "AnalogGraph CLI - run control-signal patches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate patch file syntax and structure
    Validate {
        /// Path to the patch file (YAML, or JSON by extension)
        patch_path: PathBuf,
    },
    /// List the units of a patch
    Units {
        /// Path to the patch file
        patch_path: PathBuf,
    },
    /// Run a patch and print unit values after every step
    Run {
        /// Path to the patch file
        patch_path: PathBuf,
        #[command(flatten)]
        opts: RunArgs,
    },
    /// Run the built-in oscillator -> normalizer patch
    Demo {
        #[command(flatten)]
        opts: RunArgs,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Number of steps to run
    #[arg(long, default_value_t = 20)]
    steps: u64,
    /// Fixed sample rate in Hz (overrides the patch)
    #[arg(long)]
    rate: Option<f64>,
    /// Step as fast as possible instead of holding the fixed rate
    #[arg(long)]
    no_pace: bool,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
    /// Output file path (optional, defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
    Yaml,
}

fn main() -> PatchResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { patch_path } => cmd_validate(&patch_path),
        Commands::Units { patch_path } => cmd_units(&patch_path),
        Commands::Run { patch_path, opts } => {
            let patch = ag_patch::load(&patch_path)?;
            cmd_run(patch, &opts)
        }
        Commands::Demo { opts } => {
            let mut patch = Patch::demo();
            // Pick a rate that shows a full oscillator period in the default step count.
            patch.engine.sample_rate.get_or_insert(10.0);
            cmd_run(patch, &opts)
        }
    }
}

fn cmd_validate(patch_path: &Path) -> PatchResult<()> {
    println!("Validating patch: {}", patch_path.display());
    let patch = ag_patch::load(patch_path)?;
    println!("✓ Patch '{}' is valid ({} units)", patch.name, patch.units.len());
    Ok(())
}

fn cmd_units(patch_path: &Path) -> PatchResult<()> {
    let patch = ag_patch::load(patch_path)?;

    if patch.units.is_empty() {
        println!("No units found in patch");
    } else {
        println!("Units in patch '{}':", patch.name);
        for (slot, unit) in patch.units.iter().enumerate() {
            let input = unit
                .input
                .as_deref()
                .map(|src| format!(" <- {}", src))
                .unwrap_or_default();
            println!("  #{} {} ({}){}", slot, unit.id, unit.kind.type_name(), input);
        }
    }
    Ok(())
}

/// Values of every unit after one step.
#[derive(Serialize)]
struct Row {
    step: u64,
    seconds: f64,
    values: Vec<f64>,
}

#[derive(Serialize)]
struct Trace {
    patch: String,
    units: Vec<String>,
    rows: Vec<Row>,
}

fn cmd_run(mut patch: Patch, opts: &RunArgs) -> PatchResult<()> {
    if let Some(rate) = opts.rate {
        patch.engine.sample_rate = Some(rate);
    }
    if opts.no_pace {
        patch.engine.pace = false;
    }

    let (mut engine, instance) = instantiate(&patch, StdPlatform::new())?;
    tracing::info!(
        patch = %patch.name,
        steps = opts.steps,
        rate = ?patch.engine.sample_rate,
        "running patch"
    );

    let wall = Instant::now();
    let trace = run_steps(&patch.name, &mut engine, &instance, opts.steps);
    tracing::info!(
        elapsed = engine.seconds(false),
        wall_s = wall.elapsed().as_secs_f64(),
        "run finished"
    );

    let rendered = match opts.format {
        Format::Table => render_table(&trace),
        Format::Csv => render_csv(&trace),
        Format::Json => serde_json::to_string_pretty(&trace)? + "\n",
        Format::Yaml => serde_yaml::to_string(&trace)?,
    };

    if let Some(path) = &opts.output {
        std::fs::write(path, rendered)?;
        println!("✓ Wrote {} steps to {}", trace.rows.len(), path.display());
    } else {
        print!("{}", rendered);
        let _ = io::stdout().flush();
    }
    Ok(())
}

/// Rows reserved up front; longer runs grow the trace as they go.
const ROW_PREALLOC: u64 = 4_096;

fn row_capacity(steps: u64) -> usize {
    steps.min(ROW_PREALLOC) as usize
}

fn run_steps(
    name: &str,
    engine: &mut Engine<StdPlatform>,
    instance: &PatchInstance,
    steps: u64,
) -> Trace {
    engine.initialize();

    let mut rows = Vec::with_capacity(row_capacity(steps));
    for _ in 0..steps {
        engine.step();
        instance.propagate();
        rows.push(Row {
            step: engine.n_steps(),
            seconds: engine.seconds(false),
            values: instance.values().into_iter().map(|(_, v)| v).collect(),
        });
    }

    Trace {
        patch: name.to_string(),
        units: instance.names().map(str::to_string).collect(),
        rows,
    }
}

fn render_table(trace: &Trace) -> String {
    let width = trace
        .units
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max(9);

    let mut out = format!("{:>6}  {:>10}", "step", "time_s");
    for name in &trace.units {
        out.push_str(&format!("  {:>width$}", name));
    }
    out.push('\n');
    for row in &trace.rows {
        out.push_str(&format!("{:>6}  {:>10.4}", row.step, row.seconds));
        for value in &row.values {
            out.push_str(&format!("  {:>width$.5}", value));
        }
        out.push('\n');
    }
    out
}

fn render_csv(trace: &Trace) -> String {
    let mut csv = String::from("step,time_s");
    for name in &trace.units {
        csv.push(',');
        csv.push_str(name);
    }
    csv.push('\n');
    for row in &trace.rows {
        csv.push_str(&format!("{},{}", row.step, row.seconds));
        for value in &row.values {
            csv.push_str(&format!(",{}", value));
        }
        csv.push('\n');
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trace() -> Trace {
        Trace {
            patch: "t".to_string(),
            units: vec!["lfo".to_string(), "norm".to_string()],
            rows: vec![
                Row {
                    step: 1,
                    seconds: 0.1,
                    values: vec![0.2, 0.5],
                },
                Row {
                    step: 2,
                    seconds: 0.2,
                    values: vec![0.4, 0.75],
                },
            ],
        }
    }

    #[test]
    fn csv_has_header_and_rows() {
        let csv = render_csv(&sample_trace());
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines, ["step,time_s,lfo,norm", "1,0.1,0.2,0.5", "2,0.2,0.4,0.75"]);
    }

    #[test]
    fn table_aligns_columns() {
        let table = render_table(&sample_trace());
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].trim_start().starts_with("step"));
        assert!(lines.iter().all(|l| l.len() == lines[0].len()));
    }

    #[test]
    fn huge_step_counts_reserve_bounded_rows() {
        assert_eq!(row_capacity(12), 12);
        assert_eq!(row_capacity(u64::MAX), ROW_PREALLOC as usize);
        let rows: Vec<Row> = Vec::with_capacity(row_capacity(u64::MAX));
        assert!(rows.capacity() >= ROW_PREALLOC as usize);
    }

    #[test]
    fn demo_runs_unpaced() {
        let mut patch = Patch::demo();
        patch.engine.sample_rate = Some(10.0);
        patch.engine.pace = false;
        let (mut engine, instance) = instantiate(&patch, StdPlatform::new()).unwrap();
        let trace = run_steps(&patch.name, &mut engine, &instance, 10);
        assert_eq!(trace.rows.len(), 10);
        assert_eq!(trace.rows[9].step, 10);
        assert!((trace.rows[9].seconds - 1.0).abs() < 1e-9);
        // Half a period of a 2 s triangle: the peak.
        assert!((trace.rows[9].values[0] - 1.0).abs() < 1e-9);
    }
}
