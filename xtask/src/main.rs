use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the dispatch workspace",
    long_about = "A unified CLI for running the dispatch loop against the in-memory\n\
                  store, benchmarks, and CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dispatch loop against a seeded in-memory store
    Demo {
        /// Matching strategy passed through to the service
        #[arg(long, default_value = "flow")]
        strategy: String,
        /// Number of passes before exiting
        #[arg(long, default_value_t = 20)]
        passes: u64,
        /// Milliseconds between passes
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
    },
    /// Run the dispatch loop against MySQL (reads DATABASE_URL)
    Serve,
    /// Run Criterion benchmarks
    Bench,
    /// Compare benchmarks: stash changes, create baseline, restore, compare
    BenchCompare,
    /// Run CI checks (fmt, clippy, tests, demo, benchmarks)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Short in-memory demo run with every strategy
    Demo,
    /// Run benchmarks
    Bench,
    /// Run check + demo + bench
    All,
}

const STRATEGIES: [&str; 4] = ["nearest", "greedy-distance", "greedy-revenue", "flow"];

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn spawn(program: &str, args: &[&str]) -> ExitStatus {
    eprintln!("+ {program} {}", args.join(" "));
    match Command::new(program).args(args).status() {
        Ok(status) => status,
        Err(err) => {
            eprintln!("failed to execute {program}: {err}");
            exit(1);
        }
    }
}

fn run(program: &str, args: &[&str]) {
    let status = spawn(program, args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_cargo(args: &[&str]) {
    run("cargo", args);
}

fn run_git(args: &[&str]) {
    run("git", args);
}

fn run_demo(strategy: &str, passes: u64, interval_ms: u64) {
    let passes = passes.to_string();
    let interval = interval_ms.to_string();
    run_cargo(&[
        "run",
        "-p",
        "dispatch_service",
        "--release",
        "--",
        "--store",
        "memory",
        "--strategy",
        strategy,
        "--passes",
        &passes,
        "--interval-ms",
        &interval,
    ]);
}

fn bench(extra: &[&str]) {
    let mut args = vec!["bench", "--package", "dispatch_core", "--bench", "matching"];
    if !extra.is_empty() {
        args.push("--");
        args.extend_from_slice(extra);
    }
    run_cargo(&args);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test dispatch_core");
    run_cargo(&["test", "-p", "dispatch_core"]);

    step("Test dispatch_core with the mysql backend");
    run_cargo(&["test", "-p", "dispatch_core", "--features", "mysql"]);

    step("Test dispatch_service");
    run_cargo(&["test", "-p", "dispatch_service"]);
}

fn ci_demo() {
    for strategy in STRATEGIES {
        step(&format!("Demo run with {strategy}"));
        run_demo(strategy, 5, 10);
    }
}

fn ci_bench() {
    step("Run benchmarks");
    bench(&[]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            strategy,
            passes,
            interval_ms,
        } => run_demo(&strategy, passes, interval_ms),
        Commands::Serve => {
            run_cargo(&["run", "-p", "dispatch_service", "--release", "--", "--store", "mysql"]);
        }
        Commands::Bench => bench(&[]),
        Commands::BenchCompare => {
            let baseline_dir = Path::new("target/criterion");
            if baseline_dir.exists() {
                step("Removing existing benchmark data");
                if let Err(err) = std::fs::remove_dir_all(baseline_dir) {
                    eprintln!("failed to remove target/criterion: {err}");
                    exit(1);
                }
            }

            step("Stashing current changes");
            run_git(&[
                "stash",
                "push",
                "-m",
                "Temporary stash for benchmark comparison",
            ]);

            step("Running benchmark to create baseline");
            bench(&["--save-baseline", "main"]);

            step("Reapplying changes");
            run_git(&["stash", "pop"]);

            step("Running benchmark comparing against baseline");
            bench(&["--baseline", "main"]);

            eprintln!("\nDone! Check the output above to see performance comparison.");
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Demo => ci_demo(),
                CiJob::Bench => ci_bench(),
                CiJob::All => {
                    ci_check();
                    ci_demo();
                    ci_bench();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
