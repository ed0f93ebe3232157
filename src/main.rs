//! Ringlat binary
//!
//! Usage:
//!   cargo run --release -- pingpong [OPTIONS]
//!   cargo run --release -- stress [OPTIONS]
//!   cargo run --release -- shell "<command>"

use anyhow::{Context, Result};
use clap::Parser;

use ringlat::config::{Cli, CliCommand};
use ringlat::harness::{correctness, pingpong, RECORD_SIZE};
use ringlat::trace::init_tracing;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Pingpong(args) => run_pingpong(&args.pingpong_config()),
        CliCommand::Stress(args) => run_stress(&args.stress_config()),
        CliCommand::Shell { command } => run_shell(&command),
    }
}

fn run_pingpong(config: &pingpong::PingPongConfig) -> Result<()> {
    println!("📊 Ping-Pong Latency (Lock-Free SPSC, {RECORD_SIZE}-byte records)");
    println!("------------------------------------------------------------");

    let report = pingpong::run(config).context("ping-pong benchmark failed")?;

    println!("  Iterations:      {}", report.iterations);
    println!("  Total time:      {} ns", report.total.as_nanos());
    println!(
        "  Ping-pong time:  {} ns ({:.3} μs)",
        report.round_trip().as_nanos(),
        report.round_trip().as_nanos() as f64 / 1000.0
    );
    println!(
        "  Throughput:      {:.2} M round trips/sec",
        report.round_trips_per_sec() / 1_000_000.0
    );
    Ok(())
}

fn run_stress(config: &correctness::StressConfig) -> Result<()> {
    println!("📊 Correctness Stress Test ({} records)", config.records);
    println!("------------------------------------------------------------");

    let report = correctness::run(config).context("correctness stress test failed")?;

    println!("  Records verified: {}", report.records);
    println!("  Bytes moved:      {} KB", report.bytes / 1024);
    println!("  Elapsed:          {:.3} s", report.elapsed.as_secs_f64());
    println!(
        "  Throughput:       {:.2} M records/sec",
        report.records_per_sec() / 1_000_000.0
    );
    println!("\n✅ FIFO order intact, no corruption");
    Ok(())
}

#[cfg(unix)]
fn run_shell(command: &str) -> Result<()> {
    use std::io::Write;

    let output = ringlat::shell::run(command)
        .with_context(|| format!("failed to run `{command}`"))?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "stdout size: {}", output.stdout.len())?;
    stdout.write_all(&output.stdout)?;
    writeln!(stdout, "stderr size: {}", output.stderr.len())?;
    stdout.write_all(&output.stderr)?;
    writeln!(stdout, "exit code: {}", output.exit_code)?;
    Ok(())
}

#[cfg(not(unix))]
fn run_shell(_command: &str) -> Result<()> {
    anyhow::bail!("shell runner is only available on unix")
}
