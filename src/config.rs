//! Command-line configuration untuk binary `ringlat`
//!
//! CPU pinning bisa juga di-set lewat environment:
//! - `PRODUCER_CPU`: CPU untuk thread producer / ping (default: 0)
//! - `CONSUMER_CPU`: CPU untuk thread consumer / pong (default: 1)

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::Backing;
use crate::harness::{PingPongConfig, StressConfig, DEFAULT_CAPACITY, DEFAULT_ITERATIONS};
use crate::poll::Timeout;

#[derive(Debug, Parser)]
#[command(
    name = "ringlat",
    version,
    about = "Lock-free SPSC byte ring buffer: latency benchmark and stress test"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Ping-pong latency benchmark antara dua thread
    Pingpong(RunArgs),
    /// Correctness stress test dengan counter menurun
    Stress(RunArgs),
    /// Jalankan shell command dan tampilkan stdout/stderr/exit code
    Shell {
        /// Command yang diberikan ke /bin/sh -c
        command: String,
    },
}

/// Pilihan backing storage di CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackingArg {
    Heap,
    Mapped,
}

impl From<BackingArg> for Backing {
    fn from(arg: BackingArg) -> Self {
        match arg {
            BackingArg::Heap => Backing::Heap,
            BackingArg::Mapped => Backing::Mapped,
        }
    }
}

/// Argumen bersama untuk `pingpong` dan `stress`
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Jumlah iterasi / record
    #[arg(short = 'n', long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: u32,

    /// Kapasitas storage setiap ring buffer dalam bytes
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,

    #[arg(short, long, value_enum, default_value_t = BackingArg::Heap)]
    pub backing: BackingArg,

    #[arg(long, env = "PRODUCER_CPU", default_value_t = 0)]
    pub producer_cpu: usize,

    #[arg(long, env = "CONSUMER_CPU", default_value_t = 1)]
    pub consumer_cpu: usize,

    /// Jangan pin thread ke CPU
    #[arg(long)]
    pub no_pin: bool,

    /// Batas tunggu satu write/read dalam milidetik (0 = tanpa batas)
    #[arg(long, default_value_t = 10_000)]
    pub stall_timeout_ms: u64,
}

impl RunArgs {
    fn cpus(&self) -> (Option<usize>, Option<usize>) {
        if self.no_pin {
            (None, None)
        } else {
            (Some(self.producer_cpu), Some(self.consumer_cpu))
        }
    }

    fn stall_timeout(&self) -> Timeout {
        match self.stall_timeout_ms {
            0 => Timeout::Infinite,
            ms => Timeout::Duration(Duration::from_millis(ms)),
        }
    }

    pub fn pingpong_config(&self) -> PingPongConfig {
        let (ping_cpu, pong_cpu) = self.cpus();
        PingPongConfig {
            iterations: self.iterations,
            capacity: self.capacity,
            backing: self.backing.into(),
            ping_cpu,
            pong_cpu,
            stall_timeout: self.stall_timeout(),
        }
    }

    pub fn stress_config(&self) -> StressConfig {
        let (producer_cpu, consumer_cpu) = self.cpus();
        StressConfig {
            records: self.iterations,
            capacity: self.capacity,
            backing: self.backing.into(),
            producer_cpu,
            consumer_cpu,
            stall_timeout: self.stall_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_pingpong_defaults() {
        let cli = parse(&["ringlat", "pingpong", "--no-pin"]);
        let CliCommand::Pingpong(args) = cli.command else {
            panic!("expected pingpong");
        };
        let config = args.pingpong_config();
        assert_eq!(config.iterations, DEFAULT_ITERATIONS);
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.backing, Backing::Heap);
        assert_eq!(config.ping_cpu, None);
        assert_eq!(
            config.stall_timeout,
            Timeout::Duration(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_stress_overrides() {
        let cli = parse(&[
            "ringlat",
            "stress",
            "-n",
            "500",
            "--capacity",
            "4096",
            "--backing",
            "mapped",
            "--producer-cpu",
            "2",
            "--consumer-cpu",
            "3",
            "--stall-timeout-ms",
            "0",
        ]);
        let CliCommand::Stress(args) = cli.command else {
            panic!("expected stress");
        };
        let config = args.stress_config();
        assert_eq!(config.records, 500);
        assert_eq!(config.capacity, 4096);
        assert_eq!(config.backing, Backing::Mapped);
        assert_eq!(config.producer_cpu, Some(2));
        assert_eq!(config.consumer_cpu, Some(3));
        assert_eq!(config.stall_timeout, Timeout::Infinite);
    }

    #[test]
    fn test_shell_command() {
        let cli = parse(&["ringlat", "shell", "ls -l"]);
        assert!(matches!(cli.command, CliCommand::Shell { command } if command == "ls -l"));
    }
}
