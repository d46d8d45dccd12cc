use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing::error;
use tracing_subscriber::EnvFilter;

use quantum::SchedulerConfig;
use questkit::{
    bench::benchmark, CircuitBuilder, ExecutionResult, QuestError, Session, SessionConfig,
};

/// Deterministic state-vector simulator (quest-kit)
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Worker threads per session
    #[arg(long, env = "QUEST_THREADS", default_value_t = 1)]
    threads: usize,

    /// Largest register a circuit may request
    #[arg(long, default_value_t = questkit::config::DEFAULT_MAX_QUBITS)]
    max_qubits: usize,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an encoded circuit
    Simulate {
        /// Circuit file in the binary wire format
        #[arg(conflicts_with_all = ["hex", "demo"])]
        file: Option<PathBuf>,

        /// Circuit bytes as hex
        #[arg(long, conflicts_with = "demo")]
        hex: Option<String>,

        /// Built-in circuit
        #[arg(long, value_enum)]
        demo: Option<Demo>,

        /// Sampling seed for built-in circuits
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },

    /// Execute a transaction
    Tx {
        /// Transaction payload as hex
        #[arg(long)]
        data: String,

        /// Sender identity as hex
        #[arg(long)]
        sender: String,
    },

    /// Digest of the ground state
    Hash {
        #[arg(long, default_value_t = 1)]
        qubits: usize,
    },

    /// Seeded random bytes from measured |+⟩ qubits
    Random {
        #[arg(long, default_value_t = 32)]
        bytes: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },

    /// Time a Hadamard/CNOT brickwork circuit
    Bench {
        #[arg(long, default_value_t = 20)]
        qubits: usize,

        #[arg(long, default_value_t = 200)]
        depth: usize,
    },

    /// Print the library version
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Demo {
    Bell,
    Ghz,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Quest(#[from] QuestError),

    #[error("Invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Failed to read circuit: {0}")]
    Io(#[from] std::io::Error),

    #[error("Nothing to simulate: pass a file, --hex or --demo")]
    NoCircuit,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log)),
        )
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn session_config(args: &Args) -> SessionConfig {
    SessionConfig {
        max_qubits: args.max_qubits,
        scheduler: SchedulerConfig::with_threads(args.threads),
        ..SessionConfig::default()
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = session_config(&args);

    match args.command {
        Command::Simulate {
            file,
            hex: hex_input,
            demo,
            seed,
        } => {
            let bytes = match (file, hex_input, demo) {
                (Some(path), _, _) => std::fs::read(path)?,
                (None, Some(h), _) => hex::decode(h.trim())?,
                (None, None, Some(demo)) => demo_circuit(demo, seed)?,
                (None, None, None) => return Err(CliError::NoCircuit),
            };
            let mut session = Session::new(config)?;
            let result = session.simulate_circuit(&bytes)?.parse()?;
            print_result(&result);
        }
        Command::Tx { data, sender } => {
            let data = hex::decode(data.trim())?;
            let sender = hex::decode(sender.trim())?;
            let mut session = Session::new(config)?;
            let result = session.execute_transaction(&data, &sender)?.parse()?;
            print_result(&result);
        }
        Command::Hash { qubits } => {
            let session = Session::new(SessionConfig {
                initial_qubits: qubits,
                ..config
            })?;
            println!("{}", hex::encode(session.state_hash()));
        }
        Command::Random { bytes, seed } => {
            let mut session = Session::new(config)?;
            println!("{}", hex::encode(session.random_bytes(bytes, seed)?));
        }
        Command::Bench { qubits, depth } => {
            let report = benchmark(qubits, depth, args.threads, args.max_qubits)?;
            println!(
                "Benchmark: n={}, depth={}, threads={} → {:.3} s ({:.0} gates/s)",
                report.qubits,
                report.depth,
                report.threads,
                report.elapsed.as_secs_f64(),
                report.gates_per_second()
            );
            println!("digest = {}", hex::encode(report.digest));
        }
        Command::Version => println!("{}", questkit::version()),
    }
    Ok(())
}

fn demo_circuit(demo: Demo, seed: u64) -> Result<Vec<u8>, QuestError> {
    let builder = CircuitBuilder::new(match demo {
        Demo::Bell => 2,
        Demo::Ghz => 5,
    })
    .seed(seed)
    .h(0);

    match demo {
        Demo::Bell => builder.cnot(0, 1).measure(0).measure(1).encode(),
        Demo::Ghz => (0..4)
            .fold(builder, |b, q| b.cnot(q, q + 1))
            .encode(),
    }
}

fn print_result(r: &ExecutionResult) {
    println!("kind         = {:?}", r.kind);
    println!("qubits       = {}", r.num_qubits);
    println!("instructions = {}", r.instruction_count);
    println!(
        "outcome      = {:0width$b} (p = {:.6})",
        r.outcome,
        r.outcome_probability,
        width = r.num_qubits as usize
    );
    if !r.measurements.is_empty() {
        let bits: String = r.measurements.iter().map(|b| char::from(b'0' + b)).collect();
        println!("measured     = {}", bits);
    }
    println!("digest       = {}", hex::encode(r.digest));
}
