use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use tmsim::{
    analyze, encode, parse_with_limits, tape_from, Catalog, DefinitionLoader, Halt, Limits,
    Machine, RunReport, Silent, TraceReporter,
};
use tracing::warn;

/// Runs a deterministic single-tape Turing machine over a fixed-length tape.
#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXAMPLES:
  tmsim-cli machines/even-zeros.tm 5 0000
  tmsim-cli --builtin binary-increment 6 _1011_
  cat machine.tm | tmsim-cli - 8 0101")]
struct Cli {
    /// Machine definition file (.tm), `-` for stdin, or a built-in name with --builtin
    definition: String,

    /// Number of tape cells
    tape_length: usize,

    /// Initial tape contents, padded with the blank symbol up to the tape length
    tape: String,

    /// Only print the final outcome, not every step
    #[clap(short, long)]
    silent: bool,

    /// Treat DEFINITION as the name of a built-in machine
    #[clap(short, long)]
    builtin: bool,

    /// Symbol used to pad the tape
    #[clap(long, default_value_t = '_')]
    blank: char,

    /// Give up after this many steps
    #[clap(long)]
    max_steps: Option<usize>,

    /// Maximum number of states, including accept and reject
    #[clap(long)]
    max_states: Option<usize>,

    /// Maximum number of transitions per state
    #[clap(long)]
    max_transitions: Option<usize>,

    /// Use the classic fixed capacities (25 states, 5 transitions per state)
    #[clap(long)]
    classic: bool,

    /// Print the parsed definition in canonical form before running
    #[clap(long)]
    print: bool,

    /// Print a JSON summary instead of the trace
    #[clap(long)]
    json: bool,

    /// Log warnings for suspicious definitions
    #[clap(long)]
    lint: bool,
}

impl Cli {
    fn limits(&self) -> Limits {
        let base = if self.classic {
            Limits::classic()
        } else {
            Limits::default()
        };

        Limits {
            max_states: self.max_states.or(base.max_states),
            max_transitions: self.max_transitions.or(base.max_transitions),
            max_steps: self.max_steps,
            ..base
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match execute(&cli) {
        Ok(halt) if halt.is_normal() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing with an env-driven filter (default WARN) on stderr.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn execute(cli: &Cli) -> Result<Halt> {
    if cli.tape_length == 0 {
        bail!("tape length must be at least 1");
    }

    if !cli.json {
        println!("> Parsing {} ... \n", cli.definition);
    }

    let mut machine = load_machine(cli)?;

    if cli.lint {
        for finding in analyze(&machine) {
            warn!("{finding}");
        }
    }

    if cli.print {
        print!("{}", encode(&machine));
        println!();
    }

    let mut tape = tape_from(&cli.tape, cli.tape_length, cli.blank);

    if cli.json {
        let halt = machine.run(&mut tape, &mut Silent);
        let report = RunReport::new(&machine, &tape, &halt);
        println!("{}", report.to_json().context("serializing run report")?);
        return Ok(halt);
    }

    println!("> Starting simulation... \n");

    let stdout = io::stdout().lock();
    let mut reporter = if cli.silent {
        TraceReporter::quiet(stdout)
    } else {
        TraceReporter::new(stdout)
    };

    let halt = machine.run(&mut tape, &mut reporter);
    let mut stdout = reporter.finish().context("writing trace")?;
    stdout.flush().context("flushing stdout")?;

    Ok(halt)
}

/// Loads the machine from a file, stdin, or the built-in catalog.
fn load_machine(cli: &Cli) -> Result<Machine> {
    let limits = cli.limits();

    if cli.builtin {
        let program = Catalog::get_by_name(&cli.definition).with_context(|| {
            format!(
                "unknown built-in '{}', available: {}",
                cli.definition,
                Catalog::names().join(", ")
            )
        })?;
        return parse_with_limits(program.source, limits)
            .with_context(|| format!("failed parsing built-in '{}'", cli.definition));
    }

    if cli.definition == "-" {
        return DefinitionLoader::load_from_reader(io::stdin().lock(), limits)
            .context("failed parsing the machine from stdin");
    }

    let path = Path::new(&cli.definition);
    DefinitionLoader::load_definition_with_limits(path, limits)
        .with_context(|| format!("failed parsing the machine in {}", path.display()))
}
