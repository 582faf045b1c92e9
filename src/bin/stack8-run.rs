use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use stack8::{
    listing, ProgramImage, Simulation, SimulationConfig, SimulationError, TextTrace,
};
use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

#[derive(Parser, Debug)]
#[command(name = "stack8-run")]
#[command(about = "Run a stack8 program image", long_about = None)]
struct Args {
    /// Program image (JSON)
    program: PathBuf,

    /// File whose bytes are fed to READ
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write PRINT output here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Append a 0 byte to the input
    #[arg(long, action = ArgAction::SetTrue)]
    nul_terminate: bool,

    /// Abort after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Abort after this many instructions
    #[arg(long)]
    max_instructions: Option<u64>,

    /// Print one line per tick to stderr
    #[arg(long, action = ArgAction::SetTrue)]
    trace: bool,

    /// Print the program listing and exit
    #[arg(long, action = ArgAction::SetTrue)]
    listing: bool,
}

fn write_output(path: Option<&PathBuf>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => fs::write(path, bytes)
            .with_context(|| format!("failed to write output {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes).context("failed to write output")?;
            stdout.flush().context("failed to write output")
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let text = fs::read_to_string(&args.program)
        .with_context(|| format!("failed to read program {}", args.program.display()))?;
    let image = ProgramImage::from_json(&text)
        .with_context(|| format!("failed to parse program {}", args.program.display()))?;

    if args.listing {
        let text = listing(&image).context("failed to list program")?;
        print!("{}", text);
        return Ok(ExitCode::SUCCESS);
    }

    let mut input = match &args.input {
        Some(path) => {
            fs::read(path).with_context(|| format!("failed to read input {}", path.display()))?
        }
        None => Vec::new(),
    };
    if args.nul_terminate {
        input.push(0);
    }

    let config = SimulationConfig {
        tick_limit: args.max_ticks,
        instruction_limit: args.max_instructions,
    };
    let simulation = Simulation::new(image)
        .context("invalid program image")?
        .with_config(config);

    let trace = Rc::new(RefCell::new(TextTrace::new(io::stderr())));
    let result = if args.trace {
        simulation.run_traced(&input, Box::new(Rc::clone(&trace)))
    } else {
        simulation.run(&input)
    };
    if let Some(err) = trace.borrow_mut().take_error() {
        eprintln!("warning: trace output failed: {}", err);
    }

    match result {
        Ok(report) => {
            write_output(args.output.as_ref(), &report.output)?;
            eprintln!(
                "halted after {} instructions, {} ticks",
                report.instructions, report.ticks
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(SimulationError::Execution { error, output }) => {
            write_output(args.output.as_ref(), &output)?;
            eprintln!("error: {}", error);
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}
