use clap::{Parser, command};
use mojoman::error::MojoResult;
use program::{EraseOptions, ProgramOptions, handle_erase, handle_programming};

mod program;

#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
enum Cli {
    /// Upload a bitstream to the Mojo
    #[command(name = "program", alias = "p")]
    Program(ProgramOptions),

    /// Erase flash on the Mojo
    #[command(name = "erase", alias = "e")]
    Erase(EraseOptions),
}

impl Cli {
    fn verbose(&self) -> bool {
        match self {
            Cli::Program(opts) => opts.port.verbose,
            Cli::Erase(opts) => opts.port.verbose,
        }
    }
}

fn main() -> MojoResult<()> {
    let cli = Cli::parse();

    let level = if cli.verbose() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli {
        Cli::Program(opts) => handle_programming(opts)?,
        Cli::Erase(opts) => handle_erase(opts)?,
    }

    Ok(())
}
