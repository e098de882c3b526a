//! Shellstream - print a child process's output, optionally after a marker line.

use std::path::PathBuf;
use std::pin::pin;

use clap::{Parser, ValueEnum};
use futures_util::StreamExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shellstream::config::{BufferMode, ConfigLoader};
use shellstream::display;
use shellstream::shell::{Matcher, ShellStreamBuilder};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BufferArg {
    Line,
    Unbuffered,
    Block,
}

impl From<BufferArg> for BufferMode {
    fn from(arg: BufferArg) -> Self {
        match arg {
            BufferArg::Line => BufferMode::Line,
            BufferArg::Unbuffered => BufferMode::Unbuffered,
            BufferArg::Block => BufferMode::Block,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "shellstream",
    about = "Stream a child process's output line by line",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stdin buffering mode (overrides the config file).
    #[arg(long, value_enum)]
    buffer: Option<BufferArg>,

    /// Skip output until a line equal to this text (or matching it, with --regex).
    #[arg(long)]
    after: Option<String>,

    /// Treat --after as a regex anchored at the start of the line.
    #[arg(long, requires = "after")]
    regex: bool,

    /// Also print the line that matched --after.
    #[arg(long, requires = "after")]
    include_match: bool,

    /// Text written to the child's stdin (a newline is appended).
    #[arg(long)]
    reply: Option<String>,

    /// Write --reply after this many printed lines (0-based index).
    #[arg(long, default_value_t = 1, requires = "reply")]
    reply_after: usize,

    /// Print lines without color.
    #[arg(long)]
    raw: bool,

    /// Program to run, followed by its arguments.
    #[arg(last = true, required = true, num_args = 1..)]
    command: Vec<String>,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let loader = cli
        .config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = loader.load()?;
    if let Some(buffer) = cli.buffer {
        config.buffer_mode = buffer.into();
    }

    let (program, args) = cli
        .command
        .split_first()
        .ok_or("missing program to run")?;
    let mut process = ShellStreamBuilder::new(program.as_str())
        .args(args.iter().cloned())
        .config(config)
        .spawn()?;

    tracing::info!(program = %program, pid = ?process.id(), "Streaming child output");

    let matcher = match &cli.after {
        Some(text) if cli.regex => Some(Matcher::pattern(text)?),
        Some(text) => Some(Matcher::exact(text.as_str())),
        None => None,
    };

    let mut index = 0;
    loop {
        // The stream borrows the process; rebuild it after each reply.
        let line = {
            let next = match &matcher {
                Some(m) if index == 0 => {
                    let mut lines = pin!(process.filter_after_match(m.clone(), cli.include_match));
                    lines.next().await
                }
                _ => {
                    let mut lines = pin!(process.drain());
                    lines.next().await
                }
            };
            match next {
                Some(line) => line,
                None => break,
            }
        };

        display::print_line(index, &line, cli.raw);

        if index == cli.reply_after {
            if let Some(reply) = &cli.reply {
                process.write(format!("{reply}\n")).await?;
                display::print_reply(reply);
            }
        }
        index += 1;
    }

    display::print_exit(process.exit_status());
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "shellstream failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
