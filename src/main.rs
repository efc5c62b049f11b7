use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use humansize::{format_size, BINARY};
use latexclean::{run, AssumeYes, CleanConfig, CleanOptions, Confirm, Prompt, RunOutcome, Task};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Clean a LaTeX project for submission: drop figure sources, unused figures, comments and build artifacts",
    long_about = "Clean a LaTeX project for submission.\n\n\
        Removes figure source files, figures no document includes, comments in .tex files, \
        auxiliary build files and the compiled PDF. These actions cannot be undone; use \
        --output to clean a copy instead."
)]
struct Args {
    /// Project directory (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Show every file that is removed or skipped
    #[arg(long, short)]
    verbose: bool,

    /// Phases to run, comma separated. They always run in canonical order
    #[arg(long, short, value_enum, value_delimiter = ',')]
    tasks: Option<Vec<Task>>,

    /// Bibliography file, relative to the project directory
    #[arg(long, short)]
    bib: Option<PathBuf>,

    /// Copy the project here first and clean the copy
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Answer 'yes' to every confirmation
    #[arg(long, short)]
    yes: bool,

    /// Extra configuration file layered over the defaults and latexclean.toml
    #[arg(long, short)]
    config: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("Project directory {} not found", args.path.display()))?;
    let config = CleanConfig::load(&root, args.config.as_deref())?;

    let options = CleanOptions {
        tasks: args
            .tasks
            .map(|tasks| tasks.into_iter().collect())
            .unwrap_or_default(),
        bibliography: args.bib,
        output: args.output,
    };

    let mut confirm: Box<dyn Confirm> = if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(Prompt::stdio())
    };

    match run(&root, &config, &options, confirm.as_mut())? {
        RunOutcome::Declined => {
            println!("Nothing was changed.");
        }
        RunOutcome::Completed(report) => {
            println!("========================================");
            println!(
                "Total Size Removed: {}",
                format_size(report.bytes_removed(), BINARY).bold().red()
            );
            println!("\n{}", "Success".green().bold());
        }
    }

    Ok(())
}
