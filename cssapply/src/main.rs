use clap::Parser;
use cssapply_lib::config;
use cssapply_lib::{expand, expand_and_minify, UtilityTable};
use log::info;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cssapply")]
#[command(about = "Expand @apply directives into plain CSS")]
struct Args {
    /// Input stylesheet.
    input: PathBuf,

    /// Output file. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Utility table in TOML. Defaults to the built-in table.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minify the expanded stylesheet.
    #[arg(long)]
    minify: bool,
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let utility_config = match &args.config {
        Some(path) => config::load(path)?,
        None => config::builtin()?,
    };
    let table = UtilityTable::from_config(&utility_config);

    let css = fs::read_to_string(&args.input)
        .map_err(|e| format!("failed to read {}: {}", args.input.display(), e))?;
    let source_name = args.input.to_string_lossy();

    let result = if args.minify {
        expand_and_minify(&css, &table, Some(source_name.as_ref()))?
    } else {
        expand(&css, &table, Some(source_name.as_ref()))?
    };
    info!(
        "expanded {} ({} utility lookups cached)",
        source_name,
        table.cached_len()
    );

    match &args.output {
        Some(path) => fs::write(path, result)
            .map_err(|e| format!("failed to write {}: {}", path.display(), e))?,
        None => print!("{}", result),
    }
    Ok(())
}

fn main() {
    env_logger::init();

    // parse the args given in terminal
    let args: Args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
