//! SeoLens CLI binary.
//!
//! Subcommands: `run` (analyze content once), `ops` (list operations), `serve` (HTTP + WebSocket server).

mod log_format;
mod logging;

use clap::{Parser, Subcommand};
use cli::{format_operations, format_view, read_content, run_once, RunError};
use logging::Fallback;
use seolens::{ContentBounds, Operation, Pipeline};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "seolens")]
#[command(about = "SeoLens: SEO audit, rewrite, FAQ and meta generation for your content")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze content once and print the result
    Run(RunArgs),
    /// List available operations
    Ops,
    /// Run the HTTP and WebSocket server
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Operation: audit, rewrite, faq or meta
    #[arg(long, value_name = "OP")]
    op: Operation,

    /// Read content from this file (`-` for stdin)
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Content as positional args when --file is not used; stdin when both are absent
    #[arg(trailing_var_arg = true)]
    text: Vec<String>,

    /// Print `{operation, output, view}` as JSON
    #[arg(long)]
    json: bool,

    /// When using --json, pretty-print (multi-line)
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Listen address (default SERVE_ADDR or 127.0.0.1:9002)
    #[arg(long, value_name = "ADDR")]
    addr: Option<String>,
    /// Exit after the first WebSocket connection closes
    #[arg(long)]
    once: bool,
}

fn write_json(value: &serde_json::Value, pretty: bool) -> Result<(), serde_json::Error> {
    let s = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", s);
    Ok(())
}

async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let content = read_content(args.file.as_deref(), &args.text).await?;
    let pipeline = Pipeline::from_env()?;
    let result = run_once(pipeline, ContentBounds::from_env(), args.op, &content).await?;
    if args.json {
        write_json(&serde_json::to_value(&result)?, args.pretty)?;
    } else {
        println!("{}", format_view(&result.view));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let applied = config::load_and_apply("seolens", None::<&std::path::Path>);
    let args = Args::parse();
    let fallback = match args.cmd {
        Command::Serve(_) => Fallback::Stderr,
        _ => Fallback::Drop,
    };
    logging::init(fallback)?;
    match applied {
        Ok(applied) => tracing::debug!(keys = applied.keys.len(), "config applied"),
        Err(e) => tracing::warn!("config not applied: {}", e),
    }

    match args.cmd {
        Command::Ops => println!("{}", format_operations()),
        Command::Run(ra) => {
            if let Err(e) = run(ra).await {
                match e.downcast_ref::<RunError>() {
                    Some(RunError::Validation(_)) => eprintln!("invalid input: {}", e),
                    Some(RunError::Upstream(_)) => eprintln!("analysis failed: {}", e),
                    _ => eprintln!("seolens: {}", e),
                }
                std::process::exit(1);
            }
        }
        Command::Serve(sa) => {
            let mut config = serve::ServeConfig::from_env();
            if let Some(addr) = sa.addr {
                config.addr = addr;
            }
            if let Err(e) = serve::run_serve(config, sa.once).await {
                eprintln!("serve error: {}", e);
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
