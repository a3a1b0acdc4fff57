use anyhow::Result;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::env;
use std::sync::Arc;
use tablo::cli::{self, Invocation};
use tablo::context::{AppContext, StandardContext};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let invocation = match cli::parse_args(&args[1..]) {
        Ok(inv) => inv,
        Err(msg) => {
            eprintln!("{}", msg);
            std::process::exit(2);
        }
    };

    let opts = match invocation {
        Invocation::ShowHelp => {
            cli::print_help("tablo");
            return Ok(());
        }
        Invocation::ShowVersion => {
            cli::print_version();
            return Ok(());
        }
        Invocation::Run(opts) => opts,
    };

    let ctx = Arc::new(StandardContext::new(opts.data_dir.clone()));

    // The TUI owns the terminal, so logs go to a file in the data dir.
    // Failure to set up logging is not fatal; the app still runs.
    if let Ok(log_path) = ctx.get_log_file_path()
        && let Ok(file) = std::fs::File::create(&log_path)
    {
        let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
        let _ = WriteLogger::init(LevelFilter::Info, log_config, file);
    }

    tablo::tui::run(ctx, opts.board).await
}
