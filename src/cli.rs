// File: ./src/cli.rs
//! Shared command-line interface logic: argument parsing and help text.
use std::path::PathBuf;

/// Options accepted by the `tablo` binary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOptions {
    /// Board (id or name) to open directly, overriding the config default.
    pub board: Option<String>,
    /// Override root for config/data/cache directories.
    pub data_dir: Option<PathBuf>,
}

/// What the binary should do after looking at the arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Run(CliOptions),
    ShowHelp,
    ShowVersion,
}

/// Parses `args` (without the program name). Unknown flags and flags
/// missing their value are reported as `Err` with a message for stderr.
pub fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut opts = CliOptions::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" | "help" => return Ok(Invocation::ShowHelp),
            "--version" | "-V" => return Ok(Invocation::ShowVersion),
            "--board" | "-b" => {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("{} requires a board id or name", arg))?;
                opts.board = Some(value.clone());
            }
            "--data-dir" | "-d" => {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("{} requires a path", arg))?;
                opts.data_dir = Some(PathBuf::from(value));
            }
            other => {
                return Err(format!(
                    "Unknown argument '{}'. Try '--help' for usage.",
                    other
                ));
            }
        }
    }

    Ok(Invocation::Run(opts))
}

pub fn print_help(binary_name: &str) {
    println!(
        "Tablo v{} - Fast and resilient kanban board client (TUI)",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--board <id>] [--data-dir <path>]", binary_name);
    println!("    {} --help", binary_name);
    println!("    {} --version", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    -b, --board <id>        Open a specific board (id or name) on startup.");
    println!("    -d, --data-dir <path>   Use a different directory for config and data.");
    println!("    -h, --help              Show this help message.");
    println!("    -V, --version           Show the version.");
    println!();
    println!("KEYBINDINGS:");
    println!("    Press '?' inside the app for full interactive help");
    println!();
    println!("MOVING CARDS:");
    println!("    J/K               Move the selected card down/up within its column");
    println!("    H/L               Send the selected card to the previous/next column");
    println!("    Moves apply immediately and are undone if the server rejects them.");
    println!();
    println!("MORE INFO:");
    println!("    License:    GPL-3.0");
}

pub fn print_version() {
    println!("tablo {}", env!("CARGO_PKG_VERSION"));
}
