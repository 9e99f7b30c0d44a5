use clap::{Parser, ValueEnum};
use ecsl_core::config::Config;
use ecsl_core::tokenizer::location;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ecsl", about = "Parse ECSL markup and print the resulting tree")]
struct Cli {
    /// Input ECSL file(s) or directory. Omit to read from stdin.
    #[arg()]
    input: Vec<PathBuf>,

    /// Output file (single input only) or directory (multiple inputs).
    /// Omit to write to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output representation of the parsed tree.
    #[arg(long, value_enum, default_value_t = Format::Markup)]
    format: Format,

    /// File extension for output files in directory mode (default: "out").
    #[arg(long, default_value = "out")]
    ext: String,

    /// Log parser activity to stderr (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Re-rendered ECSL markup.
    Markup,
    /// The tree as pretty-printed JSON.
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => {
            let toml_str = std::fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config {}: {e}", path.display());
                std::process::exit(1);
            });
            Config::from_toml(&toml_str).unwrap_or_else(|e| {
                eprintln!("Error parsing config: {e}");
                std::process::exit(1);
            })
        }
        None => Config::default(),
    };

    if cli.input.is_empty() {
        // Stdin mode
        let mut input = String::new();
        io::stdin().read_to_string(&mut input).unwrap_or_else(|e| {
            eprintln!("Error reading stdin: {e}");
            std::process::exit(1);
        });
        let result = process_or_exit(&input, &config, cli.format, "<stdin>");
        write_output(&result, cli.output.as_deref());
    } else {
        let files = collect_ecsl_files(&cli.input);
        if files.is_empty() {
            eprintln!("No .ecsl files found");
            std::process::exit(1);
        }

        if files.len() == 1 {
            let input = read_file(&files[0]);
            let result =
                process_or_exit(&input, &config, cli.format, &files[0].display().to_string());
            write_output(&result, cli.output.as_deref());
        } else {
            let out_dir = cli.output.unwrap_or_else(|| {
                eprintln!("Multiple input files require --output directory");
                std::process::exit(1);
            });
            std::fs::create_dir_all(&out_dir).unwrap_or_else(|e| {
                eprintln!("Error creating output directory: {e}");
                std::process::exit(1);
            });
            for file in &files {
                let input = read_file(file);
                let result =
                    process_or_exit(&input, &config, cli.format, &file.display().to_string());
                let stem = file.file_stem().unwrap_or_default().to_string_lossy();
                let out_path = out_dir.join(format!("{stem}.{}", cli.ext));
                std::fs::write(&out_path, &result).unwrap_or_else(|e| {
                    eprintln!("Error writing {}: {e}", out_path.display());
                    std::process::exit(1);
                });
                eprintln!("{} -> {}", file.display(), out_path.display());
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Read text -> tokenize -> parse -> write result, or exit with a located error.
fn process_or_exit(input: &str, config: &Config, format: Format, source: &str) -> String {
    let result = match format {
        Format::Markup => ecsl_core::format(input, config),
        Format::Json => ecsl_core::parse_str(input, &config.parser).map(|doc| {
            let mut json = serde_json::to_string_pretty(&doc).unwrap_or_else(|e| {
                eprintln!("Error encoding {source} as JSON: {e}");
                std::process::exit(1);
            });
            json.push('\n');
            json
        }),
    };
    result.unwrap_or_else(|e| {
        let (line, column) = location(input, e.offset());
        eprintln!("{source}:{line}:{column}: {e}");
        std::process::exit(1);
    })
}

fn read_file(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        std::process::exit(1);
    })
}

fn write_output(content: &str, output: Option<&Path>) {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            std::fs::write(path, content).unwrap_or_else(|e| {
                eprintln!("Error writing {}: {e}", path.display());
                std::process::exit(1);
            });
        }
        None => {
            io::stdout().write_all(content.as_bytes()).unwrap_or_else(|e| {
                eprintln!("Error writing stdout: {e}");
                std::process::exit(1);
            });
        }
    }
}

fn collect_ecsl_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            if let Ok(entries) = std::fs::read_dir(input) {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) == Some("ecsl") {
                        files.push(path);
                    }
                }
            }
        } else {
            files.push(input.clone());
        }
    }
    files.sort();
    files
}
