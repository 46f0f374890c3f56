//! Repoflat CLI - Flatten a repository into one LLM-ready document.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::info;
use repoflat::comments::{strip_comments, syntax_family_of, SyntaxFamily};
use repoflat::config::{DumpOptions, DEFAULT_MAX_SIZE, TOKEN_ENV};
use repoflat::dump::{Dump, Repoflat};
use repoflat::errors::{exit_code, RepoflatError};
use repoflat::loader::load_text;
use repoflat::output::{write_split, OutputFormat};
use repoflat::remote::download_repo;
use repoflat::tokens::Encoding;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "repoflat")]
#[command(about = "Flatten a repository into one LLM-ready document")]
#[command(version)]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump a local directory or remote repository
    Dump(DumpArgs),

    /// Print a file with its comments removed
    Strip {
        /// File to strip
        file: PathBuf,

        /// Syntax family (detected from the extension by default)
        #[arg(long)]
        family: Option<SyntaxFamily>,
    },

    /// Show syntax families and their extensions
    Languages {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8000")]
        bind: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args)]
struct DumpArgs {
    /// Local directory to dump
    path: Option<PathBuf>,

    /// Git repository URL to download instead of PATH
    #[arg(long)]
    remote_url: Option<String>,

    /// Token for private repositories
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    private_token: Option<String>,

    /// Glob(s) to include; a directory name includes everything below it
    #[arg(long, default_value = "*")]
    include: Vec<String>,

    /// Glob(s) to exclude; `.git/` is excluded by default
    #[arg(long)]
    exclude: Vec<String>,

    /// Skip files larger than this many bytes
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE)]
    max_size: u64,

    /// Hard token cap; the largest files are dropped first
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Split output into files of about N tokens each (requires --outfile)
    #[arg(long)]
    split: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: FormatArg,

    /// Only reject files containing NUL bytes
    #[arg(long)]
    no_binary_strict: bool,

    /// Strip code comments from output
    #[arg(long)]
    exclude_comments: bool,

    /// Do not respect .gitignore rules
    #[arg(long)]
    not_ignore: bool,

    /// Do not print the dump to stdout
    #[arg(long)]
    no_stdout: bool,

    /// Write the dump to this file
    #[arg(long)]
    outfile: Option<PathBuf>,

    /// Tokenizer used for token counts
    #[arg(long, value_enum, default_value = "cl100k")]
    encoding: EncodingArg,
}

#[derive(Clone, ValueEnum)]
enum FormatArg {
    Text,
    Json,
    Html,
}

#[derive(Clone, ValueEnum)]
enum EncodingArg {
    Cl100k,
    O200k,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Html => OutputFormat::Html,
        }
    }
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Cl100k => Encoding::Cl100kBase,
            EncodingArg::O200k => Encoding::O200kBase,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let json_output = json_flag(&cli.command);

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let result = match cli.command {
        Commands::Dump(args) => run_dump(args),
        Commands::Strip { file, family } => run_strip(file, family),
        Commands::Languages { json } => run_languages(json),
        Commands::Serve { bind } => run_serve(&bind),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "repoflat", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

fn json_flag(cmd: &Commands) -> bool {
    match cmd {
        Commands::Dump(args) => matches!(args.format, FormatArg::Json),
        Commands::Languages { json } => *json,
        Commands::Strip { .. } | Commands::Serve { .. } | Commands::Completions { .. } => false,
    }
}

// --- Dump command ---

enum Source {
    Local(PathBuf),
    Remote(String),
}

fn run_dump(mut args: DumpArgs) -> Result<(), RepoflatError> {
    let source = match (args.path.take(), args.remote_url.take()) {
        (Some(path), None) => Source::Local(path),
        (None, Some(url)) => Source::Remote(url),
        (Some(_), Some(_)) => {
            return Err(RepoflatError::Usage(
                "--remote-url cannot be used with PATH".to_string(),
            ))
        }
        (None, None) => {
            return Err(RepoflatError::Usage(
                "PATH or --remote-url required".to_string(),
            ))
        }
    };
    if args.split == Some(0) {
        return Err(RepoflatError::Usage(
            "--split must be a positive integer".to_string(),
        ));
    }
    if args.split.is_some() && args.outfile.is_none() {
        return Err(RepoflatError::Usage("--split requires --outfile".to_string()));
    }

    let options = DumpOptions {
        include: args.include,
        exclude: args.exclude,
        max_size: args.max_size,
        max_tokens: args.max_tokens,
        format: args.format.into(),
        binary_strict: !args.no_binary_strict,
        exclude_comments: args.exclude_comments,
        respect_gitignore: !args.not_ignore,
        private_token: args.private_token,
        encoding: args.encoding.into(),
    };

    let dump = match source {
        Source::Local(path) => {
            if !path.exists() {
                return Err(RepoflatError::PathNotFound(path));
            }
            Repoflat::new(path).options(options.clone()).build()?
        }
        Source::Remote(url) => {
            let checkout = download_repo(&url, options.private_token.as_deref())?;
            Repoflat::new(checkout.root()).options(options.clone()).build()?
        }
    };

    write_dump(&dump, &options, args.split, args.outfile, !args.no_stdout)
}

fn write_dump(
    dump: &Dump,
    options: &DumpOptions,
    split: Option<usize>,
    outfile: Option<PathBuf>,
    to_stdout: bool,
) -> Result<(), RepoflatError> {
    if let (Some(split), Some(outfile)) = (split, &outfile) {
        let parts = dump.render_split(split, options.format)?;
        let dir = outfile
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let written = write_split(dir, &parts)?;
        for path in written {
            if to_stdout {
                println!("Written {}", path.display());
            }
        }
        return Ok(());
    }

    let output = dump.render(options.format)?;
    if let Some(outfile) = outfile {
        fs::write(&outfile, &output)?;
        info!("wrote {} ({} tokens)", outfile.display(), dump.total_tokens);
    }
    if to_stdout {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        if !output.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

// --- Strip command ---

fn run_strip(file: PathBuf, family: Option<SyntaxFamily>) -> Result<(), RepoflatError> {
    if !file.exists() {
        return Err(RepoflatError::PathNotFound(file));
    }
    let text = load_text(&file)?;
    let family = family.unwrap_or_else(|| syntax_family_of(&file));
    print!("{}", strip_comments(&text, family));
    Ok(())
}

// --- Languages command ---

#[derive(Serialize)]
struct FamilyInfo {
    name: String,
    extensions: Vec<String>,
}

fn run_languages(json: bool) -> Result<(), RepoflatError> {
    let families: Vec<FamilyInfo> = SyntaxFamily::all()
        .iter()
        .map(|family| FamilyInfo {
            name: family.to_string(),
            extensions: family
                .extensions()
                .iter()
                .map(|e| format!(".{}", e))
                .collect(),
        })
        .collect();

    if json {
        #[derive(Serialize)]
        struct Output {
            families: Vec<FamilyInfo>,
        }
        let output = Output { families };
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| RepoflatError::Io(std::io::Error::other(e.to_string())))?;
        println!("{json}");
    } else {
        println!("Syntax families:");
        for family in &families {
            println!("  {:10} {}", family.name, family.extensions.join(", "));
        }
    }

    Ok(())
}

// --- Serve command ---

fn run_serve(bind: &str) -> Result<(), RepoflatError> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(repoflat::server::serve(bind))?;
    Ok(())
}
