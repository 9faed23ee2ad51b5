//! CLI tool for composing, extracting and patching ISO9660 images.

mod commands;
mod exit_codes;
mod logger;
mod output;
mod progress;

use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use exit_codes::ExitCode;

/// ISO9660 image tool
#[derive(Parser)]
#[command(name = "iso-archiver")]
#[command(author, version, about = "Compose, extract and patch ISO9660 images", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress progress output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new image from the content of a directory
    #[command(alias = "c")]
    Create {
        /// Path of the new image
        #[arg(long)]
        out: PathBuf,

        /// Directory whose files are added
        #[arg(long)]
        base_dir: PathBuf,

        /// Authoring options, e.g. volume-id=DATA,!rockridge
        #[arg(long, value_delimiter = ',')]
        options: Vec<String>,
    },

    /// Extract the regular files of an image (alias: x)
    #[command(alias = "x")]
    Extract {
        /// Image to extract
        #[arg(long)]
        source: PathBuf,

        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },

    /// Copy an image and add the files of a directory (alias: p)
    #[command(alias = "p")]
    Patch {
        /// Path of the source image
        #[arg(long)]
        source: PathBuf,

        /// Path of the patched image
        #[arg(long)]
        out: PathBuf,

        /// Directory whose files are added
        #[arg(long)]
        base_dir: PathBuf,

        /// Authoring options, e.g. boot=isolinux/isolinux.bin,boot-info-table
        #[arg(long, value_delimiter = ',')]
        options: Vec<String>,

        /// Leave out source entries that an added file replaces
        #[arg(long)]
        replace: bool,
    },

    /// List image contents (alias: l)
    #[command(alias = "l")]
    List {
        /// Image to list
        archive: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn main() {
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted");
        std::process::exit(exit_codes::USER_INTERRUPT);
    })
    .ok();

    let cli = Cli::parse();
    logger::init(cli.verbose);

    let exit_code = match cli.command {
        Commands::Create {
            out,
            base_dir,
            options,
        } => commands::create(&commands::CreateConfig {
            out: &out,
            base_dir: &base_dir,
            options: &options,
            format: cli.format,
            quiet: cli.quiet,
        }),

        Commands::Extract { source, out } => {
            commands::extract(&source, &out, cli.format, cli.quiet)
        }

        Commands::Patch {
            source,
            out,
            base_dir,
            options,
            replace,
        } => commands::patch(&commands::PatchConfig {
            source: &source,
            out: &out,
            base_dir: &base_dir,
            options: &options,
            replace,
            format: cli.format,
            quiet: cli.quiet,
        }),

        Commands::List { archive } => commands::list(&archive, cli.format),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
