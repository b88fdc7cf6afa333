//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Use this directory for project configuration
//! - `--debug`: Trace the build pipeline on stderr
//! - `--quiet` / `-q`: Suppress warnings
//! - `--format raw|mime`: How generated scripts are written

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::display::OutputFormat;

/// cellscript - Run notebook JavaScript with host variables behind a RequireJS gate
#[derive(Parser, Debug)]
#[command(name = "cellscript")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if cellscript was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Suppress warnings
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format for generated scripts
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Raw)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Options shared by the script commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ScriptArgs {
    /// Required library (repeatable, or comma-separated); defaults to the
    /// project's `require` list, else every linked library
    #[arg(long = "require", value_name = "NAME", value_delimiter = ',')]
    pub require: Vec<String>,

    /// JSON object file used as the session namespace
    #[arg(long = "ns", value_name = "FILE")]
    pub namespace_file: Option<PathBuf>,

    /// Session variable; VALUE is JSON, or taken as a string if it does not parse
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Explicit binding, embedded even if excluded by the filters
    #[arg(long = "bind", value_name = "NAME=VALUE")]
    pub bindings: Vec<String>,

    /// Never embed this variable unless bound explicitly (repeatable)
    #[arg(long = "blacklist", value_name = "NAME")]
    pub blacklist: Vec<String>,

    /// Embed `_`-prefixed variables
    #[arg(long)]
    pub allow_private: bool,

    /// Fail on placeholders with no value instead of leaving them in place
    #[arg(long)]
    pub strict: bool,

    /// Warn about variables that cannot be embedded
    #[arg(long)]
    pub warnings: bool,

    /// Placeholder delimiter: two identical punctuation characters
    #[arg(long, value_name = "DELIM")]
    pub delimiter: Option<String>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a script from a cell body
    #[command(
        name = "cell",
        long_about = "Build an executable script from a cell body.\n\n\
            The body is read from FILE, or from stdin when FILE is omitted. \
            Placeholders such as $$data or $${data} are replaced with the JSON \
            value of the matching variable, and the script only runs once every \
            required library has been loaded.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Embed a variable and wait for d3
    echo 'd3.select(element.get(0)).text($$title)' | cellscript cell --var title='\"Hi\"' --require d3

    # Use a namespace exported from the kernel
    cellscript cell chart.js --ns session.json

    # Fail instead of leaving $$missing in the output
    cellscript cell chart.js --strict"
    )]
    Cell {
        /// Script file (stdin if omitted)
        file: Option<PathBuf>,

        #[command(flatten)]
        args: ScriptArgs,
    },

    /// Build a script from a single line
    #[command(
        name = "line",
        long_about = "Build an executable script from a single line.\n\n\
            Unlike `cell`, the line form also sees local variables given with \
            --local, which take precedence over session variables."
    )]
    Line {
        /// The script line
        script: String,

        /// Local variable, layered over the session namespace
        #[arg(long = "local", value_name = "NAME=VALUE")]
        locals: Vec<String>,

        #[command(flatten)]
        args: ScriptArgs,
    },

    /// Link a library and print the loader configuration
    #[command(
        name = "require",
        after_help = "\
WORKFLOW EXAMPLES:
    # Link topojson for this invocation only
    cellscript require topojson https://unpkg.com/topojson@3

    # Link it for every invocation in this project
    cellscript require topojson https://unpkg.com/topojson@3 --save"
    )]
    Require {
        /// Library name as used in scripts
        name: String,

        /// Location without the `.js` extension
        path: String,

        /// Also record the library in the project configuration
        #[arg(long)]
        save: bool,
    },

    /// List linked libraries
    Libraries {
        /// Print the loader configuration script instead
        #[arg(long)]
        script: bool,
    },

    /// Link a stylesheet into the page
    #[command(name = "link-css")]
    LinkCss {
        /// Stylesheet URL
        href: String,
    },

    /// Link a script into the page
    #[command(name = "link-js")]
    LinkJs {
        /// Script URL
        src: String,
    },

    /// Add an inline style element to the page
    #[command(name = "load-style")]
    LoadStyle {
        /// CSS file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Add an inline script element to the page
    #[command(name = "load-script")]
    LoadScript {
        /// JavaScript file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Enable JavaScript highlighting for %%MAGIC cells
    Highlight {
        /// Cell magic name
        #[arg(default_value = "d3")]
        magic: String,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        after_help = "\
KEYS:
    warnings, delimiter, safe_substitute
    sanitize.allow_private, sanitize.blacklist, sanitize.max_value_bytes
    libraries.<name>
    require (project only)"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    cellscript completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    cellscript completion zsh >> ~/.zshrc

    # Fish
    cellscript completion fish > ~/.config/fish/completions/cellscript.fish

    # PowerShell
    cellscript completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get an effective configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
        /// Write the project config instead of the global one
        #[arg(long)]
        project: bool,
    },
    /// List effective configuration values
    List,
    /// Show configuration file locations
    Path,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
