use clap::Parser;

use crate::zip::OverwriteMode;

#[derive(Parser, Debug)]
#[command(name = "scanzip")]
#[command(version)]
#[command(about = "A recovery-oriented unzip that scans for local file headers", long_about = None)]
#[command(after_help = "Examples:\n  \
  scanzip damaged.zip -d out         recover everything readable into out/\n  \
  scanzip data1.zip -x joe           extract all files except joe from data1.zip\n  \
  scanzip -p foo.zip | more          send contents of foo.zip via pipe into more\n  \
  scanzip -v https://example.com/archive.zip   list a remote ZIP with true sizes")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely with sizes found by decoding each entry
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    pub fn overwrite_mode(&self) -> OverwriteMode {
        if self.never_overwrite {
            OverwriteMode::Never
        } else if self.overwrite {
            OverwriteMode::Always
        } else {
            OverwriteMode::Ask
        }
    }

    /// Default log filter for the binary; `RUST_LOG` takes precedence
    pub fn log_level(&self) -> &'static str {
        if self.is_very_quiet() { "error" } else { "warn" }
    }
}
