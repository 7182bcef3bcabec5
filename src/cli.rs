use clap::Parser;

use crate::config::{ArchiveConfig, LayoutVersion};

#[derive(Parser, Debug)]
#[command(name = "zipguard")]
#[command(version)]
#[command(about = "Inspect, test and extract ZIP/APK archives with strict consistency checks", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipguard -t app.apk              test every entry, fail on any inconsistency\n  \
  zipguard app.apk -x META-INF     extract all files except META-INF/*\n  \
  zipguard -p app.apk AndroidManifest.xml | xxd   dump one entry")]
pub struct Cli {
    /// ZIP or APK file path
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Test archive: read every entry and check sizes and CRCs
    #[arg(short = 't')]
    pub test: bool,

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

    /// Header field layout used to decode the archive
    #[arg(long, value_enum, default_value_t = LayoutVersion::Appnote)]
    pub layout: LayoutVersion,

    /// Do not compare local header names with the central directory
    #[arg(long)]
    pub no_name_check: bool,

    /// Accept data before the first local header (self-extracting archives)
    #[arg(long)]
    pub allow_prefix: bool,

    /// Skip length and CRC-32 verification of entry data
    #[arg(long)]
    pub no_crc: bool,

    /// Memory-map the archive instead of reading through a file handle
    #[arg(long)]
    pub mmap: bool,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    pub fn archive_config(&self) -> ArchiveConfig {
        ArchiveConfig::default()
            .with_layout(self.layout)
            .with_local_name_check(!self.no_name_check)
            .with_local_header_at_start(!self.allow_prefix)
            .with_checksums(!self.no_crc)
    }

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.is_quiet() { "error" } else { "warn" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from([
            "zipguard",
            "--layout",
            "legacy",
            "--no-name-check",
            "--allow-prefix",
            "app.apk",
        ]);
        let config = cli.archive_config();
        assert_eq!(config.layout, LayoutVersion::Legacy);
        assert!(!config.cross_check_local_names);
        assert!(!config.require_local_header_at_start);
        assert!(config.verify_checksums);
    }

    #[test]
    fn defaults_are_strict() {
        let cli = Cli::parse_from(["zipguard", "-t", "app.apk"]);
        assert_eq!(cli.archive_config(), ArchiveConfig::default());
        assert!(cli.test);
        assert_eq!(cli.log_filter(), "warn");
    }
}
