use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "tfbump",
    about = "Bump pinned Terraform module versions and provider user-agent versions in place",
    version
)]
pub struct Cli {
    /// Directory to scan for Terraform files (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Configuration file (defaults to .tfbump.toml in the scan directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report the edits that would be made without writing any file
    #[arg(long)]
    pub dry_run: bool,

    /// Never move a module pin to a pre-release version
    #[arg(long)]
    pub stable_only: bool,

    /// Reformat edited files with the canonical HCL formatter (drops comments)
    #[arg(long)]
    pub format: bool,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["tfbump"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("."));
        assert!(!cli.dry_run);
        assert!(!cli.format);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "tfbump",
            "--path",
            "infra",
            "--dry-run",
            "--stable-only",
            "--format",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.path, PathBuf::from("infra"));
        assert!(cli.dry_run && cli.stable_only && cli.format && cli.verbose);
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["tfbump", "--interactive"]).is_err());
    }
}
