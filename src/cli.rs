use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "coach-learn",
    version,
    about = "Learn which files change together from git history",
    after_help = "Filter arguments are handed to `git rev-list` unchanged \
                  (default: --all). For example:\n  \
                  coach-learn origin/main --max-count=5000\n\n\
                  Put filters that share a name with an option of this tool \
                  (--pretty, --debug, --config) after `--`:\n  \
                  coach-learn -- --pretty=oneline HEAD"
)]
pub struct Cli {
    /// Pretty-print the JSON summary (default: compact)
    #[arg(long)]
    pub pretty: bool,

    /// Enable debug logging to file
    #[arg(long)]
    pub debug: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Write a default configuration file (at --config or the default path) and exit
    #[arg(long)]
    pub init_config: bool,

    /// Arguments passed through to `git rev-list`
    #[arg(
        value_name = "FILTER",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub filters: Vec<String>,
}
