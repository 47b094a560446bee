use std::path::PathBuf;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "askchat")]
#[command(version, about = "Chat with an answer service from the terminal")]
pub struct Cli {
    /// Answer service URL (overrides config file and ASKCHAT_ENDPOINT)
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where to write the log
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}
