pub mod inspect;
pub mod score;
pub mod solve;

/// Output format shared by every subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Text,
    Json,
}
