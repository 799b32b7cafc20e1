//! activity-stream: live view over the per-component activity logs
//!
//! Usage:
//!   activity-stream                  → full-screen dashboard, all components
//!   activity-stream --type ml        → dashboard for one component
//!   activity-stream -v [--type X]    → plain-text tail of new records

use activity_stream::{run_dashboard, run_tail, Config};
use activity_stream_core::{Component, StreamFilter};
use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(
    name = "activity-stream",
    about = "Live activity stream over the component activity logs",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Which component's activity to show
    #[arg(long = "type", value_enum, default_value_t = StreamType::All)]
    stream_type: StreamType,

    /// Print new records as plain text instead of the dashboard
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StreamType {
    All,
    Cognitive,
    Sensory,
    Ml,
    Browser,
    Terminal,
    Personality,
    Emergency,
}

impl From<StreamType> for StreamFilter {
    fn from(t: StreamType) -> Self {
        let only = StreamFilter::Only;
        match t {
            StreamType::All => StreamFilter::All,
            StreamType::Cognitive => only(Component::Cognitive),
            StreamType::Sensory => only(Component::Sensory),
            StreamType::Ml => only(Component::Ml),
            StreamType::Browser => only(Component::Browser),
            StreamType::Terminal => only(Component::Terminal),
            StreamType::Personality => only(Component::Personality),
            StreamType::Emergency => only(Component::Emergency),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // logged by the selected mode once its subscriber is up
    let (config, origin) = Config::discover();
    let filter = StreamFilter::from(cli.stream_type);

    if cli.verbose {
        run_tail(config, origin, filter).await
    } else {
        run_dashboard(config, origin, filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_to_dashboard_for_all() {
        let cli = Cli::parse_from(["activity-stream"]);
        assert_eq!(cli.stream_type, StreamType::All);
        assert!(!cli.verbose);
    }

    #[test]
    fn type_and_verbose_flags() {
        let cli = Cli::parse_from(["activity-stream", "--type", "ml", "-v"]);
        assert_eq!(StreamFilter::from(cli.stream_type), StreamFilter::Only(Component::Ml));
        assert!(cli.verbose);
    }

    #[test]
    fn unknown_type_rejected() {
        assert!(Cli::try_parse_from(["activity-stream", "--type", "audio"]).is_err());
    }

    #[test]
    fn every_component_has_a_type() {
        for c in Component::ALL {
            let cli = Cli::parse_from(["activity-stream", "--type", c.as_str()]);
            assert_eq!(StreamFilter::from(cli.stream_type), StreamFilter::Only(c));
        }
    }
}
