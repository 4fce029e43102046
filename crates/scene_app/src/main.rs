use clap::Parser;

mod platform;

fn main() -> anyhow::Result<()> {
    platform::app::run(platform::config::Cli::parse())
}
