use clap::Parser;

fn main() -> anyhow::Result<()> {
    giturl::init();

    let cli = giturl::cli::Cli::parse();
    cli.run()
}
