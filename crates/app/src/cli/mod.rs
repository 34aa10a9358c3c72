use clap::{Parser, Subcommand};

mod demo;

#[derive(Debug, Parser)]
#[command(name = "harvest-app", about = "Harvest CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Walk a buyer through cart, bundle pricing and checkout over an
    /// in-memory store
    Demo(demo::DemoArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Demo(args) => demo::run(args).await,
        }
    }
}
