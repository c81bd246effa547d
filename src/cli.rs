use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub overrides: ConfigArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings that override config.yaml and the environment.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Newsletter catalog (JSON array of {title, description})
    #[clap(long, global = true)]
    pub catalog: Option<String>,

    /// Number of recommendations to return
    #[clap(long, global = true)]
    pub top_k: Option<usize>,

    /// Embedding model name
    #[clap(long, global = true)]
    pub model: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Port to listen on [env: PORT]
        #[clap(short, long)]
        port: Option<u16>,

        /// Don't embed the catalog until the first request
        #[clap(long, default_value = "false")]
        lazy: bool,
    },

    /// Print recommendations for a query and exit
    Recommend {
        /// Free-text description of what you'd like to read
        query: String,
    },
}
