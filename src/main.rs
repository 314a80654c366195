use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use readeo::{cli, config, error, types::EntityKind};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the reference remote store
    Serve,

    /// Rebuild the local cache from the remote store
    Import(ImportOptions),

    /// List cached records
    List(ListOptions),

    /// Compare local and remote record counts
    Info,

    /// Check credentials against the remote store
    Login(LoginOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ImportOptions {
    /// Only import this collection (referenced collections are not imported)
    #[clap(value_enum)]
    pub kind: Option<EntityKind>,

    /// Records per page, defaults to READEO_PAGE_SIZE
    #[clap(long)]
    pub page_size: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListOptions {
    #[clap(value_enum)]
    pub kind: EntityKind,

    /// Only show records whose name contains this text
    #[clap(long)]
    pub search: Option<String>,

    /// Print JSON instead of a table
    #[clap(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct LoginOptions {
    #[clap(long)]
    pub email: String,

    #[clap(long, env = "READEO_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("readeo=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve().await,
        Command::Import(opt) => {
            cli::import(opt.kind, opt.page_size.unwrap_or_else(config::page_size)).await
        }
        Command::List(opt) => cli::list(opt.kind, opt.search, opt.json),
        Command::Info => cli::info().await,
        Command::Login(opt) => cli::login(&opt.email, &opt.password).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
