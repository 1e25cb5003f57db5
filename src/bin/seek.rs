use anyhow::{Context, Result};
use clap::Parser;
use seekcoder::api::ApiClient;
use seekcoder::app::App;
use seekcoder::config::Config;
use seekcoder::logging::init_tracing;
use seekcoder::state::{ConversationDriver, Session};

#[derive(Parser)]
#[command(name = "seek")]
#[command(about = "Terminal coding assistant for DeepSeek-compatible chat models")]
#[command(version)]
struct Cli {
    /// Model name (overrides DEEPSEEK_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Chat completions endpoint (overrides DEEPSEEK_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Resolve relative tool paths against this directory
    #[arg(long, value_name = "DIR")]
    base_dir: Option<String>,

    /// Do not stage files after create/edit
    #[arg(long)]
    no_staging: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load()?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if cli.no_staging {
        config.skip_staging = true;
    }
    config.validate()?;
    tracing::debug!(model = %config.model, url = %config.api_url, "configuration loaded");

    let mut session = Session::probe(config.working_dir.clone(), config.skip_staging);
    if let Some(base_dir) = cli.base_dir.as_deref() {
        session
            .paths
            .set_base_dir(base_dir)
            .with_context(|| format!("invalid --base-dir '{base_dir}'"))?;
    }

    let client = ApiClient::new(&config)?;
    let driver = ConversationDriver::new(
        client,
        session,
        config.max_history_messages,
        config.max_context_files,
    );

    let mut app = App::new(driver)?;
    app.run().await?;

    Ok(())
}
