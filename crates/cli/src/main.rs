mod config;

use {
    clap::{Parser, Subcommand},
    qqbot::{MessageTarget, QqBotAccountConfig, QqBotClient, SendResult},
    secrecy::Secret,
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "qqbot", about = "QQ bot API client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (TOML or JSON). Defaults to ./qqbot.toml when present.
    #[arg(long, global = true, env = "QQBOT_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Account name from the config file.
    #[arg(long, global = true, env = "QQBOT_ACCOUNT")]
    account: Option<String>,

    /// App id; bypasses the config file together with `--client-secret`.
    #[arg(long, global = true, env = "QQBOT_APP_ID")]
    app_id: Option<String>,

    /// App secret; bypasses the config file together with `--app-id`.
    #[arg(long, global = true, env = "QQBOT_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Use the sandbox API.
    #[arg(long, global = true, default_value_t = false)]
    sandbox: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an access token and print it.
    Token,
    /// Print the WebSocket gateway URL.
    Gateway,
    /// Send a text message.
    SendText {
        /// Target: `c2c:<openid>`, `group:<openid>`, `channel:<id>` or a bare openid.
        #[arg(long)]
        to: String,
        #[arg(long)]
        text: String,
        /// Inbound message id to reply to; omit for a proactive message.
        #[arg(long)]
        reply_to: Option<String>,
    },
    /// Upload an image and send it.
    SendImage {
        #[arg(long)]
        to: String,
        /// Image URL, `data:` URI, or base64 payload.
        #[arg(long)]
        image: String,
        #[arg(long)]
        caption: Option<String>,
        #[arg(long)]
        reply_to: Option<String>,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Resolve the account from flags/env, falling back to the config file.
fn resolve_account(cli: &Cli) -> anyhow::Result<(String, QqBotAccountConfig)> {
    if let (Some(app_id), Some(secret)) = (&cli.app_id, &cli.client_secret) {
        let config = QqBotAccountConfig {
            app_id: app_id.clone(),
            client_secret: Secret::new(secret.clone()),
            sandbox: cli.sandbox,
            ..Default::default()
        };
        return Ok((app_id.clone(), config));
    }

    let path = cli
        .config
        .clone()
        .or_else(config::find_config_file)
        .ok_or_else(|| {
            anyhow::anyhow!("no credentials: pass --app-id/--client-secret or --config")
        })?;
    debug!(path = %path.display(), "loading config");
    let (name, mut account) = config::load_config(&path)?.account(cli.account.as_deref())?;
    account.sandbox |= cli.sandbox;
    Ok((name, account))
}

fn print_result(result: &SendResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let (account_id, config) = resolve_account(&cli)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        account_id = %account_id,
        sandbox = config.sandbox,
        "qqbot starting"
    );
    let client = QqBotClient::new(config)?;

    match cli.command {
        Commands::Token => {
            println!("{}", client.access_token().await?);
        },
        Commands::Gateway => {
            println!("{}", client.gateway_url().await?);
        },
        Commands::SendText { to, text, reply_to } => {
            let target: MessageTarget = to.parse()?;
            let result = client
                .send_text(&target, &text, reply_to.as_deref())
                .await?;
            print_result(&result)?;
        },
        Commands::SendImage {
            to,
            image,
            caption,
            reply_to,
        } => {
            let target: MessageTarget = to.parse()?;
            let result = client
                .send_image(&target, &image, caption.as_deref(), reply_to.as_deref())
                .await?;
            print_result(&result)?;
        },
    }

    Ok(())
}
