use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use drive_image_bot::bot::poller::UpdatePoller;
use drive_image_bot::config::BotConfig;
use drive_image_bot::infrastructure::{database, drive, logging, telegram};
use drive_image_bot::services::catalog::CatalogStore;
use drive_image_bot::services::executor::{Executor, RetryPolicy};
use drive_image_bot::{AppState, Bot, BotSettings, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Webhook when a public URL is configured, polling otherwise
    Auto,
    Polling,
    Webhook,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// How updates are delivered
    #[arg(short, long, value_enum, default_value_t = Mode::Auto)]
    mode: Mode,

    /// Port for the webhook server (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment, configuration & logging
    dotenv().ok();
    let args = Args::parse();

    let mut config = BotConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }

    logging::init_tracing(&config.log_file)
        .with_context(|| format!("cannot open log file {}", config.log_file))?;

    info!("🚀 Starting Drive Image Bot [Mode: {:?}]...", args.mode);

    config.validate().context("invalid configuration")?;

    // 2. Local catalog
    let db = database::setup_database(&config).await?;
    let executor = Executor::new(
        db,
        RetryPolicy {
            max_attempts: config.max_retries,
            backoff_unit: config.retry_backoff(),
        },
    );
    let catalog = CatalogStore::new(executor);

    // 3. Remote collaborators
    let drive_client = drive::setup_drive(&config)?;
    let telegram_client = telegram::setup_telegram(&config);

    let bot = Arc::new(Bot::new(
        catalog,
        drive_client,
        telegram_client.clone(),
        BotSettings {
            admin_id: config.admin_id,
            folder_id: config.folder_id.clone(),
        },
    ));

    // 4. Delivery
    let mode = match (args.mode, config.webhook_url.is_some()) {
        (Mode::Auto, true) | (Mode::Webhook, true) => Mode::Webhook,
        (Mode::Webhook, false) => bail!("webhook mode needs WEBHOOK_URL or RENDER_EXTERNAL_URL"),
        _ => Mode::Polling,
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    match (mode, config.webhook_url.as_deref()) {
        (Mode::Webhook, Some(base_url)) => {
            let webhook_url = format!("{}/{}", base_url, config.telegram_bot_token);
            telegram_client
                .set_webhook(&webhook_url, true)
                .await
                .context("setWebhook failed")?;
            info!("🔗 Webhook registered at {}/<token>", base_url);

            let state = AppState {
                bot,
                webhook_secret: config.telegram_bot_token.clone(),
            };

            let trace_layer = TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    // The path carries the bot token; keep it out of the logs
                    tracing::info_span!("http_request", method = %request.method())
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                );

            let app = create_app(state).layer(trace_layer);
            let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
            let listener = tokio::net::TcpListener::bind(addr).await?;

            info!("✅ Webhook server listening on: http://0.0.0.0:{}", config.port);

            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
            {
                error!("❌ Server runtime error: {}", e);
            }
            let _ = shutdown_tx.send(true);
        }
        _ => {
            let poller = UpdatePoller::new(
                bot,
                telegram_client,
                config.poll_timeout_secs,
                shutdown_rx,
            );
            let mut poller_handle = tokio::spawn(poller.run());

            // A poller that dies on its own (e.g. deleteWebhook failing at
            // boot) takes the process down with it
            tokio::select! {
                res = &mut poller_handle => {
                    match res {
                        Ok(Ok(())) => bail!("poller stopped unexpectedly"),
                        Ok(Err(e)) => return Err(e.context("polling failed")),
                        Err(e) => return Err(anyhow::Error::new(e).context("poller task failed")),
                    }
                }
                _ = shutdown_signal() => {
                    let _ = shutdown_tx.send(true);
                    match poller_handle.await {
                        Ok(Err(e)) => error!("❌ Poller stopped with error: {}", e),
                        Err(e) => error!("❌ Poller task failed: {}", e),
                        Ok(Ok(())) => {}
                    }
                }
            }
        }
    }

    info!("👋 Drive Image Bot exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("🛑 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
