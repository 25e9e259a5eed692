use anyhow::Context;
use clap::Parser;
use gotour_cli::{commands, App, Cli};
use gotour_store::app_config::Config;
use gotour_store::NotificationLevel;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gotour_cli=info,gotour_order=info,gotour_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load config")?;
    let app = App::new(&config, cli.token.clone(), cli.locale).context("Failed to build API client")?;

    // Toasts go to stderr so stdout stays parseable
    let mut notifications = app.notifier.subscribe();
    tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(n) => {
                    let tag = match n.level {
                        NotificationLevel::Success => "ok",
                        NotificationLevel::Info => "info",
                        NotificationLevel::Warning => "warn",
                        NotificationLevel::Error => "error",
                    };
                    eprintln!("[{}] {}", tag, n.message);
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut stdout = std::io::stdout();
    if let Err(e) = commands::run(&app, cli.command, &mut stdout).await {
        tracing::debug!("Command failed: {:?}", e);
        eprintln!("{}", e.message(app.locale));
        std::process::exit(e.exit_code());
    }
    Ok(())
}
