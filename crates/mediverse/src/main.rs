mod app;
mod config;
mod handlers;
mod mail;
mod state;
mod storage;
mod uploads;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use listenfd::ListenFd;
use mediverse_auth::{hash_password, AuthConfig, AuthState, SqliteSessionStore};
use mediverse_core::{
    auth::normalize_email,
    clinic::{Role, User},
    notify::Mailer,
    storage::UserRepository,
};
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    app::create_app,
    config::{AdminBootstrap, Config},
    mail::{LogMailer, SmtpMailer},
    state::AppState,
    storage::SqliteRepository,
    uploads::UploadStore,
};

/// MediVerse - Book appointments, write reports and chat with your doctor
#[derive(Parser, Debug)]
#[command(name = "mediverse")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediverse=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let repo = SqliteRepository::new(&config.sqlite_path).await?;
    tracing::info!(path = %config.sqlite_path, "Clinic database ready");

    let sessions = SqliteSessionStore::connect(&config.session_db_path).await?;
    sessions.migrate().await?;
    tracing::info!(path = %config.session_db_path, "Session store ready");

    let auth = AuthState::new(
        Arc::new(sessions),
        Arc::new(repo.clone()),
        AuthConfig::from_env(),
    );

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "Sending mail through SMTP");
            Arc::new(SmtpMailer::new(smtp, &config.mail_from)?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, notification emails are only logged");
            Arc::new(LogMailer)
        }
    };

    let uploads = UploadStore::new(&config.upload_dir, config.max_upload_bytes);
    uploads.init().await?;

    if let Some(admin) = &config.admin {
        bootstrap_admin(&repo, admin).await?;
    }

    let state = AppState::new(repo, auth, mailer, uploads);

    // Build the application router
    let app = create_app(state);

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Creates the configured admin account unless the email is already taken.
async fn bootstrap_admin(repo: &SqliteRepository, admin: &AdminBootstrap) -> Result<()> {
    let email = normalize_email(&admin.email);

    if let Some(existing) = repo.get_user_by_email(&email).await? {
        if existing.role != Role::Admin {
            tracing::warn!(email = %email, role = %existing.role, "ADMIN_EMAIL belongs to a non-admin account");
        }
        return Ok(());
    }

    let user = User::new_patient("Administrator", email, hash_password(&admin.password)?)
        .with_role(Role::Admin);
    repo.create_user(&user).await?;
    tracing::info!(user_id = %user.id, email = %user.email, "Admin account created");
    Ok(())
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
