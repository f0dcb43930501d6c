//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::services::{
    AuthService, AuthServiceImpl, ChatService, ChatServiceImpl, RoomService, RoomServiceImpl,
    UserService, UserServiceImpl,
};
use crate::config::Settings;
use crate::domain::{MessageRepository, RoomRepository, UserRepository};
use crate::infrastructure::database;
use crate::infrastructure::email::{OtpMailer, SmtpMailer};
use crate::infrastructure::repositories::{
    PgMessageRepository, PgRoomRepository, PgUserRepository,
};
use crate::presentation::http::handlers::health;
use crate::presentation::http::routes;
use crate::presentation::middleware::{cors, logging};
use crate::presentation::websocket::Gateway;
use crate::shared::snowflake::SnowflakeGenerator;

/// Store access used by the services
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub messages: Arc<dyn MessageRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            rooms: Arc::new(PgRoomRepository::new(pool.clone())),
            messages: Arc::new(PgMessageRepository::new(pool)),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub gateway: Arc<Gateway>,
    pub settings: Arc<Settings>,
    pub auth: Arc<dyn AuthService>,
    pub users: Arc<dyn UserService>,
    pub chat: Arc<dyn ChatService>,
    pub mail_enabled: bool,
}

impl AppState {
    /// Wire services over the given repositories and mailer. `db` is only
    /// used for readiness checks.
    pub fn new(
        db: PgPool,
        settings: Settings,
        repositories: Repositories,
        mailer: Arc<dyn OtpMailer>,
        mail_enabled: bool,
    ) -> Self {
        let snowflake = Arc::new(SnowflakeGenerator::new(
            settings.snowflake.machine_id,
            settings.snowflake.epoch,
        ));

        let auth: Arc<dyn AuthService> = Arc::new(AuthServiceImpl::new(
            repositories.users.clone(),
            mailer,
            snowflake.clone(),
            settings.jwt.clone(),
            settings.otp.clone(),
        ));
        let users: Arc<dyn UserService> =
            Arc::new(UserServiceImpl::new(repositories.users.clone()));
        let rooms: Arc<dyn RoomService> = Arc::new(RoomServiceImpl::new(
            repositories.rooms.clone(),
            snowflake.clone(),
        ));
        let chat: Arc<dyn ChatService> = Arc::new(ChatServiceImpl::new(
            repositories.users,
            repositories.messages,
            rooms,
            snowflake.clone(),
        ));

        let gateway = Arc::new(Gateway::new(settings.websocket.heartbeat_interval_ms));

        Self {
            db,
            gateway,
            settings: Arc::new(settings),
            auth,
            users,
            chat,
            mail_enabled,
        }
    }
}

/// Full router with tracing and CORS layers
pub fn build_router(state: AppState) -> Router {
    let cors_layer = cors::create_cors_layer(&state.settings.cors);

    routes::create_router(state)
        .layer(logging::create_trace_layer())
        .layer(cors_layer)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        let db = database::create_pool(&settings.database)
            .await
            .context("Failed to connect to PostgreSQL")?;
        tracing::info!("Database connection pool created");

        if settings.database.run_migrations {
            database::run_migrations(&db)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
        }

        let mailer = SmtpMailer::new(&settings.email).context("Failed to configure mailer")?;
        let mail_enabled = mailer.is_enabled();

        let addr = settings.server_addr();
        let state = AppState::new(
            db.clone(),
            settings,
            Repositories::postgres(db),
            Arc::new(mailer),
            mail_enabled,
        );
        let router = build_router(state);

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
