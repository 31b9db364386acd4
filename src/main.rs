use std::{sync::Arc, time::Duration};
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use acetour::{
    api::{self, state::AppState},
    config::{Settings, DEFAULT_SESSION_SECRET},
    media::{CloudinaryClient, MediaHost},
    payments::{PaymentGateway, StripeGateway},
    service::ServiceContext,
};

const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "acetour=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    if settings.auth.session_secret == DEFAULT_SESSION_SECRET {
        tracing::warn!("auth.session_secret is the built-in placeholder; set ACETOUR__AUTH__SESSION_SECRET");
    }

    tracing::info!("Starting Ace Tour server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    // Initialize Stripe if configured
    let payment_gateway: Option<Arc<dyn PaymentGateway>> = if settings.stripe.enabled {
        match (&settings.stripe.secret_key, &settings.stripe.webhook_secret) {
            (Some(api_key), Some(_)) => {
                tracing::info!("Stripe payment processing enabled");
                Some(Arc::new(StripeGateway::new(api_key.clone(), &settings.stripe.currency)?))
            }
            _ => {
                tracing::warn!("Stripe enabled but missing configuration");
                None
            }
        }
    } else {
        tracing::info!("Stripe payment processing disabled");
        None
    };

    let media_host: Option<Arc<dyn MediaHost>> = match (&settings.media.cloud_name, settings.media.enabled) {
        (Some(cloud_name), true) => {
            tracing::info!("Image uploads go to Cloudinary cloud {}", cloud_name);
            Some(Arc::new(CloudinaryClient::new(
                cloud_name.clone(),
                settings.media.upload_preset.clone(),
            )))
        }
        (None, true) => {
            tracing::warn!("Media enabled but media.cloud_name is missing");
            None
        }
        _ => None,
    };

    let service_context = Arc::new(ServiceContext::new(
        db_pool.clone(),
        &settings,
        payment_gateway,
    ));

    // Background housekeeping: expired sessions and abandoned checkout holds
    let housekeeping_ctx = service_context.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HOUSEKEEPING_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = housekeeping_ctx.run_housekeeping().await {
                tracing::error!("Housekeeping failed: {}", e);
            }
        }
    });

    let app = api::create_app(AppState::new(
        service_context,
        media_host,
        Arc::new(settings.clone()),
    ));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
