//! OpenSASE Coupons - coupon application service

use std::sync::Arc;

use anyhow::Result;
use opensase_coupons::{
    config::Config,
    events::EventPublisher,
    http::{router, AppState},
    CouponRepository, CouponService, InMemoryCouponRepository, PgCouponRepository,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    let config = Config::from_env()?;

    let repository: Arc<dyn CouponRepository> = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(config.max_connections).connect(url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            Arc::new(PgCouponRepository::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, coupons are kept in memory");
            Arc::new(InMemoryCouponRepository::new())
        }
    };

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, coupon events disabled");
                None
            }
        },
        None => None,
    };

    let state = AppState { coupons: CouponService::new(repository, EventPublisher::new(nats, config.events_subject.clone())) };
    let app = router(state);

    let addr = config.bind_addr();
    tracing::info!("🚀 OpenSASE Coupons listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
