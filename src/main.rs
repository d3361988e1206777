use mimalloc::MiMalloc;
use outlook_leads::api::{GraphApi, WorkersAi, build_http_client};
use outlook_leads::config::Config;
use outlook_leads::db::{KvStorage, LeadStore, LeadsStorage, NoopLeadStore, connect};
use outlook_leads::outlook_oauth::{OutlookCredentials, TokenManager};
use outlook_leads::router::{LeadsState, leads_router};
use outlook_leads::service::{LeadClassifier, StepPolicy, Workflow, runs_actor, scheduler};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.loglevel,
        ai_model = %cfg.ai_model,
        persist_leads = cfg.persist_leads,
    );

    let pool = connect(&cfg.database_url).await?;
    let http = build_http_client(&cfg)?;

    let tokens = Arc::new(TokenManager::new(
        OutlookCredentials::from_config(&cfg),
        http.clone(),
        Arc::new(KvStorage::new(pool.clone())),
    ));
    let mail = Arc::new(GraphApi::new(http.clone(), cfg.messages_url()));
    let inference = Arc::new(WorkersAi::new(
        http,
        cfg.inference_url(),
        cfg.cf_api_token.clone(),
    ));
    let leads: Arc<dyn LeadStore> = if cfg.persist_leads {
        let storage = LeadsStorage::new(pool);
        info!(stored = storage.list().await?.len(), "lead persistence enabled");
        Arc::new(storage)
    } else {
        Arc::new(NoopLeadStore)
    };

    let policy = StepPolicy::new(cfg.step_retries);
    let workflow = Workflow::new(
        tokens.clone(),
        mail,
        LeadClassifier::new(inference, policy),
        leads,
        policy,
    )
    .with_concurrency(cfg.classify_concurrency);

    let runs = runs_actor::spawn(Arc::new(workflow), cfg.run_retention).await?;

    match cfg.default_email.clone() {
        Some(email) => {
            scheduler::spawn_scheduler(runs.clone(), email, cfg.schedule_interval(), cfg.lookback());
        }
        None => warn!("DEFAULT_EMAIL not set; scheduled runs disabled"),
    }

    let state = LeadsState::new(runs, tokens, cfg.public_url.clone());
    let app = leads_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
