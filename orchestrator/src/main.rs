use std::sync::Arc;
use tracing::{info, warn};
use warp::{Filter, Reply};

use brief_orchestrator::agents::llm::LlmClient;
use brief_orchestrator::agents::web_search::WebSearchTool;
use brief_orchestrator::agents::{PlannerAgent, SearchAgent, WriterAgent};
use brief_orchestrator::api::{self, AppState};
use brief_orchestrator::config::{Config, ResearchSettings};
use brief_orchestrator::emailer::SmtpSettings;
use brief_orchestrator::error;
use brief_orchestrator::metrics;
use brief_orchestrator::middleware;
use brief_orchestrator::research::ResearchOrchestrator;
use brief_orchestrator::sessions::{QuotaPolicy, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting Intelligence Brief research service");

    // Load configuration
    let config = Config::from_env()?;
    let settings = Arc::new(ResearchSettings::load(config.research_config.as_deref())?);
    info!(
        max_sources = settings.max_sources,
        max_concurrency = settings.max_concurrency,
        max_total_queries = settings.max_total_queries,
        "Configuration loaded"
    );
    if config.llm_api_key.is_none() {
        warn!("LLM_API_KEY is not set; research runs will fail at planning");
    }

    // Collaborators
    let llm = LlmClient::new(config.llm_base_url.clone(), config.llm_api_key.clone())?;
    let web = WebSearchTool::new(config.searxng_url.clone())?;
    let orchestrator = ResearchOrchestrator::new(
        Arc::new(PlannerAgent::new(llm.clone(), config.planner_model.clone())),
        Arc::new(SearchAgent::new(llm.clone(), web, config.search_model.clone())),
        Arc::new(WriterAgent::new(llm, config.writer_model.clone())),
        settings,
    );

    // Initialize Redis session store
    let sessions = SessionStore::new(
        &config.redis_url,
        QuotaPolicy {
            max_questions: config.max_questions,
            admin_session_id: config.admin_session_id.clone(),
        },
    )
    .await?;
    info!("Redis connection established");

    let state = AppState {
        orchestrator,
        sessions,
        limiter: middleware::rate_limiter(config.rate_limit_per_minute),
        smtp: SmtpSettings {
            host: config.smtp_host.clone(),
            user: config.smtp_user.clone(),
            pass: config.smtp_pass.clone(),
            from: config.from_email.clone(),
        },
    };

    // Build API routes
    let api_routes = api::routes(state)
        .with(warp::log("api"))
        .with(middleware::cors());

    // Health check route
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({"status": "healthy"})));

    // Metrics route
    let metrics_route = warp::path("metrics").and(warp::get()).map(|| {
        match metrics::render() {
            Ok((buffer, content_type)) => {
                warp::reply::with_header(buffer, "Content-Type", content_type).into_response()
            }
            Err(e) => warp::reply::with_status(
                e.to_string(),
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response(),
        }
    });

    let routes = health
        .or(metrics_route)
        .or(api_routes)
        .recover(error::handle_rejection);

    // Start server
    let addr = ([0, 0, 0, 0], config.port);
    info!("Server listening on {}", addr.1);

    warp::serve(routes).run(addr).await;

    Ok(())
}
