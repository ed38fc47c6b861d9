use std::sync::Arc;

use blog_writer_api::{
    api::{router, AppState},
    config::Config,
    extract::crawl_client,
    feedback::SqliteFeedbackStore,
    generate::Generators,
    pipeline::{BlogPipeline, PipelineSettings},
    search::GoogleSearchClient,
    terms::FrequencyTermExtractor,
};

const USER_AGENT: &str = "blog-writer-api/1.0";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env();

    let api_client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let search = Arc::new(GoogleSearchClient::from_config(api_client.clone(), &config));

    let pipeline = BlogPipeline {
        crawl_client: crawl_client(config.crawl_timeout, config.insecure_ssl)?,
        web_search: search.clone(),
        image_search: search,
        generators: Generators::from_config(api_client, &config),
        terms: Arc::new(FrequencyTermExtractor::default()),
        settings: PipelineSettings::from_config(&config),
    };
    let feedback = SqliteFeedbackStore::connect(&config.feedback_database_url).await?;

    let app = router(AppState {
        pipeline: Arc::new(pipeline),
        feedback: Arc::new(feedback),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
