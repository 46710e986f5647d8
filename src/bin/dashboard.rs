use exchange_rates::config::Settings;
use exchange_rates::dashboard::favorites::FavoriteStore;
use exchange_rates::dashboard::server::{ServerState, serve};
use exchange_rates::dashboard::session::DashboardState;
use exchange_rates::etl::load::normalize_db_url;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::Mutex;

fn lazy_pool(url: Option<&str>) -> Option<PgPool> {
    let url = normalize_db_url(url?);
    // Lazy connect: a bad address surfaces as an inline view error on first
    // read instead of preventing startup.
    match PgPoolOptions::new().max_connections(5).connect_lazy(&url) {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::warn!("invalid database address {url}: {e}");
            None
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env();
    let rates = lazy_pool(settings.exchange_db_url.as_deref());
    let runs = lazy_pool(settings.run_history_url());

    let favorites = match FavoriteStore::open(&settings.favorites_db_path).await {
        Ok(store) => Some(store),
        Err(e) => {
            log::warn!(
                "could not open favorites store at {}; favorites will be session-only: {e}",
                settings.favorites_db_path
            );
            None
        }
    };

    serve(ServerState {
        settings,
        state: Mutex::new(DashboardState::new()),
        rates,
        runs,
        favorites,
    })
    .await
}
