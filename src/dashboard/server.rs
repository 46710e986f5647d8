//! HTTP layer of the dashboard: three data views plus login/logout and the
//! favorite toggle. All data shaping lives in [`super::shaping`] and
//! [`super::schema`]; handlers only wire state, render minimal HTML, and
//! surface every caught error inline with a remediation hint instead of
//! failing the process.

use actix_web::{App, HttpResponse, HttpServer, get, post, web};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::dashboard::favorites::FavoriteStore;
use crate::dashboard::schema;
use crate::dashboard::session::DashboardState;
use crate::dashboard::shaping;
use crate::error::{AppError, AppResult};
use crate::history;

/// Everything a handler needs, owned by the server for the process
/// lifetime.
pub struct ServerState {
    pub settings: Settings,
    pub state: Mutex<DashboardState>,
    /// Lazily-connected pool for the rate store; `None` when unconfigured.
    pub rates: Option<PgPool>,
    /// Pool for the run-history store.
    pub runs: Option<PgPool>,
    /// Durable favorites store; `None` degrades to session-only favorites.
    pub favorites: Option<FavoriteStore>,
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn page(title: &str, body: &str) -> HttpResponse {
    let html = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
         <title>{title}</title></head><body>\
         <nav><a href=\"/convert\">Currency Converter</a> | \
         <a href=\"/compare\">Rate Comparison</a> | \
         <a href=\"/runs\">Run Log</a> | \
         <form method=\"post\" action=\"/logout\" style=\"display:inline\">\
         <button type=\"submit\">Logout</button></form></nav>\
         <h1>{title}</h1>{body}</body></html>",
        title = escape(title),
    );
    HttpResponse::Ok().content_type("text/html").body(html)
}

fn error_box(err: &AppError) -> String {
    format!(
        "<p class=\"error\">{}</p><p class=\"hint\">{}</p>",
        escape(&err.to_string()),
        escape(err.hint()),
    )
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location.to_string()))
        .finish()
}

fn login_page(error: Option<&str>) -> HttpResponse {
    let error_html = error
        .map(|e| format!("<p class=\"error\">{}</p>", escape(e)))
        .unwrap_or_default();
    let html = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
         <title>USD Exchange Rate Dashboard</title></head><body>\
         <h1>USD Exchange Rate Dashboard</h1><h2>Please login to continue</h2>\
         {error_html}\
         <form method=\"post\" action=\"/login\">\
         <input name=\"username\" placeholder=\"Username\">\
         <input name=\"password\" type=\"password\" placeholder=\"Password\">\
         <button type=\"submit\">Login</button></form></body></html>",
    );
    HttpResponse::Ok().content_type("text/html").body(html)
}

async fn authenticated(data: &ServerState) -> bool {
    data.state.lock().await.session.is_authenticated()
}

/// Seed the session favorites from the durable store on first use.
async fn ensure_favorites_loaded(data: &ServerState) {
    let mut state = data.state.lock().await;
    if state.favorites_loaded {
        return;
    }
    if let Some(store) = &data.favorites {
        match store.list().await {
            Ok(favs) => state.favorites = favs,
            Err(e) => log::warn!("could not read favorites store: {e}"),
        }
    }
    state.favorites_loaded = true;
}

fn rates_pool(data: &ServerState) -> AppResult<&PgPool> {
    data.rates
        .as_ref()
        .ok_or_else(|| AppError::ConfigurationMissing("EXCHANGE_DB_URL".to_string()))
}

#[get("/")]
async fn index(data: web::Data<ServerState>) -> HttpResponse {
    if authenticated(&data).await {
        redirect("/convert")
    } else {
        login_page(None)
    }
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[post("/login")]
async fn login(data: web::Data<ServerState>, form: web::Form<LoginForm>) -> HttpResponse {
    let mut state = data.state.lock().await;
    if state
        .session
        .login(&form.username, &form.password, &data.settings)
    {
        drop(state);
        redirect("/convert")
    } else {
        login_page(Some("Username or password incorrect"))
    }
}

#[post("/logout")]
async fn logout(data: web::Data<ServerState>) -> HttpResponse {
    data.state.lock().await.session.logout();
    redirect("/")
}

#[derive(Deserialize)]
struct ConvertQuery {
    amount: Option<String>,
}

#[get("/convert")]
async fn convert_view(data: web::Data<ServerState>, query: web::Query<ConvertQuery>) -> HttpResponse {
    if !authenticated(&data).await {
        return redirect("/");
    }
    ensure_favorites_loaded(&data).await;

    let amount: Decimal = query
        .amount
        .as_deref()
        .and_then(|a| a.trim().parse().ok())
        .unwrap_or_else(|| Decimal::from(100));

    let rows = match fetch_rows(&data).await {
        Ok(Some(rows)) if !rows.is_empty() => rows,
        Ok(_) => {
            return page(
                "Currency Converter",
                "<p>No exchange rate data found. Run the pipeline first.</p>",
            );
        }
        Err(e) => return page("Currency Converter", &error_box(&e)),
    };

    let latest = shaping::latest_rates(&rows);
    let visible: Vec<String> = latest.iter().map(|(c, _)| c.clone()).collect();
    let favorites = data.state.lock().await.favorites.clone();
    let ordered = shaping::order_with_favorites(&visible, &favorites);

    let mut body = format!(
        "<form method=\"get\" action=\"/convert\">\
         <label>Amount in USD <input name=\"amount\" value=\"{amount}\"></label>\
         <button type=\"submit\">Convert</button></form><ul>",
    );
    for currency in &ordered {
        let Some((_, rate)) = latest.iter().find(|(c, _)| c == currency) else {
            continue;
        };
        let starred = favorites.contains(currency);
        body.push_str(&format!(
            "<li><b>{code}</b>{star}: rate {rate}, ${amount} = {converted} \
             <form method=\"post\" action=\"/favorite/{code}\" style=\"display:inline\">\
             <button type=\"submit\">{toggle}</button></form> \
             <a href=\"/history/{code}\">Show history</a></li>",
            code = escape(currency),
            star = if starred { " &#9733;" } else { "" },
            rate = rate,
            converted = shaping::convert(amount, *rate).round_dp(2),
            toggle = if starred { "Unfavorite" } else { "Favorite" },
        ));
    }
    body.push_str("</ul>");
    page("Currency Converter", &body)
}

#[post("/favorite/{currency}")]
async fn toggle_favorite(data: web::Data<ServerState>, path: web::Path<String>) -> HttpResponse {
    if !authenticated(&data).await {
        return redirect("/");
    }
    ensure_favorites_loaded(&data).await;
    let currency = path.into_inner();

    let mut state = data.state.lock().await;
    let now_favorite = state.toggle_favorite(&currency);
    // Durable write happens before the next render; on failure the session
    // view keeps the toggle.
    if let Some(store) = &data.favorites {
        if let Err(e) = store.set(&currency, now_favorite).await {
            log::warn!("favorites store write failed, keeping session-only toggle: {e}");
        }
    }
    drop(state);
    redirect("/convert")
}

#[get("/history/{currency}")]
async fn history_view(data: web::Data<ServerState>, path: web::Path<String>) -> HttpResponse {
    if !authenticated(&data).await {
        return redirect("/");
    }
    let currency = path.into_inner();
    let title = format!("History for {currency}");

    let rows = match fetch_rows(&data).await {
        Ok(Some(rows)) => rows,
        Ok(None) => {
            return page(&title, "<p>No exchange rate data found. Run the pipeline first.</p>");
        }
        Err(e) => return page(&title, &error_box(&e)),
    };

    let points = shaping::history_for(&rows, &currency);
    if points.is_empty() {
        return page(&title, "<p>No historical data for the selected currency.</p>");
    }
    let mut body = String::from("<table><tr><th>Time</th><th>Rate</th></tr>");
    for (at, rate) in points {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            at.to_rfc3339(),
            rate
        ));
    }
    body.push_str("</table>");
    page(&title, &body)
}

#[derive(Deserialize)]
struct CompareQuery {
    currencies: Option<String>,
}

#[get("/compare")]
async fn compare_view(data: web::Data<ServerState>, query: web::Query<CompareQuery>) -> HttpResponse {
    if !authenticated(&data).await {
        return redirect("/");
    }
    let rows = match fetch_rows(&data).await {
        Ok(Some(rows)) if !rows.is_empty() => rows,
        Ok(_) => {
            return page(
                "Rate Comparison",
                "<p>No exchange rate data found. Run the pipeline first.</p>",
            );
        }
        Err(e) => return page("Rate Comparison", &error_box(&e)),
    };

    let sorted = shaping::sorted_for_comparison(&shaping::latest_rates(&rows));
    let selected: Vec<String> = match query.currencies.as_deref() {
        Some(list) if !list.trim().is_empty() => list
            .split(',')
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect(),
        // Default selection: the strongest six.
        _ => sorted.iter().take(6).map(|(c, _)| c.clone()).collect(),
    };

    let mut body = String::from(
        "<form method=\"get\" action=\"/compare\">\
         <label>Currencies (comma separated) \
         <input name=\"currencies\"></label>\
         <button type=\"submit\">Compare</button></form>\
         <table><tr><th>Currency</th><th>Rate per 1 USD</th><th>$100 USD</th></tr>",
    );
    let hundred = Decimal::from(100);
    for (currency, rate) in sorted.iter().filter(|(c, _)| selected.contains(c)) {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(currency),
            rate,
            shaping::convert(hundred, *rate).round_dp(2),
        ));
    }
    body.push_str("</table>");
    page("Rate Comparison", &body)
}

#[get("/runs")]
async fn runs_view(data: web::Data<ServerState>) -> HttpResponse {
    if !authenticated(&data).await {
        return redirect("/");
    }
    let Some(pool) = &data.runs else {
        let err = AppError::ConfigurationMissing("RUN_HISTORY_DB_URL".to_string());
        return page("Pipeline Run Log", &error_box(&err));
    };

    let runs = match history::recent_runs(pool, 100).await {
        Ok(runs) => runs,
        Err(e) => return page("Pipeline Run Log", &error_box(&e)),
    };
    if runs.is_empty() {
        return page(
            "Pipeline Run Log",
            "<p>No pipeline runs found. Trigger the pipeline to populate the log.</p>",
        );
    }

    let success = runs.iter().filter(|r| r.state == "success").count();
    let failed = runs.iter().filter(|r| r.state == "failed").count();
    let running = runs.iter().filter(|r| r.state == "running").count();
    let mut body = format!(
        "<p>Total: {} | Successful: {success} | Failed: {failed} | Running: {running}</p>\
         <table><tr><th>Run</th><th>State</th><th>Started</th><th>Duration (s)</th></tr>",
        runs.len(),
    );
    for run in runs.iter().take(20) {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            run.run_id,
            escape(&run.state),
            run.started_at.to_rfc3339(),
            run.duration_seconds()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ));
    }
    body.push_str("</table>");
    page("Pipeline Run Log", &body)
}

async fn fetch_rows(data: &ServerState) -> AppResult<Option<Vec<schema::RateRow>>> {
    let pool = rates_pool(data)?;
    Ok(schema::fetch_rate_rows(pool).await?.map(|(_, rows)| rows))
}

/// Run the dashboard server until shutdown.
pub async fn serve(state: ServerState) -> std::io::Result<()> {
    let port = state.settings.dashboard_port;
    let data = web::Data::new(state);
    log::info!("dashboard listening on 0.0.0.0:{port}");
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .service(index)
            .service(login)
            .service(logout)
            .service(convert_view)
            .service(toggle_favorite)
            .service(history_view)
            .service(compare_view)
            .service(runs_view)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
