use std::env;
use std::io;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use weekboard_engine::{layout_week, monday_of, Schedule, WeekLayout};

mod cache;
mod cli;

use cache::ResponseCache;

/// What one successful submission renders to: the decoded collection plus
/// its weekly layout.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    #[serde(flatten)]
    schedule: Schedule,
    layout: WeekLayout,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = cli::parse(env::args().skip(1).collect());
    setup_logging();

    let cache = ResponseCache::new(args.cache_ttl);

    let router = Router::new()
        .route("/schedule", post(handle_schedule))
        .fallback(|| async { Redirect::permanent(env!("CARGO_PKG_REPOSITORY")) })
        .with_state(cache);

    let listener = TcpListener::bind(args.address).await?;
    info!("Listening at http://{}", args.address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

fn setup_logging() {
    const WEEKBOARD_LOG: &str = "WEEKBOARD_LOG";

    if env::var(WEEKBOARD_LOG).is_err() {
        env::set_var(WEEKBOARD_LOG, "weekboard_server=info");
    }

    pretty_env_logger::init_custom_env(WEEKBOARD_LOG);
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
    }
}

#[derive(Deserialize)]
struct ScheduleQuery {
    /// Return the events as an iCalendar file instead of the JSON layout.
    #[serde(default)]
    ics: bool,
}

async fn handle_schedule(
    State(cache): State<Arc<ResponseCache>>,
    Query(query): Query<ScheduleQuery>,
    body: String,
) -> Response {
    let key = cache::key_of(&body);

    if let Some(cached) = cache.get(key).await {
        debug!("Serving cached schedule for key {key:x}");
        return render(&cached, query.ics);
    }

    let schedule = match Schedule::from_text(&body) {
        Ok(schedule) => schedule,
        Err(err) => {
            info!("Rejected submission: {err}");
            return (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()).into_response();
        }
    };

    // An empty but well-formed submission still renders a week, anchored
    // on the current one.
    let week_start = schedule
        .week_start()
        .unwrap_or_else(|| monday_of(Utc::now().date_naive()));

    let layout = layout_week(&schedule.events, week_start);
    debug!(
        "Decoded {} events, {} placed in week of {week_start}",
        schedule.events.len(),
        layout.placements.len()
    );

    let response = cache.insert(key, ScheduleResponse { schedule, layout }).await;
    render(&response, query.ics)
}

fn render(response: &ScheduleResponse, ics: bool) -> Response {
    if ics {
        return (
            [("content-type", "text/calendar")],
            response.schedule.to_ics().to_string(),
        )
            .into_response();
    }

    Json(response).into_response()
}
