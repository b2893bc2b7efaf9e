//! Route definitions for LawnSync

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes
        .nest("/auth", auth_routes(state.clone()))
        // Unsubscribe links in emails (public, token-signed)
        .route(
            "/notifications/unsubscribe",
            get(handlers::unsubscribe),
        )
        // Protected routes
        .merge(protected_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .merge(protected)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/lawns", lawn_routes())
        .nest("/tasks", task_routes())
        .nest("/schedule", schedule_routes())
        .nest("/notifications", notification_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Lawn profile routes, with each lawn's schedule and weather
fn lawn_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_lawns).post(handlers::create_lawn))
        .route(
            "/:lawn_id",
            get(handlers::get_lawn)
                .put(handlers::update_lawn)
                .delete(handlers::delete_lawn),
        )
        .route(
            "/:lawn_id/schedule",
            get(handlers::list_schedule).post(handlers::schedule_task),
        )
        .route("/:lawn_id/schedule/export", get(handlers::export_schedule))
        .route("/:lawn_id/schedule/evaluate", post(handlers::evaluate_schedule))
        .route("/:lawn_id/recommendations", get(handlers::get_recommendations))
        .route("/:lawn_id/weather/current", get(handlers::get_current_weather))
        .route("/:lawn_id/weather/forecast", get(handlers::get_forecast))
}

/// Maintenance task catalogue routes
fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_tasks).post(handlers::create_task))
        .route(
            "/:task_id",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
}

/// Scheduled task routes
fn schedule_routes() -> Router<AppState> {
    Router::new()
        .route("/:scheduled_task_id/status", put(handlers::update_status))
        .route("/:scheduled_task_id/next-date", get(handlers::get_next_date))
}

/// Notification routes
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/preferences",
            get(handlers::get_preferences).put(handlers::update_preferences),
        )
        .route("/history", get(handlers::get_history))
        .route("/send", post(handlers::send_notification))
        .route("/triggers/reminders", post(handlers::trigger_reminders))
        .route("/triggers/weather", post(handlers::trigger_weather_alerts))
        .route("/triggers/weekly", post(handlers::trigger_weekly_summaries))
        .route(
            "/triggers/recommendations",
            post(handlers::trigger_care_recommendations),
        )
        .route("/triggers/all", post(handlers::trigger_all))
}
