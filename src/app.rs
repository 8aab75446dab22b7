use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Extension, Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api;
use crate::config::AppConfig;
use crate::services::Services;

async fn health_check() -> &'static str {
    "OK"
}

/// The full HTTP surface except `/metrics`, which needs the process-wide
/// Prometheus recorder and is attached by [`with_metrics`].
pub fn router(services: Services, config: &AppConfig) -> Router {
    let anonymous_routes = Router::new()
        .route("/api/auth/register", post(api::auth::register))
        .route("/api/auth/login", post(api::auth::login))
        .route("/api/parents/exist", get(api::parents::exists))
        .route("/api/learners/exist", get(api::learners::exists));

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(api::auth::logout))
        .route("/api/auth/me", get(api::auth::me))
        .route("/api/users/:id/role", post(api::auth::set_role))
        // School grades
        .route("/api/schoolGrades/all", get(api::school_grades::all))
        .route("/api/schoolGrades/pagedSchoolGrades", get(api::school_grades::paged))
        .route(
            "/api/schoolGrades",
            put(api::school_grades::create).post(api::school_grades::update),
        )
        .route(
            "/api/schoolGrades/:id",
            get(api::school_grades::get).delete(api::school_grades::delete),
        )
        // Teachers, age groups, activity groups
        .route("/api/teachers/all", get(api::activities::all_teachers))
        .route("/api/teachers/pagedTeachers", get(api::activities::paged_teachers))
        .route(
            "/api/teachers",
            put(api::activities::create_teacher).post(api::activities::update_teacher),
        )
        .route(
            "/api/teachers/:id",
            get(api::activities::get_teacher).delete(api::activities::delete_teacher),
        )
        .route("/api/agegroups/all", get(api::activities::all_age_groups))
        .route("/api/agegroups/pagedAgeGroups", get(api::activities::paged_age_groups))
        .route(
            "/api/agegroups",
            put(api::activities::create_age_group).post(api::activities::update_age_group),
        )
        .route(
            "/api/agegroups/:id",
            get(api::activities::get_age_group).delete(api::activities::delete_age_group),
        )
        .route("/api/activitygroups/all", get(api::activities::all_activity_groups))
        .route(
            "/api/activitygroups/pagedActivityGroups",
            get(api::activities::paged_activity_groups),
        )
        .route(
            "/api/activitygroups",
            put(api::activities::create_activity_group)
                .post(api::activities::update_activity_group),
        )
        .route(
            "/api/activitygroups/:id",
            get(api::activities::get_activity_group)
                .delete(api::activities::delete_activity_group),
        )
        // Parents and learners
        .route("/api/parents/pagedParents", get(api::parents::paged))
        .route(
            "/api/parents",
            put(api::parents::create).post(api::parents::update),
        )
        .route(
            "/api/parents/:id",
            get(api::parents::get).delete(api::parents::delete),
        )
        .route("/api/parents/:id/children", get(api::parents::children))
        .route("/api/learners/pagedLearners", get(api::learners::paged))
        .route(
            "/api/learners",
            put(api::learners::create).post(api::learners::update),
        )
        .route(
            "/api/learners/:id",
            get(api::learners::get).delete(api::learners::delete),
        )
        // Discipline
        .route("/api/disciplinary/severityScales/all", get(api::discipline::all_scales))
        .route(
            "/api/disciplinary/severityScales/pagedSeverityScales",
            get(api::discipline::paged_scales),
        )
        .route(
            "/api/disciplinary/severityScales",
            put(api::discipline::create_scale).post(api::discipline::update_scale),
        )
        .route(
            "/api/disciplinary/severityScales/:id",
            get(api::discipline::get_scale).delete(api::discipline::delete_scale),
        )
        .route("/api/disciplinary/actions/all", get(api::discipline::all_actions))
        .route(
            "/api/disciplinary/actions/pagedActions",
            get(api::discipline::paged_actions),
        )
        .route(
            "/api/disciplinary/actions",
            put(api::discipline::create_action).post(api::discipline::update_action),
        )
        .route(
            "/api/disciplinary/actions/:id",
            get(api::discipline::get_action).delete(api::discipline::delete_action),
        )
        .route("/api/disciplinary/incidents", put(api::discipline::record_incident))
        .route(
            "/api/disciplinary/incidents/learner/:learner_id",
            get(api::discipline::incidents_for_learner),
        )
        .route(
            "/api/disciplinary/incidents/:id",
            delete(api::discipline::delete_incident),
        )
        // School events
        .route("/schoolevents/all", get(api::events::all))
        .route("/schoolevents/pagedSchoolEvents", get(api::events::paged))
        .route(
            "/schoolevents",
            put(api::events::create).post(api::events::update),
        )
        .route(
            "/schoolevents/:id",
            get(api::events::get).delete(api::events::delete),
        )
        .route(
            "/schoolevents/:id/activityGroups",
            get(api::events::activity_groups).put(api::events::add_activity_group),
        )
        .route(
            "/schoolevents/:id/activityGroups/:group_id",
            delete(api::events::remove_activity_group),
        )
        .route(
            "/schoolevents/:id/permissions",
            get(api::events::permissions).put(api::events::record_permission),
        )
        // Communication
        .route(
            "/api/notifications/notificationList",
            get(api::communication::notification_list),
        )
        .route(
            "/api/notifications/:id",
            delete(api::communication::delete_notification),
        )
        .route("/api/messages", put(api::communication::create_message))
        .route(
            "/api/messages/entity/:entity_id",
            get(api::communication::messages_for),
        )
        // Listings
        .route("/api/listingTiers/all", get(api::listings::all_tiers))
        .route("/api/listingTiers/pagedListingTiers", get(api::listings::paged_tiers))
        .route(
            "/api/listingTiers",
            put(api::listings::create_tier).post(api::listings::update_tier),
        )
        .route(
            "/api/listingTiers/:id",
            get(api::listings::get_tier).delete(api::listings::delete_tier),
        )
        .route("/api/businessListings/all", get(api::listings::all_listings))
        .route(
            "/api/businessListings/pagedBusinessListings",
            get(api::listings::paged_listings),
        )
        .route(
            "/api/businessListings",
            put(api::listings::create_listing).post(api::listings::update_listing),
        )
        .route(
            "/api/businessListings/:id",
            get(api::listings::get_listing).delete(api::listings::delete_listing),
        )
        .route(
            "/api/businessListings/:id/images",
            post(api::listings::upload_images),
        )
        .route_layer(axum::middleware::from_fn(api::middleware::auth_middleware));

    // Room for a batch of files at the per-file limit.
    let body_limit = config.media.max_upload_bytes.saturating_mul(8);

    Router::new()
        .route("/health", get(health_check))
        .merge(anonymous_routes)
        .merge(protected_routes)
        .layer(Extension(services))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    // "METHOD /route" as the OpenTelemetry span name
                    let span_name = match matched_path {
                        Some(path) => format!("{} {}", request.method(), path),
                        None => format!("{} {}", request.method(), request.uri().path()),
                    };

                    let user_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .and_then(|v| v.to_str().ok())
                        .or_else(|| {
                            request
                                .headers()
                                .get("x-real-ip")
                                .and_then(|v| v.to_str().ok())
                        })
                        .unwrap_or("unknown");

                    // Handlers fill in the empty fields.
                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        user_ip = user_ip,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        table = tracing::field::Empty,
                        action = tracing::field::Empty,
                        entity_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        user_email = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(|_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(cors_layer(&config.cors_origin))
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Adds request metrics and the `/metrics` scrape endpoint.
pub fn with_metrics(
    router: Router,
    prometheus_layer: axum_prometheus::PrometheusMetricLayer<'static>,
    metric_handle: metrics_exporter_prometheus::PrometheusHandle,
) -> Router {
    router
        .layer(prometheus_layer)
        .route("/metrics", get(|| async move { metric_handle.render() }))
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match origin.parse::<HeaderValue>() {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            tracing::warn!(origin, "CORS_ORIGIN is not a valid header value; cross-origin requests are refused");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
