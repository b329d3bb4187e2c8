use crate::infrastructure::http::controllers::{ai, auth, docs, home, messages, tickets, users};
use crate::infrastructure::http::middleware::{require_session, AppState};
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    // Everything here passes through the session middleware
    let protected = Router::new()
        .route("/portal", get(home::portal))
        .route("/dashboard", get(home::dashboard))
        .route("/api/me", get(users::get_me))
        .route(
            "/api/tickets",
            get(tickets::list_tickets).post(tickets::create_ticket),
        )
        .route("/api/tickets/bulk", post(tickets::bulk_update))
        .route(
            "/api/tickets/:id",
            get(tickets::get_ticket)
                .patch(tickets::update_ticket)
                .delete(tickets::delete_ticket),
        )
        .route("/api/tickets/:id/assign", post(tickets::assign_ticket))
        .route(
            "/api/tickets/:id/messages",
            get(messages::list_messages).post(messages::create_message),
        )
        .route("/api/tickets/:id/ai-reply", post(ai::generate_reply))
        .route("/api/tickets/:id/ai-check", post(ai::check_reply))
        .route(
            "/api/messages/:id/attachments",
            get(messages::list_attachments).post(messages::add_attachment),
        )
        .route("/api/users", get(users::list_users))
        .route("/api/users/:id/role", patch(users::update_user_role))
        .route("/api/search", post(docs::search))
        .route("/api/docs/reindex", post(docs::reindex))
        .route("/api/docs/:category", get(docs::list_category))
        .route("/api/docs/:category/:slug", get(docs::get_doc))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(home::health))
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-out", post(auth::sign_out))
        .merge(protected)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
