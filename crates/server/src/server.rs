use axum::{
    Json, Router,
    extract::{Request, State},
    http::Method,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use axum_extra::headers::{Error as AxumError, Header};
use sea_orm::DatabaseConnection;
use serde::Serialize;

use std::sync::Arc;

use crate::{ServerError, banks, categories, statistics, transaction_types, transactions};
use engine::Engine;

static ACTOR_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-actor-id");

const MAX_ACTOR_LEN: usize = 128;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Identity of the caller of a mutating route, recorded on the
/// transactions it creates.
#[derive(Clone, Debug)]
pub struct Actor(pub String);

/// Typed `x-actor-id` header.
///
/// Mutating requests must contain an "x-actor-id" entry in the header.
#[derive(Debug)]
struct ActorHeader(String);

impl Header for ActorHeader {
    fn name() -> &'static axum::http::HeaderName {
        &ACTOR_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let value = value.trim();
        if value.is_empty() || value.len() > MAX_ACTOR_LEN {
            return Err(AxumError::invalid());
        }

        Ok(ActorHeader(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-actor-id header"),
        }
    }
}

fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Resolves the actor of mutating requests and stores it in the request
/// extensions. Reads pass through untouched.
async fn actor(mut request: Request, next: Next) -> Result<Response, ServerError> {
    if is_read_only(request.method()) {
        return Ok(next.run(request).await);
    }

    let mut values = request.headers().get_all(ActorHeader::name()).iter();
    let header = ActorHeader::decode(&mut values)
        .map_err(|_| ServerError::Unauthorized("missing or invalid x-actor-id".to_string()))?;

    request.extensions_mut().insert(Actor(header.0));
    Ok(next.run(request).await)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health(State(state): State<ServerState>) -> Result<Json<Health>, ServerError> {
    state.db.ping().await.map_err(engine::EngineError::from)?;
    Ok(Json(Health { status: "ok" }))
}

/// The whole HTTP surface, with the actor middleware applied.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            get(categories::get)
                .patch(categories::update)
                .delete(categories::delete),
        )
        .route("/banks", get(banks::list).post(banks::create))
        .route(
            "/banks/{id}",
            get(banks::get).patch(banks::rename).delete(banks::delete),
        )
        .route(
            "/income-types",
            get(transaction_types::list_income).post(transaction_types::create_income),
        )
        .route(
            "/income-types/{id}",
            get(transaction_types::get_income)
                .patch(transaction_types::rename_income)
                .delete(transaction_types::delete_income),
        )
        .route(
            "/expense-types",
            get(transaction_types::list_expense).post(transaction_types::create_expense),
        )
        .route(
            "/expense-types/{id}",
            get(transaction_types::get_expense)
                .patch(transaction_types::rename_expense)
                .delete(transaction_types::delete_expense),
        )
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .patch(transactions::update)
                .delete(transactions::delete),
        )
        .route("/stats", get(statistics::totals))
        .route("/stats/banks", get(statistics::banks))
        .route("/stats/categories", get(statistics::categories))
        .layer(middleware::from_fn(actor))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> Result<ActorHeader, AxumError> {
        let value = axum::http::HeaderValue::from_str(raw).unwrap();
        let mut values = std::iter::once(&value);
        ActorHeader::decode(&mut values)
    }

    #[test]
    fn actor_header_is_trimmed() {
        assert_eq!(decode("  alice ").unwrap().0, "alice");
    }

    #[test]
    fn blank_or_oversized_actor_is_invalid() {
        assert!(decode("   ").is_err());
        assert!(decode(&"a".repeat(MAX_ACTOR_LEN + 1)).is_err());
    }

    #[test]
    fn reads_skip_actor_check() {
        assert!(is_read_only(&Method::GET));
        assert!(!is_read_only(&Method::PATCH));
        assert!(!is_read_only(&Method::DELETE));
    }
}
