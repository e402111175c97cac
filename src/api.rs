//! HTTP JSON API over the resolver client and the record store.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::actors::messages::DnsRecord;
use crate::client::Resolve;
use crate::errors::{ResolveError, StoreError};
use crate::handlers::record_store_handler::RecordStoreHandle;
use crate::protocol::{Message, Question, ResourceRecord, ResourceType};

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address to listen on, 0.0.0.0:8080 by default
    pub listen: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
        }
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub resolver: Arc<dyn Resolve>,
    pub store: RecordStoreHandle,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("domain query parameter is required")]
    MissingDomain,

    #[error("{0}")]
    UnsupportedType(String),

    #[error("failed to resolve DNS record")]
    Resolve(#[source] ResolveError),

    #[error("failed to read record store")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingDomain | ApiError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
            ApiError::Resolve(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckDomainParams {
    domain: Option<String>,
    #[serde(rename = "type")]
    rtype: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionData {
    qname: String,
    qclass: u16,
    qclass_label: String,
    qtype: u16,
    qtype_label: String,
}

impl From<&Question> for QuestionData {
    fn from(question: &Question) -> Self {
        Self {
            qname: question.name.clone(),
            qclass: question.qclass.into(),
            qclass_label: question.qclass.to_string(),
            qtype: question.qtype.into(),
            qtype_label: question.qtype.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecordData {
    name: String,
    class: u16,
    class_label: String,
    ttl: u32,
    rdata: String,
    rdata_raw: Vec<u8>,
}

impl From<&ResourceRecord> for ResourceRecordData {
    fn from(record: &ResourceRecord) -> Self {
        Self {
            name: record.name.clone(),
            class: record.class.into(),
            class_label: record.class.to_string(),
            ttl: record.ttl,
            rdata: record.rdata.to_string(),
            // decoded records always re-encode unless a label held a '.'
            rdata_raw: record.rdata.to_bytes().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckDomainResponse {
    id: u16,
    opcode: u8,
    rcode: u8,
    questions: Vec<QuestionData>,
    answers: Vec<ResourceRecordData>,
    authorities: Vec<ResourceRecordData>,
    additional: Vec<ResourceRecordData>,
}

fn records(section: &[ResourceRecord]) -> Vec<ResourceRecordData> {
    section.iter().map(ResourceRecordData::from).collect()
}

impl From<&Message> for CheckDomainResponse {
    fn from(message: &Message) -> Self {
        Self {
            id: message.header.id,
            opcode: message.header.opcode.into(),
            rcode: message.header.response_code.into(),
            questions: message.questions.iter().map(QuestionData::from).collect(),
            answers: records(&message.answers),
            authorities: records(&message.authorities),
            additional: records(&message.additional),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordData {
    id: u64,
    name: String,
    #[serde(rename = "type")]
    rtype: u16,
    type_label: String,
}

impl From<DnsRecord> for RecordData {
    fn from(record: DnsRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            rtype: record.rtype.into(),
            type_label: record.rtype.to_string(),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/check", get(check_domain))
        .route("/api/records", get(list_records))
        .with_state(state)
}

/// Serves the API until `shutdown` is cancelled.
pub async fn serve(
    config: &ApiConfig,
    state: ApiState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.listen).await?;
    info!("Start API server on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn check_domain(
    State(state): State<ApiState>,
    Query(params): Query<CheckDomainParams>,
) -> Result<Json<CheckDomainResponse>, ApiError> {
    let domain = params
        .domain
        .filter(|domain| !domain.is_empty())
        .ok_or(ApiError::MissingDomain)?;

    let rtype = match params.rtype.as_deref() {
        None | Some("") => ResourceType::TXT,
        Some(name) => name.parse::<ResourceType>().map_err(ApiError::UnsupportedType)?,
    };

    let received = state.resolver.resolve(&domain, rtype).await.map_err(|e| {
        error!("failed to resolve DNS record: {}", e);
        ApiError::Resolve(e)
    })?;

    Ok(Json(CheckDomainResponse::from(&received)))
}

async fn list_records(State(state): State<ApiState>) -> Result<Json<Vec<RecordData>>, ApiError> {
    let records = state.store.find_all().await?;
    Ok(Json(records.into_iter().map(RecordData::from).collect()))
}
