use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use crate::pagination::{Page, PageParameters};

/// Reply wrapper for every domain endpoint. `succeeded` is authoritative;
/// the HTTP status is always 200.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub succeeded: bool,
    pub messages: Vec<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            succeeded: true,
            messages: Vec::new(),
        }
    }

    pub fn fail(messages: Vec<String>) -> Self {
        Self {
            data: None,
            succeeded: false,
            messages,
        }
    }
}

impl<T> From<ServiceResult<T>> for Envelope<T> {
    fn from(result: ServiceResult<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::fail(failure_messages(&err)),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaginatedEnvelope<T> {
    pub data: Vec<T>,
    pub total_count: u64,
    pub page_nr: u64,
    pub page_size: u64,
    pub succeeded: bool,
    pub messages: Vec<String>,
}

impl<T> PaginatedEnvelope<T> {
    /// A failed page echoes the requested paging with no rows.
    pub fn from_result(result: ServiceResult<Page<T>>, params: &PageParameters) -> Self {
        match result {
            Ok(page) => Self {
                data: page.items,
                total_count: page.total_count,
                page_nr: page.page_nr,
                page_size: page.page_size,
                succeeded: true,
                messages: Vec::new(),
            },
            Err(err) => Self {
                data: Vec::new(),
                total_count: 0,
                page_nr: params.page_nr,
                page_size: params.page_size,
                succeeded: false,
                messages: failure_messages(&err),
            },
        }
    }
}

impl<T: Serialize> IntoResponse for PaginatedEnvelope<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

fn failure_messages(err: &ServiceError) -> Vec<String> {
    tracing::Span::current().record("error", tracing::field::display(err));
    err.messages()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_serializes_pascal_case() {
        let json = serde_json::to_value(Envelope::success(7)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"Data": 7, "Succeeded": true, "Messages": []})
        );
    }

    #[test]
    fn failure_omits_data() {
        let envelope: Envelope<String> =
            Err(ServiceError::not_found("Learner", "x")).into();
        let json = serde_json::to_value(envelope).unwrap();
        assert_eq!(json.get("Data"), None);
        assert_eq!(json["Succeeded"], false);
        assert_eq!(json["Messages"][0], "Learner with id x was not found");
    }

    #[test]
    fn failed_page_keeps_requested_paging() {
        let params = PageParameters::new(3, 20);
        let envelope: PaginatedEnvelope<u8> = PaginatedEnvelope::from_result(
            Err(ServiceError::validation("bad")),
            &params,
        );
        let json = serde_json::to_value(envelope).unwrap();
        assert_eq!(json["Data"], serde_json::json!([]));
        assert_eq!(json["TotalCount"], 0);
        assert_eq!(json["PageNr"], 3);
        assert_eq!(json["PageSize"], 20);
        assert_eq!(json["Succeeded"], false);
    }
}
