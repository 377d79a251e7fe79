//! HTTP-shaped responses for each operation.
//!
//! A router would send `status` and `body` as-is. Upstream failure detail is
//! logged here and never sent to the caller.
use crate::aggregate::Aggregation;
use crate::error::GroceryError;
use crate::shopping_list::{AddItemRequest, RequestOrigin};
use serde::Serialize;
use serde_json::{json, Value};

pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn from_error(err: &GroceryError) -> Self {
        let message = match err {
            GroceryError::Validation(message) => message.clone(),
            GroceryError::Upstream(detail) => {
                tracing::error!(error = %format!("{detail:#}"), "request failed upstream");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };
        Self {
            status: err.status_code(),
            body: json!({ "error": message }),
        }
    }
}

pub fn aggregation(result: Result<Aggregation, GroceryError>) -> ApiResponse {
    match result {
        Ok(aggregation) => match serde_json::to_value(&aggregation) {
            Ok(body) => ApiResponse::ok(body),
            Err(err) => ApiResponse::from_error(&GroceryError::Upstream(err.into())),
        },
        Err(err) => ApiResponse::from_error(&err),
    }
}

pub fn item_added(request: &AddItemRequest, result: Result<(), GroceryError>) -> ApiResponse {
    if let Err(err) = result {
        return ApiResponse::from_error(&err);
    }
    let item = &request.item;
    match &request.origin {
        RequestOrigin::Direct => ApiResponse::ok(json!({
            "success": true,
            "message": format!("\"{item}\" added/updated."),
        })),
        RequestOrigin::Assistant { session_id, params } => ApiResponse::ok(json!({
            "session": { "id": session_id, "params": params },
            "prompt": {
                "override": false,
                "firstSimple": {
                    "speech": format!("Okay, I've added {item} to the list."),
                    "text": format!("Added {item}."),
                }
            }
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn upstream_errors_hide_detail() {
        let response = aggregation(Err(GroceryError::Upstream(anyhow!(
            "GET values Menu!A2:C: http status: 403"
        ))));
        assert_eq!(response.status, 500);
        assert_eq!(response.body, json!({ "error": INTERNAL_ERROR_MESSAGE }));
        assert!(!response.is_success());
    }

    #[test]
    fn degraded_aggregation_is_still_ok() {
        let result = Aggregation {
            fallback_error: Some("parse fallback reply as JSON".to_string()),
            ..Aggregation::default()
        };
        let response = aggregation(Ok(result));
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({ "menu": [], "ingredients": [] }));
    }

    #[test]
    fn direct_add_reply() {
        let request = AddItemRequest::direct(" eggs ").expect("request");
        let response = item_added(&request, Ok(()));
        assert_eq!(
            response.body,
            json!({ "success": true, "message": "\"eggs\" added/updated." })
        );
    }

    #[test]
    fn assistant_add_reply_echoes_session() {
        let body = json!({ "session": { "id": "s-1", "params": { "itemName": "milk" } } });
        let request = AddItemRequest::from_body(&body).expect("request");
        let response = item_added(&request, Ok(()));
        assert_eq!(response.body["session"]["id"], json!("s-1"));
        assert_eq!(
            response.body["prompt"]["firstSimple"]["speech"],
            json!("Okay, I've added milk to the list.")
        );
        assert_eq!(response.body["prompt"]["override"], json!(false));
    }

    #[test]
    fn validation_errors_keep_their_message() {
        let response = ApiResponse::from_error(&GroceryError::validation("Item name cannot be empty."));
        assert_eq!(response.status, 400);
        assert_eq!(response.body, json!({ "error": "Item name cannot be empty." }));
    }
}
