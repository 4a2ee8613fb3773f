//! Mock search function.
//!
//! Stands in for the registered `search-notes` function: it accepts a
//! query payload and returns a canned result list. Real search over note
//! metadata happens in the repository; this exists so the
//! function-invocation seam stays exercised end to end.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use studynotes_core::{defaults, Error, FunctionInvoker, Result};

/// Invoker that answers `search-notes` with a canned payload.
#[derive(Clone, Default)]
pub struct MockSearchFunction;

impl MockSearchFunction {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FunctionInvoker for MockSearchFunction {
    async fn invoke(&self, function: &str, payload: JsonValue) -> Result<JsonValue> {
        if function != defaults::SEARCH_FUNCTION {
            return Err(Error::InvalidInput(format!(
                "unknown function: {function}"
            )));
        }
        let query = payload
            .get("query")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        let body = json!({
            "results": [
                {
                    "id": "search-result-1",
                    "title": format!("Search result for: {query}"),
                    "subject": "Example Subject"
                }
            ]
        });
        // The body travels as a JSON string, matching the function's wire
        // contract.
        Ok(json!({
            "statusCode": 200,
            "body": body.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_response_echoes_query() {
        let invoker = MockSearchFunction::new();
        let response = invoker
            .invoke(defaults::SEARCH_FUNCTION, json!({"query": "calculus"}))
            .await
            .unwrap();
        assert_eq!(response["statusCode"], 200);
        let body: JsonValue =
            serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["results"][0]["title"], "Search result for: calculus");
        assert_eq!(body["results"][0]["id"], "search-result-1");
    }

    #[tokio::test]
    async fn test_unknown_function_rejected() {
        let invoker = MockSearchFunction::new();
        let err = invoker.invoke("delete-everything", json!({})).await;
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }
}
