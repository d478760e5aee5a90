//! JavaScript execution operations for CDP page session.

use serde_json::{Value, json};

use crate::cdp::error::CdpError;

use super::core::PageSession;

impl PageSession {
    /// Evaluate a JavaScript expression and return its JSON value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("Unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    /// Call `function` with JSON arguments; arguments are embedded as literals.
    pub async fn call_function(&self, function: &str, args: &[Value]) -> Result<Value, CdpError> {
        let rendered: Vec<String> = args
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<_, _>>()?;
        let expression = format!("({})({})", function, rendered.join(", "));
        self.evaluate(&expression).await
    }
}
