//! Wire shapes for bridge calls.
//!
//! Every service invocation resolves to a [`ResultEnvelope`]: either
//! `{ success: true, data }` or `{ success: false, error: { code, message } }`.
//! Service-level failures are values, never `Err`; only channel breakage
//! propagates as an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error codes the bridge scripts emit.
pub mod codes {
    /// The page's private service layer is not reachable at all.
    pub const SERVICES_UNAVAILABLE: &str = "SERVICES_UNAVAILABLE";
    /// Shim injection ran but the probe afterwards failed.
    pub const INIT_FAILED: &str = "INIT_FAILED";
    /// The shim marker is missing, typically after a page reload.
    pub const NOT_INITIALIZED: &str = "NOT_INITIALIZED";
    /// Namespace or method does not exist on the shim.
    pub const METHOD_NOT_FOUND: &str = "METHOD_NOT_FOUND";
    /// The underlying observer never fired within its deadline.
    pub const TIMEOUT: &str = "TIMEOUT";
    /// Fallback when a thrown error carries no code of its own.
    pub const ERROR: &str = "ERROR";
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResultEnvelope<T> {
    pub success: bool,
    #[serde(default = "none_of", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

fn none_of<T>() -> Option<T> {
    None
}

impl<T> ResultEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorInfo::new(code, message)),
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }

    /// Turn the envelope into a plain `Result`, losing nothing on the error
    /// side: a success without data becomes `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, ErrorInfo> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self
                .error
                .unwrap_or_else(|| ErrorInfo::new(codes::ERROR, "Unknown error")))
        }
    }
}

/// A namespaced method invocation, before it is rendered into a script.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub namespace: &'static str,
    pub method: &'static str,
    pub args: Vec<Value>,
    /// Synchronous shim methods return directly; async ones resolve a promise.
    pub sync: bool,
}

impl RequestDescriptor {
    pub fn call(namespace: &'static str, method: &'static str, args: Vec<Value>) -> Self {
        Self {
            namespace,
            method,
            args,
            sync: false,
        }
    }

    pub fn sync_call(namespace: &'static str, method: &'static str, args: Vec<Value>) -> Self {
        Self {
            namespace,
            method,
            args,
            sync: true,
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_deserializes() {
        let env: ResultEnvelope<Vec<u32>> =
            serde_json::from_value(json!({ "success": true, "data": [1, 2, 3] })).unwrap();
        assert!(env.success);
        assert_eq!(env.into_result().unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn failure_envelope_carries_code_and_message() {
        let env: ResultEnvelope<Value> = serde_json::from_value(json!({
            "success": false,
            "error": { "code": "NOT_INITIALIZED", "message": "CompanionShim not initialized" },
        }))
        .unwrap();
        assert_eq!(env.error_code(), Some(codes::NOT_INITIALIZED));
        let err = env.into_result().unwrap_err();
        assert!(err.message.contains("not initialized"));
    }

    #[test]
    fn failure_without_error_object_falls_back() {
        let env: ResultEnvelope<Value> =
            serde_json::from_value(json!({ "success": false })).unwrap();
        let err = env.into_result().unwrap_err();
        assert_eq!(err.code, codes::ERROR);
        assert_eq!(err.message, "Unknown error");
    }
}
