//! Script builders for bridge calls.
//!
//! Every builder emits a self-evaluating expression suitable for
//! `Runtime.evaluate`, never a `return` statement. Method-call scripts
//! implement the envelope contract themselves, so the page side can only
//! ever hand back a well-formed [`crate::ResultEnvelope`].

use crate::envelope::RequestDescriptor;

/// `true` iff the shim marker is present.
pub fn initialization_check() -> String {
    "!!(window.CompanionShim && window.CompanionShim._initialized)".to_string()
}

/// `true` iff the shim is installed and the page's service layer answers.
pub fn availability_check() -> String {
    "!!(window.CompanionShim && window.CompanionShim.util.isAvailable())".to_string()
}

/// `true` iff the page's private service layer itself is reachable,
/// independent of whether the shim has been injected yet.
pub fn services_probe() -> String {
    "(typeof window.services !== 'undefined' && window.services.SBC !== undefined)".to_string()
}

/// Per-namespace availability map, or `null` when the shim is absent.
pub fn available_services() -> String {
    r#"(function() {
        if (!window.CompanionShim || !window.CompanionShim.util) {
            return null;
        }
        return window.CompanionShim.util.getAvailableServices();
    })()"#
        .to_string()
}

/// Render a [`RequestDescriptor`] into its evaluate expression.
pub fn method_call(request: &RequestDescriptor) -> String {
    let args_json = serde_json::to_string(&request.args).unwrap_or_else(|_| "[]".to_string());
    let namespace = request.namespace;
    let method = request.method;

    // Sync shim methods return a value directly; async ones hand back a
    // promise the channel awaits.
    let (opener, invoke) = if request.sync {
        (
            "(function() {",
            format!("var result = window.CompanionShim['{namespace}']['{method}'].apply(null, args);"),
        )
    } else {
        (
            "(async function() {",
            format!(
                "var result = await window.CompanionShim['{namespace}']['{method}'].apply(null, args);"
            ),
        )
    };

    format!(
        r#"{opener}
        if (!window.CompanionShim || !window.CompanionShim._initialized) {{
            return {{ success: false, error: {{ code: 'NOT_INITIALIZED', message: 'CompanionShim not initialized' }} }};
        }}

        if (!window.CompanionShim['{namespace}'] || typeof window.CompanionShim['{namespace}']['{method}'] !== 'function') {{
            return {{ success: false, error: {{ code: 'METHOD_NOT_FOUND', message: 'Method {namespace}.{method} not found' }} }};
        }}

        try {{
            var args = {args_json};
            {invoke}
            return {{ success: true, data: result }};
        }} catch (error) {{
            return {{
                success: false,
                error: {{
                    code: error.code || 'ERROR',
                    message: error.message || 'Unknown error'
                }}
            }};
        }}
    }})()"#
    )
}
