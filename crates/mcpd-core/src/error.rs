//! Domain error taxonomy.
//!
//! Every fallible daemon operation funnels into one of these sentinels so
//! that the gateway can map an error to an HTTP status and a coarse
//! category header without string inspection.

#[derive(thiserror::Error, Debug)]
pub enum DaemonError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("tool not allowed: '{tool}' on server '{server}'")]
    ToolForbidden { server: String, tool: String },

    #[error("prompt not allowed: '{prompt}' on server '{server}'")]
    PromptForbidden { server: String, prompt: String },

    #[error("resource not allowed: '{uri}' on server '{server}'")]
    ResourceForbidden { server: String, uri: String },

    #[error("server not found: '{0}'")]
    ServerNotFound(String),

    #[error("no tools registered for server '{0}'")]
    ToolsNotFound(String),

    #[error("server health is not being tracked: '{0}'")]
    HealthNotTracked(String),

    #[error("prompt not found: '{prompt}' on server '{server}'")]
    PromptNotFound { server: String, prompt: String },

    #[error("resource not found: '{uri}' on server '{server}'")]
    ResourceNotFound { server: String, uri: String },

    #[error("server '{0}' does not implement prompts")]
    PromptsNotImplemented(String),

    #[error("server '{0}' does not implement resources")]
    ResourcesNotImplemented(String),

    #[error("listing tools on server '{server}' failed: {reason}")]
    ToolListFailed { server: String, reason: String },

    #[error("calling tool '{tool}' on server '{server}' failed: {reason}")]
    ToolCallFailed {
        server: String,
        tool: String,
        reason: String,
    },

    #[error("calling tool '{tool}' on server '{server}' failed without detail")]
    ToolCallFailedUnknown { server: String, tool: String },

    #[error("listing prompts on server '{server}' failed: {reason}")]
    PromptListFailed { server: String, reason: String },

    #[error("getting prompt '{prompt}' from server '{server}' failed: {reason}")]
    PromptGetFailed {
        server: String,
        prompt: String,
        reason: String,
    },

    #[error("listing resources on server '{server}' failed: {reason}")]
    ResourceListFailed { server: String, reason: String },

    #[error("listing resource templates on server '{server}' failed: {reason}")]
    ResourceTemplateListFailed { server: String, reason: String },

    #[error("reading resource '{uri}' from server '{server}' failed: {reason}")]
    ResourceReadFailed {
        server: String,
        uri: String,
        reason: String,
    },

    #[error("{0}")]
    Internal(String),
}

impl DaemonError {
    /// Coarse category slug, surfaced as the `Mcpd-Error-Type` header.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad-request",
            Self::ToolForbidden { .. } => "tool-forbidden",
            Self::PromptForbidden { .. } => "prompt-forbidden",
            Self::ResourceForbidden { .. } => "resource-forbidden",
            Self::ServerNotFound(_) => "server-not-found",
            Self::ToolsNotFound(_) => "tools-not-found",
            Self::HealthNotTracked(_) => "health-not-tracked",
            Self::PromptNotFound { .. } => "prompt-not-found",
            Self::ResourceNotFound { .. } => "resource-not-found",
            Self::PromptsNotImplemented(_) => "prompts-not-implemented",
            Self::ResourcesNotImplemented(_) => "resources-not-implemented",
            Self::ToolListFailed { .. } => "tool-list-failed",
            Self::ToolCallFailed { .. } => "tool-call-failed",
            Self::ToolCallFailedUnknown { .. } => "tool-call-failed-unknown",
            Self::PromptListFailed { .. } => "prompt-list-failed",
            Self::PromptGetFailed { .. } => "prompt-get-failed",
            Self::ResourceListFailed { .. } => "resource-list-failed",
            Self::ResourceTemplateListFailed { .. } => "resource-template-list-failed",
            Self::ResourceReadFailed { .. } => "resource-read-failed",
            Self::Internal(_) => "request-pipeline-failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DaemonError;

    #[test]
    fn display_names_the_server_and_tool() {
        let err = DaemonError::ToolForbidden {
            server: "time".into(),
            tool: "wipe".into(),
        };
        assert_eq!(err.to_string(), "tool not allowed: 'wipe' on server 'time'");
    }

    #[test]
    fn health_not_tracked_message_is_operator_facing() {
        let err = DaemonError::HealthNotTracked("ghost".into());
        assert_eq!(
            err.to_string(),
            "server health is not being tracked: 'ghost'"
        );
    }

    #[test]
    fn kind_slugs_are_stable() {
        let err = DaemonError::ResourceTemplateListFailed {
            server: "fs".into(),
            reason: "broken pipe".into(),
        };
        assert_eq!(err.kind(), "resource-template-list-failed");
        assert_eq!(
            DaemonError::Internal("boom".into()).kind(),
            "request-pipeline-failure"
        );
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DaemonError>();
    }
}
