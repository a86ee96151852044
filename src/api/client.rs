//! HTTP implementation of the widget API.

use async_trait::async_trait;
use url::Url;

use crate::forms::FormSubmission;
use crate::identity::{ConversationId, TenantKey, VisitorId};

use super::config::ClientConfig;
use super::error::WidgetApiError;
use super::types::{AgentReply, FormConfirmation, WidgetConfig};
use super::WidgetApi;

/// Widget API client over HTTP/JSON.
pub struct HttpWidgetClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWidgetClient {
    /// Create a new client from a configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be created.
    pub fn new(config: ClientConfig) -> Result<Self, WidgetApiError> {
        // Validate the base once so endpoint building later is just string
        // assembly.
        Url::parse(&config.base_url)?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let client = Self::build_client(&config)?;

        Ok(Self { client, base_url })
    }

    /// Build an HTTP client with bounded timeouts.
    fn build_client(config: &ClientConfig) -> Result<reqwest::Client, WidgetApiError> {
        use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

        let mut headers = HeaderMap::new();
        if let Ok(ua) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        if let Ok(accept) = HeaderValue::from_str("application/json") {
            headers.insert(ACCEPT, accept);
        }

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .build()
            .map_err(|e| WidgetApiError::HttpClient(e.to_string()))
    }

    fn config_endpoint(&self, tenant: &TenantKey) -> Result<Url, WidgetApiError> {
        Ok(Url::parse(&format!(
            "{}/widget/{tenant}/config",
            self.base_url
        ))?)
    }

    fn message_endpoint(&self, tenant: &TenantKey) -> Result<Url, WidgetApiError> {
        Ok(Url::parse(&format!(
            "{}/widget/{tenant}/message",
            self.base_url
        ))?)
    }

    fn form_endpoint(&self, tenant: &TenantKey) -> Result<Url, WidgetApiError> {
        Ok(Url::parse(&format!(
            "{}/widget/{tenant}/form",
            self.base_url
        ))?)
    }

    fn end_endpoint(&self, conversation: &ConversationId) -> Result<Url, WidgetApiError> {
        Ok(Url::parse(&format!(
            "{}/chat/conversations/{conversation}/end",
            self.base_url
        ))?)
    }
}

#[async_trait]
impl WidgetApi for HttpWidgetClient {
    async fn fetch_config(&self, tenant: &TenantKey) -> Result<WidgetConfig, WidgetApiError> {
        let url = self.config_endpoint(tenant)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(WidgetApiError::from_transport)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(WidgetApiError::TenantNotFound(tenant.to_string()));
        }
        if !response.status().is_success() {
            return Err(WidgetApiError::ServiceUnavailable(format!(
                "config fetch returned status: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    async fn send_message(
        &self,
        tenant: &TenantKey,
        visitor: &VisitorId,
        text: &str,
        conversation: Option<&ConversationId>,
    ) -> Result<AgentReply, WidgetApiError> {
        let url = self.message_endpoint(tenant)?;
        let body = SendMessageBody {
            visitor_id: visitor.as_str(),
            message: text,
            conversation_id: conversation.map(ConversationId::as_str),
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(WidgetApiError::from_transport)?;

        if !response.status().is_success() {
            return Err(WidgetApiError::ServiceUnavailable(format!(
                "message send returned status: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    async fn submit_form(
        &self,
        tenant: &TenantKey,
        visitor: &VisitorId,
        submission: &FormSubmission,
        conversation: &ConversationId,
    ) -> Result<FormConfirmation, WidgetApiError> {
        let url = self.form_endpoint(tenant)?;
        let body = SubmitFormBody {
            form_id: &submission.form_id,
            submitted_data: submission.submitted_data(),
            conversation_id: conversation.as_str(),
            visitor_id: visitor.as_str(),
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(WidgetApiError::from_transport)?;

        if !response.status().is_success() {
            return Err(WidgetApiError::ServiceUnavailable(format!(
                "form submit returned status: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    async fn end_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<(), WidgetApiError> {
        let url = self.end_endpoint(conversation)?;
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(WidgetApiError::from_transport)?;

        if !response.status().is_success() {
            return Err(WidgetApiError::ServiceUnavailable(format!(
                "end call returned status: {}",
                response.status()
            )));
        }

        Ok(())
    }
}

// Request body structures

#[derive(Debug, serde::Serialize)]
struct SendMessageBody<'a> {
    visitor_id: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<&'a str>,
}

#[derive(Debug, serde::Serialize)]
struct SubmitFormBody<'a> {
    form_id: &'a str,
    submitted_data: serde_json::Value,
    conversation_id: &'a str,
    visitor_id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> HttpWidgetClient {
        HttpWidgetClient::new(
            ClientConfig::new().with_base_url("https://widget.example.com/"),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_building() {
        let client = test_client();
        let tenant = TenantKey::new("acme").unwrap();

        assert_eq!(
            client.config_endpoint(&tenant).unwrap().as_str(),
            "https://widget.example.com/widget/acme/config"
        );
        assert_eq!(
            client.message_endpoint(&tenant).unwrap().as_str(),
            "https://widget.example.com/widget/acme/message"
        );
        assert_eq!(
            client
                .end_endpoint(&ConversationId::from_server("conv-9"))
                .unwrap()
                .as_str(),
            "https://widget.example.com/chat/conversations/conv-9/end"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = HttpWidgetClient::new(ClientConfig::new().with_base_url("not a url"));
        assert!(matches!(result, Err(WidgetApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_message_body_omits_absent_conversation() {
        let body = SendMessageBody {
            visitor_id: "v-1",
            message: "hi",
            conversation_id: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("conversation_id").is_none());

        let body = SendMessageBody {
            visitor_id: "v-1",
            message: "hi",
            conversation_id: Some("conv-1"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["conversation_id"], "conv-1");
    }
}
