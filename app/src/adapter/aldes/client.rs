use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use reqwest::StatusCode;
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::core::Document;
use crate::descriptor::AirMode;
use crate::port::{CommandError, ModeCommandChannel, ProductSource};

#[derive(Debug, Clone)]
pub struct AldesClient {
    client: ClientWithMiddleware,
    base_url: String,
    username: String,
    password: String,
    token: Arc<RwLock<Option<String>>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl AldesClient {
    pub fn new(client: ClientWithMiddleware, url: &str, username: &str, password: &str) -> Self {
        Self {
            client,
            base_url: url.trim_end_matches('/').to_owned(),
            username: username.to_owned(),
            password: password.to_owned(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn login(&self) -> anyhow::Result<String> {
        tracing::info!("Requesting new Aldes access token");

        let response = self
            .client
            .post(format!("{}/oauth2/token/", self.base_url))
            .form(&[
                ("grant_type", "password"),
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?
            .error_for_status()
            .context("Error authenticating with Aldes")?;

        let token = response.json::<TokenResponse>().await?.access_token;
        *self.token.write().await = Some(token.clone());

        Ok(token)
    }

    async fn current_token(&self) -> anyhow::Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }

        self.login().await
    }

    /// Sends with the cached token. An expired token gets one re-login and retry.
    async fn send_authorized<F>(&self, request: F) -> anyhow::Result<reqwest::Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.current_token().await?;
        let response = request(&token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::info!("Aldes token rejected, logging in again");
        let token = self.login().await?;

        Ok(request(&token).send().await?)
    }
}

impl ProductSource for AldesClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_products(&self) -> anyhow::Result<Document> {
        let url = format!("{}/aldesoc/v5/users/me/products", self.base_url);

        let response = self
            .send_authorized(|token| self.client.get(&url).bearer_auth(token))
            .await?
            .error_for_status()
            .context("Error fetching Aldes products")?;

        let body = response.text().await?;

        Document::from_json(&body, Utc::now()).context("Error parsing Aldes products")
    }
}

impl ModeCommandChannel for AldesClient {
    #[tracing::instrument(skip(self))]
    async fn set_mode(&self, modem: &str, mode: AirMode) -> Result<(), CommandError> {
        let url = format!("{}/aldesoc/v5/users/me/products/{}/commands", self.base_url, modem);
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "changeMode",
            "id": 1,
            "params": [mode.code()],
        });

        tracing::info!("Changing mode of {} to {} ({})", modem, mode.label(), mode.code());

        let response = self
            .send_authorized(|token| self.client.post(&url).bearer_auth(token).json(&payload))
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(CommandError::RemoteRejected {
            modem: modem.to_owned(),
            code: mode.code(),
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        })
    }
}
