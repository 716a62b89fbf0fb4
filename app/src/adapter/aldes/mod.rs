mod client;

pub use client::AldesClient;

use infrastructure::HttpClientConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AldesCloud {
    #[serde(default = "default_url")]
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub http: HttpClientConfig,
}

fn default_url() -> String {
    "https://aldesiotsuite-aldeswebapi.azurewebsites.net".to_string()
}

impl AldesCloud {
    pub fn new_client(&self) -> anyhow::Result<AldesClient> {
        let client = self.http.new_tracing_client()?;
        Ok(AldesClient::new(client, &self.url, &self.username, &self.password))
    }
}
