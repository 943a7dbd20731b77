//! Corporate registry client (gBizINFO).
//!
//! Resolves free-text company names to corporate numbers, which key the
//! research cache.

pub mod handlers;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::company::CompanyBasicInfo;

const GBIZ_API_URL: &str = "https://info.gbiz.go.jp/hojin/v1/hojin";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("GBIZ_API_KEY is not set")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct GbizResponse {
    #[serde(rename = "hojin-infos", default)]
    hojin_infos: Vec<GbizCompany>,
}

#[derive(Debug, Deserialize)]
struct GbizCompany {
    corporate_number: String,
    name: String,
}

#[derive(Clone)]
pub struct RegistryClient {
    client: Client,
    api_key: Option<String>,
}

impl RegistryClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Searches the registry for active companies matching `keyword`.
    pub async fn search_companies(
        &self,
        keyword: &str,
    ) -> Result<Vec<CompanyBasicInfo>, RegistryError> {
        let api_key = self.api_key.as_deref().ok_or(RegistryError::MissingApiKey)?;

        let response = self
            .client
            .get(GBIZ_API_URL)
            .query(&[("name", keyword), ("exist_flg", "true")])
            .header("X-hojinInfo-api-token", api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: GbizResponse = response.json().await?;
        debug!(
            "Registry search for \"{keyword}\" returned {} companies",
            body.hojin_infos.len()
        );

        Ok(body
            .hojin_infos
            .into_iter()
            .map(|c| CompanyBasicInfo {
                company_id: c.corporate_number,
                company_name: c.name,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_response_parses_hyphenated_key() {
        let body: GbizResponse = serde_json::from_str(
            r#"{"hojin-infos": [
                {"corporate_number": "7010001000000", "name": "株式会社サンプル", "location": "東京都"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(body.hojin_infos.len(), 1);
        assert_eq!(body.hojin_infos[0].corporate_number, "7010001000000");
        assert_eq!(body.hojin_infos[0].name, "株式会社サンプル");
    }

    #[test]
    fn test_registry_response_tolerates_missing_list() {
        let body: GbizResponse = serde_json::from_str(r#"{"message": "200 - OK"}"#).unwrap();
        assert!(body.hojin_infos.is_empty());
    }
}
