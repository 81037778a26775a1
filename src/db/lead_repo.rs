// src/db/lead_repo.rs

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{common::error::AppError, models::lead::RawLeadRecord};

pub const AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";

// A fonte dos leads. Em produção é a tabela do Airtable; nos testes, um fake.
#[async_trait]
pub trait LeadSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<RawLeadRecord>, AppError>;
}

// O repositório de leads, responsável pela leitura da tabela no Airtable
#[derive(Clone)]
pub struct AirtableLeadRepository {
    client: Client,
    base_url: String,
    api_key: String,
    base_id: String,
    table: String,
    view: String,
}

impl AirtableLeadRepository {
    pub fn new(
        client: Client,
        base_url: String,
        api_key: String,
        base_id: String,
        table: String,
        view: String,
    ) -> Self {
        Self { client, base_url, api_key, base_id, table, view }
    }

    // GET /v0/{base}/{tabela}?view=..&sort[0][field]=Created_At&sort[0][direction]=desc[&offset=..]
    fn page_url(&self, offset: Option<&str>) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("URL do Airtable inválida: {}", e))?;

        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("URL do Airtable não aceita segmentos de caminho"))?
            .pop_if_empty()
            .push(&self.base_id)
            .push(&self.table);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("view", &self.view)
                .append_pair("sort[0][field]", "Created_At")
                .append_pair("sort[0][direction]", "desc");
            if let Some(offset) = offset {
                query.append_pair("offset", offset);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl LeadSource for AirtableLeadRepository {
    // Lê todas as páginas; qualquer falha aborta a leitura inteira (sem resultado parcial)
    async fn fetch_all(&self) -> Result<Vec<RawLeadRecord>, AppError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let url = self.page_url(offset.as_deref())?;

            let response = self.client
                .get(url)
                .bearer_auth(&self.api_key)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                tracing::error!("🔥 Airtable respondeu {} para a tabela {}", status, self.table);
                return Err(AppError::LeadStore { status: status.as_u16(), body });
            }

            let page: AirtablePage = response.json().await?;
            records.extend(page.records);

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        tracing::info!("📥 {} registros lidos da tabela {}", records.len(), self.table);
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct AirtablePage {
    #[serde(default)]
    records: Vec<RawLeadRecord>,
    #[serde(default)]
    offset: Option<String>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{
        extract::Query,
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    // Sobe o router numa porta livre e devolve a URL base (http://127.0.0.1:porta)
    pub(crate) async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn repo_at(base_url: String) -> AirtableLeadRepository {
        AirtableLeadRepository::new(
            Client::new(),
            base_url,
            "key".to_string(),
            "appBase123".to_string(),
            "PiscinasLosHermanos".to_string(),
            "Grid view".to_string(),
        )
    }

    fn repo() -> AirtableLeadRepository {
        AirtableLeadRepository::new(
            Client::new(),
            AIRTABLE_API_URL.to_string(),
            "key".to_string(),
            "appBase123".to_string(),
            "PiscinasLosHermanos".to_string(),
            "Grid view".to_string(),
        )
    }

    #[test]
    fn first_page_url_sorts_by_creation_desc() {
        let url = repo().page_url(None).unwrap();

        assert_eq!(url.path(), "/v0/appBase123/PiscinasLosHermanos");

        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            params,
            vec![
                ("view".to_string(), "Grid view".to_string()),
                ("sort[0][field]".to_string(), "Created_At".to_string()),
                ("sort[0][direction]".to_string(), "desc".to_string()),
            ]
        );
    }

    #[test]
    fn next_page_url_carries_offset() {
        let url = repo().page_url(Some("itr123/rec456")).unwrap();
        let offset = url
            .query_pairs()
            .find(|(k, _)| k == "offset")
            .map(|(_, v)| v.into_owned());
        assert_eq!(offset.as_deref(), Some("itr123/rec456"));
    }

    #[test]
    fn decodes_page_with_and_without_offset() {
        let page: AirtablePage = serde_json::from_value(json!({
            "records": [
                { "id": "rec1", "createdTime": "2024-05-01T10:00:00.000Z", "fields": { "Nombre_Completo": "Ana" } },
                { "id": "rec2", "createdTime": "2024-05-02T10:00:00.000Z" }
            ],
            "offset": "itr1/rec2"
        }))
        .unwrap();

        assert_eq!(page.records.len(), 2);
        assert!(page.records[1].fields.is_null());
        assert_eq!(page.offset.as_deref(), Some("itr1/rec2"));

        let last: AirtablePage = serde_json::from_value(json!({ "records": [] })).unwrap();
        assert!(last.records.is_empty());
        assert_eq!(last.offset, None);
    }

    async fn paged_table(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
        if headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some("Bearer key") {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "AUTHENTICATION_REQUIRED" })));
        }

        let body = match params.get("offset").map(String::as_str) {
            None => json!({
                "records": [
                    { "id": "rec1", "createdTime": "2024-05-01T10:00:00.000Z", "fields": { "Nombre_Completo": "Ana" } },
                    { "id": "rec2", "createdTime": "2024-05-02T10:00:00.000Z", "fields": {} }
                ],
                "offset": "itr1/rec2"
            }),
            Some("itr1/rec2") => json!({
                "records": [
                    { "id": "rec3", "createdTime": "2024-05-03T10:00:00.000Z", "fields": {} }
                ]
            }),
            Some(_) => return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": "LIST_RECORDS_ITERATOR_NOT_AVAILABLE" }))),
        };
        (StatusCode::OK, Json(body))
    }

    #[tokio::test]
    async fn fetch_all_follows_offset_across_pages() {
        let base = serve(Router::new().route("/v0/appBase123/PiscinasLosHermanos", get(paged_table))).await;

        let records = repo_at(format!("{}/v0", base)).fetch_all().await.unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rec1", "rec2", "rec3"]);
        assert_eq!(records[0].fields["Nombre_Completo"], "Ana");
    }

    #[tokio::test]
    async fn rejected_credentials_become_lead_store_error() {
        let base = serve(Router::new().route("/v0/appBase123/PiscinasLosHermanos", get(paged_table))).await;

        let mut repo = repo_at(format!("{}/v0", base));
        repo.api_key = "revogada".to_string();

        let err = repo.fetch_all().await.unwrap_err();
        match err {
            AppError::LeadStore { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("AUTHENTICATION_REQUIRED"));
            }
            other => panic!("erro inesperado: {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_page_is_an_http_client_error() {
        let base = serve(Router::new().route(
            "/v0/appBase123/PiscinasLosHermanos",
            get(|| async { "isto não é json" }),
        ))
        .await;

        let err = repo_at(format!("{}/v0", base)).fetch_all().await.unwrap_err();
        assert!(matches!(err, AppError::HttpClient(_)));
    }
}
