// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Erros da aplicação. Os do pipeline (parser, geocoder) nunca chegam aqui
// como resposta: são recuperados localmente. Só a leitura da tabela é fatal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Lead não encontrado: {0}")]
    LeadNotFound(String),

    // A tabela respondeu, mas com status de erro
    #[error("Erro na leitura da tabela de leads ({status}): {body}")]
    LeadStore { status: u16, body: String },

    // Falha de rede / decodificação ao falar com um serviço externo
    #[error("Erro de comunicação HTTP: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Usado apenas dentro do adaptador de geocodificação (vira `None` lá)
    #[error("Erro na geocodificação: {0}")]
    Geocoding(String),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::LeadNotFound(_) => StatusCode::NOT_FOUND,
            AppError::LeadStore { .. } | AppError::HttpClient(_) | AppError::Geocoding(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match self {
            // Devolvemos todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais parâmetros são inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::LeadNotFound(id) => format!("Lead '{}' não encontrado.", id),

            // O detalhe vai para o log, o cliente recebe uma mensagem estável.
            ref e @ (AppError::LeadStore { .. } | AppError::HttpClient(_) | AppError::Geocoding(_)) => {
                tracing::error!("Falha em serviço externo: {}", e);
                "Não foi possível obter os leads da fonte de dados.".to_string()
            }
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                "Ocorreu um erro inesperado.".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
