// File: src/client/core.rs
use crate::client::cert::NoVerifier;
use crate::client::middleware::{UserAgentLayer, UserAgentService};
use crate::client::{GatewayError, MoveGateway};
use crate::model::{Board, BoardSummary, Card, Column};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use http::{Method, Request, StatusCode, Uri};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::auth::AddAuthorization;
use tower_layer::Layer;
use tower_service::Service;

type HttpsClient = UserAgentService<
    AddAuthorization<
        Client<
            hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
            String,
        >,
    >,
>;

/// REST client for the board backend. Constructed once per configured
/// server; an empty URL yields an offline client whose calls fail with
/// [`GatewayError::Offline`] so the UI can still browse cached boards.
#[derive(Clone, Debug)]
pub struct BoardClient {
    http: Option<HttpsClient>,
    base: String,
}

impl BoardClient {
    pub fn new(
        url: &str,
        username: &str,
        password: &str,
        token: Option<&str>,
        insecure: bool,
    ) -> Result<Self, String> {
        if url.is_empty() {
            return Ok(Self {
                http: None,
                base: String::new(),
            });
        }
        url.parse::<Uri>()
            .map_err(|e: http::uri::InvalidUri| e.to_string())?;
        let base = url.trim_end_matches('/').to_string();

        let tls_config_builder = rustls::ClientConfig::builder();

        let tls_config = if insecure {
            tls_config_builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerifier))
                .with_no_client_auth()
        } else {
            let mut root_store = rustls::RootCertStore::empty();
            let result = rustls_native_certs::load_native_certs();
            root_store.add_parsable_certificates(result.certs);
            if root_store.is_empty() {
                return Err("No valid system certificates found.".to_string());
            }
            tls_config_builder
                .with_root_certificates(root_store)
                .with_no_client_auth()
        };

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
        let auth_client = match token {
            Some(t) if !t.is_empty() => AddAuthorization::bearer(http_client, t),
            _ => AddAuthorization::basic(http_client, username, password),
        };
        let with_agent = UserAgentLayer::new(format!("tablo/{}", env!("CARGO_PKG_VERSION")))
            .layer(auth_client);

        Ok(Self {
            http: Some(with_agent),
            base,
        })
    }

    pub fn is_online(&self) -> bool {
        self.http.is_some()
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<(StatusCode, String), GatewayError> {
        let mut svc = self.http.clone().ok_or(GatewayError::Offline)?;
        let url = format!("{}{}", self.base, path);

        // User-Agent and Accept are stamped by the middleware layer.
        let mut builder = Request::builder().method(method).uri(url);
        if body.is_some() {
            builder = builder.header(http::header::CONTENT_TYPE, "application/json");
        }
        let req = builder
            .body(body.unwrap_or_default())
            .map_err(|e| GatewayError::Network(format!("request build: {}", e)))?;

        let svc = svc
            .ready()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        let resp = svc
            .call(req)
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?
            .to_bytes();
        let text = String::from_utf8_lossy(bytes.as_ref()).to_string();
        Ok((status, text))
    }

    // --- BOARDS ---

    pub async fn get_boards(&self) -> Result<Vec<BoardSummary>, GatewayError> {
        let (status, text) = self.send(Method::GET, "/boards", None).await?;
        decode(&expect_success(status, text)?)
    }

    pub async fn get_board(&self, board_id: &str) -> Result<Board, GatewayError> {
        let (status, text) = self
            .send(Method::GET, &format!("/boards/{}", board_id), None)
            .await?;
        decode(&expect_success(status, text)?)
    }

    pub async fn create_board(&self, name: &str, description: &str) -> Result<Board, GatewayError> {
        let body = encode(&BoardBody { name, description })?;
        let (status, text) = self.send(Method::POST, "/boards", Some(body)).await?;
        decode(&expect_success(status, text)?)
    }

    pub async fn update_board(
        &self,
        board_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Board, GatewayError> {
        let body = encode(&BoardBody { name, description })?;
        let (status, text) = self
            .send(Method::PUT, &format!("/boards/{}", board_id), Some(body))
            .await?;
        decode(&expect_success(status, text)?)
    }

    pub async fn delete_board(&self, board_id: &str) -> Result<(), GatewayError> {
        let (status, text) = self
            .send(Method::DELETE, &format!("/boards/{}", board_id), None)
            .await?;
        expect_success(status, text)?;
        Ok(())
    }

    /// Fetches full boards for the given summaries concurrently (cache
    /// warming on startup). Individual failures are logged and skipped.
    pub async fn prefetch_boards(&self, summaries: &[BoardSummary]) -> Vec<(String, Board)> {
        let ids: Vec<String> = summaries.iter().map(|summary| summary.id.clone()).collect();
        let futures = ids.into_iter().map(|id| async move {
            match self.get_board(&id).await {
                Ok(board) => Some((id, board)),
                Err(e) => {
                    log::debug!("prefetch of board {} failed: {}", id, e);
                    None
                }
            }
        });

        let results: Vec<Option<(String, Board)>> =
            stream::iter(futures).buffer_unordered(4).collect().await;
        results.into_iter().flatten().collect()
    }

    // --- COLUMNS ---

    pub async fn create_column(&self, board_id: &str, name: &str) -> Result<Column, GatewayError> {
        let body = encode(&NameBody { name })?;
        let (status, text) = self
            .send(
                Method::POST,
                &format!("/boards/{}/columns", board_id),
                Some(body),
            )
            .await?;
        decode(&expect_success(status, text)?)
    }

    pub async fn rename_column(&self, column_id: &str, name: &str) -> Result<Column, GatewayError> {
        let body = encode(&NameBody { name })?;
        let (status, text) = self
            .send(Method::PUT, &format!("/columns/{}", column_id), Some(body))
            .await?;
        decode(&expect_success(status, text)?)
    }

    pub async fn delete_column(&self, column_id: &str) -> Result<(), GatewayError> {
        let (status, text) = self
            .send(Method::DELETE, &format!("/columns/{}", column_id), None)
            .await?;
        expect_success(status, text)?;
        Ok(())
    }

    pub async fn reorder_columns(
        &self,
        board_id: &str,
        column_ids: &[String],
    ) -> Result<(), GatewayError> {
        let body = encode(&ReorderColumnsBody { column_ids })?;
        let (status, text) = self
            .send(
                Method::PUT,
                &format!("/boards/{}/columns/reorder", board_id),
                Some(body),
            )
            .await?;
        expect_success(status, text)?;
        Ok(())
    }

    // --- CARDS ---

    pub async fn create_card(&self, column_id: &str, title: &str) -> Result<Card, GatewayError> {
        let body = encode(&NewCardBody {
            title,
            description: "",
        })?;
        let (status, text) = self
            .send(Method::POST, &format!("/cards/{}", column_id), Some(body))
            .await?;
        decode(&expect_success(status, text)?)
    }

    pub async fn update_card(&self, card: &Card) -> Result<Card, GatewayError> {
        let body = encode(card)?;
        let (status, text) = self
            .send(Method::PUT, &format!("/cards/{}", card.id), Some(body))
            .await?;
        decode(&expect_success(status, text)?)
    }

    pub async fn delete_card(&self, card_id: &str) -> Result<(), GatewayError> {
        let (status, text) = self
            .send(Method::DELETE, &format!("/cards/{}", card_id), None)
            .await?;
        expect_success(status, text)?;
        Ok(())
    }
}

#[async_trait]
impl MoveGateway for BoardClient {
    async fn move_card(
        &self,
        card_id: &str,
        source_column_id: &str,
        dest_column_id: &str,
        new_index: usize,
    ) -> Result<(), GatewayError> {
        log::debug!(
            "move_card {}: {} -> {}[{}]",
            card_id,
            source_column_id,
            dest_column_id,
            new_index
        );
        let body = encode(&MoveCardBody {
            new_column_id: dest_column_id,
            new_position: new_index,
        })?;
        let (status, text) = self
            .send(
                Method::PATCH,
                &format!("/cards/{}/move", card_id),
                Some(body),
            )
            .await?;
        expect_success(status, text)?;
        Ok(())
    }
}

// --- WIRE HELPERS ---

fn encode<B: Serialize>(body: &B) -> Result<String, GatewayError> {
    serde_json::to_string(body).map_err(|e| GatewayError::Decode(format!("encode: {}", e)))
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, GatewayError> {
    serde_json::from_str(text).map_err(|e| GatewayError::Decode(e.to_string()))
}

fn expect_success(status: StatusCode, text: String) -> Result<String, GatewayError> {
    if status.is_success() {
        Ok(text)
    } else {
        Err(GatewayError::Http {
            status: status.as_u16(),
            message: snippet(&text),
        })
    }
}

fn snippet(text: &str) -> String {
    let flat = text.trim().replace('\n', " ");
    let mut out: String = flat.chars().take(200).collect();
    if flat.chars().count() > 200 {
        out.push_str("...");
    }
    out
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveCardBody<'a> {
    new_column_id: &'a str,
    new_position: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReorderColumnsBody<'a> {
    column_ids: &'a [String],
}

#[derive(Serialize)]
struct NameBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct BoardBody<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct NewCardBody<'a> {
    title: &'a str,
    description: &'a str,
}
