use grid_store::DocumentStore;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::decode::parse_params;
use crate::service::TableService;

#[derive(Serialize)]
struct TableView<'a> {
    columns: Vec<&'a str>,
    max_rows: u64,
    searchable: bool,
}

/// Maps plain `http` requests onto a [`TableService`].
pub struct TableHttp<S: ?Sized> {
    service: TableService<S>,
}

impl<S: DocumentStore + ?Sized> TableHttp<S> {
    pub fn new(service: TableService<S>) -> Self {
        Self { service }
    }

    pub async fn handle(&self, req: Request<Vec<u8>>) -> Response<Vec<u8>> {
        self.handle_with_cancel(req, &CancellationToken::new()).await
    }

    pub async fn handle_with_cancel(
        &self,
        req: Request<Vec<u8>>,
        cancel: &CancellationToken,
    ) -> Response<Vec<u8>> {
        let path = req.uri().path().trim_end_matches('/');
        match (req.method(), path) {
            (&Method::GET, "/config") => self.get_config(),
            (&Method::GET, "/data") => {
                let query = req.uri().query().unwrap_or("");
                self.get_data(query.as_bytes(), cancel).await
            }
            (&Method::POST, "/data") => self.get_data(req.body(), cancel).await,
            _ => error_response(StatusCode::NOT_FOUND, "not found"),
        }
    }

    fn get_config(&self) -> Response<Vec<u8>> {
        let config = self.service.config();
        let view = TableView {
            columns: config.columns.iter().map(|c| c.name.as_str()).collect(),
            max_rows: config.max_rows,
            searchable: !config.search_fields.is_empty(),
        };
        match serde_json::to_vec(&view) {
            Ok(body) => json_response(StatusCode::OK, body),
            Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        }
    }

    async fn get_data(&self, params: &[u8], cancel: &CancellationToken) -> Response<Vec<u8>> {
        let params = parse_params(params);
        match self.service.get_table_data(&params, cancel).await {
            Ok(table) => match serde_json::to_vec(&table) {
                Ok(body) => json_response(StatusCode::OK, body),
                Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
            },
            Err(e) => {
                let status = e.status_code();
                warn!(
                    collection = %self.service.config().collection,
                    status = status.as_u16(),
                    error = %e,
                    "table request failed"
                );
                error_response(status, &e.to_string())
            }
        }
    }
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response<Vec<u8>> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn error_response(status: StatusCode, message: &str) -> Response<Vec<u8>> {
    let body = serde_json::json!({ "error": message });
    json_response(status, body.to_string().into_bytes())
}
