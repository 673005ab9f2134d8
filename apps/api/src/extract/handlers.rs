//! Axum route handlers for the Text Extractor, plus the multipart reader the
//! other upload routes share.

use std::collections::HashMap;

use axum::{
    extract::{multipart::MultipartError, FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::json::JsonBody;
use crate::extract::{
    extract_text, fetch_document, resolve_format, DocumentFormat, MAX_DOCUMENT_BYTES,
};
use crate::state::AppState;

/// Name of the multipart part that carries the document.
const FILE_FIELD: &str = "file";

/// A document received through a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    /// Text parts sent alongside the file.
    pub fields: HashMap<String, String>,
}

impl Upload {
    /// File name without directory or extension, when the client sent one.
    pub fn stem(&self) -> Option<&str> {
        let name = self.file_name.as_deref()?;
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem).trim();
        (!stem.is_empty()).then_some(stem)
    }
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::MissingInput(format!("invalid multipart body: {}", e.body_text()))
}

/// Reads the `file` part and any text parts. A form without a file is `MissingInput`.
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut file = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == FILE_FIELD {
            let content_type = field.content_type().map(str::to_string);
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(bad_multipart)?;
            file = Some((bytes, content_type, file_name));
        } else {
            let value = field.text().await.map_err(bad_multipart)?;
            fields.insert(name, value);
        }
    }

    let (bytes, content_type, file_name) =
        file.ok_or_else(|| AppError::MissingInput("No file provided".to_string()))?;
    Ok(Upload {
        bytes,
        content_type,
        file_name,
        fields,
    })
}

#[derive(Debug, Deserialize)]
pub struct ExtractUrlRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub format: DocumentFormat,
    pub text: String,
}

pub(crate) fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("multipart/form-data"))
}

/// Downloads the document at `url` within the upstream time bound. The last
/// path segment stands in for the file name.
pub(crate) async fn fetch_upload(state: &AppState, url: &str) -> Result<Upload, AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::MissingInput("url or file is required".to_string()));
    }
    let fetch = fetch_document(&state.http, url, MAX_DOCUMENT_BYTES);
    let (bytes, content_type) = tokio::time::timeout(state.upstream_timeout, fetch)
        .await
        .map_err(|_| AppError::UpstreamTimeout(state.upstream_timeout))??;

    let file_name = reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments()?.last().map(str::to_string))
        .filter(|name| !name.is_empty());
    Ok(Upload {
        bytes,
        content_type,
        file_name,
        fields: HashMap::new(),
    })
}

/// POST /api/v1/documents/extract
///
/// Accepts either a multipart `file` or a JSON `{ "url": ... }` body.
pub async fn handle_extract(
    State(state): State<AppState>,
    _user: CurrentUser,
    request: Request,
) -> Result<Json<ExtractResponse>, AppError> {
    let upload = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::MissingInput(e.body_text()))?;
        read_upload(multipart).await?
    } else {
        let JsonBody(body) = JsonBody::<ExtractUrlRequest>::from_request(request, &state).await?;
        fetch_upload(&state, &body.url).await?
    };

    let format = resolve_format(&upload.bytes, upload.content_type.as_deref())?;
    let text = extract_text(upload.bytes, Some(format.mime())).await?;
    Ok(Json(ExtractResponse { format, text }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(file_name: Option<&str>) -> Upload {
        Upload {
            bytes: Bytes::new(),
            content_type: None,
            file_name: file_name.map(str::to_string),
            fields: HashMap::new(),
        }
    }

    #[test]
    fn test_stem_strips_path_and_extension() {
        assert_eq!(upload(Some("Jane Doe CV.pdf")).stem(), Some("Jane Doe CV"));
        assert_eq!(upload(Some("C:\\docs\\resume.docx")).stem(), Some("resume"));
        assert_eq!(upload(Some("resume")).stem(), Some("resume"));
        assert_eq!(upload(Some(".pdf")).stem(), None);
        assert_eq!(upload(None).stem(), None);
    }
}
