//! Text Extractor: turns an uploaded document into plain text.
//!
//! Supported: PDF and DOCX. The format comes from the declared MIME type when one
//! is given, otherwise from the leading bytes. Extraction is pure; the only I/O
//! lives in `fetch_document`, which downloads a document by URL first.

mod docx;
pub mod handlers;
mod pdf;

use bytes::{Bytes, BytesMut};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

const PDF_SIGNATURE: [u8; 4] = [0x25, 0x50, 0x44, 0x46]; // %PDF
const ZIP_SIGNATURE: [u8; 2] = [0x50, 0x4B]; // PK

/// Largest document accepted, whether uploaded or fetched by URL.
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// MIME types that carry no format information; the bytes are sniffed instead.
const GENERIC_MIMES: [&str; 3] = ["", "application/octet-stream", "binary/octet-stream"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("corrupt document: {0}")]
    CorruptDocument(String),

    #[error("could not fetch document: {0}")]
    Fetch(String),

    #[error("invalid document URL: {0}")]
    InvalidUrl(String),

    #[error("document is larger than {limit} bytes")]
    TooLarge { limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// Page-description format.
    Pdf,
    /// Archive-based word-processing format.
    Docx,
}

impl DocumentFormat {
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/pdf" | "application/x-pdf" => Some(DocumentFormat::Pdf),
            DOCX_MIME => Some(DocumentFormat::Docx),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => PDF_MIME,
            DocumentFormat::Docx => DOCX_MIME,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }
}

/// Classifies a buffer by its leading bytes. A buffer cut off inside a known
/// signature is corrupt; any other unknown lead is unsupported.
pub fn sniff(bytes: &[u8]) -> Result<DocumentFormat, ExtractError> {
    if bytes.starts_with(&PDF_SIGNATURE) {
        return Ok(DocumentFormat::Pdf);
    }
    if bytes.starts_with(&ZIP_SIGNATURE) {
        return Ok(DocumentFormat::Docx);
    }
    let truncated = |signature: &[u8]| bytes.len() < signature.len() && signature.starts_with(bytes);
    if truncated(&PDF_SIGNATURE) || truncated(&ZIP_SIGNATURE) {
        return Err(ExtractError::CorruptDocument(
            "document is too short to identify".to_string(),
        ));
    }
    Err(ExtractError::UnsupportedFormat(format!(
        "unrecognized signature {:02X?}",
        &bytes[..bytes.len().min(4)]
    )))
}

/// Picks the format: a specific declared MIME wins, a generic or absent one falls back to sniffing.
pub fn resolve_format(bytes: &[u8], declared: Option<&str>) -> Result<DocumentFormat, ExtractError> {
    match declared.map(str::trim) {
        Some(mime) if !GENERIC_MIMES.contains(&mime) => DocumentFormat::from_mime(mime)
            .ok_or_else(|| ExtractError::UnsupportedFormat(mime.to_string())),
        _ => sniff(bytes),
    }
}

/// Extracts plain text, preserving page/paragraph order.
pub async fn extract_text(source: Bytes, declared: Option<&str>) -> Result<String, ExtractError> {
    let format = resolve_format(&source, declared)?;
    debug!("Extracting {:?} document ({} bytes)", format, source.len());

    let text = match format {
        // pdf-extract is CPU-bound and can panic on malformed input; both are
        // contained by the blocking task.
        DocumentFormat::Pdf => tokio::task::spawn_blocking(move || pdf::extract(&source))
            .await
            .map_err(|e| ExtractError::CorruptDocument(format!("PDF parser aborted: {e}")))??,
        DocumentFormat::Docx => docx::extract(&source)?,
    };

    info!("Extracted {} characters from {:?} document", text.len(), format);
    Ok(text)
}

/// Downloads a document, using the response `Content-Type` as the declared format.
///
/// Only `http` and `https` URLs are fetched. The body is read chunk by chunk and
/// abandoned as soon as it passes `max_bytes`.
pub async fn fetch_document(
    http: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<(Bytes, Option<String>), ExtractError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ExtractError::InvalidUrl(format!(
            "scheme '{}' is not allowed",
            parsed.scheme()
        )));
    }

    let mut response = http
        .get(parsed)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| match e.status() {
            Some(status) => ExtractError::Fetch(format!("document URL returned {status}")),
            None => ExtractError::Fetch("document URL is unreachable".to_string()),
        })?;

    if response
        .content_length()
        .is_some_and(|len| len > max_bytes as u64)
    {
        return Err(ExtractError::TooLarge { limit: max_bytes });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut body = BytesMut::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|_| ExtractError::Fetch("response body could not be read".to_string()))?
    {
        if body.len() + chunk.len() > max_bytes {
            return Err(ExtractError::TooLarge { limit: max_bytes });
        }
        body.extend_from_slice(&chunk);
    }
    debug!("Fetched {} bytes from document URL", body.len());

    Ok((body.freeze(), content_type))
}

#[cfg(test)]
pub(crate) use docx::build_docx;
#[cfg(test)]
pub(crate) use pdf::build_pdf;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{http::header, routing::get, Router};

    /// Serves `router` on an ephemeral port and returns its base URL.
    pub(crate) async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn file_server() -> Router {
        Router::new()
            .route(
                "/cv.docx",
                get(|| async {
                    (
                        [(header::CONTENT_TYPE, DOCX_MIME)],
                        build_docx(&[&["Jane Doe"]]),
                    )
                }),
            )
            .route("/huge.pdf", get(|| async { vec![b'%'; 64 * 1024] }))
    }

    #[test]
    fn test_sniff_pdf_signature() {
        assert_eq!(sniff(b"%PDF-1.7\n...").unwrap(), DocumentFormat::Pdf);
        assert_eq!(
            sniff(&[0x25, 0x50, 0x44, 0x46]).unwrap(),
            DocumentFormat::Pdf
        );
    }

    #[test]
    fn test_sniff_archive_signature() {
        assert_eq!(sniff(&[0x50, 0x4B, 0x03, 0x04]).unwrap(), DocumentFormat::Docx);
    }

    #[test]
    fn test_sniff_unknown_signature_is_unsupported() {
        assert!(matches!(
            sniff(b"GIF89a"),
            Err(ExtractError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            sniff(&[0xD0, 0xCF, 0x11, 0xE0]),
            Err(ExtractError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_sniff_cut_off_signature_is_corrupt() {
        assert!(matches!(sniff(b"P"), Err(ExtractError::CorruptDocument(_))));
        assert!(matches!(sniff(b"%PD"), Err(ExtractError::CorruptDocument(_))));
        assert!(matches!(sniff(b""), Err(ExtractError::CorruptDocument(_))));
    }

    #[test]
    fn test_sniff_short_unknown_lead_is_unsupported() {
        assert!(matches!(sniff(b"G"), Err(ExtractError::UnsupportedFormat(_))));
        assert!(matches!(sniff(b"%X"), Err(ExtractError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_declared_mime_wins_over_sniffing() {
        assert_eq!(
            resolve_format(b"PK\x03\x04", Some("application/pdf")).unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            resolve_format(b"%PDF", Some("application/octet-stream")).unwrap(),
            DocumentFormat::Pdf
        );
        assert!(matches!(
            resolve_format(b"%PDF", Some("image/png")),
            Err(ExtractError::UnsupportedFormat(_))
        ));
        assert_eq!(
            resolve_format(b"", Some("application/pdf; charset=binary")).unwrap(),
            DocumentFormat::Pdf
        );
    }

    #[tokio::test]
    async fn test_truncated_pdf_is_corrupt() {
        let err = extract_text(Bytes::from_static(b"%PDF-1.4\n1 0 obj"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::CorruptDocument(_)));
    }

    #[tokio::test]
    async fn test_docx_extraction_is_idempotent() {
        let doc = Bytes::from(build_docx(&[&["Jane ", "Doe"], &["Backend Engineer"]]));
        let first = extract_text(doc.clone(), None).await.unwrap();
        let second = extract_text(doc, None).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "Jane Doe\nBackend Engineer");
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_declared_type() {
        let base = serve(file_server()).await;

        let (bytes, declared) =
            fetch_document(&reqwest::Client::new(), &format!("{base}/cv.docx"), 1024 * 1024)
                .await
                .unwrap();

        assert_eq!(declared.as_deref(), Some(DOCX_MIME));
        assert_eq!(resolve_format(&bytes, declared.as_deref()).unwrap(), DocumentFormat::Docx);
    }

    #[tokio::test]
    async fn test_fetch_refuses_declared_length_over_limit() {
        let base = serve(file_server()).await;

        let err = fetch_document(&reqwest::Client::new(), &format!("{base}/huge.pdf"), 1024)
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractError::TooLarge { limit: 1024 }));
    }

    /// Answers one request with a chunked body and no `Content-Length`.
    async fn serve_chunked(chunks: usize, chunk_len: usize) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let mut response =
                b"HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nTransfer-Encoding: chunked\r\n\r\n"
                    .to_vec();
            for _ in 0..chunks {
                response.extend_from_slice(format!("{chunk_len:x}\r\n").as_bytes());
                response.extend(std::iter::repeat(b'%').take(chunk_len));
                response.extend_from_slice(b"\r\n");
            }
            response.extend_from_slice(b"0\r\n\r\n");
            // The client may hang up once it has seen enough.
            let _ = socket.write_all(&response).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_fetch_stops_streamed_body_at_limit() {
        let base = serve_chunked(16, 4096).await;

        let err = fetch_document(&reqwest::Client::new(), &format!("{base}/streamed.pdf"), 10_000)
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractError::TooLarge { limit: 10_000 }));
    }

    #[tokio::test]
    async fn test_fetch_only_follows_http_urls() {
        let http = reqwest::Client::new();
        for url in ["file:///etc/passwd", "ftp://files.test/cv.pdf", "not a url"] {
            let err = fetch_document(&http, url, MAX_DOCUMENT_BYTES).await.unwrap_err();
            assert!(matches!(err, ExtractError::InvalidUrl(_)), "{url}");
        }
    }

    #[tokio::test]
    async fn test_pdf_extraction_is_idempotent() {
        let doc = Bytes::from(build_pdf(&["Jane Doe", "Backend Engineer"]));
        assert_eq!(sniff(&doc).unwrap(), DocumentFormat::Pdf);

        let first = extract_text(doc.clone(), None).await.unwrap();
        let second = extract_text(doc, Some(PDF_MIME)).await.unwrap();

        assert_eq!(first, second);
        assert!(first.contains("Jane Doe"), "{first}");
        assert!(first.contains("Backend Engineer"), "{first}");
    }
}
