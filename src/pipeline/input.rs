//! Input resolution: load a question-paper image from a path, URL or buffer.
//!
//! Only PNG and JPEG photos are accepted. The format is decided from the
//! leading magic bytes, never from the file extension, and the size limit is
//! checked before the bytes are handed to the decoder so an oversized upload
//! is rejected without being decoded.

use crate::error::DocGenError;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF";

/// Image container formats accepted for question papers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
        }
    }
}

/// A validated question-paper image held in memory.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
    /// File path or URL the bytes came from, for error messages.
    pub source_name: String,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Detect PNG or JPEG from the leading bytes.
pub fn sniff(bytes: &[u8]) -> Option<ImageKind> {
    if bytes.starts_with(PNG_MAGIC) {
        Some(ImageKind::Png)
    } else if bytes.starts_with(JPEG_MAGIC) {
        Some(ImageKind::Jpeg)
    } else {
        None
    }
}

/// Resolve the input string to an in-memory image.
///
/// URLs are downloaded with `timeout_secs`; anything else is treated as a
/// local path.
pub async fn load_image(
    input: &str,
    max_bytes: u64,
    timeout_secs: u64,
) -> Result<LoadedImage, DocGenError> {
    if is_url(input) {
        download_url(input, max_bytes, timeout_secs).await
    } else {
        load_local(input, max_bytes).await
    }
}

/// Validate an uploaded buffer: size limit first, then magic bytes.
pub fn image_from_bytes(
    bytes: Vec<u8>,
    source_name: impl Into<String>,
    max_bytes: u64,
) -> Result<LoadedImage, DocGenError> {
    let source_name = source_name.into();
    check_size(bytes.len() as u64, max_bytes)?;
    let kind = sniff(&bytes).ok_or_else(|| DocGenError::UnsupportedImage {
        source_name: source_name.clone(),
        magic: bytes.iter().take(8).copied().collect(),
    })?;
    debug!("{}: {:?}, {} bytes", source_name, kind, bytes.len());
    Ok(LoadedImage {
        bytes,
        kind,
        source_name,
    })
}

async fn load_local(path_str: &str, max_bytes: u64) -> Result<LoadedImage, DocGenError> {
    let path = PathBuf::from(path_str);

    let meta = tokio::fs::metadata(&path)
        .await
        .map_err(|e| map_io_error(e.kind(), &path))?;
    if !meta.is_file() {
        return Err(DocGenError::InvalidInput {
            input: path_str.to_string(),
        });
    }
    check_size(meta.len(), max_bytes)?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| map_io_error(e.kind(), &path))?;

    debug!("Read local image: {}", path.display());
    image_from_bytes(bytes, path_str, max_bytes)
}

async fn download_url(
    url: &str,
    max_bytes: u64,
    timeout_secs: u64,
) -> Result<LoadedImage, DocGenError> {
    if reqwest::Url::parse(url).is_err() {
        return Err(DocGenError::InvalidInput {
            input: url.to_string(),
        });
    }
    info!("Downloading image from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocGenError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let map_err = |e: reqwest::Error| {
        if e.is_timeout() {
            DocGenError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocGenError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let mut response = client.get(url).send().await.map_err(map_err)?;

    if !response.status().is_success() {
        return Err(DocGenError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    // Reject early when the server announces the size.
    if let Some(len) = response.content_length() {
        check_size(len, max_bytes)?;
    }

    // Chunked responses carry no length, so count while reading.
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(map_err)? {
        append_capped(&mut body, &chunk, max_bytes)?;
    }
    info!("Downloaded {} bytes", body.len());

    image_from_bytes(body, url, max_bytes)
}

fn append_capped(body: &mut Vec<u8>, chunk: &[u8], max_bytes: u64) -> Result<(), DocGenError> {
    check_size((body.len() + chunk.len()) as u64, max_bytes)?;
    body.extend_from_slice(chunk);
    Ok(())
}

fn check_size(size: u64, max_bytes: u64) -> Result<(), DocGenError> {
    if size > max_bytes {
        return Err(DocGenError::ImageTooLarge {
            size,
            limit_mb: max_bytes.div_ceil(1024 * 1024),
        });
    }
    Ok(())
}

fn map_io_error(kind: ErrorKind, path: &std::path::Path) -> DocGenError {
    match kind {
        ErrorKind::PermissionDenied => DocGenError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => DocGenError::FileNotFound {
            path: path.to_path_buf(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LIMIT: u64 = 10 * 1024 * 1024;

    fn png_bytes() -> Vec<u8> {
        let mut b = PNG_MAGIC.to_vec();
        b.extend_from_slice(&[0u8; 16]);
        b
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/paper.png"));
        assert!(is_url("http://example.com/paper.jpg"));
        assert!(!is_url("/tmp/paper.png"));
        assert!(!is_url("paper.png"));
        assert!(!is_url(""));
    }

    #[test]
    fn sniff_png_and_jpeg() {
        assert_eq!(sniff(&png_bytes()), Some(ImageKind::Png));
        assert_eq!(sniff(b"\xFF\xD8\xFF\xE0rest"), Some(ImageKind::Jpeg));
        assert_eq!(sniff(b"GIF89a"), None);
        assert_eq!(sniff(b"%PDF-1.7"), None);
        assert_eq!(sniff(b""), None);
    }

    #[test]
    fn bytes_rejects_gif() {
        let err = image_from_bytes(b"GIF89a....".to_vec(), "scan.gif", LIMIT).unwrap_err();
        assert!(matches!(err, DocGenError::UnsupportedImage { .. }));
    }

    #[test]
    fn bytes_rejects_oversized_before_sniffing() {
        let err = image_from_bytes(vec![0u8; 2048], "big", 1024).unwrap_err();
        match err {
            DocGenError::ImageTooLarge { size, limit_mb } => {
                assert_eq!(size, 2048);
                assert_eq!(limit_mb, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bytes_accepts_png() {
        let img = image_from_bytes(png_bytes(), "paper.png", LIMIT).unwrap();
        assert_eq!(img.kind, ImageKind::Png);
        assert_eq!(img.kind.mime_type(), "image/png");
    }

    #[tokio::test]
    async fn local_missing_file() {
        let err = load_image("/definitely/not/here.png", LIMIT, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DocGenError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_png_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&png_bytes()).unwrap();
        let path = tmp.path().to_string_lossy().to_string();
        let img = load_image(&path, LIMIT, 5).await.unwrap();
        assert_eq!(img.kind, ImageKind::Png);
        assert_eq!(img.source_name, path);
    }

    #[tokio::test]
    async fn local_directory_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_image(&dir.path().to_string_lossy(), LIMIT, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DocGenError::InvalidInput { .. }));
    }

    #[test]
    fn append_capped_stops_at_limit() {
        let mut body = Vec::new();
        append_capped(&mut body, &[1u8; 600], 1024).unwrap();
        append_capped(&mut body, &[2u8; 424], 1024).unwrap();
        assert_eq!(body.len(), 1024);
        let err = append_capped(&mut body, &[3u8], 1024).unwrap_err();
        assert!(matches!(err, DocGenError::ImageTooLarge { size: 1025, .. }));
        assert_eq!(body.len(), 1024);
    }

    /// Serve one chunked response (no `Content-Length`) on a local port.
    async fn serve_chunked(chunks: usize, chunk_size: usize) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\n\
                        Transfer-Encoding: chunked\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            let mut payload = PNG_MAGIC.to_vec();
            payload.resize(chunk_size, 0);
            for _ in 0..chunks {
                let mut frame = format!("{chunk_size:x}\r\n").into_bytes();
                frame.extend_from_slice(&payload);
                frame.extend_from_slice(b"\r\n");
                // The client hangs up once it has seen too much.
                if socket.write_all(&frame).await.is_err() {
                    return;
                }
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
        });
        format!("http://{addr}/paper.png")
    }

    #[tokio::test]
    async fn chunked_download_over_limit_is_rejected() {
        let url = serve_chunked(64, 1024).await;
        let err = load_image(&url, 4096, 5).await.unwrap_err();
        match err {
            DocGenError::ImageTooLarge { size, limit_mb } => {
                assert!(size > 4096 && size <= 4096 + 1024, "size {size}");
                assert_eq!(limit_mb, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn chunked_download_within_limit_is_accepted() {
        let url = serve_chunked(2, 512).await;
        let img = load_image(&url, LIMIT, 5).await.unwrap();
        assert_eq!(img.kind, ImageKind::Png);
        assert_eq!(img.bytes.len(), 1024);
        assert_eq!(img.source_name, url);
    }
}
