//! Rendition file serving: byte-range parsing and chunked streaming.

use std::path::Path;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use tubecast_core::Error;

/// Renditions are always MP4; the cache only ever holds transcoder output.
const CONTENT_TYPE_MP4: &str = "video/mp4";

const CHUNK_SIZE: usize = 64 * 1024;

/// Parse a `Range: bytes=START-END` header value.
///
/// Returns `(start, Option<end>)`; `end` is `None` for open-ended ranges like
/// `bytes=500-`. Anything else (multiple ranges, suffix ranges, garbage)
/// yields `None` and the caller serves the whole file.
pub fn parse_range_header(value: &str) -> Option<(u64, Option<u64>)> {
    let spec = value.strip_prefix("bytes=")?;
    let (start_str, end_str) = spec.split_once('-')?;

    let start: u64 = start_str.trim().parse().ok()?;
    let end_str = end_str.trim();
    let end: Option<u64> = if end_str.is_empty() {
        None
    } else {
        Some(end_str.parse().ok()?)
    };

    Some((start, end))
}

/// Serve a cached rendition, honoring a single byte range.
///
/// Reads stream in 64 KiB chunks so memory stays bounded no matter how large
/// the rendition is. A range starting past EOF gets `416` with the total size
/// in `Content-Range`.
pub async fn serve_rendition(path: &Path, range_header: Option<&str>) -> Result<Response, Error> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|_| Error::not_found("rendition", path.display()))?;
    let file_size = metadata.len();

    let Some((start, end_opt)) = range_header.and_then(parse_range_header) else {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|_| Error::not_found("rendition", path.display()))?;
        let body = Body::from_stream(ReaderStream::with_capacity(file, CHUNK_SIZE));
        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE.as_str(), CONTENT_TYPE_MP4.to_string()),
                (header::CONTENT_LENGTH.as_str(), file_size.to_string()),
                (header::ACCEPT_RANGES.as_str(), "bytes".to_string()),
            ],
            body,
        )
            .into_response());
    };

    let last = file_size.saturating_sub(1);
    let end = end_opt.unwrap_or(last).min(last);
    if start >= file_size || start > end {
        return Ok((
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(
                header::CONTENT_RANGE.as_str(),
                format!("bytes */{file_size}"),
            )],
            Body::empty(),
        )
            .into_response());
    }

    let length = end - start + 1;

    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|_| Error::not_found("rendition", path.display()))?;
    file.seek(std::io::SeekFrom::Start(start))
        .await
        .map_err(|e| Error::internal(format!("seek failed: {e}")))?;

    // Take limits reads to exactly the requested window.
    let body = Body::from_stream(ReaderStream::with_capacity(file.take(length), CHUNK_SIZE));
    Ok((
        StatusCode::PARTIAL_CONTENT,
        [
            (header::CONTENT_TYPE.as_str(), CONTENT_TYPE_MP4.to_string()),
            (
                header::CONTENT_RANGE.as_str(),
                format!("bytes {start}-{end}/{file_size}"),
            ),
            (header::CONTENT_LENGTH.as_str(), length.to_string()),
            (header::ACCEPT_RANGES.as_str(), "bytes".to_string()),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bounded_range() {
        assert_eq!(parse_range_header("bytes=0-999"), Some((0, Some(999))));
        assert_eq!(parse_range_header("bytes=10-20"), Some((10, Some(20))));
    }

    #[test]
    fn parse_open_ended_range() {
        assert_eq!(parse_range_header("bytes=500-"), Some((500, None)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_range_header("invalid").is_none());
        assert!(parse_range_header("bytes=abc-def").is_none());
        assert!(parse_range_header("bytes=-500").is_none());
        assert!(parse_range_header("bytes=0-1,5-9").is_none());
    }

    #[tokio::test]
    async fn missing_rendition_is_not_found() {
        let err = serve_rendition(Path::new("/nonexistent/x.mp4"), None)
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn range_past_eof_is_unsatisfiable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.mp4");
        std::fs::write(&path, b"0123456789").unwrap();

        let response = serve_rendition(&path, Some("bytes=100-")).await.unwrap();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(
            response.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes */10"
        );
    }

    #[tokio::test]
    async fn bounded_range_is_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.mp4");
        std::fs::write(&path, b"0123456789").unwrap();

        let response = serve_rendition(&path, Some("bytes=2-5")).await.unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            response.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes 2-5/10"
        );
        assert_eq!(response.headers().get(header::CONTENT_LENGTH).unwrap(), "4");
    }

    #[tokio::test]
    async fn malformed_range_serves_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.mp4");
        std::fs::write(&path, b"0123456789").unwrap();

        let response = serve_rendition(&path, Some("bits=0-3")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_LENGTH).unwrap(),
            "10"
        );
        assert_eq!(
            response.headers().get(header::ACCEPT_RANGES).unwrap(),
            "bytes"
        );
    }
}
