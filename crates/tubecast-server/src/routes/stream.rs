//! The main streaming endpoint: `GET /{channel}.mp4`.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::Extension;

use tubecast_core::{ChannelName, Error};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::RequestId;
use crate::prep;
use crate::routes::serve::serve_rendition;

/// Serve a channel's rendition, preparing it first when the cache is empty.
pub async fn stream_channel(
    State(ctx): State<AppContext>,
    Path(file): Path<String>,
    request_id: Option<Extension<RequestId>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    stream_inner(&ctx, &file, &headers).await.map_err(|err| {
        match request_id {
            Some(Extension(RequestId(id))) => AppError::from(err).with_request_id(id),
            None => AppError::from(err),
        }
    })
}

async fn stream_inner(ctx: &AppContext, file: &str, headers: &HeaderMap) -> Result<Response, Error> {
    let stem = file
        .strip_suffix(".mp4")
        .ok_or_else(|| Error::not_found("stream", file))?;
    let name: ChannelName = stem
        .parse()
        .map_err(|_| Error::not_found("stream", file))?;

    let path = prep::get_or_fetch(ctx, &name).await?;

    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());
    serve_rendition(&path, range).await
}
