use std::path::PathBuf;

use log::{debug, warn};
use percent_encoding::percent_decode_str;
use rust_embed::RustEmbed;
use warp::filters::BoxedFilter;
use warp::http::header::CONTENT_TYPE;
use warp::path::{FullPath, Tail};
use warp::reply::{self, Reply, Response};
use warp::{Filter, Rejection};

use super::routes::identified;
use super::types::DotFileRejected;
use super::web_server::WebServer;
use crate::identity::Identity;

const INDEX: &str = "index.html";

/// Web UI compiled into the binary.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/web/"]
struct WebAssets;

/// Reports whether any `/`-separated element of `path` starts with a period.
///
/// The path is percent-decoded first, so `/%2esecret` counts as a dot file too.
pub fn contains_dot_file(path: &str) -> bool {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    decoded.split('/').any(|part| part.starts_with('.'))
}

/// Rejects with `DotFileRejected` when the request path names a dot file or dot directory.
pub fn hide_dotfiles() -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::path::full()
        .and_then(|full: FullPath| async move {
            if contains_dot_file(full.as_str()) {
                warn!("Refusing to serve dot file path {}", full.as_str());
                Err(warp::reject::custom(DotFileRejected))
            } else {
                Ok(())
            }
        })
        .untuple_one()
}

/// GET /img/... -> uploaded images, for identified callers only
pub fn images_route(server: WebServer) -> BoxedFilter<(Response,)> {
    let img_dir = server.config().img_dir();
    warp::path("img")
        .and(hide_dotfiles())
        .and(warp::get())
        .and(identified(server))
        .and(warp::fs::dir(img_dir))
        .map(|_: Identity, file: warp::fs::File| file.into_response())
        .boxed()
}

/// GET /... -> web UI, from `web_dir` when given, otherwise the embedded pages
pub fn web_ui_route(web_dir: Option<PathBuf>) -> BoxedFilter<(Response,)> {
    let guarded = hide_dotfiles().and(warp::get());
    match web_dir {
        Some(dir) => guarded
            .and(warp::fs::dir(dir))
            .map(|file: warp::fs::File| file.into_response())
            .boxed(),
        None => guarded
            .and(warp::path::tail())
            .and_then(serve_embedded)
            .boxed(),
    }
}

async fn serve_embedded(tail: Tail) -> Result<Response, Rejection> {
    let decoded = percent_decode_str(tail.as_str()).decode_utf8_lossy();
    let path = if decoded.is_empty() || decoded.ends_with('/') {
        format!("{}{}", decoded, INDEX)
    } else {
        decoded.into_owned()
    };

    let asset = WebAssets::get(&path).ok_or_else(warp::reject::not_found)?;
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    debug!("Serving embedded {} as {}", path, mime);
    Ok(reply::with_header(asset.data.into_owned(), CONTENT_TYPE, mime.as_ref()).into_response())
}
