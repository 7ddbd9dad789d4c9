use std::convert::Infallible;
use std::net::SocketAddr;

use askama::Template;
use bytes::BufMut;
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use warp::http::header::CONTENT_TYPE;
use warp::http::{HeaderMap, Method, StatusCode};
use warp::multipart::{FormData, Part};
use warp::reply::{self, Reply, Response};
use warp::{Filter, Rejection};

use super::types::{DotFileRejected, MethodRejected, UnidentifiedRejected, WhoView};
use super::web_server::WebServer;
use crate::error_handling::types::{IdentityError, WebError};
use crate::identity::serve_headers::{SERVE_LOGIN_HEADER, SERVE_NAME_HEADER};
use crate::identity::{serve_identity, Identity};
use crate::storage::types::{Post, UploadRequest};

const POST_FIELD: &str = "post";
const IMAGE_FIELD: &str = "img";
/// URL prefix under which stored images are served.
const IMAGE_URL_PREFIX: &str = "img";

fn with_server(server: WebServer) -> impl Filter<Extract = (WebServer,), Error = Infallible> + Clone {
    warp::any().map(move || server.clone())
}

/// Passes only requests using `expected`; everything else is rejected with `MethodRejected`.
pub fn require_method(expected: Method) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::method()
        .and_then(move |method: Method| {
            let expected = expected.clone();
            async move {
                if method == expected {
                    Ok(())
                } else {
                    Err(warp::reject::custom(MethodRejected(expected)))
                }
            }
        })
        .untuple_one()
}

/// Who sent a request: the peer address plus the headers a local proxy may have added.
pub struct Caller {
    pub remote: Option<SocketAddr>,
    headers: HeaderMap,
}

impl Caller {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Identity forwarded by `tailscale serve` on loopback, otherwise whatever the
    /// server's resolver says about the peer.
    pub async fn resolve(&self, server: &WebServer) -> Result<Identity, IdentityError> {
        if let Some(identity) = serve_identity(
            self.remote,
            self.header(SERVE_LOGIN_HEADER),
            self.header(SERVE_NAME_HEADER),
        ) {
            debug!("Caller {} identified by tailscale serve headers", identity.login_name);
            return Ok(identity);
        }
        server.identity().who_is(self.remote).await
    }
}

pub fn caller() -> impl Filter<Extract = (Caller,), Error = Infallible> + Clone {
    warp::addr::remote()
        .and(warp::header::headers_cloned())
        .map(|remote, headers| Caller { remote, headers })
}

/// Passes only callers that resolve to a tailnet identity; rejects with
/// `UnidentifiedRejected` otherwise.
pub fn identified(server: WebServer) -> impl Filter<Extract = (Identity,), Error = Rejection> + Clone {
    with_server(server)
        .and(caller())
        .and_then(|server: WebServer, caller: Caller| async move {
            caller.resolve(&server).await.map_err(|e| {
                warn!("Refusing unidentified caller {:?}: {}", caller.remote, e);
                warp::reject::custom(UnidentifiedRejected)
            })
        })
}

/// /who
pub fn who_route(server: WebServer) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path("who")
        .and(warp::path::end())
        .and(with_server(server))
        .and(caller())
        .and_then(who)
}

/// POST /upload
///
/// Once the path matches, every outcome is answered here, so a bad form never falls
/// through to the static routes.
pub fn upload_route(server: WebServer) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let limit = server.config().max_upload_bytes;
    warp::path("upload").and(warp::path::end()).and(
        require_method(Method::POST)
            .and(with_server(server))
            .and(caller())
            .and(warp::multipart::form().max_length(limit))
            .and_then(upload)
            .recover(handle_rejection)
            .unify(),
    )
}

/// GET /feed, for identified callers only
pub fn feed_route(server: WebServer) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path("feed").and(warp::path::end()).and(
        require_method(Method::GET)
            .and(identified(server.clone()))
            .and(with_server(server))
            .and_then(feed)
            .recover(handle_rejection)
            .unify(),
    )
}

async fn who(server: WebServer, caller: Caller) -> Result<Response, Rejection> {
    let identity = match caller.resolve(&server).await {
        Ok(identity) => identity,
        Err(e) => return Ok(WebError::from(e).into_response()),
    };

    let view = WhoView {
        login_name: &identity.login_name,
        display_name: &identity.display_name,
        remote_addr: caller.remote.map(|a| a.to_string()).unwrap_or_default(),
        hostname: &server.config().hostname,
    };
    match view.render() {
        Ok(html) => Ok(reply::html(html).into_response()),
        Err(e) => Ok(WebError::Template(e.to_string()).into_response()),
    }
}

async fn upload(server: WebServer, caller: Caller, form: FormData) -> Result<Response, Rejection> {
    match store_upload(&server, &caller, form).await {
        Ok(post) if post.has_image() => {
            info!("Accepted post {} from {} with {}", post.id, post.author, post.image_path);
            Ok(reply::reply().into_response())
        }
        Ok(post) => {
            info!("Accepted post {} from {}", post.id, post.author);
            Ok(reply::reply().into_response())
        }
        Err(e) => Ok(e.into_response()),
    }
}

async fn feed(identity: Identity, server: WebServer) -> Result<Response, Rejection> {
    debug!("Feed requested by {}", identity.login_name);
    let assembler = server.feed().clone();
    match blocking(move || Ok(assembler.assemble()?)).await {
        Ok(body) => Ok(reply::with_status(
            reply::with_header(body, CONTENT_TYPE, "application/json"),
            StatusCode::OK,
        )
        .into_response()),
        Err(e) => Ok(WebError::from(e).into_response()),
    }
}

/// Run a storage call on the blocking pool so slow disks do not stall request handling.
async fn blocking<T, F>(f: F) -> Result<T, WebError>
where
    F: FnOnce() -> Result<T, WebError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// An uploaded file: client-side file name and contents.
///
/// Held in memory until the post field has been parsed; the multipart limit
/// (`max_upload_bytes`) bounds its size.
struct ImageUpload {
    filename: String,
    data: Vec<u8>,
}

/// The parts of an upload form this endpoint cares about.
#[derive(Default)]
struct UploadForm {
    post: Option<Vec<u8>>,
    image: Option<ImageUpload>,
}

async fn read_part(part: Part) -> Result<Vec<u8>, WebError> {
    part.stream()
        .try_fold(Vec::new(), |mut acc, buf| async move {
            acc.put(buf);
            Ok(acc)
        })
        .await
        .map_err(|e| WebError::Upload(e.to_string()))
}

async fn read_form(form: FormData) -> Result<UploadForm, WebError> {
    let mut form = std::pin::pin!(form);
    let mut fields = UploadForm::default();
    while let Some(part) = form.try_next().await.map_err(|e| WebError::Upload(e.to_string()))? {
        let name = part.name().to_string();
        match name.as_str() {
            POST_FIELD if fields.post.is_none() => fields.post = Some(read_part(part).await?),
            IMAGE_FIELD if fields.image.is_none() => {
                // A part without a file name is a plain form value, not a file.
                let filename = part.filename().map(str::to_string);
                let data = read_part(part).await?;
                if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                    fields.image = Some(ImageUpload { filename, data });
                }
            }
            _ => debug!("Ignoring form field {:?}", name),
        }
    }
    Ok(fields)
}

/// Parse the form, keep the image if any, then persist the post under the caller's name.
///
/// An image stored before a later failure stays on disk.
async fn store_upload(server: &WebServer, caller: &Caller, form: FormData) -> Result<Post, WebError> {
    let fields = read_form(form).await?;
    let request: UploadRequest = serde_json::from_slice(fields.post.as_deref().unwrap_or_default())?;

    let image_path = match fields.image {
        Some(ImageUpload { filename, data }) => {
            let images = server.images().clone();
            let stored = blocking(move || Ok(images.save(&mut data.as_slice(), &filename)?)).await?;
            let name = stored
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Some(format!("{}/{}", IMAGE_URL_PREFIX, name))
        }
        None => {
            info!("no file uploaded with post");
            None
        }
    };

    let identity = caller.resolve(server).await?;
    let post = Post::new(request.note, identity.display_name, image_path);
    let posts = server.posts().clone();
    blocking(move || {
        posts.write(&post)?;
        Ok(post)
    })
    .await
}

/// Turn rejections into plain-text error responses.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if let Some(MethodRejected(method)) = err.find() {
        let e = WebError::MethodNotAllowed(method.clone());
        (e.status(), e.to_string())
    } else if err.find::<DotFileRejected>().is_some() {
        (StatusCode::FORBIDDEN, "403 Forbidden".to_string())
    } else if err.find::<UnidentifiedRejected>().is_some() {
        (StatusCode::FORBIDDEN, "caller is not a known tailnet peer".to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "upload too large".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "404 page not found".to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{:?}", err))
    };
    debug!("Rejected request: {} {}", status, message);
    Ok(reply::with_status(message, status).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Config;
    use crate::error_handling::types::IdentityError;
    use crate::identity::{Identity, IdentityResolver, StaticResolver};
    use crate::storage::{FileImageStorage, FilePostStorage, PostStorage};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    const BOUNDARY: &str = "teaspoon-boundary";

    struct Unreachable;

    #[async_trait]
    impl IdentityResolver for Unreachable {
        async fn who_is(&self, _remote: Option<SocketAddr>) -> Result<Identity, IdentityError> {
            Err(IdentityError::Status(500, "tailscaled is down".into()))
        }
    }

    /// tailscaled answering `whois` for an address outside the tailnet.
    struct NoMatch;

    #[async_trait]
    impl IdentityResolver for NoMatch {
        async fn who_is(&self, _remote: Option<SocketAddr>) -> Result<Identity, IdentityError> {
            Err(IdentityError::Status(404, "no match for IP:port".into()))
        }
    }

    fn server_with(dir: &TempDir, identity: Arc<dyn IdentityResolver>) -> WebServer {
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let posts = Arc::new(FilePostStorage::new(config.post_dir()).unwrap());
        let images = Arc::new(FileImageStorage::new(config.img_dir()).unwrap());
        WebServer::new(config, posts, images, identity)
    }

    fn server(dir: &TempDir) -> WebServer {
        server_with(dir, Arc::new(StaticResolver::new("alice@example.com", "alice")))
    }

    fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match filename {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, f
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(data.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> warp::test::RequestBuilder {
        warp::test::request()
            .method("POST")
            .path("/upload")
            .remote_addr("100.64.0.2:5555".parse().unwrap())
            .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(body)
    }

    fn get_from(path: &str, remote: &str) -> warp::test::RequestBuilder {
        warp::test::request().path(path).remote_addr(remote.parse().unwrap())
    }

    fn post_files(dir: &TempDir) -> Vec<std::path::PathBuf> {
        fs::read_dir(dir.path().join("post"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn test_upload_without_image() {
        let dir = TempDir::new().unwrap();
        let routes = server(&dir).routes();
        let res = upload_request(multipart(&[("post", None, r#"{"Note":"hi"}"#)]))
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.body().is_empty());

        let files = post_files(&dir);
        assert_eq!(files.len(), 1);
        let post: Post = serde_json::from_slice(&fs::read(&files[0]).unwrap()).unwrap();
        assert_eq!(post.note, "hi");
        assert_eq!(post.author, "alice");
        assert_eq!(post.image_path, "");
        assert_eq!(files[0].file_name().unwrap().to_str().unwrap(), format!("{}.json", post.id));
    }

    #[tokio::test]
    async fn test_upload_with_image() {
        let dir = TempDir::new().unwrap();
        let routes = server(&dir).routes();
        let res = upload_request(multipart(&[
            ("img", Some("cat.jpg"), "jpeg bytes"),
            ("post", None, r#"{"Note":"look"}"#),
        ]))
        .reply(&routes)
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let post: Post = serde_json::from_slice(&fs::read(&post_files(&dir)[0]).unwrap()).unwrap();
        assert!(post.image_path.starts_with("img/"));
        assert!(post.image_path.ends_with("_.jpg"));
        let stored = dir.path().join(&post.image_path);
        assert_eq!(fs::read(stored).unwrap(), b"jpeg bytes");

        let served = get_from(&format!("/{}", post.image_path), "100.64.0.2:5555")
            .reply(&routes)
            .await;
        assert_eq!(served.status(), StatusCode::OK);
        assert_eq!(served.body().as_ref(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_upload_image_field_without_filename_is_missing() {
        let dir = TempDir::new().unwrap();
        let routes = server(&dir).routes();
        let res = upload_request(multipart(&[
            ("post", None, r#"{"Note":"plain"}"#),
            ("img", None, "not a file"),
        ]))
        .reply(&routes)
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(fs::read_dir(dir.path().join("img")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_bad_post_json() {
        let dir = TempDir::new().unwrap();
        let routes = server(&dir).routes();
        let res = upload_request(multipart(&[
            ("post", None, "{Note: oops"),
            ("img", Some("cat.jpg"), "jpeg bytes"),
        ]))
        .reply(&routes)
        .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(post_files(&dir).is_empty());
        assert_eq!(fs::read_dir(dir.path().join("img")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_missing_post_field() {
        let dir = TempDir::new().unwrap();
        let routes = server(&dir).routes();
        let res = upload_request(multipart(&[("other", None, "x")]))
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(post_files(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_upload_identity_failure() {
        let dir = TempDir::new().unwrap();
        let routes = server_with(&dir, Arc::new(Unreachable)).routes();
        let res = upload_request(multipart(&[("post", None, r#"{"Note":"hi"}"#)]))
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(String::from_utf8_lossy(res.body()).contains("tailscaled is down"));
        assert!(post_files(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_upload_not_multipart() {
        let dir = TempDir::new().unwrap();
        let routes = server(&dir).routes();
        let res = warp::test::request()
            .method("POST")
            .path("/upload")
            .remote_addr("100.64.0.2:5555".parse().unwrap())
            .body("post=hi")
            .reply(&routes)
            .await;
        assert!(res.status().is_client_error() || res.status().is_server_error());
        assert_ne!(res.status(), StatusCode::OK);
        assert!(post_files(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_method_guards() {
        let dir = TempDir::new().unwrap();
        let routes = server(&dir).routes();

        let res = warp::test::request().method("GET").path("/upload").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            res.body().as_ref(),
            b"only POST requests are supported at this endpoint"
        );

        let res = warp::test::request().method("POST").path("/feed").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            res.body().as_ref(),
            b"only GET requests are supported at this endpoint"
        );

        assert!(post_files(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_feed_empty() {
        let dir = TempDir::new().unwrap();
        let routes = server(&dir).routes();
        let res = get_from("/feed", "100.64.0.2:5555").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "application/json");
        assert_eq!(res.body().as_ref(), br#"{"Posts":[]}"#);
    }

    #[tokio::test]
    async fn test_feed_storage_failure() {
        let dir = TempDir::new().unwrap();
        let routes = server(&dir).routes();
        fs::remove_dir(dir.path().join("post")).unwrap();
        let res = get_from("/feed", "100.64.0.2:5555").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_upload_over_limit_stores_nothing() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            max_upload_bytes: 256,
            ..Config::default()
        };
        let posts = Arc::new(FilePostStorage::new(config.post_dir()).unwrap());
        let images = Arc::new(FileImageStorage::new(config.img_dir()).unwrap());
        let identity = Arc::new(StaticResolver::new("alice@example.com", "alice"));
        let routes = WebServer::new(config, posts, images, identity).routes();

        let big = "x".repeat(1024);
        let res = upload_request(multipart(&[
            ("post", None, r#"{"Note":"big"}"#),
            ("img", Some("big.png"), big.as_str()),
        ]))
        .reply(&routes)
        .await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(post_files(&dir).is_empty());
        assert_eq!(fs::read_dir(dir.path().join("img")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_feed_refused_to_unknown_peer() {
        let dir = TempDir::new().unwrap();
        let server = server_with(&dir, Arc::new(NoMatch));
        let post = Post::new("private note", "alice", None);
        server.posts().write(&post).unwrap();
        fs::write(dir.path().join("img").join("1_.jpg"), b"private image").unwrap();
        let routes = server.routes();

        let res = get_from("/feed", "203.0.113.9:40000").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(!String::from_utf8_lossy(res.body()).contains("private note"));

        let res = get_from("/img/1_.jpg", "203.0.113.9:40000").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_ne!(res.body().as_ref(), b"private image");

        let res = warp::test::request().path("/feed").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_serve_headers_identify_loopback_caller() {
        let dir = TempDir::new().unwrap();
        let routes = server_with(&dir, Arc::new(NoMatch)).routes();

        let res = warp::test::request()
            .path("/who")
            .remote_addr("127.0.0.1:51000".parse().unwrap())
            .header("Tailscale-User-Login", "carol@example.com")
            .header("Tailscale-User-Name", "Carol")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = String::from_utf8_lossy(res.body());
        assert!(body.contains("<b>carol@example.com</b>"));
        assert!(body.contains("<b>Carol</b>"));

        let res = warp::test::request()
            .method("POST")
            .path("/upload")
            .remote_addr("127.0.0.1:51000".parse().unwrap())
            .header("Tailscale-User-Login", "carol@example.com")
            .header("Tailscale-User-Name", "Carol")
            .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(multipart(&[("post", None, r#"{"Note":"via serve"}"#)]))
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let post: Post = serde_json::from_slice(&fs::read(&post_files(&dir)[0]).unwrap()).unwrap();
        assert_eq!(post.author, "Carol");

        let res = warp::test::request()
            .path("/feed")
            .remote_addr("127.0.0.1:51000".parse().unwrap())
            .header("Tailscale-User-Login", "carol@example.com")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(String::from_utf8_lossy(res.body()).contains("via serve"));
    }

    #[tokio::test]
    async fn test_serve_headers_ignored_from_remote_peer() {
        let dir = TempDir::new().unwrap();
        let routes = server_with(&dir, Arc::new(NoMatch)).routes();

        let res = warp::test::request()
            .path("/feed")
            .remote_addr("203.0.113.9:40000".parse().unwrap())
            .header("Tailscale-User-Login", "carol@example.com")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = upload_request(multipart(&[("post", None, r#"{"Note":"spoofed"}"#)]))
            .header("Tailscale-User-Login", "carol@example.com")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(post_files(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_who() {
        let dir = TempDir::new().unwrap();
        let routes = server(&dir).routes();
        let res = warp::test::request()
            .path("/who")
            .remote_addr("100.64.0.2:5555".parse().unwrap())
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = String::from_utf8_lossy(res.body());
        assert!(body.contains("<b>alice@example.com</b>"));
        assert!(body.contains("<b>alice</b>"));
        assert!(body.contains("100.64.0.2:5555"));
        assert!(body.contains("<b>teaspoon</b>"));
    }

    #[tokio::test]
    async fn test_who_escapes_names() {
        let dir = TempDir::new().unwrap();
        let resolver = Arc::new(StaticResolver::new("mallory", "<script>x</script>"));
        let routes = server_with(&dir, resolver).routes();
        let res = warp::test::request()
            .path("/who")
            .remote_addr("100.64.0.3:1".parse().unwrap())
            .reply(&routes)
            .await;
        let body = String::from_utf8_lossy(res.body());
        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn test_who_identity_failure() {
        let dir = TempDir::new().unwrap();
        let routes = server_with(&dir, Arc::new(Unreachable)).routes();
        let res = warp::test::request()
            .path("/who")
            .remote_addr("100.64.0.3:1".parse().unwrap())
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_dotfiles_are_forbidden() {
        let dir = TempDir::new().unwrap();
        let routes = server(&dir).routes();
        fs::write(dir.path().join("img").join(".secret"), b"hidden").unwrap();

        for path in ["/.secret", "/dir/.hidden/file", "/img/.secret", "/%2esecret"] {
            let res = warp::test::request().path(path).reply(&routes).await;
            assert_eq!(res.status(), StatusCode::FORBIDDEN, "{}", path);
            assert_ne!(res.body().as_ref(), b"hidden");
        }
    }

    #[tokio::test]
    async fn test_web_ui_from_disk() {
        let dir = TempDir::new().unwrap();
        let web = TempDir::new().unwrap();
        fs::write(web.path().join("index.html"), b"<h1>custom</h1>").unwrap();
        fs::write(web.path().join(".env"), b"SECRET=1").unwrap();
        fs::create_dir(web.path().join("sub")).unwrap();

        let config = Config {
            data_dir: dir.path().to_path_buf(),
            web_dir: Some(web.path().to_path_buf()),
            ..Config::default()
        };
        let posts = Arc::new(FilePostStorage::new(config.post_dir()).unwrap());
        let images = Arc::new(FileImageStorage::new(config.img_dir()).unwrap());
        let routes = WebServer::new(config, posts, images, Arc::new(StaticResolver::new("a", "b"))).routes();

        let res = warp::test::request().path("/index.html").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"<h1>custom</h1>");

        let res = warp::test::request().path("/.env").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = warp::test::request().path("/sub/").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_embedded_web_ui() {
        let dir = TempDir::new().unwrap();
        let routes = server(&dir).routes();

        let res = warp::test::request().path("/").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()["content-type"].to_str().unwrap().starts_with("text/html"));

        let res = warp::test::request().path("/post.js").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(String::from_utf8_lossy(res.body()).contains("/upload"));

        let res = warp::test::request().path("/nope.html").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
