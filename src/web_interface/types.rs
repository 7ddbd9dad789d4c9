use askama::Template;
use log::error;
use warp::http::Method;
use warp::reject::Reject;
use warp::reply::{self, Reply, Response};

use crate::error_handling::types::WebError;

/// The request used a verb the endpoint does not serve.
#[derive(Debug)]
pub struct MethodRejected(pub Method);

impl Reject for MethodRejected {}

/// The request path has a segment starting with a period.
#[derive(Debug)]
pub struct DotFileRejected;

impl Reject for DotFileRejected {}

/// The caller could not be matched to a tailnet identity.
#[derive(Debug)]
pub struct UnidentifiedRejected;

impl Reject for UnidentifiedRejected {}

/// Page served on `/who`.
#[derive(Template)]
#[template(path = "who.html")]
pub struct WhoView<'a> {
    pub login_name: &'a str,
    pub display_name: &'a str,
    pub remote_addr: String,
    pub hostname: &'a str,
}

impl Reply for WebError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        reply::with_status(self.to_string(), self.status()).into_response()
    }
}
