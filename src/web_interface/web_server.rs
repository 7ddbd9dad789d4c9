use std::sync::Arc;

use log::info;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::Filter;

use super::routes::{feed_route, handle_rejection, upload_route, who_route};
use super::static_files::{images_route, web_ui_route};
use crate::configuration::Config;
use crate::feed::FeedAssembler;
use crate::identity::IdentityResolver;
use crate::storage::storage_trait::{ImageStorage, PostStorage};

/// HTTP surface of the feed: `/who`, `/upload`, `/feed`, `/img/` and the web UI.
///
/// Cheap to clone; every route filter holds its own copy.
#[derive(Clone)]
pub struct WebServer {
    config: Arc<Config>,
    posts: Arc<dyn PostStorage>,
    images: Arc<dyn ImageStorage>,
    identity: Arc<dyn IdentityResolver>,
    feed: FeedAssembler,
}

impl WebServer {
    /// Create a new WebServer instance
    pub fn new(
        config: Config,
        posts: Arc<dyn PostStorage>,
        images: Arc<dyn ImageStorage>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        let feed = FeedAssembler::new(posts.clone());
        Self {
            config: Arc::new(config),
            posts,
            images,
            identity,
            feed,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn posts(&self) -> &Arc<dyn PostStorage> {
        &self.posts
    }

    pub fn images(&self) -> &Arc<dyn ImageStorage> {
        &self.images
    }

    pub fn identity(&self) -> &Arc<dyn IdentityResolver> {
        &self.identity
    }

    pub fn feed(&self) -> &FeedAssembler {
        &self.feed
    }

    /// Every route, with rejections already turned into responses.
    pub fn routes(&self) -> BoxedFilter<(Response,)> {
        who_route(self.clone())
            .or(upload_route(self.clone()))
            .unify()
            .or(feed_route(self.clone()))
            .unify()
            .or(images_route(self.clone()))
            .unify()
            .or(web_ui_route(self.config.web_dir.clone()))
            .unify()
            .recover(handle_rejection)
            .unify()
            .boxed()
    }

    /// Serve until the process is stopped.
    pub async fn start(&self) {
        let addr = self.config.listen_addr();
        info!(
            "Serving {} on http://{} (post dir {}, image dir {})",
            self.config.hostname,
            addr,
            self.config.post_dir().display(),
            self.config.img_dir().display()
        );
        let routes = self.routes().with(warp::log("teaspoon::http"));
        warp::serve(routes).run(addr).await;
    }
}
