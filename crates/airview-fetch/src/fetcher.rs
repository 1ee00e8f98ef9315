use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use airview_core::{published_at, Collection, Post, PostCache};
use airview_proto::{
    FrameType, Header, Mail, MessageList, TransferMessageList, BODY_COMPONENT, TITLE_COMPONENT,
};
use metrics::{counter, histogram};
use prost::Message;
use tracing::{debug, info, warn};

use crate::error::{FetchError, RemoteError, Stage};
use crate::markup::MarkdownRenderer;
use crate::opener::PlainFrameOpener;
use crate::ports::{
    AliasResolver, DecodeError, Endpoint, FrameOpener, LookupPurpose, MarkupRenderer,
    OpenedFrame, Session, SessionTransport, TransportError,
};
use crate::Identity;

/// Retrieves an author's posts from their message server and fills the cache.
pub struct PostFetcher {
    origin: Identity,
    resolver: Arc<dyn AliasResolver>,
    transport: Arc<dyn SessionTransport>,
    opener: Arc<dyn FrameOpener>,
    renderer: Arc<dyn MarkupRenderer>,
    cache: Arc<PostCache>,
    io_timeout: Duration,
}

impl PostFetcher {
    pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(
        origin: Identity,
        resolver: Arc<dyn AliasResolver>,
        transport: Arc<dyn SessionTransport>,
        cache: Arc<PostCache>,
    ) -> Self {
        Self {
            origin,
            resolver,
            transport,
            opener: Arc::new(PlainFrameOpener),
            renderer: Arc::new(MarkdownRenderer::default()),
            cache,
            io_timeout: Self::DEFAULT_IO_TIMEOUT,
        }
    }

    pub fn with_opener(mut self, opener: Arc<dyn FrameOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn MarkupRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Deadline applied to each resolve, connect, send and read individually.
    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn origin(&self) -> &Identity {
        &self.origin
    }

    pub fn cache(&self) -> &Arc<PostCache> {
        &self.cache
    }

    /// Fetch every post `alias` has published, newest first.
    ///
    /// Posts are written to the cache as they arrive, so a fetch that fails
    /// part way through still leaves the items read before the failure cached.
    pub async fn fetch_posts(&self, alias: &str) -> Result<Collection, FetchError> {
        let started = Instant::now();
        counter!("airview.fetch.requests").increment(1);

        let result = self.run_session(alias).await;
        let elapsed = started.elapsed();
        histogram!("airview.fetch.latency_ms").record(elapsed.as_secs_f64() * 1000.0);

        match &result {
            Ok(posts) => {
                counter!("airview.fetch.posts").increment(posts.len() as u64);
                info!(
                    alias,
                    posts = posts.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "fetched posts"
                );
            }
            Err(err) => {
                counter!("airview.fetch.failures").increment(1);
                warn!(alias, error = %err, "fetch failed");
            }
        }

        result
    }

    async fn run_session(&self, alias: &str) -> Result<Collection, FetchError> {
        let server = self.resolve(alias, LookupPurpose::Transfer).await?;
        let author = self.resolve(alias, LookupPurpose::Mail).await?;

        let mut session = self
            .within(Stage::Connect, self.transport.connect(&server))
            .await?
            .map_err(transport_failure(Stage::Connect))?;

        let request = TransferMessageList {
            since: 0,
            author: author.address,
        };
        self.within(
            Stage::Request,
            session.send_signed(&request, &self.origin, &server),
        )
        .await?
        .map_err(transport_failure(Stage::Request))?;

        let header = self
            .read_opened(session.as_mut(), Stage::Header, true)
            .await?;
        expect_frame(&header, FrameType::ListHeader, Stage::Header)?;
        let declared = MessageList::decode(header.payload.as_slice())
            .map_err(|source| FetchError::Decode {
                stage: Stage::Header,
                source: DecodeError::Malformed {
                    what: "message list",
                    source,
                },
            })?
            .length;
        debug!(alias, declared, "list header received");

        let mut posts = Collection::new();
        for index in 0..declared {
            let stage = Stage::Item {
                index,
                total: declared,
            };
            let frame = self.read_opened(session.as_mut(), stage, false).await?;
            expect_frame(&frame, FrameType::Item, stage)?;

            let mail = Mail::decode(frame.payload.as_slice()).map_err(|source| {
                FetchError::Decode {
                    stage,
                    source: DecodeError::Malformed {
                        what: "mail",
                        source,
                    },
                }
            })?;

            match self.post_from_mail(alias, &mail, &frame.header) {
                Some(post) => {
                    let post = Arc::new(post);
                    self.cache.store_post(alias, &post.name, Arc::clone(&post));
                    posts.push(post);
                }
                None => debug!(alias, name = %mail.name, "skipping item without a title"),
            }
        }

        posts.sort_newest_first();
        Ok(posts)
    }

    async fn resolve(&self, alias: &str, purpose: LookupPurpose) -> Result<Endpoint, FetchError> {
        self.within(Stage::Resolve, self.resolver.resolve(alias, purpose))
            .await?
            .map_err(|source| FetchError::Resolution {
                alias: alias.to_string(),
                purpose,
                source,
            })
    }

    async fn read_opened(
        &self,
        session: &mut dyn Session,
        stage: Stage,
        is_header: bool,
    ) -> Result<OpenedFrame, FetchError> {
        let raw = self
            .within(stage, session.read_frame())
            .await?
            .map_err(transport_failure(stage))?;

        self.opener
            .reconstruct(&raw, &self.origin, is_header)
            .map_err(|source| FetchError::Decode { stage, source })
    }

    async fn within<F: Future>(&self, stage: Stage, fut: F) -> Result<F::Output, FetchError> {
        tokio::time::timeout(self.io_timeout, fut)
            .await
            .map_err(|_| FetchError::Timeout {
                stage,
                timeout: self.io_timeout,
            })
    }

    /// A mail item is a post iff it carries a title component.
    fn post_from_mail(&self, alias: &str, mail: &Mail, header: &Header) -> Option<Post> {
        let title = mail.string_component(TITLE_COMPONENT)?;
        let body = mail
            .raw_component(BODY_COMPONENT)
            .map(|raw| self.renderer.render(raw))
            .unwrap_or_default();

        Some(Post {
            title,
            body,
            author: alias.to_string(),
            name: mail.name.clone(),
            published: published_at(header.timestamp),
        })
    }
}

fn transport_failure(stage: Stage) -> impl FnOnce(TransportError) -> FetchError {
    move |source| FetchError::Transport { stage, source }
}

fn expect_frame(frame: &OpenedFrame, expected: FrameType, stage: Stage) -> Result<(), FetchError> {
    if frame.frame_type == expected {
        return Ok(());
    }

    match &frame.frame_type {
        FrameType::Error => {
            let remote = RemoteError::from_frame(frame)
                .map_err(|source| FetchError::Decode { stage, source })?;
            Err(FetchError::Remote(remote))
        }
        observed => Err(FetchError::Protocol {
            expected,
            observed: observed.clone(),
        }),
    }
}
