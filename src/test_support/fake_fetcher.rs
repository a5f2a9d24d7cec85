//! Scripted [`Fetcher`] for driving the orchestrator without sockets.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use url::Url;

use crate::download::{FetchError, FetchResponse, Fetcher};

/// One scripted body item.
#[derive(Debug, Clone)]
pub(crate) enum Chunk {
    Data(Bytes),
    Error(std::io::ErrorKind),
}

/// What the fake does for one `fetch` call.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Headers arrive, then the scripted chunks; optionally the body stalls forever.
    Respond {
        status: u16,
        content_length: Option<u64>,
        content_type: Option<&'static str>,
        chunks: Vec<Chunk>,
        stall: bool,
    },
    /// No response headers ever arrive.
    Hang,
    /// The request fails before headers.
    Fail(std::io::ErrorKind),
}

impl Step {
    pub(crate) fn ok(content_type: &'static str, body: &'static [u8]) -> Self {
        Self::Respond {
            status: 200,
            content_length: Some(body.len() as u64),
            content_type: Some(content_type),
            chunks: vec![Chunk::Data(Bytes::from_static(body))],
            stall: false,
        }
    }

    pub(crate) fn status(status: u16) -> Self {
        Self::Respond {
            status,
            content_length: Some(0),
            content_type: Some("text/html"),
            chunks: Vec::new(),
            stall: false,
        }
    }
}

/// Replays [`Step`]s in order; the last step repeats once the script runs out.
pub(crate) struct FakeFetcher {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    calls: AtomicUsize,
    body_polled: Arc<AtomicBool>,
}

impl FakeFetcher {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            body_polled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn body_polled(&self) -> bool {
        self.body_polled.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut last = self.last.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(step) = steps.pop_front() {
            *last = Some(step.clone());
            step
        } else {
            last.clone().unwrap_or(Step::Hang)
        }
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, _url: &Url) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Hang => std::future::pending().await,
            Step::Fail(kind) => Err(FetchError::from(std::io::Error::new(kind, "scripted failure"))),
            Step::Respond {
                status,
                content_length,
                content_type,
                chunks,
                stall,
            } => {
                let items = stream::iter(chunks.into_iter().map(|chunk| match chunk {
                    Chunk::Data(bytes) => Ok(bytes),
                    Chunk::Error(kind) => Err(FetchError::from(std::io::Error::new(
                        kind,
                        "scripted body failure",
                    ))),
                }));
                let mut inner = if stall {
                    items.chain(stream::pending()).boxed()
                } else {
                    items.boxed()
                };
                let polled = Arc::clone(&self.body_polled);
                let body = stream::poll_fn(move |cx| {
                    polled.store(true, Ordering::SeqCst);
                    inner.poll_next_unpin(cx)
                })
                .boxed();

                Ok(FetchResponse {
                    status,
                    content_length,
                    content_type: content_type.map(str::to_string),
                    body,
                })
            }
        }
    }
}
