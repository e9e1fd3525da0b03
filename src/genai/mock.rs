//! Scripted in-memory backend for tests.

use super::GenerationBackend;
use crate::{
    codec::EncodedImage,
    error::{Result, StudioError},
    models::{GenerationRequest, GenerationResponse},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) enum MockReply {
    Image { data: String, delay_ms: u64 },
    Empty,
    Text(String),
    Fail(String),
}

impl MockReply {
    pub(crate) fn image(data: impl Into<String>) -> Self {
        MockReply::Image {
            data: data.into(),
            delay_ms: 0,
        }
    }
}

type Responder = Box<dyn Fn(usize, &GenerationRequest) -> MockReply + Send + Sync>;

pub(crate) struct MockBackend {
    responder: Responder,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl MockBackend {
    /// `responder` receives the 0-based call number and the request.
    pub(crate) fn new(
        responder: impl Fn(usize, &GenerationRequest) -> MockReply + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always_succeeds() -> Self {
        Self::new(|call, _| MockReply::image(format!("image-{}", call)))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn seen(&self) -> Vec<GenerationRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate_content(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let reply = (self.responder)(call, request);
        let delay_ms = match &reply {
            MockReply::Image { delay_ms, .. } => *delay_ms,
            _ => 0,
        };
        // Yield even without a delay so concurrent callers overlap.
        tokio::time::sleep(Duration::from_millis(delay_ms.max(1))).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            MockReply::Image { data, .. } => Ok(GenerationResponse::with_image(EncodedImage::new(
                data,
                "image/png",
            ))),
            MockReply::Empty => Ok(GenerationResponse::default()),
            MockReply::Text(text) => Ok(GenerationResponse::with_text(text)),
            MockReply::Fail(message) => Err(StudioError::Request(message)),
        }
    }
}
