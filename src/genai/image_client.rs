use super::GenerationBackend;
use crate::{
    codec::EncodedImage,
    error::{Result, StudioError},
    models::{GenerationBatch, GenerationRequest, ResultImage},
};
use futures::future::join_all;
use std::sync::Arc;

#[derive(Clone)]
pub struct ImageClient {
    backend: Arc<dyn GenerationBackend>,
}

impl ImageClient {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    pub async fn generate_one(&self, image: &EncodedImage, prompt: &str) -> Result<ResultImage> {
        let request = GenerationRequest::image(image.clone(), prompt);

        match self.request_image(&request).await? {
            Some(image) => Ok(ResultImage { index: 1, image }),
            None => Err(StudioError::Generation(
                "The model returned no image".into(),
            )),
        }
    }

    /// Issue `count` calls one after another and require an image from each.
    ///
    /// Calls that return no image are counted as a shortfall and the remaining
    /// calls still run; the total is only checked at the end. A transport
    /// failure ends the batch immediately.
    pub async fn generate_n(
        &self,
        image: &EncodedImage,
        prompt: &str,
        count: usize,
    ) -> Result<Vec<ResultImage>> {
        if count == 0 {
            return Err(StudioError::Validation(
                "At least one image must be requested.".into(),
            ));
        }

        let batch = GenerationBatch::repeated(image, prompt, count);
        log::info!(
            "[batch {}] Requesting {} images sequentially",
            batch.short_id(),
            count
        );

        let mut results = Vec::with_capacity(count);
        for (attempt, request) in batch.requests.iter().enumerate() {
            match self.request_image(request).await? {
                Some(image) => results.push(ResultImage {
                    index: results.len() + 1,
                    image,
                }),
                None => log::warn!(
                    "[batch {}] Request {}/{} returned no image",
                    batch.short_id(),
                    attempt + 1,
                    count
                ),
            }
        }

        if results.len() < count {
            log::error!(
                "[batch {}] Got {} of {} images",
                batch.short_id(),
                results.len(),
                count
            );
            return Err(StudioError::IncompleteGeneration {
                obtained: results.len(),
                expected: count,
            });
        }

        Ok(results)
    }

    /// Issue one call per prompt concurrently; results follow prompt order.
    pub async fn generate_variations(
        &self,
        image: &EncodedImage,
        prompts: &[String],
    ) -> Result<Vec<ResultImage>> {
        if prompts.is_empty() {
            return Err(StudioError::Validation(
                "At least one prompt is required.".into(),
            ));
        }

        let batch = GenerationBatch::variations(image, prompts);
        log::info!(
            "[batch {}] Requesting {} variations concurrently",
            batch.short_id(),
            batch.len()
        );

        let replies = join_all(
            batch
                .requests
                .iter()
                .map(|request| self.request_image(request)),
        )
        .await;

        let mut slots: Vec<Option<EncodedImage>> = Vec::with_capacity(replies.len());
        let mut first_error = None;
        for (index, reply) in replies.into_iter().enumerate() {
            match reply {
                Ok(slot) => {
                    if slot.is_none() {
                        log::warn!(
                            "[batch {}] Variation {} returned no image",
                            batch.short_id(),
                            index + 1
                        );
                    }
                    slots.push(slot);
                }
                Err(e) => {
                    log::error!(
                        "[batch {}] Variation {} failed: {}",
                        batch.short_id(),
                        index + 1,
                        e
                    );
                    first_error.get_or_insert(e);
                    slots.push(None);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let obtained = slots.iter().filter(|slot| slot.is_some()).count();
        if obtained < prompts.len() {
            return Err(StudioError::IncompleteGeneration {
                obtained,
                expected: prompts.len(),
            });
        }

        Ok(slots
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(position, image)| ResultImage {
                index: position + 1,
                image,
            })
            .collect())
    }

    /// First inline image of the reply, tagged with the request's MIME type if the reply omits one.
    async fn request_image(&self, request: &GenerationRequest) -> Result<Option<EncodedImage>> {
        let response = self.backend.generate_content(request).await?;
        Ok(response.into_first_image().map(|mut image| {
            if image.mime_type.is_empty() {
                image.mime_type = request.image.mime_type.clone();
            }
            image
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::mock::{MockBackend, MockReply};

    fn source() -> EncodedImage {
        EncodedImage::new("c291cmNl", "image/png")
    }

    fn client(backend: &Arc<MockBackend>) -> ImageClient {
        ImageClient::new(backend.clone())
    }

    #[tokio::test]
    async fn generate_n_returns_every_image_in_call_order() {
        let backend = Arc::new(MockBackend::always_succeeds());
        let results = client(&backend)
            .generate_n(&source(), "Enhance", 2)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].index, 1);
        assert_eq!(results[0].image.data, "image-0");
        assert_eq!(results[1].index, 2);
        assert_eq!(results[1].image.data, "image-1");
        assert_eq!(backend.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn generate_n_reports_shortfall_after_all_attempts() {
        let backend = Arc::new(MockBackend::new(|call, _| {
            if call == 0 {
                MockReply::Empty
            } else {
                MockReply::image("ok")
            }
        }));
        let err = client(&backend)
            .generate_n(&source(), "Enhance", 2)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StudioError::IncompleteGeneration {
                obtained: 1,
                expected: 2
            }
        ));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn generate_n_stops_on_transport_failure() {
        let backend = Arc::new(MockBackend::new(|call, _| {
            if call == 1 {
                MockReply::Fail("connection reset".into())
            } else {
                MockReply::image("ok")
            }
        }));
        let err = client(&backend)
            .generate_n(&source(), "Render", 4)
            .await
            .unwrap_err();

        assert!(matches!(err, StudioError::Request(_)));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn generate_one_without_image_is_a_generation_error() {
        let backend = Arc::new(MockBackend::new(|_, _| MockReply::Empty));
        let err = client(&backend)
            .generate_one(&source(), "Enhance")
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Generation(_)));
    }

    #[tokio::test]
    async fn variations_keep_prompt_order_despite_reversed_latency() {
        let prompts: Vec<String> = (0..4).map(|i| format!("prompt-{}", i)).collect();
        let backend = Arc::new(MockBackend::new(|_, request| {
            let position: u64 = request.prompt["prompt-".len()..].parse().unwrap();
            MockReply::Image {
                data: format!("for-{}", request.prompt),
                delay_ms: (4 - position) * 25,
            }
        }));

        let results = client(&backend)
            .generate_variations(&source(), &prompts)
            .await
            .unwrap();

        let data: Vec<&str> = results.iter().map(|r| r.image.data.as_str()).collect();
        assert_eq!(
            data,
            vec!["for-prompt-0", "for-prompt-1", "for-prompt-2", "for-prompt-3"]
        );
        assert_eq!(
            results.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(backend.max_in_flight(), 4);
    }

    #[tokio::test]
    async fn variations_with_a_hole_fail_atomically() {
        let prompts: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let backend = Arc::new(MockBackend::new(|_, request| {
            if request.prompt == "b" {
                MockReply::Empty
            } else {
                MockReply::image("ok")
            }
        }));

        let err = client(&backend)
            .generate_variations(&source(), &prompts)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StudioError::IncompleteGeneration {
                obtained: 2,
                expected: 3
            }
        ));
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn variations_wait_for_all_before_reporting_failure() {
        let prompts: Vec<String> = vec!["fast-fail".into(), "slow".into()];
        let backend = Arc::new(MockBackend::new(|_, request| {
            if request.prompt == "fast-fail" {
                MockReply::Fail("timeout".into())
            } else {
                MockReply::Image {
                    data: "late".into(),
                    delay_ms: 40,
                }
            }
        }));

        let err = client(&backend)
            .generate_variations(&source(), &prompts)
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Request(_)));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn zero_count_is_rejected_before_any_call() {
        let backend = Arc::new(MockBackend::always_succeeds());
        assert!(client(&backend).generate_n(&source(), "x", 0).await.is_err());
        assert!(client(&backend)
            .generate_variations(&source(), &[])
            .await
            .is_err());
        assert_eq!(backend.calls(), 0);
    }
}
