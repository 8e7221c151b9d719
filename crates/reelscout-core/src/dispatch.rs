//! Batch dispatch of media references against the inference gateway.
//!
//! The dispatcher never raises: every per-item failure is captured as an
//! error value in the report, and the report is always positionally aligned
//! with the input list. Per-item mode throttles the gateway with an
//! inter-call delay; batched mode issues one aggregate call and applies any
//! failure uniformly to every item.

use crate::error::GatewayError;
use crate::gateway::{retry, InferenceGateway, InferenceRequest, PromptSpec};
use crate::types::{BatchReport, ItemReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Tuning for a batch dispatch run.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Max concurrent gateway calls in per-item mode. The gateway fronts a
    /// single model instance, so this defaults to 1.
    pub parallel: usize,

    /// Delay between per-item calls in milliseconds
    pub item_delay_ms: u64,

    /// Per-item deadline in milliseconds
    pub item_timeout_ms: u64,

    /// Deadline for the aggregate batched call in milliseconds
    pub batch_timeout_ms: u64,

    /// Max retries per item for transient failures
    pub retry_attempts: u32,

    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            parallel: 1,
            item_delay_ms: 1000,
            item_timeout_ms: 300_000,
            batch_timeout_ms: 600_000,
            retry_attempts: 0,
            retry_delay_ms: 1000,
        }
    }
}

impl DispatchOptions {
    pub fn from_config(
        dispatch: &crate::config::DispatchConfig,
        gateway: &crate::config::GatewayConfig,
    ) -> Self {
        Self {
            parallel: dispatch.parallel,
            item_delay_ms: dispatch.item_delay_ms,
            item_timeout_ms: gateway.request_timeout_ms,
            batch_timeout_ms: gateway.batch_timeout_ms,
            retry_attempts: dispatch.retry_attempts,
            retry_delay_ms: dispatch.retry_delay_ms,
        }
    }
}

/// Dispatches media references to an inference gateway.
pub struct BatchDispatcher {
    gateway: Arc<dyn InferenceGateway>,
    options: DispatchOptions,
}

impl BatchDispatcher {
    pub fn new(gateway: Arc<dyn InferenceGateway>, options: DispatchOptions) -> Self {
        Self { gateway, options }
    }

    /// Per-item mode: one gateway call per reference.
    ///
    /// Calls are bounded by a semaphore (default width 1, serializing the
    /// gateway) with an inter-call delay. A failed item never aborts the
    /// batch. `on_item` fires as each item completes, so the caller can
    /// drive a progress display; completion order may differ from input
    /// order when `parallel > 1`, but the returned report is always aligned
    /// with the input list.
    pub async fn dispatch_each<F>(
        &self,
        media: &[String],
        prompt: &PromptSpec,
        max_new_tokens: u32,
        on_item: F,
    ) -> BatchReport
    where
        F: Fn(&ItemReport) + Send + Sync + 'static,
    {
        tracing::debug!(
            "Per-item dispatch of {} items via {} gateway",
            media.len(),
            self.gateway.name()
        );

        let semaphore = Arc::new(Semaphore::new(self.options.parallel.max(1)));
        let on_item = Arc::new(on_item);
        let total = media.len();
        let mut handles = Vec::with_capacity(total);

        for (index, media_ref) in media.iter().enumerate() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("Dispatch semaphore closed unexpectedly — stopping batch");
                    break;
                }
            };

            // Throttle between launches; with parallel=1 this is the fixed
            // inter-call delay of the sequential mode.
            if index > 0 && self.options.item_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.options.item_delay_ms)).await;
            }

            tracing::info!("Dispatching {}/{}: {}", index + 1, total, media_ref);

            let gateway = self.gateway.clone();
            let options = self.options.clone();
            let on_item = on_item.clone();
            let request = InferenceRequest::new(media_ref.clone(), prompt.clone(), max_new_tokens);

            handles.push(tokio::spawn(async move {
                let item = dispatch_single(&gateway, request, &options).await;
                drop(permit); // Release concurrency permit before callback
                on_item(&item);
                item
            }));
        }

        // Await in spawn order — the report stays aligned with the input.
        let mut items = Vec::with_capacity(total);
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::error!("Dispatch task panicked: {e}");
                    items.push(ItemReport::failure(
                        media[index].clone(),
                        format!("dispatch task panicked: {e}"),
                    ));
                }
            }
        }
        for media_ref in media.iter().skip(items.len()) {
            items.push(ItemReport::failure(
                media_ref.clone(),
                "dispatch aborted before this item was issued",
            ));
        }

        BatchReport { items }
    }

    /// Batched mode: one aggregate gateway call for the whole list.
    ///
    /// On failure every reference is marked failed with the identical
    /// reason. A result list whose length does not match the input is
    /// treated as a failed batch rather than zipped short.
    pub async fn dispatch_batched(
        &self,
        media: &[String],
        prompt: &PromptSpec,
        max_new_tokens: u32,
    ) -> BatchReport {
        if media.is_empty() {
            return BatchReport::default();
        }

        tracing::info!("Dispatching batch of {} items", media.len());

        let deadline = Duration::from_millis(self.options.batch_timeout_ms);
        let outcome = tokio::time::timeout(
            deadline,
            self.gateway.describe_batch(media, prompt, max_new_tokens),
        )
        .await;

        match outcome {
            Ok(Ok(results)) => {
                if results.len() != media.len() {
                    let err = GatewayError::LengthMismatch {
                        expected: media.len(),
                        got: results.len(),
                    };
                    tracing::error!("Batch dispatch failed: {err}");
                    return BatchReport::uniform_failure(media, &err.to_string());
                }
                let items = media
                    .iter()
                    .zip(results)
                    .map(|(media_ref, text)| ItemReport::success(media_ref.clone(), text))
                    .collect();
                BatchReport { items }
            }
            Ok(Err(e)) => {
                tracing::error!("Batch dispatch failed: {e}");
                BatchReport::uniform_failure(media, &e.to_string())
            }
            Err(_) => {
                let reason = format!("Timeout after {}ms", self.options.batch_timeout_ms);
                tracing::error!("Batch dispatch failed: {reason}");
                BatchReport::uniform_failure(media, &reason)
            }
        }
    }
}

/// Dispatch one item with retry logic.
async fn dispatch_single(
    gateway: &Arc<dyn InferenceGateway>,
    request: InferenceRequest,
    options: &DispatchOptions,
) -> ItemReport {
    let mut last_error = String::new();

    for attempt in 0..=options.retry_attempts {
        if attempt > 0 {
            let delay = retry::backoff_duration(attempt - 1, options.retry_delay_ms);
            tracing::debug!(
                "Retry {attempt}/{} for {} after {delay:?}",
                options.retry_attempts,
                request.media
            );
            tokio::time::sleep(delay).await;
        }

        match tokio::time::timeout(
            Duration::from_millis(options.item_timeout_ms),
            gateway.describe(&request),
        )
        .await
        {
            Ok(Ok(text)) => return ItemReport::success(request.media, text),
            Ok(Err(e)) => {
                last_error = e.to_string();
                if !retry::is_retryable(&e) {
                    break;
                }
            }
            Err(_) => {
                last_error = format!("Timeout after {}ms", options.item_timeout_ms);
                // Timeouts are retryable
            }
        }
    }

    ItemReport::failure(request.media, last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    type ItemFn = Box<dyn Fn(u32, &InferenceRequest) -> Result<String, GatewayError> + Send + Sync>;
    type BatchFn = Box<dyn Fn(&[String]) -> Result<Vec<String>, GatewayError> + Send + Sync>;

    /// A configurable mock gateway for dispatcher tests.
    ///
    /// Each `describe` call invokes the item factory with the current call
    /// index, so tests can vary behavior per attempt.
    struct MockGateway {
        item_fn: ItemFn,
        batch_fn: Option<BatchFn>,
        call_count: Arc<AtomicU32>,
        delay: Option<Duration>,
        in_flight: Option<(Arc<AtomicU32>, Arc<AtomicU32>)>, // (in_flight, max_concurrent)
    }

    impl MockGateway {
        fn describing() -> Self {
            Self {
                item_fn: Box::new(|_, request| Ok(format!("described {}", request.media))),
                batch_fn: None,
                call_count: Arc::new(AtomicU32::new(0)),
                delay: None,
                in_flight: None,
            }
        }

        fn failing(status_code: Option<u16>, message: &str) -> Self {
            let message = message.to_string();
            Self {
                item_fn: Box::new(move |_, _| {
                    Err(GatewayError::Gateway {
                        message: message.clone(),
                        status_code,
                    })
                }),
                batch_fn: None,
                call_count: Arc::new(AtomicU32::new(0)),
                delay: None,
                in_flight: None,
            }
        }

        fn with_item_fn(item_fn: ItemFn) -> Self {
            Self {
                item_fn,
                batch_fn: None,
                call_count: Arc::new(AtomicU32::new(0)),
                delay: None,
                in_flight: None,
            }
        }

        fn with_batch_fn(batch_fn: BatchFn) -> Self {
            Self {
                item_fn: Box::new(|_, _| Ok(String::new())),
                batch_fn: Some(batch_fn),
                call_count: Arc::new(AtomicU32::new(0)),
                delay: None,
                in_flight: None,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn call_count_handle(&self) -> Arc<AtomicU32> {
            self.call_count.clone()
        }
    }

    #[async_trait]
    impl InferenceGateway for MockGateway {
        fn name(&self) -> &str {
            "mock"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn describe(&self, request: &InferenceRequest) -> Result<String, GatewayError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Some((ref in_flight, ref max_concurrent)) = self.in_flight {
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_concurrent.fetch_max(current, Ordering::SeqCst);
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let result = (self.item_fn)(idx, request);
            if let Some((ref in_flight, _)) = self.in_flight {
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
            result
        }

        async fn describe_batch(
            &self,
            media: &[String],
            _prompt: &PromptSpec,
            _max_new_tokens: u32,
        ) -> Result<Vec<String>, GatewayError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.batch_fn {
                Some(batch_fn) => batch_fn(media),
                None => Ok(media.iter().map(|m| format!("described {m}")).collect()),
            }
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(60)
        }
    }

    fn media(refs: &[&str]) -> Vec<String> {
        refs.iter().map(|s| s.to_string()).collect()
    }

    fn fast_options() -> DispatchOptions {
        DispatchOptions {
            parallel: 1,
            item_delay_ms: 0,
            item_timeout_ms: 5000,
            batch_timeout_ms: 5000,
            retry_attempts: 0,
            retry_delay_ms: 10,
        }
    }

    fn dispatcher(gateway: MockGateway, options: DispatchOptions) -> BatchDispatcher {
        BatchDispatcher::new(Arc::new(gateway), options)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_per_item_results_aligned_with_input() {
        let dispatcher = dispatcher(MockGateway::describing(), fast_options());
        let inputs = media(&["/a.mp4", "/b.mp4", "/c.mp4"]);
        let report = dispatcher
            .dispatch_each(&inputs, &PromptSpec::text("p"), 128, |_| {})
            .await;

        assert_eq!(report.len(), inputs.len());
        for (item, input) in report.items.iter().zip(&inputs) {
            assert_eq!(&item.media, input);
            assert_eq!(item.result.as_deref(), Some(format!("described {input}").as_str()));
        }
        assert_eq!(report.succeeded(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_per_item_failure_is_isolated() {
        // Second call fails; first and third still succeed
        let gateway = MockGateway::with_item_fn(Box::new(|idx, request| {
            if idx == 1 {
                Err(GatewayError::Gateway {
                    message: "model exploded".to_string(),
                    status_code: Some(400),
                })
            } else {
                Ok(format!("described {}", request.media))
            }
        }));
        let dispatcher = dispatcher(gateway, fast_options());
        let inputs = media(&["/a.mp4", "/b.mp4", "/c.mp4"]);
        let report = dispatcher
            .dispatch_each(&inputs, &PromptSpec::text("p"), 128, |_| {})
            .await;

        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.items[1].error.as_deref(), Some("Gateway error: model exploded"));
        assert!(report.items[0].success);
        assert!(report.items[2].success);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_per_item_retry_on_server_error() {
        let gateway = MockGateway::with_item_fn(Box::new(|idx, _| {
            if idx == 0 {
                Err(GatewayError::Gateway {
                    message: "service unavailable".to_string(),
                    status_code: Some(503),
                })
            } else {
                Ok("recovered".to_string())
            }
        }));
        let call_count = gateway.call_count_handle();
        let options = DispatchOptions {
            retry_attempts: 1,
            ..fast_options()
        };
        let dispatcher = dispatcher(gateway, options);
        let report = dispatcher
            .dispatch_each(&media(&["/a.mp4"]), &PromptSpec::text("p"), 128, |_| {})
            .await;

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.items[0].result.as_deref(), Some("recovered"));
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_per_item_no_retry_on_bad_request() {
        let gateway = MockGateway::failing(Some(400), "video_path is required");
        let call_count = gateway.call_count_handle();
        let options = DispatchOptions {
            retry_attempts: 3,
            ..fast_options()
        };
        let dispatcher = dispatcher(gateway, options);
        let report = dispatcher
            .dispatch_each(&media(&["/a.mp4"]), &PromptSpec::text("p"), 128, |_| {})
            .await;

        assert_eq!(report.failed(), 1);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_per_item_timeout_captured() {
        let gateway = MockGateway::describing().with_delay(Duration::from_secs(5));
        let options = DispatchOptions {
            item_timeout_ms: 50,
            ..fast_options()
        };
        let dispatcher = dispatcher(gateway, options);
        let report = dispatcher
            .dispatch_each(&media(&["/a.mp4"]), &PromptSpec::text("p"), 128, |_| {})
            .await;

        assert_eq!(report.failed(), 1);
        let reason = report.items[0].error.as_deref().unwrap_or_default();
        assert!(reason.contains("Timeout"), "got: {reason}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_per_item_semaphore_bounds_concurrency() {
        let in_flight = Arc::new(AtomicU32::new(0));
        let max_concurrent = Arc::new(AtomicU32::new(0));
        let gateway = MockGateway {
            item_fn: Box::new(|_, _| Ok("described".to_string())),
            batch_fn: None,
            call_count: Arc::new(AtomicU32::new(0)),
            delay: Some(Duration::from_millis(100)),
            in_flight: Some((in_flight.clone(), max_concurrent.clone())),
        };
        let options = DispatchOptions {
            parallel: 2,
            ..fast_options()
        };
        let dispatcher = dispatcher(gateway, options);
        let inputs: Vec<String> = (0..6).map(|i| format!("/clip_{i}.mp4")).collect();
        let report = dispatcher
            .dispatch_each(&inputs, &PromptSpec::text("p"), 128, |_| {})
            .await;

        assert_eq!(report.succeeded(), 6);
        assert!(
            max_concurrent.load(Ordering::SeqCst) <= 2,
            "semaphore violated: max concurrent was {}",
            max_concurrent.load(Ordering::SeqCst)
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_per_item_delay_throttles_calls() {
        let gateway = MockGateway::describing();
        let options = DispatchOptions {
            item_delay_ms: 30,
            ..fast_options()
        };
        let dispatcher = dispatcher(gateway, options);
        let start = std::time::Instant::now();
        let report = dispatcher
            .dispatch_each(&media(&["/a.mp4", "/b.mp4", "/c.mp4"]), &PromptSpec::text("p"), 128, |_| {})
            .await;

        assert_eq!(report.succeeded(), 3);
        // Two inter-call gaps at 30ms each
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_per_item_empty_input() {
        let gateway = MockGateway::describing();
        let call_count = gateway.call_count_handle();
        let dispatcher = dispatcher(gateway, fast_options());
        let report = dispatcher
            .dispatch_each(&[], &PromptSpec::text("p"), 128, |_| {})
            .await;

        assert!(report.is_empty());
        assert_eq!(call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_per_item_callback_fires_per_item() {
        let seen = Arc::new(AtomicU32::new(0));
        let seen_clone = seen.clone();
        let dispatcher = dispatcher(MockGateway::describing(), fast_options());
        dispatcher
            .dispatch_each(&media(&["/a.mp4", "/b.mp4"]), &PromptSpec::text("p"), 128, move |_| {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_batched_success_aligned() {
        let dispatcher = dispatcher(MockGateway::describing(), fast_options());
        let inputs = media(&["/a.mp4", "/b.mp4"]);
        let report = dispatcher
            .dispatch_batched(&inputs, &PromptSpec::catalog_id("3"), 128)
            .await;

        assert_eq!(report.len(), 2);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.items[0].result.as_deref(), Some("described /a.mp4"));
        assert_eq!(report.items[1].result.as_deref(), Some("described /b.mp4"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_batched_failure_is_uniform() {
        let gateway = MockGateway::with_batch_fn(Box::new(|_| {
            Err(GatewayError::Gateway {
                message: "connection refused".to_string(),
                status_code: None,
            })
        }));
        let dispatcher = dispatcher(gateway, fast_options());
        let inputs = media(&["/a.mp4", "/b.mp4", "/c.mp4"]);
        let report = dispatcher
            .dispatch_batched(&inputs, &PromptSpec::text("p"), 128)
            .await;

        assert_eq!(report.failed(), 3);
        let reasons: Vec<_> = report
            .items
            .iter()
            .map(|item| item.error.as_deref().unwrap_or_default())
            .collect();
        // Every item carries the identical reason string
        assert!(reasons.windows(2).all(|w| w[0] == w[1]));
        assert!(reasons[0].contains("connection refused"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_batched_length_mismatch_guarded() {
        let gateway = MockGateway::with_batch_fn(Box::new(|_| {
            Ok(vec!["only one result".to_string()])
        }));
        let dispatcher = dispatcher(gateway, fast_options());
        let inputs = media(&["/a.mp4", "/b.mp4"]);
        let report = dispatcher
            .dispatch_batched(&inputs, &PromptSpec::text("p"), 128)
            .await;

        assert_eq!(report.len(), 2);
        assert_eq!(report.failed(), 2);
        let reason = report.items[0].error.as_deref().unwrap_or_default();
        assert!(reason.contains("mismatch"), "got: {reason}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_batched_timeout_is_uniform() {
        let gateway = MockGateway::describing().with_delay(Duration::from_secs(5));
        let options = DispatchOptions {
            batch_timeout_ms: 50,
            ..fast_options()
        };
        let dispatcher = dispatcher(gateway, options);
        let inputs = media(&["/a.mp4", "/b.mp4"]);
        let report = dispatcher
            .dispatch_batched(&inputs, &PromptSpec::text("p"), 128)
            .await;

        assert_eq!(report.failed(), 2);
        assert!(report.items[0]
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("Timeout"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_batched_empty_input() {
        let gateway = MockGateway::describing();
        let call_count = gateway.call_count_handle();
        let dispatcher = dispatcher(gateway, fast_options());
        let report = dispatcher
            .dispatch_batched(&[], &PromptSpec::text("p"), 128)
            .await;

        assert!(report.is_empty());
        assert_eq!(call_count.load(Ordering::SeqCst), 0);
    }
}
