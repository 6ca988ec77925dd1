//! Priority queue of generation requests, drained under a rate limit
//!
//! Each request moves through `queued -> processing -> completed | failed`.
//! The queued state lives only in the scheduler; from `processing` on, the
//! current snapshot is stored in the cache under the request fingerprint, which
//! is also what deduplicates identical submissions.

use crate::cache::{CacheKey, CacheStore};
use crate::clock::{elapsed_between, SharedClock, SystemClock};
use crate::error::{Result, ServiceError};
use crate::generation::catalog::{ModelCategory, ModelDescriptor};
use crate::generation::config::SchedulerConfig;
use crate::generation::fingerprint::fingerprint;
use crate::generation::metrics::PerformanceMetrics;
use crate::generation::provider::{GenerationJob, GenerationOutput, GenerationProvider};
use crate::generation::selector::ModelSelector;
use crate::generation::types::{GenerationRequest, GenerationResult, GenerationStatus, Priority};
use crate::notify::{Notification, SharedNotifier, TracingNotifier};
use crate::ticker::RecurringTask;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// User id attached to requests issued by [`RequestScheduler::warm_cache`]
pub const CACHE_WARMER_USER: &str = "system:cache-warmer";

/// Message shown to the user when a generation fails upstream
pub const FAILURE_NOTICE: &str = "Image generation failed. Please try again.";

/// What a single drain step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Nothing queued
    Idle,
    /// A previous drain is still waiting on the provider
    Busy,
    /// The minimum dispatch interval has not elapsed
    RateLimited,
    /// The head of the queue was processed
    Dispatched {
        request_id: String,
        status: GenerationStatus,
    },
}

struct QueuedRequest {
    request: GenerationRequest,
    fingerprint: CacheKey,
}

struct RequestQueue {
    /// Ordered by priority, then arrival
    pending: Vec<QueuedRequest>,

    last_dispatch: Option<DateTime<Utc>>,
}

/// A request popped from the queue with its initial snapshot
struct Dispatch {
    request: GenerationRequest,
    fingerprint: CacheKey,
    model: Result<ModelDescriptor>,
    processing: GenerationResult,
    started_at: DateTime<Utc>,
}

/// Accepts generation requests and dispatches them one per drain tick
pub struct RequestScheduler {
    config: SchedulerConfig,
    cache: Arc<CacheStore>,
    selector: ModelSelector,
    provider: Arc<dyn GenerationProvider>,
    notifier: SharedNotifier,
    clock: SharedClock,
    queue: Mutex<RequestQueue>,
    /// Held for the whole of a drain step, provider call included
    drain_lock: Mutex<()>,
}

impl RequestScheduler {
    pub fn new(
        config: SchedulerConfig,
        cache: Arc<CacheStore>,
        selector: ModelSelector,
        provider: Arc<dyn GenerationProvider>,
    ) -> Self {
        info!("Initializing request scheduler with config: {:?}", config);

        Self {
            config,
            cache,
            selector,
            provider,
            notifier: Arc::new(TracingNotifier),
            clock: SystemClock::shared(),
            queue: Mutex::new(RequestQueue {
                pending: Vec::new(),
                last_dispatch: None,
            }),
            drain_lock: Mutex::new(()),
        }
    }

    pub fn with_notifier(mut self, notifier: SharedNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Queue a request and return the id to poll
    ///
    /// If a live, non-failed result already exists for the same fingerprint,
    /// or an identical request is still waiting in the queue, nothing is
    /// queued and the id of that earlier request is returned instead.
    pub async fn submit(&self, request: GenerationRequest) -> String {
        let key = fingerprint(&request);
        let mut queue = self.queue.lock().await;

        if let Some(existing) = self.cache.get(&key).await {
            if !existing.is_failed() {
                debug!(
                    "Request {} deduplicated against cached result of {}",
                    request.id, existing.request_id
                );
                return existing.request_id;
            }
        }

        if let Some(queued) = queue.pending.iter_mut().find(|q| q.fingerprint == key) {
            debug!(
                "Request {} deduplicated against queued request {}",
                request.id, queued.request.id
            );
            let queued_id = queued.request.id.clone();
            // The queued entry runs at the highest priority any caller asked for
            if request.priority.rank() > queued.request.priority.rank() {
                info!(
                    "Raised queued request {} from {} to {}",
                    queued_id, queued.request.priority, request.priority
                );
                queued.request.priority = request.priority;
                queue
                    .pending
                    .sort_by_key(|q| Reverse(q.request.priority.rank()));
            }
            return queued_id;
        }

        let id = request.id.clone();
        let priority = request.priority;
        queue.pending.push(QueuedRequest {
            request,
            fingerprint: key,
        });
        // Stable: arrival order is kept within a tier
        queue
            .pending
            .sort_by_key(|q| Reverse(q.request.priority.rank()));

        info!(
            "Queued request {} (priority: {}, queue length: {})",
            id,
            priority,
            queue.pending.len()
        );
        id
    }

    /// Queue several requests, returning their ids in order
    pub async fn submit_batch(&self, requests: Vec<GenerationRequest>) -> Vec<String> {
        let mut ids = Vec::with_capacity(requests.len());
        for request in requests {
            ids.push(self.submit(request).await);
        }
        ids
    }

    /// Queue low-priority generations for prompts that are not cached yet
    ///
    /// Returns how many requests were actually queued.
    pub async fn warm_cache<I, S>(&self, model: &str, prompts: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut queued = 0;
        for prompt in prompts {
            let request = GenerationRequest::new(model, prompt, CACHE_WARMER_USER)
                .with_priority(Priority::Low)
                .with_submitted_at(self.clock.now());
            let id = request.id.clone();
            if self.submit(request).await == id {
                queued += 1;
            }
        }

        info!("Cache warm-up queued {} generations for {}", queued, model);
        queued
    }

    /// Dispatch the head of the queue if the rate limit allows
    ///
    /// At most one drain runs at a time; a call made while another is waiting
    /// on the provider returns [`DrainOutcome::Busy`] immediately.
    pub async fn drain_once(&self) -> DrainOutcome {
        let Ok(_drain) = self.drain_lock.try_lock() else {
            debug!("Drain skipped, previous dispatch still in flight");
            return DrainOutcome::Busy;
        };

        let dispatch = match self.pop_next().await {
            Ok(dispatch) => dispatch,
            Err(outcome) => return outcome,
        };

        let request_id = dispatch.request.id.clone();
        let status = self.process(dispatch).await;

        DrainOutcome::Dispatched { request_id, status }
    }

    /// Latest result recorded for `request_id`, `None` while queued or unknown
    pub async fn status(&self, request_id: &str) -> Option<GenerationResult> {
        self.cache
            .find_latest(|result| result.request_id == request_id)
            .await
    }

    /// Zero-based position of a request still waiting in the queue
    pub async fn queue_position(&self, request_id: &str) -> Option<usize> {
        let queue = self.queue.lock().await;
        queue
            .pending
            .iter()
            .position(|q| q.request.id == request_id)
    }

    /// Ids of queued requests in drain order
    pub async fn queued_ids(&self) -> Vec<String> {
        let queue = self.queue.lock().await;
        queue.pending.iter().map(|q| q.request.id.clone()).collect()
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.pending.len()
    }

    /// Aggregate performance of the cached results
    pub async fn metrics(&self) -> PerformanceMetrics {
        let results = self.cache.live_values().await;
        PerformanceMetrics::from_results(&results)
    }

    /// Advisory hints derived from [`metrics`](Self::metrics)
    pub async fn cost_optimization_hints(&self) -> Vec<String> {
        self.metrics()
            .await
            .optimization_hints(&self.config.hint_thresholds)
    }

    /// Start draining on the configured interval
    pub fn start(self: &Arc<Self>) -> RecurringTask {
        let scheduler = Arc::clone(self);
        RecurringTask::spawn("queue-drain", self.config.drain_interval, move || {
            let scheduler = Arc::clone(&scheduler);
            async move {
                if let DrainOutcome::Dispatched { request_id, status } = scheduler.drain_once().await {
                    debug!("Drain tick finished {} as {}", request_id, status);
                }
            }
        })
    }

    /// Pop the head, choose its model and publish the `processing` snapshot
    ///
    /// The queue stays locked until the snapshot is in the cache, so a
    /// concurrent identical submission always finds one or the other.
    async fn pop_next(&self) -> std::result::Result<Dispatch, DrainOutcome> {
        let mut queue = self.queue.lock().await;

        if queue.pending.is_empty() {
            return Err(DrainOutcome::Idle);
        }

        let now = self.clock.now();
        if let Some(last) = queue.last_dispatch {
            if elapsed_between(last, now) < self.config.min_dispatch_interval {
                debug!("Drain rate limited");
                return Err(DrainOutcome::RateLimited);
            }
        }

        let QueuedRequest {
            request,
            fingerprint,
        } = queue.pending.remove(0);
        queue.last_dispatch = Some(now);

        let model = self.resolve_model(&request);
        let mut processing = GenerationResult::begin(&request);
        if let Ok(model) = &model {
            processing = processing.with_model(&model.id);
        }
        self.cache
            .set(fingerprint.clone(), processing.clone(), None)
            .await;

        info!(
            "Dispatching request {} ({} left in queue)",
            request.id,
            queue.pending.len()
        );

        Ok(Dispatch {
            request,
            fingerprint,
            model,
            processing,
            started_at: now,
        })
    }

    /// Run the provider call and store the terminal snapshot
    async fn process(&self, dispatch: Dispatch) -> GenerationStatus {
        let Dispatch {
            request,
            fingerprint,
            model,
            processing,
            started_at,
        } = dispatch;

        let outcome = match model {
            Ok(model) => {
                let job = GenerationJob {
                    request: request.clone(),
                    model,
                };
                self.call_provider(&job).await
            }
            Err(e) => Err(e),
        };

        let elapsed = elapsed_between(started_at, self.clock.now());

        let (next, ttl) = match outcome {
            Ok(output) => (processing.complete(output, elapsed), None),
            Err(e) => {
                if e.is_user_visible() {
                    error!("Generation failed for request {}: {}", request.id, e);
                    self.notifier
                        .notify(Notification::error(FAILURE_NOTICE).for_request(&request.id));
                } else {
                    warn!("Request {} could not be dispatched: {}", request.id, e);
                }
                (
                    processing.fail(e.to_string(), elapsed),
                    Some(self.config.failed_result_ttl),
                )
            }
        };

        match next {
            Ok(result) => {
                let status = result.status;
                info!(
                    "Request {} {} in {}ms",
                    request.id, status, result.processing_time_ms
                );
                self.cache.set(fingerprint, result, ttl).await;
                status
            }
            Err(e) => {
                error!("Dropping result for request {}: {}", request.id, e);
                processing.status
            }
        }
    }

    async fn call_provider(&self, job: &GenerationJob) -> Result<GenerationOutput> {
        let call = self.provider.generate(job);

        match self.config.generation_timeout {
            None => call.await,
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ServiceError::Timeout {
                    timeout_ms: limit.as_millis() as u64,
                    context: format!("generation of {} on {}", job.request.id, job.model.id),
                }),
            },
        }
    }

    /// Pick a backend; when selection fails, fall back to the request's own model
    fn resolve_model(&self, request: &GenerationRequest) -> Result<ModelDescriptor> {
        let selected = match request.category() {
            Some(name) => name.parse::<ModelCategory>(),
            None => Ok(self.config.default_category),
        }
        .and_then(|category| {
            self.selector
                .select(category, request.priority, request.quality_requirement())
                .cloned()
        });

        match selected {
            Ok(model) => Ok(model),
            Err(e) => match self.selector.catalog().get(&request.model) {
                Some(model) => {
                    warn!(
                        "Model selection failed for {} ({}), using requested model {}",
                        request.id, e, model.id
                    );
                    Ok(model.clone())
                }
                None => Err(e),
            },
        }
    }
}
