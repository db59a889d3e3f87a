//! Analysis throttle, queue, and worker.
//!
//! The queue decouples producer burstiness from analyzer cost: a minimum-
//! interval gate discards requests that arrive too soon after the last
//! accepted one (lossy sampling, freshness over completeness), and the
//! bounded queue drops its oldest pending request in favor of the newest
//! when full. A dedicated worker thread runs the analyzer so nothing
//! upstream ever blocks on OCR.

use crate::analysis::analyzer::{AnalysisResult, ScreenAnalyzer};
use crate::analysis::{LiveResult, ObserverRegistry};
use crate::producer::types::AnalysisRequest;
use crate::producer::join_bounded;
use crate::state::ActivityAggregator;
use crate::stats::MonitorStats;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// What happened to a submitted analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Accepted into the queue
    Accepted,
    /// Accepted; the oldest pending request was dropped to make room
    AcceptedDroppedOldest,
    /// Rejected by the minimum-interval gate
    Throttled,
}

/// Bounded queue of pending analysis requests with an interval gate.
pub struct AnalysisQueue {
    sender: Sender<AnalysisRequest>,
    receiver: Receiver<AnalysisRequest>,
    interval: Duration,
    last_accepted: Mutex<Option<Instant>>,
}

impl AnalysisQueue {
    pub fn new(interval: Duration, capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            interval,
            last_accepted: Mutex::new(None),
        }
    }

    /// Submit a request. Never blocks the caller.
    ///
    /// The gate runs before the request enters the queue: if less than the
    /// configured interval has elapsed since the last accepted request, the
    /// request is discarded.
    pub fn submit(&self, request: AnalysisRequest) -> SubmitOutcome {
        let mut last = self
            .last_accepted
            .lock()
            .expect("throttle gate lock poisoned");

        if let Some(accepted_at) = *last {
            if accepted_at.elapsed() < self.interval {
                tracing::debug!("analysis request throttled");
                return SubmitOutcome::Throttled;
            }
        }
        *last = Some(Instant::now());
        drop(last);

        match self.sender.try_send(request) {
            Ok(()) => SubmitOutcome::Accepted,
            Err(TrySendError::Full(request)) => {
                // Bias toward recency: evict the oldest pending request.
                let _ = self.receiver.try_recv();
                if self.sender.try_send(request).is_err() {
                    tracing::warn!("analysis queue full after eviction; request dropped");
                    return SubmitOutcome::Throttled;
                }
                SubmitOutcome::AcceptedDroppedOldest
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::error!("analysis queue disconnected");
                SubmitOutcome::Throttled
            }
        }
    }

    /// Number of requests currently waiting.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    fn receiver(&self) -> Receiver<AnalysisRequest> {
        self.receiver.clone()
    }
}

/// Worker thread that drains the analysis queue.
///
/// For each surviving request it runs the analyzer synchronously, feeds the
/// result into the aggregator, bumps the analysis counter, and notifies the
/// observer registry. An analysis failure is logged and replaced by an
/// empty, zero-confidence result; the loop always continues.
pub struct AnalysisWorker {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    pub fn spawn(
        queue: Arc<AnalysisQueue>,
        analyzer: Arc<ScreenAnalyzer>,
        aggregator: Arc<ActivityAggregator>,
        stats: Arc<MonitorStats>,
        observers: Arc<ObserverRegistry>,
        poll: Duration,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let receiver = queue.receiver();

        let handle = thread::spawn(move || {
            while flag.load(Ordering::SeqCst) {
                let request = match receiver.recv_timeout(poll) {
                    Ok(request) => request,
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                    Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                };

                let result = match analyzer.analyze(&request) {
                    Ok(result) => {
                        stats.record_ocr_analysis();
                        result
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "screen analysis failed");
                        AnalysisResult::empty(request.timestamp)
                    }
                };

                aggregator.observe_analysis(&result);
                observers.notify(&LiveResult::from_analysis(&result));
            }
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal the worker to stop and join it within `timeout`.
    pub fn stop(&mut self, timeout: Duration) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            join_bounded(handle, timeout, "analysis worker");
        }
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        self.stop(Duration::from_secs(2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ocr::{OcrEngine, OcrOutput, StaticOcr};
    use crate::analysis::AnalysisError;
    use crate::classify::RuleSet;
    use crate::source::CaptureRef;
    use std::sync::atomic::AtomicUsize;

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(CaptureRef::from_bytes(vec![0u8; 4]))
    }

    /// Fails on the first call, then delegates to a working stub.
    struct FlakyOcr {
        calls: AtomicUsize,
        inner: StaticOcr,
    }

    impl OcrEngine for FlakyOcr {
        fn recognize(&self, capture: &CaptureRef) -> Result<OcrOutput, AnalysisError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(AnalysisError::Ocr("engine warming up".to_string()));
            }
            self.inner.recognize(capture)
        }
    }

    #[test]
    fn test_gate_throttles_rapid_submissions() {
        let queue = AnalysisQueue::new(Duration::from_millis(200), 4);

        assert_eq!(queue.submit(request()), SubmitOutcome::Accepted);
        assert_eq!(queue.submit(request()), SubmitOutcome::Throttled);
        assert_eq!(queue.pending(), 1);
    }

    #[test]
    fn test_gate_accepts_after_interval() {
        let queue = AnalysisQueue::new(Duration::from_millis(50), 4);

        assert_eq!(queue.submit(request()), SubmitOutcome::Accepted);
        thread::sleep(Duration::from_millis(60));
        assert_eq!(queue.submit(request()), SubmitOutcome::Accepted);
        assert_eq!(queue.pending(), 2);
    }

    #[test]
    fn test_full_queue_drops_oldest() {
        let queue = AnalysisQueue::new(Duration::ZERO, 2);

        assert_eq!(queue.submit(request()), SubmitOutcome::Accepted);
        assert_eq!(queue.submit(request()), SubmitOutcome::Accepted);
        assert_eq!(queue.submit(request()), SubmitOutcome::AcceptedDroppedOldest);
        assert_eq!(queue.pending(), 2);
    }

    #[test]
    fn test_worker_survives_analysis_failure() {
        let queue = Arc::new(AnalysisQueue::new(Duration::ZERO, 4));
        let analyzer = Arc::new(ScreenAnalyzer::new(
            Arc::new(FlakyOcr {
                calls: AtomicUsize::new(0),
                inner: StaticOcr::from_text("excel workbook sum", 0.9),
            }),
            Arc::new(RuleSet::default_rules()),
        ));
        let aggregator = Arc::new(ActivityAggregator::with_defaults());
        let stats = Arc::new(MonitorStats::new());
        let observers = Arc::new(ObserverRegistry::new());

        let mut worker = AnalysisWorker::spawn(
            queue.clone(),
            analyzer,
            aggregator.clone(),
            stats.clone(),
            observers,
            Duration::from_millis(5),
        );

        queue.submit(request());
        queue.submit(request());
        thread::sleep(Duration::from_millis(200));
        worker.stop(Duration::from_secs(1));

        // The first request failed; the second was analyzed and counted.
        assert_eq!(stats.snapshot().ocr_analyses, 1);
        assert!(aggregator
            .applications_snapshot()
            .iter()
            .any(|a| a.name == "excel"));
    }
}
