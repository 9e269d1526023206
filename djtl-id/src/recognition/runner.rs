//! Bounded-parallel segment recognition
//!
//! Segments are recognized concurrently (at most `max_concurrency` in
//! flight), each under its own timeout. Results are collected with their
//! segment index and re-sorted before being returned, so callers always get
//! records in time order regardless of completion order.
//!
//! A segment that times out, errors, or is cancelled becomes an
//! unrecognized record. The run itself never fails.

use super::{Recognition, Recognizer};
use crate::models::{RawDetection, Segment};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RecognitionRunner {
    max_concurrency: usize,
    segment_timeout: Duration,
    cancel: CancellationToken,
}

impl RecognitionRunner {
    pub fn new(max_concurrency: usize, segment_timeout: Duration) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            segment_timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Share an external cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Recognize every segment with one backend, returning time-ordered records
    pub async fn run(
        &self,
        recognizer: Arc<dyn Recognizer>,
        segments: &[Segment],
    ) -> Vec<RawDetection> {
        let source = recognizer.name().to_string();
        info!(
            source = %source,
            segments = segments.len(),
            max_concurrency = self.max_concurrency,
            "Starting segment recognition"
        );

        // Futures own their inputs
        let calls = segments.iter().cloned().map(|segment| {
            let runner = self.clone();
            let recognizer = Arc::clone(&recognizer);
            let source = source.clone();
            async move {
                let recognition = runner.recognize_one(recognizer.as_ref(), &segment).await;
                (segment.index, recognition.into_detection(&source, &segment))
            }
        });

        let mut results: Vec<(usize, RawDetection)> = stream::iter(calls)
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        // Barrier passed: restore time order before anything folds
        results.sort_by_key(|(index, _)| *index);

        let detections: Vec<RawDetection> = results.into_iter().map(|(_, d)| d).collect();
        let recognized = detections.iter().filter(|d| d.recognized).count();
        info!(
            source = %source,
            recognized,
            total = detections.len(),
            "Segment recognition complete"
        );

        detections
    }

    async fn recognize_one(&self, recognizer: &dyn Recognizer, segment: &Segment) -> Recognition {
        if self.cancel.is_cancelled() {
            return Recognition::NoMatch;
        }

        tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!(segment = segment.index, "Recognition cancelled");
                Recognition::NoMatch
            }
            outcome = tokio::time::timeout(self.segment_timeout, recognizer.recognize(segment)) => {
                match outcome {
                    Ok(Ok(recognition)) => {
                        if let Recognition::Match { title, artist, .. } = &recognition {
                            debug!(
                                source = recognizer.name(),
                                segment = segment.index,
                                at = segment.start,
                                %title,
                                %artist,
                                "Segment recognized"
                            );
                        }
                        recognition
                    }
                    Ok(Err(err)) => {
                        warn!(
                            source = recognizer.name(),
                            segment = segment.index,
                            error = %err,
                            "Segment recognition failed, treating as unrecognized"
                        );
                        Recognition::NoMatch
                    }
                    Err(_) => {
                        warn!(
                            source = recognizer.name(),
                            segment = segment.index,
                            timeout_secs = self.segment_timeout.as_secs_f64(),
                            "Segment recognition timed out, treating as unrecognized"
                        );
                        Recognition::NoMatch
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::RecognitionError;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn segments(n: usize) -> Vec<Segment> {
        (0..n)
            .map(|index| Segment {
                index,
                start: index as f64 * 30.0,
                end: (index + 1) as f64 * 30.0,
                path: PathBuf::from(format!("segment_{index:04}.wav")),
            })
            .collect()
    }

    struct InFlight<'a>(&'a AtomicUsize);

    impl Drop for InFlight<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Later segments finish first; segment 1 fails; segment 3 hangs
    struct Scripted {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Recognizer for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn recognize(&self, segment: &Segment) -> Result<Recognition, RecognitionError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            let _guard = InFlight(&self.in_flight);
            self.peak.fetch_max(now, Ordering::SeqCst);

            let wait = match segment.index {
                3 => 5_000,
                i => 40 - (i as u64 * 5),
            };
            tokio::time::sleep(Duration::from_millis(wait)).await;

            match segment.index {
                1 => Err(RecognitionError::Fatal("boom".into())),
                i => Ok(Recognition::Match {
                    title: format!("Track {i}"),
                    artist: "Artist".to_string(),
                    confidence: None,
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_results_are_time_ordered_and_degraded() {
        let recognizer = Arc::new(Scripted {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let runner = RecognitionRunner::new(2, Duration::from_millis(200));

        let detections = runner.run(recognizer.clone(), &segments(6)).await;

        assert_eq!(detections.len(), 6);
        for (i, d) in detections.iter().enumerate() {
            assert_eq!(d.segment_start, i as f64 * 30.0);
            assert_eq!(d.source, "scripted");
        }
        assert!(detections[0].recognized);
        assert!(!detections[1].recognized, "error degrades to unrecognized");
        assert!(!detections[3].recognized, "timeout degrades to unrecognized");
        assert_eq!(detections[5].title, "Track 5");
        assert!(recognizer.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_yields_unrecognized() {
        let recognizer = Arc::new(Scripted {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let runner = RecognitionRunner::new(3, Duration::from_secs(10));
        runner.cancellation_token().cancel();

        let detections = runner.run(recognizer, &segments(4)).await;
        assert_eq!(detections.len(), 4);
        assert!(detections.iter().all(|d| !d.recognized));
    }
}
