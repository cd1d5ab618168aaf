// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end tests of the prefetch pipeline with real worker threads.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use tokio_util::sync::CancellationToken;

    use crate::config::DeviceMode;
    use crate::engine::{
        Batch, BufferAccounting, MirroredDevice, PipelineState, PrefetchConfig, Prefetcher,
    };
    use crate::errors::{DeviceError, LoadError, PipelineError};
    use crate::traits::{loader_fn, BatchLoader, DeviceTransfer, TransferOutcome};

    /// Payload `[i]` on the i-th fill, optionally failing or panicking on one call.
    fn counting_loader(fail_at: Option<usize>, panic_at: Option<usize>) -> impl BatchLoader<f32> {
        let mut calls = 0_usize;
        loader_fn(move |batch: &mut Batch<f32>| {
            let call = calls;
            calls += 1;
            if Some(call) == panic_at {
                panic!("loader exploded on call {call}");
            }
            if Some(call) == fail_at {
                return Err(LoadError::Other(format!("source failed on call {call}")));
            }
            batch.payload.reshape(&[1]);
            batch.payload.data_mut()[0] = call as f32;
            Ok(())
        })
    }

    fn config(prefetch_depth: usize) -> PrefetchConfig {
        PrefetchConfig {
            prefetch_depth,
            output_labels: false,
            device: DeviceMode::Host,
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Every slot is ready or current, so the worker is parked on an empty free queue.
    fn wait_until_worker_parked(pipeline: &Prefetcher<f32>) {
        let depth = pipeline.config().prefetch_depth;
        wait_until(|| {
            let accounting = pipeline.accounting();
            accounting.full + accounting.current == depth
        });
    }

    #[test]
    fn test_depth_two_yields_call_indices_in_order() {
        let mut pipeline = Prefetcher::new("depth_two", config(2)).unwrap();
        pipeline.start(counting_loader(None, None), 0).unwrap();

        for expected in 0..3 {
            let staged = pipeline.next().unwrap();
            assert_eq!(staged.payload.data(), &[expected as f32]);
            assert!(staged.label.is_none());
        }
        pipeline.stop().unwrap();
    }

    #[test]
    fn test_batches_arrive_in_generation_order_without_gaps() {
        struct TestCase {
            depth: usize,
            calls: usize,
        }

        let test_cases = vec![
            TestCase { depth: 1, calls: 10 },
            TestCase { depth: 3, calls: 25 },
            TestCase { depth: 8, calls: 40 },
        ];

        for test_case in test_cases {
            let mut pipeline = Prefetcher::new("ordering", config(test_case.depth)).unwrap();
            pipeline.start(counting_loader(None, None), 0).unwrap();

            for expected in 0..test_case.calls {
                let staged = pipeline.next().unwrap();
                assert_eq!(staged.sequence, expected as u64, "depth {}", test_case.depth);
                assert_eq!(staged.payload.data(), &[expected as f32], "depth {}", test_case.depth);
            }
        }
    }

    #[test]
    fn test_buffer_accounting_once_worker_parks() {
        let depth = 4;
        let mut pipeline = Prefetcher::new("accounting", config(depth)).unwrap();
        assert_eq!(pipeline.accounting().total(), depth);
        assert_eq!(pipeline.accounting().free, depth);

        pipeline.start(counting_loader(None, None), 0).unwrap();
        wait_until_worker_parked(&pipeline);
        assert_eq!(
            pipeline.accounting(),
            BufferAccounting { free: 0, full: depth, filling: 0, current: 0 }
        );

        for _ in 0..6 {
            pipeline.next().unwrap();
            wait_until_worker_parked(&pipeline);
            assert_eq!(
                pipeline.accounting(),
                BufferAccounting { free: 0, full: depth - 1, filling: 0, current: 1 }
            );
            assert_eq!(pipeline.accounting().total(), depth);
        }

        pipeline.stop().unwrap();
        assert_eq!(pipeline.accounting().total(), depth);
    }

    #[test]
    fn test_buffer_accounting_totals_depth_while_worker_runs() {
        let depth = 2;

        for _ in 0..50 {
            let mut pipeline = Prefetcher::new("accounting_live", config(depth)).unwrap();
            pipeline.start(counting_loader(None, None), 0).unwrap();

            for _ in 0..40 {
                let accounting = pipeline.accounting();
                assert_eq!(accounting.total(), depth, "right after start: {:?}", accounting);
            }

            for _ in 0..20 {
                pipeline.next().unwrap();
                let accounting = pipeline.accounting();
                assert_eq!(accounting.total(), depth, "right after next: {:?}", accounting);
                assert_eq!(accounting.current, 1);
            }

            pipeline.stop().unwrap();
            assert_eq!(pipeline.accounting().total(), depth);
        }
    }

    #[test]
    fn test_stop_returns_when_worker_blocked_on_free_queue() {
        let mut pipeline = Prefetcher::new("never_consumed", config(2)).unwrap();
        pipeline.start(counting_loader(None, None), 0).unwrap();
        wait_until_worker_parked(&pipeline);

        pipeline.stop().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert!(pipeline.last_error().is_none());
    }

    #[test]
    fn test_drop_stops_running_worker() {
        let fills = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fills);
        let mut pipeline = Prefetcher::new("dropped", config(2)).unwrap();
        pipeline
            .start(
                loader_fn(move |batch: &mut Batch<f32>| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    batch.payload.reshape(&[1]);
                    Ok(())
                }),
                0,
            )
            .unwrap();
        pipeline.next().unwrap();
        drop(pipeline);

        // The worker is joined by drop, so the count can no longer move.
        let after_drop = fills.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(fills.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn test_stop_during_slow_fill() {
        let mut pipeline = Prefetcher::new("slow", config(2)).unwrap();
        pipeline
            .start(
                loader_fn(|batch: &mut Batch<f32>| {
                    thread::sleep(Duration::from_millis(30));
                    batch.payload.reshape(&[1]);
                    Ok(())
                }),
                0,
            )
            .unwrap();
        thread::sleep(Duration::from_millis(10));

        pipeline.stop().unwrap();
        assert_eq!(pipeline.accounting().total(), 2);
    }

    #[test]
    fn test_load_failure_is_fatal_and_reported() {
        let mut pipeline = Prefetcher::new("failing", config(2)).unwrap();
        pipeline.start(counting_loader(Some(3), None), 0).unwrap();

        let mut seen = Vec::new();
        let error = loop {
            match pipeline.next() {
                Ok(staged) => seen.push(staged.payload.data()[0]),
                Err(error) => break error,
            }
            assert!(seen.len() <= 3, "a failed fill must never be skipped");
        };

        let expected: Vec<f32> = (0..seen.len()).map(|i| i as f32).collect();
        assert_eq!(seen, expected);
        assert!(matches!(error, PipelineError::WorkerFailed { ref reason, .. } if reason.contains("call 3")));
        assert_eq!(pipeline.last_error(), Some(error.clone()));

        // Every later call keeps reporting the same failure.
        assert_eq!(pipeline.next().unwrap_err(), error);
        pipeline.stop().unwrap();
        assert_eq!(pipeline.accounting().total(), 2);
    }

    #[test]
    fn test_blocked_consumer_wakes_on_failure() {
        let mut pipeline = Prefetcher::new("wake_on_failure", config(2)).unwrap();
        pipeline
            .start(
                loader_fn(|_batch: &mut Batch<f32>| {
                    thread::sleep(Duration::from_millis(20));
                    Err(LoadError::EmptySource("records.csv".into()))
                }),
                0,
            )
            .unwrap();

        let error = pipeline.next().unwrap_err();
        assert!(error.is_worker_failure());
        assert!(error.to_string().contains("records.csv"));
    }

    #[test]
    fn test_loader_panic_is_reported() {
        let mut pipeline = Prefetcher::new("panicking", config(1)).unwrap();
        pipeline.start(counting_loader(None, Some(0)), 0).unwrap();

        let error = pipeline.next().unwrap_err();
        assert_eq!(error, PipelineError::WorkerPanicked("panicking".to_string()));
        pipeline.stop().unwrap();
    }

    #[test]
    fn test_mirrored_device_holds_each_consumed_batch() {
        let device = Arc::new(MirroredDevice::<f32>::new().unwrap());
        let transfer: Arc<dyn DeviceTransfer<f32>> = device.clone();
        let mut pipeline = Prefetcher::with_device("mirrored", config(3), transfer).unwrap();
        assert_eq!(device.slot_count(), 3);

        pipeline.start(counting_loader(None, None), 0).unwrap();
        for _ in 0..7 {
            let staged = pipeline.next().unwrap();
            let host = staged.payload.data().to_vec();
            assert_eq!(device.mirror(staged.slot), Some(host));
        }
    }

    #[test]
    fn test_mirrored_mode_from_config() {
        let pipeline_config = PrefetchConfig {
            device: DeviceMode::Mirrored,
            ..config(2)
        };
        let mut pipeline = Prefetcher::new("mirrored_config", pipeline_config).unwrap();
        pipeline.start(counting_loader(None, None), 0).unwrap();

        for expected in 0..4 {
            assert_eq!(pipeline.next().unwrap().payload.data(), &[expected as f32]);
        }
    }

    struct FaultyDevice;

    impl DeviceTransfer<f32> for FaultyDevice {
        fn name(&self) -> &'static str {
            "faulty"
        }

        fn commit(&self, batch: &Batch<f32>, _cancel: &CancellationToken) -> Result<TransferOutcome, DeviceError> {
            Err(DeviceError::TransferFailed {
                batch_id: batch.id,
                reason: "bus error".to_string(),
            })
        }
    }

    /// Never acknowledges; only cancellation ends a commit.
    struct StalledDevice;

    impl DeviceTransfer<f32> for StalledDevice {
        fn name(&self) -> &'static str {
            "stalled"
        }

        fn commit(&self, _batch: &Batch<f32>, cancel: &CancellationToken) -> Result<TransferOutcome, DeviceError> {
            while !cancel.is_cancelled() {
                thread::sleep(Duration::from_millis(1));
            }
            Ok(TransferOutcome::Cancelled)
        }
    }

    #[test]
    fn test_device_failure_is_fatal() {
        let mut pipeline = Prefetcher::with_device("faulty", config(2), Arc::new(FaultyDevice)).unwrap();
        pipeline.start(counting_loader(None, None), 0).unwrap();

        let error = pipeline.next().unwrap_err();
        assert!(matches!(error, PipelineError::WorkerFailed { ref reason, .. } if reason.contains("bus error")));
    }

    #[test]
    fn test_stop_interrupts_device_wait() {
        let mut pipeline = Prefetcher::with_device("stalled", config(2), Arc::new(StalledDevice)).unwrap();
        pipeline.start(counting_loader(None, None), 0).unwrap();
        wait_until(|| pipeline.accounting().filling == 1);

        pipeline.stop().unwrap();
        assert!(pipeline.last_error().is_none());
        assert_eq!(pipeline.accounting().total(), 2);
        assert_eq!(pipeline.accounting().free, 2);
    }
}
