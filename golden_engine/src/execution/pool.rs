// src/execution/pool.rs
//! Bounded worker pool for device evaluation
//!
//! Workers pull device indices from a shared atomic cursor and keep their
//! results locally until joined, so no lock is held while evaluating. With a
//! device timeout each evaluation runs on its own helper thread and the
//! worker waits with `recv_timeout`.

use super::cancellation::CancellationToken;
use super::evaluator::{evaluate_device, log_device_failure, panic_message};
use crate::results::{DeviceErrorCode, DeviceFailure, DeviceReport};
use crate::strategies::ExtractorRegistry;
use crate::types::DeviceInput;
use golden_rules::logging::codes;
use golden_rules::RuleSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub threads: usize,
    pub device_timeout: Option<Duration>,
    pub progress_reporting: bool,
}

/// Shared, read-only state for one batch
struct BatchJob<'a> {
    inputs: &'a [Arc<DeviceInput>],
    rules: &'a Arc<RuleSet>,
    extractors: &'a Arc<ExtractorRegistry>,
    settings: PoolSettings,
    token: &'a CancellationToken,
    completed: AtomicUsize,
}

impl BatchJob<'_> {
    fn run_one(&self, index: usize) -> DeviceReport {
        let input = &self.inputs[index];
        let report = match self.settings.device_timeout {
            Some(budget) => run_with_timeout(input, self.rules, self.extractors, budget),
            None => run_inline(input, self.rules, self.extractors),
        };

        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        if self.settings.progress_reporting {
            eprintln!(
                "Evaluated device {} of {}: {}",
                done,
                self.inputs.len(),
                input.device
            );
        }
        report
    }
}

/// Evaluate every input, returning one report per input in input order.
///
/// Devices not started before cancellation are reported as `cancelled`.
pub fn evaluate_all(
    inputs: &[Arc<DeviceInput>],
    rules: &Arc<RuleSet>,
    extractors: &Arc<ExtractorRegistry>,
    settings: PoolSettings,
    token: &CancellationToken,
) -> Vec<DeviceReport> {
    let total = inputs.len();
    let workers = settings.threads.max(1).min(total.max(1));

    golden_rules::log_info!("Evaluating devices",
        "devices" => total,
        "workers" => workers,
        "device_timeout_ms" => settings
            .device_timeout
            .map(|t| t.as_millis().to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    let job = BatchJob {
        inputs,
        rules,
        extractors,
        settings,
        token,
        completed: AtomicUsize::new(0),
    };
    let mut slots: Vec<Option<DeviceReport>> = (0..total).map(|_| None).collect();

    if workers == 1 {
        for (index, slot) in slots.iter_mut().enumerate() {
            if token.is_cancelled() {
                break;
            }
            *slot = Some(job.run_one(index));
        }
    } else {
        let cursor = AtomicUsize::new(0);

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                handles.push(scope.spawn(|| {
                    let mut local = Vec::new();
                    while !job.token.is_cancelled() {
                        let index = cursor.fetch_add(1, Ordering::SeqCst);
                        if index >= total {
                            break;
                        }
                        local.push((index, job.run_one(index)));
                    }
                    local
                }));
            }

            for handle in handles {
                match handle.join() {
                    Ok(local) => {
                        for (index, report) in local {
                            slots[index] = Some(report);
                        }
                    }
                    Err(payload) => {
                        golden_rules::log_error!(codes::batch::WORKER_PANIC, "Worker thread panicked",
                            "reason" => panic_message(payload.as_ref())
                        );
                    }
                }
            }
        });
    }

    let cancelled = token.is_cancelled();
    if cancelled {
        golden_rules::log_warning!("Batch cancelled",
            "completed" => job.completed.load(Ordering::SeqCst),
            "devices" => total
        );
    }

    slots
        .into_iter()
        .zip(inputs)
        .map(|(slot, input)| {
            slot.unwrap_or_else(|| {
                let failure = if cancelled {
                    DeviceFailure::new(
                        &input.device,
                        &input.platform,
                        DeviceErrorCode::Cancelled,
                        "batch cancelled before the device was evaluated",
                    )
                } else {
                    DeviceFailure::new(
                        &input.device,
                        &input.platform,
                        DeviceErrorCode::WorkerPanic,
                        "worker terminated before the device was evaluated",
                    )
                };
                log_device_failure(&failure);
                DeviceReport::Error(failure)
            })
        })
        .collect()
}

fn run_inline(
    input: &DeviceInput,
    rules: &RuleSet,
    extractors: &ExtractorRegistry,
) -> DeviceReport {
    panic::catch_unwind(AssertUnwindSafe(|| evaluate_device(input, rules, extractors, None)))
        .unwrap_or_else(|payload| {
            worker_panic(input, format!("evaluation panicked: {}", panic_message(payload.as_ref())))
        })
}

/// Evaluate on a detached helper thread and give up after `budget`.
///
/// The helper also sees the deadline and stops between rules, so a timed
/// out evaluation does not keep running for long.
fn run_with_timeout(
    input: &Arc<DeviceInput>,
    rules: &Arc<RuleSet>,
    extractors: &Arc<ExtractorRegistry>,
    budget: Duration,
) -> DeviceReport {
    let deadline = Instant::now() + budget;
    let (sender, receiver) = mpsc::channel();

    let job_input = Arc::clone(input);
    let job_rules = Arc::clone(rules);
    let job_extractors = Arc::clone(extractors);

    let spawned = thread::Builder::new()
        .name("golden-device".to_string())
        .spawn(move || {
            let report = evaluate_device(&job_input, &job_rules, &job_extractors, Some(deadline));
            // Receiver is gone once the worker timed out
            let _ = sender.send(report);
        });

    if let Err(e) = spawned {
        return worker_panic(input, format!("could not start evaluation thread: {}", e));
    }

    match receiver.recv_timeout(budget) {
        Ok(report) => report,
        Err(RecvTimeoutError::Timeout) => {
            let failure = DeviceFailure::new(
                &input.device,
                &input.platform,
                DeviceErrorCode::Timeout,
                format!("evaluation exceeded {} ms", budget.as_millis()),
            );
            log_device_failure(&failure);
            DeviceReport::Error(failure)
        }
        Err(RecvTimeoutError::Disconnected) => {
            worker_panic(input, "evaluation thread terminated without a result".to_string())
        }
    }
}

fn worker_panic(input: &DeviceInput, reason: String) -> DeviceReport {
    let failure = DeviceFailure::new(&input.device, &input.platform, DeviceErrorCode::WorkerPanic, reason);
    log_device_failure(&failure);
    DeviceReport::Error(failure)
}
