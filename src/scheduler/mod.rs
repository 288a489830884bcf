// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Static-chunked parallel execution of independent jobs.
//!
//! Jobs (sky pixels, or cache-table cells) are split into one contiguous chunk
//! per thread. Every worker writes only to its own slice of the output, polls
//! the [`CancelToken`] once per job and advances a shared progress bar once
//! per completed job.
//!
//! A job error that is recoverable (e.g. a quadrature that didn't converge)
//! is recorded against that job only and its output stays at [`UNSEEN`]. Any
//! other error stops every worker; it is returned once all threads have been
//! joined.

mod error;

pub use error::{SchedulerError, SignalHandlerError};

use std::{
    num::NonZeroUsize,
    ops::Range,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use crossbeam_utils::atomic::AtomicCell;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, trace};
use scopeguard::defer_on_unwind;

use crate::{constants::UNSEEN, PROGRESS_BARS};

/// A cooperative cancellation flag shared between the caller, a signal
/// handler and worker threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Cancel this token on SIGINT or SIGTERM. Only one handler can be
    /// installed per process.
    pub fn install_signal_handler(&self) -> Result<(), SignalHandlerError> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            token.cancel();
        })?;
        debug!("Installed SIGINT/SIGTERM handler");
        Ok(())
    }
}

/// Errors from jobs say whether the run can carry on without them.
pub trait JobError: std::error::Error + Send + 'static {
    fn is_recoverable(&self) -> bool;
}

/// A job that failed with a recoverable error.
#[derive(Debug)]
pub struct JobFailure<E> {
    /// Index into the job list.
    pub job: usize,
    pub error: E,
}

#[derive(Debug)]
pub struct RunSummary<E> {
    /// Jobs with a value.
    pub completed: usize,

    /// Jobs that failed without stopping the run, in job order.
    pub failures: Vec<JobFailure<E>>,

    /// Did the run stop early because it was cancelled?
    pub cancelled: bool,
}

/// The number of threads to use by default.
pub fn default_num_threads() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Split `0..n` into at most `threads` contiguous, non-empty ranges whose
/// sizes differ by at most one. The ranges cover `0..n` exactly once.
pub fn chunk_ranges(n: usize, threads: usize) -> Vec<Range<usize>> {
    let num_chunks = threads.max(1).min(n);
    if num_chunks == 0 {
        return vec![];
    }
    let base = n / num_chunks;
    let remainder = n % num_chunks;
    let mut start = 0;
    (0..num_chunks)
        .map(|i| {
            let len = base + usize::from(i < remainder);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// A progress bar in the house style, drawn only if progress bars are
/// enabled.
pub fn progress_bar(len: usize, message: &'static str, noun: &str) -> ProgressBar {
    let draw_target = if PROGRESS_BARS.load() {
        ProgressDrawTarget::stdout()
    } else {
        ProgressDrawTarget::hidden()
    };
    ProgressBar::with_draw_target(Some(len as u64), draw_target)
        .with_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{msg:17}}: [{{wide_bar:.blue}}] {{pos:2}}/{{len:2}} {noun} ({{elapsed_precise}}<{{eta_precise}})"
                ))
                .expect("progress bar template is valid")
                .progress_chars("=> "),
        )
        .with_position(0)
        .with_message(message)
}

/// Run `f` for every job on up to `num_threads` threads, writing each result
/// into the matching slot of `outputs`.
pub fn run_chunked<T, E, F>(
    jobs: &[T],
    outputs: &mut [f64],
    num_threads: usize,
    progress: &ProgressBar,
    cancel: &CancelToken,
    f: F,
) -> Result<RunSummary<E>, SchedulerError<E>>
where
    T: Sync,
    E: JobError,
    F: Fn(&T) -> Result<f64, E> + Sync,
{
    assert_eq!(
        jobs.len(),
        outputs.len(),
        "every job needs exactly one output slot"
    );
    outputs.fill(UNSEEN);

    let ranges = chunk_ranges(jobs.len(), num_threads);
    debug!(
        "Running {} jobs in {} chunks",
        jobs.len(),
        ranges.len()
    );

    // Hand each chunk its own disjoint slice of the outputs.
    let mut output_chunks = Vec::with_capacity(ranges.len());
    let mut rest = outputs;
    for range in &ranges {
        let (head, tail) = rest.split_at_mut(range.len());
        output_chunks.push(head);
        rest = tail;
    }

    // Use a variable to track whether any threads have an issue.
    let error = AtomicCell::new(false);
    let error = &error;
    let f = &f;

    let joined = thread::scope(|scope| {
        let handles: Vec<_> = ranges
            .into_iter()
            .zip(output_chunks)
            .enumerate()
            .map(|(i_chunk, (range, outputs))| {
                let name = format!("worker {i_chunk}");
                let handle = thread::Builder::new()
                    .name(name.clone())
                    .spawn_scoped(scope, move || {
                        // If a panic happens, update our atomic error.
                        defer_on_unwind! { error.store(true); }
                        trace!("Chunk {i_chunk}: jobs {range:?}");

                        let mut completed = 0;
                        let mut failures = vec![];
                        let mut cancelled = false;
                        for (i_job, output) in range.zip(outputs.iter_mut()) {
                            // Should we continue?
                            if error.load() {
                                break;
                            }
                            if cancel.is_cancelled() {
                                cancelled = true;
                                break;
                            }

                            match f(&jobs[i_job]) {
                                Ok(v) => {
                                    *output = v;
                                    completed += 1;
                                }
                                Err(e) if e.is_recoverable() => {
                                    failures.push(JobFailure { job: i_job, error: e })
                                }
                                Err(e) => {
                                    // Allow the other threads to see this so
                                    // they can abandon their work early.
                                    error.store(true);
                                    return Err(e);
                                }
                            }
                            progress.inc(1);
                        }

                        Ok(RunSummary {
                            completed,
                            failures,
                            cancelled,
                        })
                    })
                    .expect("OS can create threads");
                (name, handle)
            })
            .collect();

        // Join everything before looking at any result.
        handles
            .into_iter()
            .map(|(name, handle)| handle.join().map_err(|_| name))
            .collect::<Vec<_>>()
    });

    let mut summary = RunSummary {
        completed: 0,
        failures: vec![],
        cancelled: false,
    };
    let mut first_error = None;
    for result in joined {
        match result {
            Err(name) => return Err(SchedulerError::WorkerPanicked(name)),
            Ok(Err(e)) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            Ok(Ok(chunk)) => {
                summary.completed += chunk.completed;
                summary.failures.extend(chunk.failures);
                summary.cancelled |= chunk.cancelled;
            }
        }
    }
    match first_error {
        Some(e) => Err(SchedulerError::Job(e)),
        None => Ok(summary),
    }
}
