//! A small scheduler for embarrassingly parallel work.
//!
//! A **ParallelProcess** describes a fixed number of independent work
//! units. The scheduler runs them on a pool of worker threads, which
//! pull unit indices from a shared atomic counter and send their results
//! over a channel to the thread that scheduled the job. Cancellation is
//! cooperative: workers poll a shared **CancelToken** between units and
//! processes are expected to poll it inside long running units, too.

// std
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
// others
use log::{debug, warn};

/// Terminal status of a scheduled process.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    Success,
    Failure,
    Cancelled,
}

/// Shared cancellation flag with an optional deadline. Clones observe
/// the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }
    /// A token that trips by itself after `seconds` (0 = never).
    pub fn with_timeout(seconds: u32) -> Self {
        let mut token = CancelToken::new();
        if seconds > 0 {
            token.deadline = Some(Instant::now() + Duration::from_secs(seconds as u64));
        }
        token
    }
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }
    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Acquire) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.flag.store(true, Ordering::Release);
                true
            }
            _ => false,
        }
    }
}

/// Independent units of work plus the code that processes one of them.
pub trait ParallelProcess: Send + Sync {
    type WorkResult: Send;
    fn work_unit_count(&self) -> usize;
    /// Process unit `index`; `None` means the unit was abandoned
    /// because `token` was cancelled.
    fn process(&self, index: usize, token: &CancelToken) -> Option<Self::WorkResult>;
}

/// Outcome of a finished job. On cancellation or failure the partial
/// results are discarded.
pub struct JobOutcome<R> {
    pub status: ProcessStatus,
    pub results: Vec<(usize, R)>,
}

pub struct Job<P: ParallelProcess> {
    token: CancelToken,
    handle: JoinHandle<JobOutcome<P::WorkResult>>,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    core_count: usize,
    show_progress: bool,
}

impl Scheduler {
    /// `num_threads == 0` uses all available cores.
    pub fn new(num_threads: usize) -> Self {
        let core_count: usize = if num_threads == 0 {
            num_cpus::get()
        } else {
            num_threads
        };
        Scheduler {
            core_count,
            show_progress: false,
        }
    }
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
    pub fn core_count(&self) -> usize {
        self.core_count
    }
    /// Start executing `process` in the background.
    pub fn schedule<P>(&self, process: Arc<P>, token: CancelToken) -> Job<P>
    where
        P: ParallelProcess + 'static,
        P::WorkResult: 'static,
    {
        let core_count: usize = self.core_count;
        let show_progress: bool = self.show_progress;
        let worker_token: CancelToken = token.clone();
        let handle = std::thread::spawn(move || {
            execute(process.as_ref(), core_count, show_progress, &worker_token)
        });
        Job { token, handle }
    }
    /// Block until all work units of `job` are done or abandoned.
    pub fn wait<P: ParallelProcess>(&self, job: Job<P>) -> JobOutcome<P::WorkResult> {
        match job.handle.join() {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Scheduler: coordinator thread panicked");
                JobOutcome {
                    status: ProcessStatus::Failure,
                    results: Vec::new(),
                }
            }
        }
    }
    pub fn cancel<P: ParallelProcess>(&self, job: &Job<P>) {
        job.token.cancel();
    }
}

fn execute<P: ParallelProcess>(
    process: &P,
    core_count: usize,
    show_progress: bool,
    token: &CancelToken,
) -> JobOutcome<P::WorkResult> {
    let n_units: usize = process.work_unit_count();
    let num_workers: usize = core_count.max(1).min(n_units.max(1));
    let next = AtomicUsize::new(0);
    let mut results: Vec<(usize, P::WorkResult)> = Vec::with_capacity(n_units);
    let mut abandoned: usize = 0;
    let scoped = crossbeam::scope(|scope| {
        let (result_tx, result_rx) = crossbeam_channel::bounded(num_workers);
        // spawn worker threads
        for _ in 0..num_workers {
            let result_tx = result_tx.clone();
            let next = &next;
            scope.spawn(move |_| loop {
                if token.is_cancelled() {
                    break;
                }
                let index: usize = next.fetch_add(1, Ordering::AcqRel);
                if index >= n_units {
                    break;
                }
                let result = process.process(index, token);
                if result_tx.send((index, result)).is_err() {
                    break;
                }
            });
        }
        drop(result_tx);
        let mut progress = if show_progress && n_units > 0 {
            Some(pbr::ProgressBar::new(n_units as u64))
        } else {
            None
        };
        // collect until every worker has hung up
        for (index, result) in result_rx.iter() {
            match result {
                Some(r) => results.push((index, r)),
                None => abandoned += 1,
            }
            if let Some(ref mut pb) = progress {
                pb.inc();
            }
        }
        if let Some(ref mut pb) = progress {
            pb.finish();
        }
    });
    if scoped.is_err() {
        warn!("Scheduler: a worker thread panicked");
        return JobOutcome {
            status: ProcessStatus::Failure,
            results: Vec::new(),
        };
    }
    if token.is_cancelled() || abandoned > 0 || results.len() < n_units {
        debug!(
            "Scheduler: cancelled with {} of {} work units finished",
            results.len(),
            n_units
        );
        return JobOutcome {
            status: ProcessStatus::Cancelled,
            results: Vec::new(),
        };
    }
    results.sort_by_key(|(index, _)| *index);
    JobOutcome {
        status: ProcessStatus::Success,
        results,
    }
}
