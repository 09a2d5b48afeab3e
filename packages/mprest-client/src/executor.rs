use std::future::Future;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinSet;

use crate::{Error, Result};

/// Anything whose completion advances a progress sink by a document count.
pub trait DocCount {
	fn doc_count(&self) -> u64;
}

/// Advance-by-N progress sink. All engine code must work with a no-op sink;
/// implementations only need monotonic-counter semantics.
pub trait Progress: Send + Sync {
	fn advance(&self, n: u64);
	fn close(&self);
}

pub struct NoProgress;
impl Progress for NoProgress {
	fn advance(&self, _: u64) {}

	fn close(&self) {}
}

/// Terminal progress bar sized to the expected document total.
pub struct BarProgress {
	bar: ProgressBar,
}
impl BarProgress {
	pub fn new(total: u64, message: String) -> Self {
		let bar = ProgressBar::new(total);

		bar.set_style(
			ProgressStyle::default_bar()
				.template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
				.unwrap_or_else(|_| ProgressStyle::default_bar())
				.progress_chars("█▓░"),
		);
		bar.set_message(message);

		Self { bar }
	}
}
impl Progress for BarProgress {
	fn advance(&self, n: u64) {
		self.bar.inc(n);
	}

	fn close(&self) {
		self.bar.finish();
	}
}

/// One finished task, tagged with the index of the input that produced it so
/// results can be mapped back to their originating partition.
#[derive(Debug)]
pub struct Completed<R> {
	pub result: R,
	pub subtotal: u64,
	pub index: usize,
}

/// Runs request futures with bounded concurrency, backfilling the window as
/// soon as any slot frees up rather than waiting for full batches.
#[derive(Debug, Clone, Copy)]
pub struct ParallelExecutor {
	limit: usize,
}

impl ParallelExecutor {
	pub fn new(limit: usize) -> Self {
		Self { limit: limit.max(1) }
	}

	/// Apply `func` to every input, at most `limit` in flight at once.
	///
	/// Completions are returned in completion order; every input yields
	/// exactly one entry. The first failed task aborts the run — already
	/// submitted siblings are left to finish on their own, not cancelled.
	pub async fn run<P, R, F, Fut>(
		&self,
		func: F,
		inputs: Vec<P>,
		progress: &dyn Progress,
	) -> Result<Vec<Completed<R>>>
	where
		P: Send + 'static,
		R: DocCount + Send + 'static,
		F: Fn(P) -> Fut,
		Fut: Future<Output = Result<(R, u64)>> + Send + 'static,
	{
		let mut completions = Vec::with_capacity(inputs.len());
		let mut queue = inputs.into_iter().enumerate();
		let mut in_flight = JoinSet::new();

		for (index, input) in queue.by_ref().take(self.limit) {
			let fut = func(input);

			in_flight.spawn(async move { (index, fut.await) });
		}

		while let Some(joined) = in_flight.join_next().await {
			let (index, outcome) = match joined {
				Ok(finished) => finished,
				Err(err) => {
					in_flight.detach_all();

					return Err(Error::Task { message: err.to_string() });
				},
			};
			let (result, subtotal) = match outcome {
				Ok(pair) => pair,
				Err(err) => {
					in_flight.detach_all();

					return Err(err);
				},
			};

			progress.advance(result.doc_count());
			completions.push(Completed { result, subtotal, index });

			if let Some((index, input)) = queue.next() {
				let fut = func(input);

				in_flight.spawn(async move { (index, fut.await) });
			}
		}

		Ok(completions)
	}
}
