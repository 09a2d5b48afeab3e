use std::{cmp::min, time::Duration};

use reqwest::Url;
use serde_json::Value;

use crate::{
	Criteria, Dispatcher, Error, Meta, QuerySettings, Result,
	executor::{BarProgress, NoProgress, ParallelExecutor, Progress},
	partition,
	rebalance::{PartitionState, plan_rebalance},
};

/// Chunking and projection knobs for one query.
#[derive(Debug, Clone)]
pub struct QueryOptions {
	/// Documents per page round. Falls back to the configured default.
	pub chunk_size: Option<u64>,
	/// Page cap; `None` retrieves every matching document.
	pub num_chunks: Option<u64>,
	/// Request every schema field when no explicit projection is given.
	pub all_fields: bool,
	pub timeout: Option<Duration>,
}
impl Default for QueryOptions {
	fn default() -> Self {
		Self { chunk_size: None, num_chunks: None, all_fields: true, timeout: None }
	}
}

/// All pages of one logical query, merged.
///
/// Order is: first-round results in partition submission order, then
/// rebalance and page rounds in completion order. Within a partition the
/// server's ordering is preserved; across partitions it is not, unless the
/// query itself carried a sort request.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
	pub data: Vec<Value>,
	pub meta: Meta,
}

/// Drives partition planning, parallel rounds, rebalancing, and page budget
/// tracking for one logical query.
pub struct Paginator<'a> {
	pub dispatcher: &'a Dispatcher,
	pub settings: &'a QuerySettings,
}

impl Paginator<'_> {
	pub async fn paginate(
		&self,
		url: &Url,
		mut criteria: Criteria,
		chunk_size: u64,
		num_chunks: Option<u64>,
		doc_name: &str,
	) -> Result<QueryResult> {
		if chunk_size == 0 {
			return Err(Error::Config {
				message: "Chunk size must be greater than zero.".to_string(),
			});
		}
		if num_chunks == Some(0) {
			return Err(Error::Config {
				message: "Number of chunks must be greater than zero or unset.".to_string(),
			});
		}

		criteria.set_raw("_limit", chunk_size.to_string());

		let plan = partition::plan(&criteria, chunk_size, self.settings);

		tracing::debug!(
			partitions = plan.partitions.len(),
			split_field = ?plan.split_field,
			"Planned parallel sub-queries."
		);

		let executor = ParallelExecutor::new(self.settings.num_parallel_requests);
		let dispatch = |request: Criteria| {
			let dispatcher = self.dispatcher.clone();
			let url = url.clone();

			async move { dispatcher.get_page(url, &request).await }
		};

		let mut states: Vec<PartitionState> = plan
			.partitions
			.iter()
			.map(|partition| PartitionState {
				criteria: partition.criteria.clone(),
				subtotal: 0,
				claimed: partition.limit,
			})
			.collect();
		let inputs: Vec<Criteria> =
			plan.partitions.iter().map(|partition| partition.criteria.clone()).collect();
		let mut initial = executor.run(&dispatch, inputs, &NoProgress).await?;
		let mut data: Vec<Value> = Vec::new();
		let mut meta = Meta::default();

		if let Some(last) = initial.last() {
			meta = last.result.meta.clone();
		}

		for done in &initial {
			states[done.index].subtotal = done.subtotal;
		}

		// First-round pages merge in submission order.
		initial.sort_by_key(|done| done.index);

		for done in initial {
			data.extend(done.result.data);
		}

		let top_ups = plan_rebalance(&mut states, data.len() as u64, chunk_size);

		if !top_ups.is_empty() {
			tracing::debug!(
				top_ups = top_ups.len(),
				"Rebalancing shortfall onto partitions with headroom."
			);

			let inputs: Vec<Criteria> =
				top_ups.iter().map(|top_up| top_up.criteria.clone()).collect();
			let round = executor.run(&dispatch, inputs, &NoProgress).await?;

			if let Some(last) = round.last() {
				meta = last.result.meta.clone();
			}

			for done in round {
				data.extend(done.result.data);
			}
		}

		let total_doc: u64 = states.iter().map(|state| state.subtotal).sum();
		let max_pages = num_chunks.unwrap_or_else(|| total_doc.div_ceil(chunk_size));
		let target = min(max_pages.saturating_mul(chunk_size), total_doc);
		let requested = num_chunks.map(|pages| pages.saturating_mul(chunk_size));
		let progress: Box<dyn Progress> = if self.settings.mute_progress {
			Box::new(NoProgress)
		} else {
			Box::new(BarProgress::new(target, format!("Retrieving {doc_name} documents")))
		};
		let collected = data.len() as u64;

		if collected >= target || num_chunks == Some(1) {
			data.truncate(target as usize);
			progress.advance(target);
			progress.close();

			return Ok(finish(data, meta, total_doc, requested));
		}

		progress.advance(collected);

		// Remaining pages, each partition advancing its own skip offset.
		let budget = target - collected;
		let mut doc_counter: u64 = 0;
		let mut inputs = Vec::new();

		for state in &mut states {
			let mut remaining = state.subtotal.saturating_sub(state.claimed);

			while remaining > 0 && doc_counter < budget {
				let share = if remaining < chunk_size {
					remaining
				} else {
					chunk_size - (doc_counter % chunk_size)
				};
				let take = share.min(budget - doc_counter);
				let mut request = state.criteria.clone();

				request.set_raw("_skip", state.claimed.to_string());
				request.set_raw("_limit", take.to_string());
				inputs.push(request);

				state.claimed += take;
				remaining -= take;
				doc_counter += take;
			}
		}

		tracing::debug!(
			requests = inputs.len(),
			target,
			total_doc,
			"Dispatching remaining page requests."
		);

		let round = executor.run(&dispatch, inputs, progress.as_ref()).await?;

		if let Some(last) = round.last()
			&& let Some(time_stamp) = last.result.meta.time_stamp.clone()
		{
			meta.time_stamp = Some(time_stamp);
		}

		for done in round {
			data.extend(done.result.data);
		}

		data.truncate(target as usize);
		progress.close();

		Ok(finish(data, meta, total_doc, requested))
	}
}

fn finish(data: Vec<Value>, mut meta: Meta, total_doc: u64, requested: Option<u64>) -> QueryResult {
	let len = data.len() as u64;

	meta.total_doc = Some(total_doc);
	meta.shortfall = requested.and_then(|requested| {
		if len < requested {
			Some(requested - len)
		} else {
			None
		}
	});

	QueryResult { data, meta }
}
