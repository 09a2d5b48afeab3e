use crate::Criteria;

/// Running bookkeeping for one partition across request rounds.
///
/// `claimed` counts the documents already requested from this partition; it
/// doubles as the next `_skip` offset because requests are contiguous.
#[derive(Debug, Clone)]
pub struct PartitionState {
	pub criteria: Criteria,
	pub subtotal: u64,
	pub claimed: u64,
}

impl PartitionState {
	/// Documents still available on the server for this partition. Negative
	/// means the initial share over-estimated what exists.
	pub fn headroom(&self) -> i64 {
		self.subtotal as i64 - self.claimed as i64
	}
}

/// A follow-up request shifting unmet quota onto a partition with headroom.
#[derive(Debug, Clone)]
pub struct TopUp {
	pub criteria: Criteria,
	pub index: usize,
	pub limit: u64,
}

/// Decide the second round after an uneven first round.
///
/// Walks partitions in ascending headroom order: over-assigned partitions
/// surrender their deficit into a fill pool, partitions with headroom drain
/// the pool with `_skip` set past what they already delivered. State is
/// updated here, so callers only merge the returned pages.
pub fn plan_rebalance(
	states: &mut [PartitionState],
	collected: u64,
	chunk_size: u64,
) -> Vec<TopUp> {
	if states.len() <= 1 || collected >= chunk_size {
		return Vec::new();
	}

	let mut order: Vec<usize> = (0..states.len()).collect();

	order.sort_by_key(|&index| states[index].headroom());

	let mut fill_docs: u64 = 0;
	let mut top_ups = Vec::new();

	for index in order {
		let headroom = states[index].headroom();

		if headroom <= 0 {
			fill_docs += headroom.unsigned_abs();
			// Everything this partition holds was already delivered.
			states[index].claimed = states[index].subtotal;

			continue;
		}
		if fill_docs == 0 {
			continue;
		}

		let take = fill_docs.min(headroom as u64);
		let mut criteria = states[index].criteria.clone();

		criteria.set_raw("_skip", states[index].claimed.to_string());
		criteria.set_raw("_limit", take.to_string());
		top_ups.push(TopUp { criteria, index, limit: take });

		states[index].claimed += take;
		fill_docs -= take;
	}

	top_ups
}
