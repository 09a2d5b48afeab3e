use crate::{Criteria, QuerySettings, criteria::encode_value};

/// One parallel sub-query covering a slice of the split field.
#[derive(Debug, Clone)]
pub struct Partition {
	pub criteria: Criteria,
	pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct PartitionPlan {
	pub partitions: Vec<Partition>,
	pub split_field: Option<String>,
}

/// The filter field with the most comma-separated values, skipping fields
/// excluded from splitting and `_`-prefixed control keys.
pub fn choose_split_field(criteria: &Criteria, no_parallel: &[String]) -> Option<String> {
	let mut best: Option<(&str, usize)> = None;

	for (key, value) in criteria.iter() {
		if key.starts_with('_') || no_parallel.iter().any(|field| field == key) {
			continue;
		}

		let count = value.split(',').count();

		if best.map(|(_, best_count)| count > best_count).unwrap_or(true) {
			best = Some((key, count));
		}
	}

	best.map(|(key, _)| key.to_string())
}

/// Split one logical query into parallel sub-queries.
///
/// The partition count starts at `value_count / num_parallel_requests` and
/// shrinks until every partition's encoded value list fits the URL headroom
/// left by the other parameters. `chunk_size` is distributed across
/// partitions by integer quotient and remainder so the limits sum back to
/// `chunk_size`.
pub fn plan(criteria: &Criteria, chunk_size: u64, settings: &QuerySettings) -> PartitionPlan {
	let split_field = choose_split_field(criteria, &settings.no_parallel);
	let Some(field) = split_field else {
		return single_partition(criteria, chunk_size);
	};
	let Some(joined) = criteria.get(&field).map(str::to_string) else {
		return single_partition(criteria, chunk_size);
	};
	let values: Vec<&str> = joined.split(',').collect();

	let bare_len = criteria.encoded_len_excluding(&field);
	let headroom = settings.max_url_length.saturating_sub(bare_len);
	let mut slice_size = (values.len() / settings.num_parallel_requests).max(1);

	// Shrink the slice if any headroom-sized window of the encoded value
	// string holds fewer values than the parallelism-based slice would.
	if headroom > 0 {
		let encoded = encode_value(&joined);
		let mut min_window_values: Option<usize> = None;
		let mut offset = 0;

		while offset + headroom <= encoded.len() {
			let count = encoded[offset..offset + headroom].split("%2C").count();

			min_window_values = Some(min_window_values.map_or(count, |best| best.min(count)));
			offset += headroom;
		}

		if let Some(min_window_values) = min_window_values
			&& min_window_values < slice_size
		{
			slice_size = min_window_values.max(1);
		}
	}

	let groups: Vec<String> = values.chunks(slice_size).map(|group| group.join(",")).collect();
	let count = groups.len() as u64;
	let quotient = chunk_size / count;
	let mut remainder = chunk_size % count;
	let mut partitions = Vec::with_capacity(groups.len());

	for group in groups {
		let limit = if remainder > 0 {
			remainder -= 1;

			quotient + 1
		} else if quotient > 0 {
			quotient
		} else {
			1
		};
		let mut sliced = criteria.clone();

		sliced.set_raw(&field, group);
		sliced.set_raw("_limit", limit.to_string());
		partitions.push(Partition { criteria: sliced, limit });
	}

	PartitionPlan { partitions, split_field: Some(field) }
}

fn single_partition(criteria: &Criteria, chunk_size: u64) -> PartitionPlan {
	let mut single = criteria.clone();

	single.set_raw("_limit", chunk_size.to_string());

	PartitionPlan {
		partitions: vec![Partition { criteria: single, limit: chunk_size }],
		split_field: None,
	}
}
