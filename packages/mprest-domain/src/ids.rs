use regex::Regex;

use crate::{Error, Result};

const ID_PATTERN: &str = r"^(mp|mvc|mol|task)-\d+$";

/// Longest identifier list accepted in one filter. Longer lists should drop
/// the id filter and select locally.
pub const MAX_ID_LIST_LENGTH: usize = 40_000;

/// Validate material/task identifiers before they are joined into an
/// id-filtered query.
pub fn validate_ids(ids: &[String]) -> Result<()> {
	if ids.len() > MAX_ID_LIST_LENGTH {
		return Err(Error::Validation {
			message: format!(
				"Identifier list of length {} exceeds the supported maximum of {MAX_ID_LIST_LENGTH}. \
				Remove the id filter and select locally instead.",
				ids.len()
			),
		});
	}

	for id in ids {
		if !Regex::new(ID_PATTERN).map(|re| re.is_match(id)).unwrap_or(false) {
			return Err(Error::InvalidId { id: id.clone() });
		}
	}

	Ok(())
}
