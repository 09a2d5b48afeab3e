mod error;
mod ids;
mod projected;
mod summary;

pub use error::{Error, Result};
pub use ids::{MAX_ID_LIST_LENGTH, validate_ids};
pub use projected::{ProjectedDoc, materialize};
pub use summary::{SummaryDoc, Symmetry};

use serde::de::DeserializeOwned;

/// A document schema served by one API route.
///
/// `FIELDS` is the full top-level field list of the schema; the materializer
/// uses it to tell "not requested" apart from "does not exist".
pub trait Document: DeserializeOwned {
	const NAME: &'static str;
	const FIELDS: &'static [&'static str];
}
