pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(
		"'{field}' data is available but was not requested in the fields projection. \
		A full list of unrequested fields can be found in fields_not_requested."
	)]
	FieldNotRequested { field: String },
	#[error("No field named {field:?}.")]
	UnknownField { field: String },
	#[error("Invalid identifier {id:?}. Expected a prefixed numeric id such as mp-149.")]
	InvalidId { id: String },
	#[error("{message}")]
	Validation { message: String },
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
}
