use serde::{Deserialize, Serialize};

use crate::Document;

/// Consolidated per-material document served by the summary endpoint.
///
/// Every field is optional because the server only returns the fields a
/// caller projected with `_fields`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryDoc {
	pub material_id: Option<String>,
	pub formula_pretty: Option<String>,
	pub chemsys: Option<String>,
	pub elements: Option<Vec<String>>,
	pub nsites: Option<u32>,
	pub nelements: Option<u32>,
	pub volume: Option<f64>,
	pub density: Option<f64>,
	pub symmetry: Option<Symmetry>,
	pub band_gap: Option<f64>,
	pub is_gap_direct: Option<bool>,
	pub is_metal: Option<bool>,
	pub formation_energy_per_atom: Option<f64>,
	pub energy_above_hull: Option<f64>,
	pub is_stable: Option<bool>,
	pub total_magnetization: Option<f64>,
	pub theoretical: Option<bool>,
	pub deprecated: Option<bool>,
	pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Symmetry {
	pub crystal_system: Option<String>,
	pub symbol: Option<String>,
	pub number: Option<i32>,
}

impl Document for SummaryDoc {
	const FIELDS: &'static [&'static str] = &[
		"material_id",
		"formula_pretty",
		"chemsys",
		"elements",
		"nsites",
		"nelements",
		"volume",
		"density",
		"symmetry",
		"band_gap",
		"is_gap_direct",
		"is_metal",
		"formation_energy_per_atom",
		"energy_above_hull",
		"is_stable",
		"total_magnetization",
		"theoretical",
		"deprecated",
		"last_updated",
	];
	const NAME: &'static str = "SummaryDoc";
}
