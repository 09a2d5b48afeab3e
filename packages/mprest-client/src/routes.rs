use crate::{Criteria, Error, FilterValue, Result};

/// Value shape a route accepts for one logical parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
	Text,
	Int,
	Number,
	Bool,
	List,
	Range,
}

/// One logical search parameter and its wire encoding.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
	pub name: &'static str,
	pub wire: &'static str,
	pub kind: ParamKind,
}

/// Static description of one API endpoint.
///
/// Endpoints differ only in their suffix, primary key, and accepted
/// parameters, so each is a data record rather than a hand-written client.
#[derive(Debug, Clone, Copy)]
pub struct RouteSpec {
	pub name: &'static str,
	pub suffix: &'static str,
	pub primary_key: &'static str,
	pub params: &'static [ParamSpec],
}

pub const SUMMARY: RouteSpec = RouteSpec {
	name: "summary",
	suffix: "summary",
	primary_key: "material_id",
	params: &[
		ParamSpec { name: "material_ids", wire: "material_ids", kind: ParamKind::List },
		ParamSpec { name: "formula", wire: "formula", kind: ParamKind::Text },
		ParamSpec { name: "chemsys", wire: "chemsys", kind: ParamKind::Text },
		ParamSpec { name: "elements", wire: "elements", kind: ParamKind::List },
		ParamSpec { name: "exclude_elements", wire: "exclude_elements", kind: ParamKind::List },
		ParamSpec { name: "nsites", wire: "nsites", kind: ParamKind::Range },
		ParamSpec { name: "nelements", wire: "nelements", kind: ParamKind::Range },
		ParamSpec { name: "band_gap", wire: "band_gap", kind: ParamKind::Range },
		ParamSpec { name: "energy_above_hull", wire: "energy_above_hull", kind: ParamKind::Range },
		ParamSpec {
			name: "formation_energy",
			wire: "formation_energy_per_atom",
			kind: ParamKind::Range,
		},
		ParamSpec { name: "total_magnetization", wire: "total_magnetization", kind: ParamKind::Range },
		ParamSpec { name: "is_stable", wire: "is_stable", kind: ParamKind::Bool },
		ParamSpec { name: "is_gap_direct", wire: "is_gap_direct", kind: ParamKind::Bool },
		ParamSpec { name: "is_metal", wire: "is_metal", kind: ParamKind::Bool },
		ParamSpec { name: "theoretical", wire: "theoretical", kind: ParamKind::Bool },
		ParamSpec { name: "deprecated", wire: "deprecated", kind: ParamKind::Bool },
	],
};

pub const THERMO: RouteSpec = RouteSpec {
	name: "thermo",
	suffix: "thermo",
	primary_key: "material_id",
	params: &[
		ParamSpec { name: "material_ids", wire: "material_ids", kind: ParamKind::List },
		ParamSpec { name: "formula", wire: "formula", kind: ParamKind::Text },
		ParamSpec { name: "chemsys", wire: "chemsys", kind: ParamKind::Text },
		ParamSpec { name: "energy_above_hull", wire: "energy_above_hull", kind: ParamKind::Range },
		ParamSpec {
			name: "formation_energy",
			wire: "formation_energy_per_atom",
			kind: ParamKind::Range,
		},
		ParamSpec { name: "is_stable", wire: "is_stable", kind: ParamKind::Bool },
	],
};

pub const ELASTICITY: RouteSpec = RouteSpec {
	name: "elasticity",
	suffix: "elasticity",
	primary_key: "material_id",
	params: &[
		ParamSpec { name: "material_ids", wire: "material_ids", kind: ParamKind::List },
		ParamSpec { name: "chemsys", wire: "chemsys", kind: ParamKind::Text },
		ParamSpec { name: "g_voigt", wire: "g_voigt", kind: ParamKind::Range },
		ParamSpec { name: "k_voigt", wire: "k_voigt", kind: ParamKind::Range },
		ParamSpec { name: "elastic_anisotropy", wire: "elastic_anisotropy", kind: ParamKind::Range },
	],
};

/// Translate logical `(name, value)` arguments into wire criteria through a
/// route's parameter records.
pub fn encode_request(route: &RouteSpec, args: &[(&str, FilterValue)]) -> Result<Criteria> {
	let mut criteria = Criteria::new();

	for (name, value) in args {
		let spec = route.params.iter().find(|spec| spec.name == *name).ok_or_else(|| {
			Error::Config {
				message: format!("Unknown parameter {name:?} for the {} route.", route.name),
			}
		})?;

		if !kind_matches(spec.kind, value) {
			return Err(Error::Config {
				message: format!(
					"Parameter {name:?} for the {} route expects a {:?} value.",
					route.name, spec.kind
				),
			});
		}

		criteria.set(spec.wire, value.clone());
	}

	Ok(criteria)
}

fn kind_matches(kind: ParamKind, value: &FilterValue) -> bool {
	match (kind, value) {
		(ParamKind::Text, FilterValue::Text(_))
		| (ParamKind::Int, FilterValue::Int(_))
		| (ParamKind::Number, FilterValue::Number(_) | FilterValue::Int(_))
		| (ParamKind::Bool, FilterValue::Bool(_))
		| (ParamKind::List, FilterValue::List(_) | FilterValue::Text(_))
		| (ParamKind::Range, FilterValue::Range { .. }) => true,
		_ => false,
	}
}
