//! Endpoint security metadata and the scope sets derived from it.

// std
use std::slice::Iter;
// crates.io
use indexmap::IndexMap;
// self
use crate::_prelude::*;

/// One acceptable way to satisfy an endpoint's access control.
///
/// Maps a security-scheme name to the scopes that scheme requires. Scopes inside a requirement
/// are conjunctive, while the requirements listed on an [`EndpointMetadata`] are alternatives.
/// Scheme names keep their declaration order.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Per-endpoint descriptor emitted alongside each generated request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointMetadata {
	/// Ordered security alternatives; `None` or empty means no declared requirement.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub security: Option<Vec<SecurityRequirement>>,
}
impl EndpointMetadata {
	/// Metadata for an endpoint without declared security.
	pub fn unsecured() -> Self {
		Self::default()
	}

	/// Metadata with a single alternative requiring `scopes` under `scheme`.
	pub fn with_scopes<I, S>(scheme: impl Into<String>, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::default().or_requirement(scheme, scopes)
	}

	/// Appends another alternative requiring `scopes` under `scheme`.
	pub fn or_requirement<I, S>(mut self, scheme: impl Into<String>, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut requirement = SecurityRequirement::new();

		requirement.insert(scheme.into(), scopes.into_iter().map(Into::into).collect());
		self.security.get_or_insert_with(Vec::new).push(requirement);

		self
	}

	/// Flattens every alternative into the advisory [`ScopeSet`].
	pub fn scopes(&self) -> ScopeSet {
		extract_scopes(self)
	}
}

/// Deduplicated scopes in first-seen order.
///
/// The set is advisory: it tells token suppliers and fetchers which permissions an endpoint
/// declared, it is never enforced locally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(Vec<String>);
impl ScopeSet {
	/// Builds a set from any iterator, keeping the first occurrence of each scope.
	pub fn new<I, S>(scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut set = Self::default();

		for scope in scopes {
			set.insert(scope);
		}

		set
	}

	/// Inserts a scope unless it is already present; returns whether it was added.
	pub fn insert(&mut self, scope: impl Into<String>) -> bool {
		let scope = scope.into();

		if self.contains(&scope) {
			return false;
		}

		self.0.push(scope);

		true
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are declared.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.iter().any(|candidate| candidate == scope)
	}

	/// Iterator over scopes in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Space-delimited representation used for OAuth `scope` parameters.
	pub fn joined(&self) -> String {
		self.0.join(" ")
	}

	/// Returns the underlying scopes.
	pub fn as_slice(&self) -> &[String] {
		&self.0
	}

	/// Consumes the set, returning the scopes in insertion order.
	pub fn into_vec(self) -> Vec<String> {
		self.0
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.joined())
	}
}
impl<S> FromIterator<S> for ScopeSet
where
	S: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self::new(iter)
	}
}

/// Iterator over scope strings.
pub struct ScopeIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for ScopeIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = ScopeIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		ScopeIter { inner: self.0.iter() }
	}
}

/// Collects every scope declared by any security alternative of `metadata`.
pub fn extract_scopes(metadata: &EndpointMetadata) -> ScopeSet {
	let mut scopes = ScopeSet::default();
	let Some(security) = metadata.security.as_deref() else {
		return scopes;
	};

	for requirement in security {
		for scheme_scopes in requirement.values() {
			for scope in scheme_scopes {
				scopes.insert(scope.as_str());
			}
		}
	}

	scopes
}
