//! Backend endpoint configuration shared through Leptos context.

use log::debug;

/// Name of the `<meta>` tag that may override the API base URL.
pub const API_META_NAME: &str = "candidate-graph-api";

/// Where the visualizer finds its backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
	/// Origin prefix, empty for same-origin requests.
	pub base_url: String,
	/// Candidate graph route; the identifier is appended as a path segment.
	pub graph_path: String,
	/// Repository analysis route.
	pub analysis_path: String,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			base_url: String::new(),
			graph_path: "/api/neo4j/candidates".into(),
			analysis_path: "/api/analysis/repo".into(),
		}
	}
}

impl ApiConfig {
	/// Default routes against another origin.
	pub fn with_base_url(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			..Self::default()
		}
	}

	/// Read the base URL from the page's `<meta name="candidate-graph-api">`, if any.
	pub fn from_document() -> Self {
		let base = web_sys::window()
			.and_then(|window| window.document())
			.and_then(|document| {
				document
					.query_selector(&format!("meta[name=\"{API_META_NAME}\"]"))
					.ok()
					.flatten()
			})
			.and_then(|meta| meta.get_attribute("content"))
			.filter(|content| !content.trim().is_empty());
		match base {
			Some(base) => {
				debug!("API base URL from document: {base}");
				Self::with_base_url(base.trim())
			}
			None => Self::default(),
		}
	}

	/// `encoded_identifier` must already be URI-component encoded.
	pub fn graph_url(&self, encoded_identifier: &str) -> String {
		format!(
			"{}{}/{}",
			self.base_url.trim_end_matches('/'),
			self.graph_path,
			encoded_identifier
		)
	}

	pub fn analysis_url(&self) -> String {
		format!("{}{}", self.base_url.trim_end_matches('/'), self.analysis_path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn same_origin_urls_by_default() {
		let config = ApiConfig::default();
		assert_eq!(config.graph_url("alice"), "/api/neo4j/candidates/alice");
		assert_eq!(config.analysis_url(), "/api/analysis/repo");
	}

	#[test]
	fn base_url_trailing_slash_is_ignored() {
		let config = ApiConfig::with_base_url("http://localhost:8000/");
		assert_eq!(
			config.graph_url("bob%20smith"),
			"http://localhost:8000/api/neo4j/candidates/bob%20smith"
		);
		assert_eq!(config.analysis_url(), "http://localhost:8000/api/analysis/repo");
	}
}
