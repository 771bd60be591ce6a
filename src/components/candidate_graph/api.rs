//! HTTP access to the graph and repository-analysis endpoints.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use super::types::RawGraph;
use crate::config::ApiConfig;

#[derive(Debug, Error)]
pub enum FetchError {
	#[error("no browser window available")]
	NoWindow,
	#[error("network error: {0}")]
	Network(String),
	#[error("request failed with status {0}")]
	Status(u16),
	#[error("invalid response body: {0}")]
	Decode(#[from] serde_json::Error),
}

impl From<JsValue> for FetchError {
	fn from(value: JsValue) -> Self {
		let message = value
			.as_string()
			.or_else(|| {
				value
					.dyn_ref::<js_sys::Error>()
					.map(|err| String::from(err.message()))
			})
			.unwrap_or_else(|| format!("{value:?}"));
		FetchError::Network(message)
	}
}

#[derive(Serialize)]
struct AnalysisRequest<'a> {
	repo_url: &'a str,
}

#[derive(Deserialize)]
struct AnalysisResponse {
	analysis: String,
}

pub async fn fetch_graph(config: &ApiConfig, identifier: &str) -> Result<RawGraph, FetchError> {
	let encoded = String::from(js_sys::encode_uri_component(identifier));
	let init = RequestInit::new();
	init.set_method("GET");
	let request = Request::new_with_str_and_init(&config.graph_url(&encoded), &init)?;
	request.headers().set("Accept", "application/json")?;
	send(request).await
}

pub async fn fetch_analysis(config: &ApiConfig, repo_url: &str) -> Result<String, FetchError> {
	let body = serde_json::to_string(&AnalysisRequest { repo_url })?;
	let init = RequestInit::new();
	init.set_method("POST");
	init.set_body(&JsValue::from_str(&body));
	let request = Request::new_with_str_and_init(&config.analysis_url(), &init)?;
	request.headers().set("Content-Type", "application/json")?;
	let response: AnalysisResponse = send(request).await?;
	Ok(response.analysis)
}

async fn send<T: DeserializeOwned>(request: Request) -> Result<T, FetchError> {
	let window = web_sys::window().ok_or(FetchError::NoWindow)?;
	let response: Response = JsFuture::from(window.fetch_with_request(&request))
		.await?
		.dyn_into()?;
	if !response.ok() {
		return Err(FetchError::Status(response.status()));
	}
	let text = JsFuture::from(response.text()?).await?;
	decode(&text.as_string().unwrap_or_default())
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
	Ok(serde_json::from_str(body)?)
}
