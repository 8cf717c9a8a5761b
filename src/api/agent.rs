//! Agent (application) settings.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	api::WorkClient,
	http::ApiHttpClient,
	transport::{ApiRequest, TransportErrorMapper},
};

/// `GET agent/get`.
pub fn get(agent_id: i64) -> ApiRequest {
	ApiRequest::get("agent/get").query("agentid", agent_id)
}

/// `POST agent/set`; `settings` must include `agentid`.
pub fn set<T>(settings: &T) -> Result<ApiRequest>
where
	T: ?Sized + Serialize,
{
	ApiRequest::post_json("agent/set", settings)
}

/// `GET agent/list`.
pub fn list() -> ApiRequest {
	ApiRequest::get("agent/list")
}

impl<C, M> WorkClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches an agent's settings.
	pub async fn get_agent(&self, agent_id: i64) -> Result<Value> {
		self.call(get(agent_id)).await
	}

	/// Updates an agent's settings.
	pub async fn set_agent<T>(&self, settings: &T) -> Result<Value>
	where
		T: ?Sized + Serialize,
	{
		self.call(set(settings)?).await
	}

	/// Lists the agents visible to the corp secret.
	pub async fn list_agents(&self) -> Result<Value> {
		self.call(list()).await
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::transport::ApiMethod;

	#[test]
	fn set_posts_the_settings_verbatim() {
		let request = set(&json!({ "agentid": 5, "report_location_flag": 0 }))
			.expect("JSON settings should serialize.");

		assert_eq!(request.method, ApiMethod::Post);
		assert_eq!(request.path, "agent/set");
		assert_eq!(request.body, Some(json!({ "agentid": 5, "report_location_flag": 0 })));
	}

	#[test]
	fn get_passes_the_agent_id() {
		assert_eq!(get(5).query, vec![("agentid".to_owned(), "5".to_owned())]);
		assert!(list().query.is_empty());
	}
}
