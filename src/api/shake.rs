//! Shake-around device lookups.

// crates.io
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	api::WorkClient,
	http::ApiHttpClient,
	transport::{ApiRequest, TransportErrorMapper},
};

/// `POST shakearound/getshakeinfo`.
pub fn get_shake_info(ticket: &str) -> ApiRequest {
	ApiRequest::post("shakearound/getshakeinfo", json!({ "ticket": ticket }))
}

impl<C, M> WorkClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Resolves the device and member behind a shake ticket.
	pub async fn get_shake_info(&self, ticket: &str) -> Result<Value> {
		self.call(get_shake_info(ticket)).await
	}
}
