//! Callback source addresses.

// self
use crate::{
	_prelude::*,
	api::WorkClient,
	http::ApiHttpClient,
	transport::{ApiRequest, TransportErrorMapper},
};

/// Addresses the platform uses when calling back into the corp's servers.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CallbackIps {
	/// IP addresses or CIDR ranges.
	pub ip_list: Vec<String>,
}

/// `GET getcallbackip`.
pub fn get_callback_ip() -> ApiRequest {
	ApiRequest::get("getcallbackip")
}

impl<C, M> WorkClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Lists the addresses callbacks originate from.
	pub async fn get_callback_ip(&self) -> Result<CallbackIps> {
		self.call_as(get_callback_ip()).await
	}
}
