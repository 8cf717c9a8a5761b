//! Credential suppliers mint fresh access tokens from long-lived application secrets.

// self
use crate::{
	_prelude::*,
	auth::{CorpCredentials, TokenSecret},
	error::ConfigError,
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan, FlowStage},
	transport::{ApiRequest, ApiTransport, TransportErrorMapper},
};

/// Boxed future returned by [`CredentialSupplier::mint`].
pub type SupplyFuture<'a> = Pin<Box<dyn Future<Output = Result<IssuedToken>> + 'a + Send>>;

/// Token value plus the lifetime the remote service granted it.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
	/// Access token value.
	pub token: TokenSecret,
	/// Lifetime relative to the moment the token was received.
	pub ttl: Duration,
}
impl IssuedToken {
	/// Creates an issued token.
	pub fn new(token: impl Into<TokenSecret>, ttl: Duration) -> Self {
		Self { token: token.into(), ttl }
	}
}
impl Debug for IssuedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedToken").field("token", &self.token).field("ttl", &self.ttl).finish()
	}
}

/// Network exchange that mints a new access token.
///
/// Implementations must not retry internally; the token manager decides when to call again.
pub trait CredentialSupplier
where
	Self: Send + Sync,
{
	/// Mints a token. Each call is one exchange with the remote service.
	fn mint(&self) -> SupplyFuture<'_>;
}

#[derive(Deserialize)]
struct TokenPayload {
	access_token: String,
	expires_in: i64,
}

/// Supplier calling `gettoken` with the corp id + secret pair.
pub struct CorpSecretSupplier<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	credentials: CorpCredentials,
	transport: ApiTransport<C, M>,
}
impl<C, M> CorpSecretSupplier<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a supplier for `credentials` that talks through `transport`.
	pub fn new(credentials: CorpCredentials, transport: ApiTransport<C, M>) -> Self {
		Self { credentials, transport }
	}

	fn request(&self) -> ApiRequest {
		ApiRequest::get("gettoken")
			.query("corpid", self.credentials.corp_id.as_ref())
			.query("corpsecret", self.credentials.secret.expose())
	}

	async fn exchange(&self) -> Result<IssuedToken> {
		let payload: TokenPayload = self.transport.call_as(&self.request(), None).await?;

		if payload.expires_in < 0 {
			return Err(ConfigError::NegativeExpiresIn.into());
		}

		Ok(IssuedToken::new(payload.access_token, Duration::seconds(payload.expires_in)))
	}
}
impl<C, M> CredentialSupplier for CorpSecretSupplier<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn mint(&self) -> SupplyFuture<'_> {
		Box::pin(async move {
			let span = FlowSpan::new(FlowStage::GetToken, &self.credentials.scope());

			obs::record_flow_outcome(FlowKind::Supply, FlowOutcome::Attempt);

			let result = span.instrument(self.exchange()).await;

			obs::record_flow_result(FlowKind::Supply, &result);

			result
		})
	}
}
