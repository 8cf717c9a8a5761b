//! Long-lived corp credentials used to mint access tokens.

// self
use crate::{
	_prelude::*,
	auth::{CorpId, CredentialScope, TokenSecret},
};

/// Corp identifier, application secret, and optional agent the client acts for.
#[derive(Clone, Debug)]
pub struct CorpCredentials {
	/// Corp identifier (`corpid`).
	pub corp_id: CorpId,
	/// Application secret (`corpsecret`); never logged.
	pub secret: TokenSecret,
	/// Agent identifier used by agent-scoped endpoints such as `user/getuserinfo`.
	pub agent_id: Option<i64>,
}
impl CorpCredentials {
	/// Creates credentials for the provided corp + secret pair.
	pub fn new(corp_id: CorpId, secret: impl Into<TokenSecret>) -> Self {
		Self { corp_id, secret: secret.into(), agent_id: None }
	}

	/// Associates the credentials with an agent.
	pub fn with_agent_id(mut self, agent_id: i64) -> Self {
		self.agent_id = Some(agent_id);

		self
	}

	/// Scope every credential minted from these secrets belongs to.
	pub fn scope(&self) -> CredentialScope {
		CredentialScope::new(self.corp_id.clone(), &self.secret)
	}
}
