//! Production and sandbox endpoint families.

// self
use crate::{_prelude::*, error::ConfigError};

const PRODUCTION_BASE_URL: &str = "https://api.etrade.com";
const SANDBOX_BASE_URL: &str = "https://apisb.etrade.com";
const AUTHORIZE_URL: &str = "https://us.etrade.com/e/t/etws/authorize";
const REQUEST_TOKEN_PATH: &str = "/oauth/request_token";
const ACCESS_TOKEN_PATH: &str = "/oauth/access_token";
const RENEW_ACCESS_TOKEN_PATH: &str = "/oauth/renew_access_token";

/// The two environments the provider exposes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	/// Live trading environment.
	#[default]
	Production,
	/// Sandbox environment with canned data.
	Sandbox,
}
impl Environment {
	/// Maps the persisted `sandbox` flag onto an environment.
	pub const fn from_sandbox(sandbox: bool) -> Self {
		if sandbox { Self::Sandbox } else { Self::Production }
	}

	/// Returns `true` for [`Environment::Sandbox`].
	pub const fn is_sandbox(self) -> bool {
		matches!(self, Self::Sandbox)
	}

	/// API host for the environment; the sandbox inserts `sb` after `api`.
	pub const fn base_url(self) -> &'static str {
		match self {
			Self::Production => PRODUCTION_BASE_URL,
			Self::Sandbox => SANDBOX_BASE_URL,
		}
	}

	/// Derives the endpoint set for the environment.
	pub fn endpoints(self) -> Result<ProviderEndpoints> {
		let base = parse_url(self.base_url())?;
		let authorize = parse_url(AUTHORIZE_URL)?;

		ProviderEndpoints::rooted_at(base, authorize)
	}
}
impl Display for Environment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Production => f.write_str("production"),
			Self::Sandbox => f.write_str("sandbox"),
		}
	}
}

/// Endpoint set used by a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderEndpoints {
	/// API root that request paths are appended to.
	pub base: Url,
	/// Request-token endpoint (first leg).
	pub request_token: Url,
	/// Access-token endpoint (third leg).
	pub access_token: Url,
	/// Human-facing authorization page; identical across environments.
	pub authorize: Url,
	/// Access-token renewal endpoint.
	pub renew: Url,
}
impl ProviderEndpoints {
	/// Derives the token endpoints from `base` using the provider's fixed path convention.
	pub fn rooted_at(base: Url, authorize: Url) -> Result<Self> {
		let join = |path: &str| {
			base.join(path).map_err(|source| ConfigError::invalid_endpoint(path, source))
		};
		let request_token = join(REQUEST_TOKEN_PATH)?;
		let access_token = join(ACCESS_TOKEN_PATH)?;
		let renew = join(RENEW_ACCESS_TOKEN_PATH)?;

		Ok(Self { base, request_token, access_token, authorize, renew })
	}

	/// Resolves a request path against the API root.
	///
	/// The path is appended verbatim to the base URL (no dot-segment or relative-reference
	/// resolution), so `/v1/accounts/list` always lands under the configured root.
	pub fn resolve(&self, path: &str) -> Result<Url> {
		let root = self.base.as_str().trim_end_matches('/');
		let raw = if path.starts_with('/') { format!("{root}{path}") } else { format!("{root}/{path}") };

		Url::parse(&raw).map_err(|source| ConfigError::invalid_endpoint(raw, source).into())
	}
}

fn parse_url(raw: &str) -> Result<Url> {
	Url::parse(raw).map_err(|source| ConfigError::invalid_endpoint(raw, source).into())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn sandbox_inserts_the_sb_segment() {
		let sandbox = Environment::Sandbox.endpoints().expect("Sandbox endpoints should derive.");

		assert_eq!(sandbox.request_token.as_str(), "https://apisb.etrade.com/oauth/request_token");
		assert_eq!(sandbox.access_token.as_str(), "https://apisb.etrade.com/oauth/access_token");
		assert_eq!(sandbox.renew.as_str(), "https://apisb.etrade.com/oauth/renew_access_token");
	}

	#[test]
	fn production_omits_the_sb_segment() {
		let production =
			Environment::Production.endpoints().expect("Production endpoints should derive.");

		assert_eq!(production.request_token.as_str(), "https://api.etrade.com/oauth/request_token");
		assert_eq!(production.access_token.as_str(), "https://api.etrade.com/oauth/access_token");
		assert_eq!(production.renew.as_str(), "https://api.etrade.com/oauth/renew_access_token");
	}

	#[test]
	fn authorize_url_is_shared() {
		let sandbox = Environment::Sandbox.endpoints().expect("Sandbox endpoints should derive.");
		let production =
			Environment::Production.endpoints().expect("Production endpoints should derive.");

		assert_eq!(sandbox.authorize, production.authorize);
		assert_eq!(sandbox.authorize.as_str(), "https://us.etrade.com/e/t/etws/authorize");
	}

	#[test]
	fn sandbox_flag_round_trips() {
		assert_eq!(Environment::from_sandbox(true), Environment::Sandbox);
		assert!(!Environment::from_sandbox(false).is_sandbox());
	}

	#[test]
	fn resolve_appends_paths_verbatim() {
		let endpoints =
			Environment::Production.endpoints().expect("Production endpoints should derive.");

		assert_eq!(
			endpoints.resolve("/v1/accounts/list").expect("Path should resolve.").as_str(),
			"https://api.etrade.com/v1/accounts/list"
		);
		assert_eq!(
			endpoints.resolve("v1/market/quote/GOOG").expect("Path should resolve.").as_str(),
			"https://api.etrade.com/v1/market/quote/GOOG"
		);
	}
}
