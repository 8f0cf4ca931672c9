//! Capability that turns an authorize URL into an OAuth verifier.

// self
use crate::_prelude::*;

/// Boxed future returned by [`AuthCodeRetriever::retrieve`].
pub type RetrieverFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a + Send>>;

/// Obtains the verifier code after a human (or an automated callback handler) visits the
/// authorize URL.
///
/// The session awaits the returned future without a timeout; implementations that talk to
/// people should apply their own deadline. Plain closures of the shape
/// `Fn(&Url) -> Result<String>` implement the trait, which covers the common copy/paste flow.
pub trait AuthCodeRetriever
where
	Self: Send + Sync,
{
	/// Resolves to the verifier for `authorize_url`.
	fn retrieve<'a>(&'a self, authorize_url: &'a Url) -> RetrieverFuture<'a>;
}
impl<F> AuthCodeRetriever for F
where
	F: Send + Sync + Fn(&Url) -> Result<String>,
{
	fn retrieve<'a>(&'a self, authorize_url: &'a Url) -> RetrieverFuture<'a> {
		let verifier = self(authorize_url);

		Box::pin(async move { verifier })
	}
}

/// Retriever that always answers with the same verifier.
///
/// Useful when the verifier was obtained out of band before the session was built.
#[derive(Clone)]
pub struct StaticVerifier(String);
impl StaticVerifier {
	/// Wraps a known verifier.
	pub fn new(verifier: impl Into<String>) -> Self {
		Self(verifier.into())
	}
}
impl AuthCodeRetriever for StaticVerifier {
	fn retrieve<'a>(&'a self, _authorize_url: &'a Url) -> RetrieverFuture<'a> {
		Box::pin(async move { Ok(self.0.clone()) })
	}
}
impl Debug for StaticVerifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("StaticVerifier(<redacted>)")
	}
}

pub(crate) fn normalize_verifier(raw: String) -> Result<String> {
	let verifier = raw.trim();

	if verifier.is_empty() {
		return Err(Error::Retriever { reason: "the retriever returned an empty verifier".into() });
	}

	Ok(verifier.to_owned())
}
