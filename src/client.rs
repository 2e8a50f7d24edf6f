//! Request client orchestrating transport, token lifecycle, and error classification.

pub mod request;
pub mod session;
pub mod token;

pub use session::{ApiQuota, CodeToken, Session};

// self
use crate::{
	_prelude::*,
	auth::{AppId, AppSecret},
	http::Transport,
	store::{CacheKey, TokenStore},
};
#[cfg(feature = "reqwest")]
use crate::{error::TransportError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = Client<ReqwestTransport>;

/// Coordinates open-platform API calls for a single application's credentials.
///
/// The client owns the transport, token store, and credentials so the token and request
/// modules can focus on their state machines. Token fetches for the same cache key are
/// funneled through per-key singleflight guards, which keeps concurrent cold-cache callers
/// from stampeding the token endpoints without changing the retry contract.
#[derive(Clone)]
pub struct Client<C>
where
	C: ?Sized + Transport,
{
	/// Transport used for every outbound platform call.
	pub transport: Arc<C>,
	/// Token store caching issued access tokens.
	pub store: Arc<dyn TokenStore>,
	app_id: AppId,
	app_secret: AppSecret,
	token_guards: Arc<Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>>,
}
impl<C> Client<C>
where
	C: ?Sized + Transport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn TokenStore>,
		app_id: AppId,
		app_secret: AppSecret,
		transport: impl Into<Arc<C>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			app_id,
			app_secret,
			token_guards: Default::default(),
		}
	}

	/// Application identifier this client signs requests with.
	pub fn app_id(&self) -> &AppId {
		&self.app_id
	}

	pub(crate) fn app_secret(&self) -> &AppSecret {
		&self.app_secret
	}

	/// Returns (and creates on demand) the singleflight guard for a cache key.
	pub(crate) fn token_guard(&self, key: &CacheKey) -> Arc<AsyncMutex<()>> {
		let mut guards = self.token_guards.lock();

		guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
	/// Creates a client bound to the production open-platform endpoint with a default
	/// reqwest transport.
	pub fn new(
		store: Arc<dyn TokenStore>,
		app_id: AppId,
		app_secret: AppSecret,
	) -> Result<Self, TransportError> {
		Ok(Self::with_transport(store, app_id, app_secret, ReqwestTransport::open_platform()?))
	}
}
impl<C> Debug for Client<C>
where
	C: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("app_id", &self.app_id)
			.field("app_secret", &self.app_secret)
			.finish()
	}
}
