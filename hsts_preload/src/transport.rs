/*!
# HSTS Preload: Transport
*/

use crate::{
	PRELOADED,
	Table,
};
use url::{
	Host,
	Url,
};



/// # Request.
///
/// This is the minimal view of an outgoing HTTP request [`Upgrade`] needs: a
/// URL it can read, and replace on a private copy.
pub trait Request: Clone {
	/// # URL.
	fn url(&self) -> &Url;

	/// # Set URL.
	fn set_url(&mut self, url: Url);
}

impl Request for Url {
	#[inline]
	fn url(&self) -> &Url { self }

	#[inline]
	fn set_url(&mut self, url: Url) { *self = url; }
}



/// # Round Trip.
///
/// Something that can execute an HTTP request, e.g. a client.
pub trait RoundTrip<R: Request> {
	/// # Response Type.
	type Response;

	/// # Error Type.
	type Error;

	/// # Round Trip.
	///
	/// Execute the request.
	///
	/// ## Errors
	///
	/// That's up to the implementation.
	fn round_trip(&self, req: &R) -> Result<Self::Response, Self::Error>;
}

#[derive(Debug, Clone, Copy)]
/// # Closure Round Trip.
///
/// Wrap a closure so it can be used as a [`RoundTrip`].
pub struct RoundTripFn<F>(pub F);

impl<R, F, O, E> RoundTrip<R> for RoundTripFn<F>
where R: Request, F: Fn(&R) -> Result<O, E> {
	type Response = O;
	type Error = E;

	#[inline]
	fn round_trip(&self, req: &R) -> Result<O, E> { (self.0)(req) }
}



#[derive(Debug, Clone)]
/// # Upgrade Transport.
///
/// This wraps another [`RoundTrip`], transparently upgrading plain `http`
/// requests to `https` for hosts on the preload list.
///
/// Upgrading only happens when the port is absent or the default (80); the
/// upgraded request drops the port so the `https` default applies. Everything
/// else is passed through untouched.
///
/// The caller's request is never modified; upgrades are made on a copy.
///
/// ## Examples
///
/// ```
/// use hsts_preload::{
///     Builder,
///     RoundTripFn,
///     RoundTrip,
///     Upgrade,
/// };
/// use url::Url;
///
/// let table = Builder::from_iter([("a.b", false)]).build().unwrap();
/// let upgrade = Upgrade::with_table(
///     RoundTripFn(|u: &Url| Ok::<String, ()>(u.to_string())),
///     table,
/// );
///
/// let req = Url::parse("http://a.b/path").unwrap();
/// assert_eq!(upgrade.round_trip(&req), Ok("https://a.b/path".to_owned()));
/// assert_eq!(req.as_str(), "http://a.b/path"); // Unchanged.
/// ```
pub struct Upgrade<T> {
	base: T,
	table: Option<Table<'static>>,
}

impl<T> Upgrade<T> {
	#[must_use]
	/// # New.
	///
	/// Wrap `base`, checking hosts against the embedded preload list.
	pub const fn new(base: T) -> Self {
		Self { base, table: None }
	}

	#[must_use]
	/// # With Table.
	///
	/// Wrap `base`, checking hosts against a custom table instead of the
	/// embedded one.
	pub const fn with_table(base: T, table: Table<'static>) -> Self {
		Self { base, table: Some(table) }
	}

	#[must_use]
	/// # Base Transport.
	pub const fn base(&self) -> &T { &self.base }

	#[must_use]
	/// # Into Base Transport.
	pub fn into_base(self) -> T { self.base }

	/// # Table.
	fn table(&self) -> &Table<'static> {
		self.table.as_ref().unwrap_or(&PRELOADED)
	}
}

impl<T, R> RoundTrip<R> for Upgrade<T>
where T: RoundTrip<R>, R: Request {
	type Response = T::Response;
	type Error = T::Error;

	fn round_trip(&self, req: &R) -> Result<Self::Response, Self::Error> {
		if let Some(url) = upgrade_url_with(self.table(), req.url()) {
			log::debug!("Upgrading {} to HTTPS.", url.host_str().unwrap_or_default());
			let mut req = req.clone();
			req.set_url(url);
			self.base.round_trip(&req)
		}
		else { self.base.round_trip(req) }
	}
}



#[must_use]
/// # Upgrade URL.
///
/// If `url` should be upgraded per the embedded preload list, return the
/// `https` version, otherwise `None`.
///
/// ## Examples
///
/// ```
/// use hsts_preload::upgrade_url;
/// use url::Url;
///
/// // The bundled list includes the whole .dev TLD.
/// let url = Url::parse("http://example.dev:80/path?q=1").unwrap();
/// assert_eq!(
///     upgrade_url(&url).map(String::from),
///     Some("https://example.dev/path?q=1".to_owned()),
/// );
///
/// // Non-default ports are left alone.
/// let url = Url::parse("http://example.dev:8080/").unwrap();
/// assert!(upgrade_url(&url).is_none());
/// ```
pub fn upgrade_url(url: &Url) -> Option<Url> { upgrade_url_with(&PRELOADED, url) }

/// # Upgrade URL (Custom Table).
fn upgrade_url_with(table: &Table<'_>, url: &Url) -> Option<Url> {
	// The URL parser drops default ports, so `None` covers :80 too.
	if url.scheme() != "http" || url.port().is_some() { return None; }

	// Only real domains need apply.
	let Some(Host::Domain(host)) = url.host() else { return None; };
	if ! table.is_preloaded(host) { return None; }

	let mut out = url.clone();
	out.set_scheme("https").ok()?;
	out.set_port(None).ok()?;
	Some(out)
}
