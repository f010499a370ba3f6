//! Service addressing for the PG management backend.
//!
//! Every backend endpoint lives under `/<service-name>/<resource>`. [`Service`] names the
//! services and [`ServiceClient`] scopes an [`AuthClient`] to one of them, so callers write
//! `client.service(Service::Room).get("rooms")` instead of assembling paths by hand.

pub mod auth;

// self
use crate::{
	_prelude::*,
	client::{AuthClient, RequestSpec},
	http::{HttpResponse, HttpTransport, Method},
};

/// Backend microservices reachable through the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Service {
	/// Login, logout, session introspection, and token refresh.
	Auth,
	/// Properties (PGs/hostels) and their settings.
	Property,
	/// Rooms and beds.
	Room,
	/// Tenants and their stays.
	Tenant,
	/// Tenant complaints.
	Complaint,
	/// Kitchen menus and meal plans.
	Kitchen,
	/// In-app notifications.
	Notification,
	/// Aggregated dashboard figures.
	Dashboard,
}
impl Service {
	/// Every service, in declaration order.
	pub const ALL: [Service; 8] = [
		Service::Auth,
		Service::Property,
		Service::Room,
		Service::Tenant,
		Service::Complaint,
		Service::Kitchen,
		Service::Notification,
		Service::Dashboard,
	];

	/// Returns the path segment the service is mounted under.
	pub const fn as_str(self) -> &'static str {
		match self {
			Service::Auth => "auth-service",
			Service::Property => "property-service",
			Service::Room => "room-service",
			Service::Tenant => "tenant-service",
			Service::Complaint => "complaint-service",
			Service::Kitchen => "kitchen-service",
			Service::Notification => "notification-service",
			Service::Dashboard => "dashboard-service",
		}
	}

	/// Builds `/<service>/<resource>`; a leading `/` on `resource` is ignored.
	pub fn path(self, resource: &str) -> String {
		let resource = resource.trim_start_matches('/');

		if resource.is_empty() {
			format!("/{}", self.as_str())
		} else {
			format!("/{}/{resource}", self.as_str())
		}
	}
}
impl Display for Service {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Service {
	type Err = ServiceParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Service::ALL
			.into_iter()
			.find(|service| service.as_str() == s)
			.ok_or_else(|| ServiceParseError { name: s.to_owned() })
	}
}

/// Error returned when a string names no known service.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown service `{name}`.")]
pub struct ServiceParseError {
	/// The rejected name.
	pub name: String,
}

/// An [`AuthClient`] scoped to one service; every call goes through the 401 interceptor.
pub struct ServiceClient<'a, T>
where
	T: ?Sized + HttpTransport,
{
	client: &'a AuthClient<T>,
	service: Service,
}
impl<T> ServiceClient<'_, T>
where
	T: ?Sized + HttpTransport,
{
	/// Service this handle is scoped to.
	pub fn service(&self) -> Service {
		self.service
	}

	/// Builds a spec for `method` against `resource` of this service.
	pub fn spec(&self, method: Method, resource: &str) -> RequestSpec {
		RequestSpec::new(method, self.service.path(resource))
	}

	/// Sends `spec` and returns the raw 2xx response.
	pub async fn send(&self, spec: RequestSpec) -> Result<HttpResponse> {
		self.client.send(spec).await
	}

	/// Sends `spec` and decodes the JSON response body.
	pub async fn request<R>(&self, spec: RequestSpec) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.client.request(spec).await
	}

	/// `GET /<service>/<resource>`.
	pub async fn get<R>(&self, resource: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.client.get(self.service.path(resource)).await
	}

	/// `POST /<service>/<resource>` with a JSON body.
	pub async fn post<B, R>(&self, resource: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.client.post(self.service.path(resource), body).await
	}

	/// `PUT /<service>/<resource>` with a JSON body.
	pub async fn put<B, R>(&self, resource: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.client.put(self.service.path(resource), body).await
	}

	/// `PATCH /<service>/<resource>` with a JSON body.
	pub async fn patch<B, R>(&self, resource: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.client.patch(self.service.path(resource), body).await
	}

	/// `DELETE /<service>/<resource>`.
	pub async fn delete<R>(&self, resource: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.client.delete(self.service.path(resource)).await
	}
}
impl<T> Clone for ServiceClient<'_, T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		*self
	}
}
impl<T> Copy for ServiceClient<'_, T> where T: ?Sized + HttpTransport {}
impl<T> Debug for ServiceClient<'_, T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ServiceClient").field("service", &self.service).finish()
	}
}

impl<T> AuthClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Scopes the client to `service`.
	pub fn service(&self, service: Service) -> ServiceClient<'_, T> {
		ServiceClient { client: self, service }
	}
}
