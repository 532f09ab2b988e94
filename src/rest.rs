use std::time::Duration;

use serde::Serialize;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Call metadata for one REST operation.
///
/// The path is mandatory, so a record can only be built through one of the
/// per-method constructors. Timeouts are in milliseconds and `0` leaves the
/// transport default in place.
///
/// ```
/// use mercadopago_sdk::rest::RestSpec;
///
/// const GET_PAYMENT: RestSpec = RestSpec::get("/v1/payments/:id")
///     .with_retries(2)
///     .with_connection_timeout(5_000);
///
/// assert_eq!(GET_PAYMENT.retries(), 2);
/// assert!(GET_PAYMENT.socket_timeout().is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RestSpec {
    method: HttpMethod,
    path: &'static str,
    retries: u32,
    connection_timeout: u64,
    socket_timeout: u64,
}

impl RestSpec {
    pub const fn new(method: HttpMethod, path: &'static str) -> Self {
        Self {
            method,
            path,
            retries: 0,
            connection_timeout: 0,
            socket_timeout: 0,
        }
    }

    pub const fn get(path: &'static str) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub const fn post(path: &'static str) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub const fn put(path: &'static str) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub const fn delete(path: &'static str) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub const fn with_connection_timeout(mut self, millis: u64) -> Self {
        self.connection_timeout = millis;
        self
    }

    pub const fn with_socket_timeout(mut self, millis: u64) -> Self {
        self.socket_timeout = millis;
        self
    }

    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    pub const fn path(&self) -> &'static str {
        self.path
    }

    pub const fn retries(&self) -> u32 {
        self.retries
    }

    pub fn connection_timeout(&self) -> Option<Duration> {
        (self.connection_timeout > 0).then(|| Duration::from_millis(self.connection_timeout))
    }

    pub fn socket_timeout(&self) -> Option<Duration> {
        (self.socket_timeout > 0).then(|| Duration::from_millis(self.socket_timeout))
    }

    /// Applies the non-zero timeouts to a client builder. The socket timeout
    /// bounds the whole request since reqwest has no separate read timeout.
    pub fn configure(&self, mut builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        if let Some(timeout) = self.connection_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.socket_timeout() {
            builder = builder.timeout(timeout);
        }
        builder
    }
}
