//! The thin seam between a wire transport and the dispatch engine.
//!
//! The engine only needs the request path from a request and a sink for the
//! response: [`RequestPath`] and [`ResponseWriter`]. [`BufferedResponse`]
//! collects a response in memory and converts into an [`http::Response`].

use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode, header};

/// Anything carrying a request path.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be dispatched",
    label = "missing `RequestPath` implementation",
    note = "The dispatcher routes on the request path; implement `RequestPath` to expose it."
)]
pub trait RequestPath {
    /// The path to route on, e.g. `/about`.
    fn path(&self) -> &str;
}

impl RequestPath for str {
    fn path(&self) -> &str {
        self
    }
}

impl RequestPath for String {
    fn path(&self) -> &str {
        self
    }
}

impl<T: RequestPath + ?Sized> RequestPath for &T {
    fn path(&self) -> &str {
        (**self).path()
    }
}

impl<B> RequestPath for http::Request<B> {
    fn path(&self) -> &str {
        self.uri().path()
    }
}

/// A response sink handed to render handlers.
pub trait ResponseWriter {
    /// Set the response status.
    fn set_status(&mut self, status: StatusCode);

    /// Insert a header, replacing any previous value.
    fn insert_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Append bytes to the response body.
    fn write(&mut self, bytes: &[u8]);

    /// Write a plain-text error response.
    fn error(&mut self, status: StatusCode, message: &str) {
        self.set_status(status);
        self.insert_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.insert_header(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        self.write(message.as_bytes());
        self.write(b"\n");
    }

    /// Write the standard not-found response.
    fn not_found(&mut self) {
        self.error(StatusCode::NOT_FOUND, "404 page not found");
    }
}

/// A response collected in memory.
#[derive(Debug, Clone, Default)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl BufferedResponse {
    /// An empty `200 OK` response.
    pub fn new() -> Self {
        Self::default()
    }

    /// The response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The response body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convert into an [`http::Response`].
    pub fn into_response(self) -> Response<Vec<u8>> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseWriter for BufferedResponse {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }
}

impl From<BufferedResponse> for Response<Vec<u8>> {
    fn from(response: BufferedResponse) -> Self {
        response.into_response()
    }
}
