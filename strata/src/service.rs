//! Tower integration for strata.
//!
//! [`DispatchService`] exposes a [`Dispatcher`] over `http::Request`s as a
//! `tower::Service`, so a loaded application can sit behind any tower-based
//! HTTP server or middleware stack.
//!
//! # Example
//!
//! ```rust,ignore
//! use strata::service::DispatchService;
//! use tower::ServiceExt;
//!
//! let service = DispatchService::new(Arc::clone(app.dispatcher()));
//! let response = service.oneshot(request).await?;
//! ```

use std::{
    future::{Ready, ready},
    sync::Arc,
    task::{Context, Poll},
};
use strata_std::{
    dispatch::{Dispatcher, State},
    error::DispatchError,
    transport::BufferedResponse,
};

/// Runs both dispatch passes for every request, starting from
/// [`State::Empty`].
pub struct DispatchService<B, S> {
    dispatcher: Arc<Dispatcher<http::Request<B>, S>>,
}

impl<B, S> DispatchService<B, S> {
    /// Serve requests with `dispatcher`.
    pub fn new(dispatcher: Arc<Dispatcher<http::Request<B>, S>>) -> Self {
        Self { dispatcher }
    }

    /// Get a reference to the inner dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher<http::Request<B>, S> {
        &self.dispatcher
    }
}

impl<B, S> Clone for DispatchService<B, S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<B: 'static, S: 'static> tower::Service<http::Request<B>> for DispatchService<B, S> {
    type Response = http::Response<Vec<u8>>;
    type Error = DispatchError;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Dispatch never blocks
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<B>) -> Self::Future {
        let mut response = BufferedResponse::new();
        let result = self
            .dispatcher
            .dispatch(State::Empty, &request, &mut response)
            .map(|_| response.into_response());
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_std::{
        builtin::{AboutModule, CoreModule},
        runtime::{BoxModule, load_modules},
        transport::ResponseWriter,
    };
    use tower::ServiceExt;

    type Request = http::Request<()>;

    fn service() -> DispatchService<(), String> {
        let modules: Vec<BoxModule<(), Request, String>> = vec![
            Box::new(CoreModule::new(|value: &String, writer: &mut dyn ResponseWriter| {
                writer.write(value.as_bytes());
                Ok(())
            })),
            Box::new(AboutModule::new("About the world".to_string())),
        ];
        let app = load_modules((), modules).unwrap();
        DispatchService::new(Arc::clone(app.dispatcher()))
    }

    #[tokio::test]
    async fn test_service_serves_about() {
        let request = http::Request::get("/about").body(()).unwrap();
        let response = service().oneshot(request).await.unwrap();

        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(response.body(), b"About the world");
    }

    #[tokio::test]
    async fn test_service_not_found() {
        let request = http::Request::get("/nowhere").body(()).unwrap();
        let response = service().oneshot(request).await.unwrap();

        assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
    }
}
