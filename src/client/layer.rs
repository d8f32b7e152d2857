//! Tower middleware applied to every control-plane request.
//!
//! # Responsibilities
//! - Take a token from the shared [`RequestLimiter`] before a request leaves
//! - Record request count and latency by method and status
//!
//! # Design Decisions
//! - The inner stack is not `Clone` (kube boxes it), so it sits behind an
//!   async mutex held only while the request is dispatched; response futures
//!   run concurrently
//! - The limiter wait happens before taking the lock

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures_util::future::BoxFuture;
use http::{Request, Response};
use tokio::sync::Mutex;
use tower::{Layer, Service, ServiceExt};

use crate::client::rate_limit::RequestLimiter;
use crate::observability::metrics;

/// Layer that rate limits and instruments a request stack.
#[derive(Debug, Clone)]
pub struct RequestLimitLayer {
    limiter: Arc<RequestLimiter>,
}

impl RequestLimitLayer {
    pub fn new(limiter: Arc<RequestLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for RequestLimitLayer {
    type Service = RequestLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLimitService {
            inner: Arc::new(Mutex::new(inner)),
            limiter: self.limiter.clone(),
        }
    }
}

/// Service produced by [`RequestLimitLayer`].
#[derive(Debug)]
pub struct RequestLimitService<S> {
    inner: Arc<Mutex<S>>,
    limiter: Arc<RequestLimiter>,
}

impl<S> Clone for RequestLimitService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: self.limiter.clone(),
        }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestLimitService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness of the inner stack is checked per request under the lock.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let inner = self.inner.clone();
        let limiter = self.limiter.clone();

        Box::pin(async move {
            limiter.acquire().await;

            let method = request.method().to_string();
            let start = Instant::now();

            let response = {
                let mut service = inner.lock().await;
                match service.ready().await {
                    Ok(ready) => ready.call(request),
                    Err(e) => {
                        metrics::record_client_request(method, None, start.elapsed());
                        return Err(e);
                    }
                }
            };

            let result = response.await;
            let status = result.as_ref().ok().map(|response| response.status().as_u16());
            metrics::record_client_request(method, status, start.elapsed());
            result
        })
    }
}
