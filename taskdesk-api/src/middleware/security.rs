/// Security headers middleware
///
/// Adds a fixed set of response headers to everything the server returns,
/// including static assets, attachments and error bodies.
///
/// # Headers Applied
///
/// - `X-Content-Type-Options: nosniff` - Attachments are served with a guessed
///   type; browsers must not second-guess it
/// - `X-Frame-Options: DENY` - No framing of the dashboard
/// - `Referrer-Policy: same-origin`
/// - `Permissions-Policy` - Disables device APIs the pages never use
/// - `Content-Security-Policy` - Scripts only from `/static`
/// - `Strict-Transport-Security` - Production only
///
/// # Example
///
/// ```no_run
/// use axum::Router;
/// use taskdesk_api::middleware::security::SecurityHeadersLayer;
///
/// let app: Router = Router::new()
///     .layer(SecurityHeadersLayer::new(true)); // true = production mode
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::Response,
};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self'; \
     style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; \
     form-action 'self'; frame-ancestors 'none'; base-uri 'self'";

/// Security headers middleware layer
#[derive(Clone)]
pub struct SecurityHeadersLayer {
    headers: Arc<HeaderMap>,
}

impl SecurityHeadersLayer {
    /// Creates a new security headers layer
    ///
    /// `enable_hsts` should only be set when the server sits behind HTTPS.
    pub fn new(enable_hsts: bool) -> Self {
        let mut headers = HeaderMap::new();

        headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("same-origin"));
        headers.insert(
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("geolocation=(), microphone=(), camera=(), payment=(), usb=()"),
        );
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        );

        if enable_hsts {
            headers.insert(
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static("max-age=31536000; includeSubDomains"),
            );
        }

        Self {
            headers: Arc::new(headers),
        }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersMiddleware {
            inner,
            headers: Arc::clone(&self.headers),
        }
    }
}

/// Security headers middleware service
#[derive(Clone)]
pub struct SecurityHeadersMiddleware<S> {
    inner: S,
    headers: Arc<HeaderMap>,
}

impl<S> Service<Request> for SecurityHeadersMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let future = self.inner.call(request);
        let headers = Arc::clone(&self.headers);

        Box::pin(async move {
            let mut response = future.await?;

            let target = response.headers_mut();
            for (name, value) in headers.iter() {
                target.insert(name.clone(), value.clone());
            }

            Ok(response)
        })
    }
}
