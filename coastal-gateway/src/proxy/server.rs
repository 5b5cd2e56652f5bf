//! HTTP front end for the proxy (hyper 0.14).

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use tokio::sync::broadcast;
use tracing::info;

use super::forwarder::{ProxyForwarder, ProxyReply, DEFAULT_CONTENT_TYPE};

/// Shared per-server state
#[derive(Debug)]
pub struct ProxyState {
    pub forwarder: ProxyForwarder,
    /// Route answering `?path=` requests, e.g. `/api/proxy`
    pub route: String,
    pub shutdown: broadcast::Sender<()>,
}

/// Proxy HTTP server
#[derive(Debug, Clone)]
pub struct ProxyServer {
    state: Arc<ProxyState>,
}

impl ProxyServer {
    pub fn new(forwarder: ProxyForwarder, route: impl Into<String>, shutdown: broadcast::Sender<()>) -> Self {
        let route = route.into();
        let route = format!("/{}", route.trim_matches('/'));
        Self {
            state: Arc::new(ProxyState {
                forwarder,
                route,
                shutdown,
            }),
        }
    }

    /// Bind `addr` and return the bound address with the serving future.
    ///
    /// The future completes once a shutdown is broadcast and open
    /// connections have drained.
    pub fn bind(
        &self,
        addr: SocketAddr,
    ) -> Result<(SocketAddr, impl Future<Output = Result<(), hyper::Error>>), hyper::Error> {
        let state = Arc::clone(&self.state);
        let make_svc = make_service_fn(move |_conn| {
            let state = Arc::clone(&state);
            async move {
                Ok::<_, Infallible>(service_fn(move |req| handle_request(req, Arc::clone(&state))))
            }
        });

        let server = Server::try_bind(&addr)?.serve(make_svc);
        let local_addr = server.local_addr();

        let mut shutdown = self.state.shutdown.subscribe();
        let graceful = server.with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        });

        info!("Proxy listening on http://{}{}", local_addr, self.state.route);
        info!("Health check endpoint available at http://{}/health", local_addr);
        Ok((local_addr, graceful))
    }

    /// Bind and serve until shutdown
    pub async fn run(&self, addr: SocketAddr) -> Result<(), hyper::Error> {
        let (_, server) = self.bind(addr)?;
        server.await
    }
}

/// Route one request
pub async fn handle_request(req: Request<Body>, state: Arc<ProxyState>) -> Result<Response<Body>, Infallible> {
    let path = req.uri().path();
    let response = match req.method() {
        &Method::GET if path == "/health" => json_response(StatusCode::OK, r#"{"ok":true}"#),
        &Method::GET if path.trim_end_matches('/') == state.route => {
            let logical = query_param(req.uri().query(), "path");
            let reply = state
                .forwarder
                .forward(logical.as_deref(), Some(state.shutdown.subscribe()))
                .await;
            reply_response(reply)
        }
        _ => {
            let mut response = Response::new(Body::from("Not Found"));
            *response.status_mut() = StatusCode::NOT_FOUND;
            response
        }
    };
    Ok(response)
}

/// First value of `name` in a query string, form-decoded
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn json_response(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    response
}

fn reply_response(reply: ProxyReply) -> Response<Body> {
    let mut response = Response::new(Body::from(reply.body));
    *response.status_mut() = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = HeaderValue::from_str(&reply.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param_decodes_form_encoding() {
        assert_eq!(
            query_param(Some("x=1&path=%2Fwaves%2F%3Fstart%3D1%26end%3D2"), "path").as_deref(),
            Some("/waves/?start=1&end=2")
        );
        assert_eq!(query_param(Some("x=1"), "path"), None);
        assert_eq!(query_param(None, "path"), None);
    }

    #[test]
    fn test_reply_response_defaults() {
        let response = reply_response(ProxyReply {
            status: 404,
            content_type: "text/plain; charset=utf-8".into(),
            body: "missing".into(),
        });
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");

        let response = reply_response(ProxyReply {
            status: 42,
            content_type: "bad\nvalue".into(),
            body: String::new(),
        });
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()[CONTENT_TYPE], DEFAULT_CONTENT_TYPE);
    }
}
