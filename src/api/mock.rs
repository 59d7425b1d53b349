// Scripted in-memory transport for tests
//
// Responses are queued per (method, path). A queued response can be gated on
// a oneshot so a test can observe state while a request is still in flight.

use super::error::ClientError;
use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use reqwest::Method;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// API base every test session is built with
pub const MOCK_BASE: &str = "http://backend.test/api";

enum Scripted {
    Reply(HttpResponse),
    Fail(ClientError),
    Gated(oneshot::Receiver<()>, HttpResponse),
}

#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enqueue(&self, method: Method, path: &str, scripted: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(scripted);
    }

    /// Queue a JSON reply
    pub fn reply(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
        self.enqueue(
            method,
            path,
            Scripted::Reply(HttpResponse::new(status, body.to_string())),
        );
    }

    /// Queue a transport-level failure
    pub fn fail(&self, method: Method, path: &str, error: ClientError) {
        self.enqueue(method, path, Scripted::Fail(error));
    }

    /// Queue a reply that is held back until the returned sender fires
    pub fn gated(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: serde_json::Value,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(
            method,
            path,
            Scripted::Gated(rx, HttpResponse::new(status, body.to_string())),
        );
        tx
    }

    /// Every request seen so far, oldest first
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests that hit one path
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<HttpRequest> {
        let url = format!("{}{}", MOCK_BASE, path);
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.url == url)
            .collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let path = request
            .url
            .strip_prefix(MOCK_BASE)
            .unwrap_or(&request.url)
            .to_string();
        let key = (request.method.clone(), path);
        self.requests.lock().unwrap().push(request);

        let next = self
            .routes
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front());

        match next {
            Some(Scripted::Reply(resp)) => Ok(resp),
            Some(Scripted::Fail(err)) => Err(err),
            Some(Scripted::Gated(gate, resp)) => {
                let _ = gate.await;
                Ok(resp)
            }
            None => Ok(HttpResponse::new(404, r#"{"detail":"Not Found"}"#)),
        }
    }
}
