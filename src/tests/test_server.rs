//! Throwaway HTTP server answering every request with one canned response
//! and recording what it received.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use warp::hyper::body::Bytes;
use warp::Filter;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

pub struct TestServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start(status: u16, content_type: &'static str, body: String) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = requests.clone();

        let routes = warp::method()
            .and(warp::path::full())
            .and(warp::header::optional::<String>("authorization"))
            .and(warp::body::bytes())
            .map(
                move |method: warp::http::Method,
                      path: warp::path::FullPath,
                      authorization: Option<String>,
                      bytes: Bytes| {
                    captured.lock().unwrap().push(CapturedRequest {
                        method: method.to_string(),
                        path: path.as_str().to_string(),
                        authorization,
                        body: String::from_utf8_lossy(&bytes).to_string(),
                    });
                    warp::http::Response::builder()
                        .status(status)
                        .header("content-type", content_type)
                        .body(body.clone())
                        .unwrap()
                },
            );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (addr_tx, addr_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(
                ([127, 0, 0, 1], 0u16),
                async {
                    shutdown_rx.await.ok();
                },
            );
            let _ = addr_tx.send(addr);
            server.await;
        });

        let addr = addr_rx.await.expect("test server failed to start");
        Self {
            addr,
            requests,
            shutdown: Some(shutdown_tx),
        }
    }

    pub async fn json(status: u16, body: serde_json::Value) -> Self {
        Self::start(status, "application/json", body.to_string()).await
    }

    /// Reply shaped like an OpenAI-compatible chat completion
    pub async fn chat_completion(content: &str) -> Self {
        Self::json(
            200,
            serde_json::json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }]
            }),
        )
        .await
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
