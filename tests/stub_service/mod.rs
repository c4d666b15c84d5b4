#![allow(dead_code)]

use actix_web::{
    App,
    HttpRequest,
    HttpResponse,
    HttpServer,
    dev::ServerHandle,
    http::{
        StatusCode,
        header::CONTENT_TYPE,
    },
    web,
};
use std::{
    collections::HashMap,
    net::TcpListener,
    sync::{
        Arc,
        Mutex,
    },
    thread::JoinHandle,
};

#[derive(Clone, Debug, PartialEq)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

#[derive(Clone)]
struct Scripted {
    status: u16,
    content_type: &'static str,
    body: String,
}

#[derive(Default)]
struct StubState {
    responses: HashMap<(String, String), Scripted>,
    requests: Vec<CapturedRequest>,
}

/// Ledger service double on an ephemeral port. Unscripted routes answer 404.
pub struct StubLedgerService {
    state: Arc<Mutex<StubState>>,
    base_url: String,
    server_handle: ServerHandle,
    server_thread: Option<JoinHandle<()>>,
}

impl StubLedgerService {
    pub fn start() -> Self {
        let state = Arc::new(Mutex::new(StubState::default()));
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let server_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(server_state.clone()))
                .default_service(web::to(handle_request))
        })
        .workers(1)
        .shutdown_timeout(1)
        .listen(listener)
        .unwrap()
        .run();

        let server_handle = server.handle();
        let server_thread = std::thread::spawn(move || {
            let sys = actix_web::rt::System::new();
            let _ = sys.block_on(server);
        });

        Self {
            state,
            base_url,
            server_handle,
            server_thread: Some(server_thread),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn respond_json(
        &self,
        method: &str,
        path: &str,
        status: u16,
        body: serde_json::Value,
    ) {
        self.script(method, path, status, "application/json", body.to_string());
    }

    pub fn respond_text(&self, method: &str, path: &str, status: u16, body: &str) {
        self.script(method, path, status, "text/plain; charset=utf-8", body.to_string());
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<CapturedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    fn script(
        &self,
        method: &str,
        path: &str,
        status: u16,
        content_type: &'static str,
        body: String,
    ) {
        self.state.lock().unwrap().responses.insert(
            (method.to_string(), path.to_string()),
            Scripted {
                status,
                content_type,
                body,
            },
        );
    }
}

impl Drop for StubLedgerService {
    fn drop(&mut self) {
        let _ = self.server_handle.stop(true);
        if let Some(thread) = self.server_thread.take() {
            let _ = thread.join();
        }
    }
}

async fn handle_request(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<Arc<Mutex<StubState>>>,
) -> HttpResponse {
    let captured = CapturedRequest {
        method: req.method().to_string(),
        path: req.path().to_string(),
        query: req.query_string().to_string(),
        content_type: req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: body.to_vec(),
    };
    let key = (captured.method.clone(), captured.path.clone());
    let mut state = state.lock().unwrap();
    state.requests.push(captured);
    match state.responses.get(&key) {
        Some(scripted) => HttpResponse::build(
            StatusCode::from_u16(scripted.status).unwrap(),
        )
        .content_type(scripted.content_type)
        .body(scripted.body.clone()),
        None => HttpResponse::NotFound().body("404 page not found"),
    }
}
