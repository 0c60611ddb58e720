#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use eod_client::{
    models::{EodResponse, Pagination, PriceRecord},
    providers::{ApiSnafu, EodProvider, ProviderError},
};

pub fn record(symbol: &str, date: &str, close: f64, volume: u64) -> PriceRecord {
    PriceRecord {
        symbol: symbol.into(),
        exchange: "XNAS".into(),
        date: date.into(),
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume,
    }
}

pub fn response(data: Vec<PriceRecord>) -> EodResponse {
    EodResponse {
        pagination: Pagination::single_page(data.len()),
        data,
    }
}

#[derive(Clone)]
enum Script {
    Ok(EodResponse),
    Api { status: u16, message: String },
}

/// Provider answering per query string after a configurable delay.
///
/// Unknown queries and zero-delay scripts answer without yielding.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: HashMap<String, (Duration, Script)>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, query: &str, delay: Duration, data: Vec<PriceRecord>) -> Self {
        self.scripts
            .insert(query.into(), (delay, Script::Ok(response(data))));
        self
    }

    pub fn fail(mut self, query: &str, delay: Duration, status: u16, message: &str) -> Self {
        self.scripts.insert(
            query.into(),
            (
                delay,
                Script::Api {
                    status,
                    message: message.into(),
                },
            ),
        );
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EodProvider for ScriptedProvider {
    async fn fetch_eod(&self, symbols: &str) -> Result<EodResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(symbols.to_string());

        let Some((delay, script)) = self.scripts.get(symbols).cloned() else {
            return Ok(response(Vec::new()));
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match script {
            Script::Ok(resp) => Ok(resp),
            Script::Api { status, message } => ApiSnafu { status, message }.fail(),
        }
    }
}

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}
