#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use keepsake::{Raw, ResourceAddress, Transport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("host unreachable: {0}")]
pub struct Unreachable(pub String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    pub title: String,
}

impl Article {
    pub fn new(id: u64, title: &str) -> Self {
        Self {
            id,
            title: title.to_owned(),
        }
    }

    pub fn json(&self) -> Bytes {
        Bytes::from(serde_json::to_vec(self).unwrap())
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Body(Bytes),
    Fail(String),
    Hang,
}

/// Scripted transport that counts its calls.
#[derive(Debug)]
pub struct MockTransport {
    reply: Mutex<Reply>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::with(Reply::Body(body.into()))
    }

    pub fn failing(message: &str) -> Self {
        Self::with(Reply::Fail(message.to_owned()))
    }

    pub fn hanging() -> Self {
        Self::with(Reply::Hang)
    }

    fn with(reply: Reply) -> Self {
        Self {
            reply: Mutex::new(reply),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn delayed(self, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..self
        }
    }

    pub fn respond(&self, body: impl Into<Bytes>) {
        *self.reply.lock().unwrap() = Reply::Body(body.into());
    }

    pub fn fail(&self, message: &str) {
        *self.reply.lock().unwrap() = Reply::Fail(message.to_owned());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Error = Unreachable;

    async fn get(&self, _address: &ResourceAddress) -> Result<Raw, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            Reply::Body(body) => Ok(body),
            Reply::Fail(message) => Err(Unreachable(message)),
            Reply::Hang => std::future::pending().await,
        }
    }
}
