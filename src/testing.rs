//! Test doubles shared across module tests

use crate::chain::Eip1193;
use crate::error::{SessionError, SessionResult};

use async_trait::async_trait;
use ethers::types::{Address, Signature, U256};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// In-memory wallet that answers the handful of methods the crate uses and
/// records every request
pub struct FakeWallet {
    chain_id: Mutex<u64>,
    accounts: Vec<Address>,
    /// Chain the wallet moves to after `wallet_addEthereumChain`
    switch_to: Option<u64>,
    fail_method: Option<(String, i64)>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl FakeWallet {
    pub fn on_chain(chain_id: u64) -> Self {
        Self {
            chain_id: Mutex::new(chain_id),
            accounts: vec![Address::from_low_u64_be(0xA11CE)],
            switch_to: None,
            fail_method: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_accounts(mut self) -> Self {
        self.accounts.clear();
        self
    }

    pub fn switching_to(mut self, chain_id: u64) -> Self {
        self.switch_to = Some(chain_id);
        self
    }

    pub fn failing(mut self, method: &str, code: i64) -> Self {
        self.fail_method = Some((method.to_string(), code));
        self
    }

    pub fn account(&self) -> Address {
        self.accounts[0]
    }

    pub fn current_chain(&self) -> u64 {
        *self.chain_id.lock().unwrap()
    }

    /// Fixed signature returned for every `personal_sign`
    pub fn signature() -> Signature {
        Signature {
            r: U256::from(1u64),
            s: U256::from(2u64),
            v: 27,
        }
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn calls_for(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl Eip1193 for FakeWallet {
    async fn request(&self, method: &str, params: Value) -> SessionResult<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));

        if let Some((failing, code)) = &self.fail_method {
            if failing == method {
                return Err(SessionError::Wallet {
                    code: Some(*code),
                    message: format!("{} rejected", method),
                });
            }
        }

        match method {
            "eth_chainId" => Ok(json!(format!("0x{:x}", self.current_chain()))),
            "eth_requestAccounts" | "eth_accounts" => Ok(json!(self
                .accounts
                .iter()
                .map(|a| format!("{:?}", a))
                .collect::<Vec<_>>())),
            "wallet_addEthereumChain" => {
                if let Some(target) = self.switch_to {
                    *self.chain_id.lock().unwrap() = target;
                }
                Ok(Value::Null)
            }
            "personal_sign" => Ok(json!(format!("0x{}", Self::signature()))),
            other => Err(SessionError::Wallet {
                code: Some(4200),
                message: format!("Unsupported method {}", other),
            }),
        }
    }
}

/// Request seen by a [`StubServer`]
#[derive(Debug, Clone)]
pub struct StubRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Loopback HTTP/1.1 server answering fixed routes, one request per
/// connection. Unknown paths get a 404.
pub struct StubServer {
    url: String,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl StubServer {
    pub async fn start(routes: Vec<(&'static str, u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let Some(request) = read_request(&mut socket).await else {
                        return;
                    };
                    let (status, body) = routes
                        .iter()
                        .find(|(path, _, _)| *path == request.path)
                        .map(|(_, status, body)| (*status, body.clone()))
                        .unwrap_or((404, String::new()));
                    log.lock().unwrap().push(request);

                    let response = format!(
                        "HTTP/1.1 {} Stub\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { url, requests }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<StubRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let (head_len, body_len) = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let body_len = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            break (end + 4, body_len);
        }
    };

    while buf.len() < head_len + body_len {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf[..head_len]).to_string();
    let mut request_line = head.lines().next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let body = String::from_utf8_lossy(&buf[head_len..]).to_string();

    Some(StubRequest { method, path, body })
}
