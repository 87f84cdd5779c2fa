//! Test helpers for event stream integration tests.
//!
//! Provides a minimal server-sent events server on a local port that tests
//! drive explicitly: push an event to every open connection, or drop all
//! connections to simulate a server restart.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use beefweb_api::ServerAddress;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{broadcast, Mutex};

#[derive(Debug, Clone)]
enum ServerCommand {
    Send(String),
    Raw(Vec<u8>),
    CloseAll,
}

/// Simple SSE mock server for testing
pub struct SseMockServer {
    port: u16,
    commands: broadcast::Sender<ServerCommand>,
    accepted: Arc<AtomicUsize>,
    received_requests: Arc<Mutex<Vec<String>>>,
    accept_task: tokio::task::JoinHandle<()>,
}

impl SseMockServer {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (commands, _) = broadcast::channel(64);
        let accepted = Arc::new(AtomicUsize::new(0));
        let received_requests = Arc::new(Mutex::new(Vec::new()));

        let accept_task = {
            let commands = commands.clone();
            let accepted = Arc::clone(&accepted);
            let received_requests = Arc::clone(&received_requests);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    // Subscribe before counting so a test that waits on the
                    // count never misses the first pushed event
                    let rx = commands.subscribe();
                    accepted.fetch_add(1, Ordering::SeqCst);
                    let received_requests = Arc::clone(&received_requests);
                    tokio::spawn(async move {
                        let _ = Self::handle_connection(stream, rx, received_requests).await;
                    });
                }
            })
        };

        Self {
            port,
            commands,
            accepted,
            received_requests,
            accept_task,
        }
    }

    #[allow(dead_code)]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[allow(dead_code)]
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    #[allow(dead_code)]
    pub fn address(&self) -> ServerAddress {
        ServerAddress::new("127.0.0.1", self.port).unwrap()
    }

    /// Push one `data:` event to every open connection
    pub fn send(&self, data: &str) {
        let _ = self.commands.send(ServerCommand::Send(data.to_string()));
    }

    /// Write bytes to every open connection without any framing
    #[allow(dead_code)]
    pub fn send_raw(&self, bytes: &[u8]) {
        let _ = self.commands.send(ServerCommand::Raw(bytes.to_vec()));
    }

    /// Drop every open connection
    pub fn close_all(&self) {
        let _ = self.commands.send(ServerCommand::CloseAll);
    }

    /// Number of connections accepted so far
    pub fn connection_count(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` connections were accepted
    #[allow(dead_code)]
    pub async fn wait_for_connections(&self, count: usize) {
        while self.connection_count() < count {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    #[allow(dead_code)]
    pub async fn received_requests(&self) -> Vec<String> {
        self.received_requests.lock().await.clone()
    }

    async fn handle_connection(
        mut stream: tokio::net::TcpStream,
        mut commands: broadcast::Receiver<ServerCommand>,
        received_requests: Arc<Mutex<Vec<String>>>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut buffer = [0; 4096];
        let n = stream.read(&mut buffer).await?;
        received_requests
            .lock()
            .await
            .push(String::from_utf8_lossy(&buffer[..n]).to_string());

        stream
            .write_all(
                b"HTTP/1.1 200 OK\r\n\
                  Content-Type: text/event-stream\r\n\
                  Cache-Control: no-cache\r\n\
                  Connection: close\r\n\
                  \r\n",
            )
            .await?;
        stream.flush().await?;

        loop {
            match commands.recv().await {
                Ok(ServerCommand::Send(data)) => {
                    stream.write_all(format!("data: {data}\n\n").as_bytes()).await?;
                    stream.flush().await?;
                }
                Ok(ServerCommand::Raw(bytes)) => {
                    stream.write_all(&bytes).await?;
                    stream.flush().await?;
                }
                Ok(ServerCommand::CloseAll) | Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
            }
        }

        stream.shutdown().await?;
        Ok(())
    }
}

impl Drop for SseMockServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}
