//! In-process game server speaking the server side of the session protocol.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use arena_client::config::GameConfig;
use arena_client::core::codec::FrameCodec;
use arena_client::service::resolver::RoundInfo;
use arena_client::utils::crypto::Cipher;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

pub const TICKET: &str = "T";

/// Server end of one client connection.
pub struct ServerConn {
    framed: Framed<TcpStream, FrameCodec>,
    pub cipher: Cipher,
    pub encrypted: bool,
    pub pc: u32,
}

impl ServerConn {
    pub async fn recv_raw(&mut self) -> Option<Vec<u8>> {
        match self.framed.next().await {
            Some(Ok(frame)) => Some(frame.to_vec()),
            _ => None,
        }
    }

    pub async fn recv(&mut self) -> Value {
        let frame = self.recv_raw().await.expect("client frame");
        let plain = if self.encrypted {
            self.cipher.open_base64(&frame).expect("client frame opens")
        } else {
            frame
        };
        serde_json::from_slice(&plain).expect("client frame is json")
    }

    /// The socket beneath the framing, for hand-crafted writes.
    pub fn stream_mut(&mut self) -> &mut TcpStream {
        self.framed.get_mut()
    }

    pub async fn send_raw(&mut self, frame: Vec<u8>) {
        self.framed.send(frame).await.expect("server write");
    }

    pub async fn send(&mut self, packet: Value) {
        let plain = serde_json::to_vec(&packet).unwrap();
        let frame = if self.encrypted {
            self.cipher.seal_base64(&plain).unwrap().into_bytes()
        } else {
            plain
        };
        self.send_raw(frame).await;
    }

    /// Reply to `login`.
    pub async fn accept_login(&mut self) {
        let login = self.recv().await;
        assert_eq!(login["type"], "login");
        assert_eq!(login["obj"]["roundticket"], TICKET);
        assert!(login.get("pc").is_none(), "login carries no pc");
        self.send(json!({"type": "login"})).await;
    }

    /// Read `clienthello` and return the decrypted challenge string.
    pub async fn read_client_hello(&mut self) -> String {
        let hello = self.recv().await;
        assert_eq!(hello["type"], "clienthello");
        let sealed = hello["obj"]["cipher"].as_str().expect("cipher field");
        let plain = self.cipher.open_base64(sealed.as_bytes()).expect("hello opens");
        let plain = String::from_utf8(plain).unwrap();
        plain
            .strip_prefix("clienthello:")
            .expect("clienthello prefix")
            .to_string()
    }

    pub async fn send_server_hello(&mut self, challenge: &str) {
        let sealed = self
            .cipher
            .seal_base64(format!("serverhello:{challenge}").as_bytes())
            .unwrap();
        self.send(json!({"type": "serverhello", "obj": {"cipher": sealed}}))
            .await;
        self.encrypted = true;
    }

    /// Full handshake ending in `Ready` on the client.
    pub async fn handshake(&mut self, initial_pc: u32) {
        self.accept_login().await;
        let challenge = self.read_client_hello().await;
        self.send_server_hello(&challenge).await;
        self.send(json!({"type": "initialpc", "pc": initial_pc}))
            .await;
        self.pc = initial_pc;

        let agree = self.expect_command("agreeconn").await;
        assert_eq!(agree["obj"], json!({}));
        self.reply("agreeconn", json!({})).await;
    }

    /// Read a counted command and check its type and counter.
    pub async fn expect_command(&mut self, kind: &str) -> Value {
        let packet = self.recv().await;
        assert_eq!(packet["type"], kind);
        self.pc += 1;
        assert_eq!(packet["pc"], self.pc, "client counter for {kind}");
        packet
    }

    /// Answer the command in flight with the current counter.
    pub async fn reply(&mut self, kind: &str, obj: Value) {
        let pc = self.pc;
        self.send(json!({"type": kind, "pc": pc, "obj": obj})).await;
    }

    /// Refuse the command in flight. Refused commands are not counted.
    pub async fn reject(&mut self, kind: &str, message: &str) {
        self.send(json!({"type": kind, "error": message})).await;
        self.pc -= 1;
    }

    /// Seal `packet` and flip one bit of the ciphertext before sending.
    pub async fn send_tampered(&mut self, packet: Value, bit: usize) {
        let plain = serde_json::to_vec(&packet).unwrap();
        let mut sealed = self.cipher.seal(&plain).unwrap();
        let idx = (bit / 8) % sealed.len();
        sealed[idx] ^= 1 << (bit % 8);
        self.send_raw(STANDARD_NO_PAD.encode(sealed).into_bytes())
            .await;
    }
}

/// Round information pointing at a freshly bound local server.
pub struct TestServer {
    pub info: RoundInfo,
    pub key: [u8; 32],
    listener: TcpListener,
}

impl TestServer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let key: [u8; 32] = rand::random();
        let info = RoundInfo {
            ticket: TICKET.to_string(),
            aes_key: STANDARD.encode(key),
            ipv4: "127.0.0.1".to_string(),
            ipv6: String::new(),
            port,
            error: None,
        };
        Self {
            info,
            key,
            listener,
        }
    }

    /// Accept one client and run `script` against it on a background task.
    pub fn serve<F, Fut>(self, script: F) -> (RoundInfo, JoinHandle<()>)
    where
        F: FnOnce(ServerConn) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let info = self.info.clone();
        let key = self.key;
        let listener = self.listener;
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let conn = ServerConn {
                framed: Framed::new(stream, FrameCodec::default()),
                cipher: Cipher::new(&key),
                encrypted: false,
                pc: 0,
            };
            script(conn).await;
        });
        (info, handle)
    }
}

/// Bind and serve in one step.
pub async fn spawn_server<F, Fut>(script: F) -> (RoundInfo, JoinHandle<()>)
where
    F: FnOnce(ServerConn) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    TestServer::bind().await.serve(script)
}

/// Configuration with short timeouts so a stuck test fails fast.
pub fn test_config() -> GameConfig {
    GameConfig::default_with_overrides(|c| {
        c.client.read_timeout = Duration::from_secs(2);
        c.client.write_timeout = Duration::from_secs(2);
        c.client.connect_timeout = Duration::from_secs(2);
    })
}
