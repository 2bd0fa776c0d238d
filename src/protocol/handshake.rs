//! Session establishment.
//!
//! `join` turns an authorization token into a ready, encrypted session:
//!
//! ```text
//! Connecting       resolve round info, derive key, dial
//! LoggingIn        -> login{roundticket}          <- login
//! ClientHelloSent  -> clienthello{cipher}         (plain frame, sealed field)
//! ServerHello..    <- serverhello{cipher}         must open to "serverhello:<challenge>"
//! SyncingCounter   <- initialpc{pc}               (first encrypted frame)
//! Agreeing         -> agreeconn{pc+1}             <- agreeconn{pc+1}
//! Ready
//! ```
//!
//! Each stage is one function driven in sequence. The handshake is all or
//! nothing: any failure closes the transport before the error is returned.

use crate::config::GameConfig;
use crate::core::envelope::{
    kinds, Empty, Envelope, HelloBody, LoginBody, CLIENT_HELLO_PREFIX, SERVER_HELLO_PREFIX,
};
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::counter::PacketCounter;
use crate::protocol::state::SessionState;
use crate::service::resolver::{RoundInfo, RoundResolver};
use crate::service::session::Session;
use crate::utils::crypto::Cipher;
use crate::utils::metrics::{global_metrics, Timer};
use serde::de::IgnoredAny;
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroize;

/// Exchange `authtoken` for round information and establish a ready session.
#[instrument(skip(authtoken, resolver, config))]
pub async fn join<R>(authtoken: &str, resolver: &R, config: &GameConfig) -> Result<Session>
where
    R: RoundResolver + ?Sized,
{
    let metrics = global_metrics();
    metrics.handshake_attempt();
    let _timer = Timer::start("join");

    let (mut session, ticket) = match connect(authtoken, resolver, config).await {
        Ok(connected) => connected,
        Err(err) => {
            metrics.handshake_failed();
            warn!(error = %err, stage = %SessionState::Connecting, "Join failed");
            return Err(err);
        }
    };

    match establish(&mut session, &ticket).await {
        Ok(()) => {
            metrics.handshake_success();
            metrics.session_opened();
            info!(peer = ?session.peer_addr(), pc = ?session.packet_counter(), "Session ready");
            Ok(session)
        }
        Err(err) => {
            metrics.handshake_failed();
            warn!(error = %err, stage = %session.state(), "Join failed");
            session.close().await;
            Err(err)
        }
    }
}

async fn establish(session: &mut Session, ticket: &str) -> Result<()> {
    login(session, ticket).await?;
    let challenge = client_hello(session).await?;
    verify_server_hello(session, challenge).await?;
    sync_counter(session).await?;
    agree(session).await
}

/// Resolve the round, build the cipher and dial the game server.
#[instrument(skip_all)]
pub(crate) async fn connect<R>(
    authtoken: &str,
    resolver: &R,
    config: &GameConfig,
) -> Result<(Session, String)>
where
    R: RoundResolver + ?Sized,
{
    let mut info: RoundInfo = resolver.resolve(authtoken).await?.check()?;
    let address = info.address()?;

    let cipher = Cipher::from_base64(&info.aes_key);
    info.aes_key.zeroize();
    let cipher = cipher?;
    let ticket = std::mem::take(&mut info.ticket);

    debug!(%address, "Round resolved");
    let session = Session::dial(&address, cipher, &config.client).await?;
    Ok((session, ticket))
}

/// Plain `login` carrying the round ticket.
#[instrument(skip_all)]
pub(crate) async fn login(session: &mut Session, ticket: &str) -> Result<()> {
    session.transition(SessionState::LoggingIn);
    let body = LoginBody {
        roundticket: ticket.to_owned(),
    };
    session
        .request::<_, IgnoredAny>(kinds::LOGIN, Some(body))
        .await?;
    debug!("Logged in");
    Ok(())
}

/// Send a sealed random challenge inside an otherwise plain frame.
#[instrument(skip_all)]
pub(crate) async fn client_hello(session: &mut Session) -> Result<u64> {
    let challenge = generate_challenge()?;
    let sealed = session
        .cipher()?
        .seal_base64(format!("{CLIENT_HELLO_PREFIX}{challenge}").as_bytes())?;

    // The state stays unencrypted here, so only `obj.cipher` is sealed.
    session.transition(SessionState::ClientHelloSent);
    session
        .send_command(
            kinds::CLIENT_HELLO,
            Some(HelloBody {
                cipher: Some(sealed),
            }),
        )
        .await?;
    Ok(challenge)
}

/// The server must echo our challenge under the shared key.
#[instrument(skip_all)]
pub(crate) async fn verify_server_hello(session: &mut Session, challenge: u64) -> Result<()> {
    let payload = session.recv_and_validate(kinds::SERVER_HELLO).await?;
    let hello: Envelope<HelloBody> = serde_json::from_slice(&payload)?;

    let sealed = hello
        .obj
        .and_then(|obj| obj.cipher)
        .ok_or_else(|| ProtocolError::HandshakeVerification(constants::ERR_MISSING_CIPHER.into()))?;

    let plain = session
        .cipher()?
        .open_base64(sealed.as_bytes())
        .map_err(|e| ProtocolError::HandshakeVerification(format!("serverhello cipher: {e}")))?;

    let expected = format!("{SERVER_HELLO_PREFIX}{challenge}");
    if plain != expected.as_bytes() {
        return Err(ProtocolError::HandshakeVerification(format!(
            "{}: expected '{expected}', got '{}'",
            constants::ERR_CHALLENGE_MISMATCH,
            String::from_utf8_lossy(&plain)
        )));
    }

    session.transition(SessionState::ServerHelloVerified);
    debug!("Server proved key possession, channel encrypted");
    Ok(())
}

/// Adopt the server's `initialpc` as the counter baseline.
#[instrument(skip_all)]
pub(crate) async fn sync_counter(session: &mut Session) -> Result<()> {
    session.transition(SessionState::SyncingCounter);
    let payload = session.recv_and_validate(kinds::INITIAL_PC).await?;
    let initial: Envelope<IgnoredAny> = serde_json::from_slice(&payload)?;

    let pc = initial.pc.ok_or_else(|| {
        ProtocolError::violation(
            SessionState::SyncingCounter,
            constants::ERR_MISSING_PC,
            "initialpc.pc",
            "none",
        )
    })?;
    session.counter = Some(PacketCounter::from_initial(pc));
    debug!(pc, "Counter synchronised");
    Ok(())
}

/// First counted round-trip; success makes the session ready.
#[instrument(skip_all)]
pub(crate) async fn agree(session: &mut Session) -> Result<()> {
    session.transition(SessionState::Agreeing);
    session
        .request::<_, IgnoredAny>(kinds::AGREE_CONN, Some(Empty {}))
        .await?;
    session.transition(SessionState::Ready);
    Ok(())
}

/// Random 64-bit challenge from the OS CSPRNG.
fn generate_challenge() -> Result<u64> {
    let mut buf = [0u8; 8];
    getrandom::fill(&mut buf).map_err(|_| ProtocolError::EncryptionFailure)?;
    Ok(u64::from_be_bytes(buf))
}
