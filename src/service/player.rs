//! Game commands for the controlled character.
//!
//! Each command is one correlated round-trip; this module only knows the
//! body and response shapes.

use crate::core::envelope::Empty;
use crate::error::{ProtocolError, Result};
use crate::protocol::state::SessionState;
use crate::service::session::Session;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Command packet types.
pub mod commands {
    pub const ROTATE: &str = "rotate";
    pub const MOVE: &str = "move";
    pub const ATTACK: &str = "attack";
    pub const RADAR: &str = "radar";
    pub const WATCH: &str = "watch";
    pub const SCOUT: &str = "scout";
    pub const DEFEND: &str = "defend";
    pub const UNDEFEND: &str = "undefend";
    pub const HEALTH: &str = "health";
}

pub const ERR_INVALID_RESPONSE: &str = "invalid response";

const NO_BODY: Option<Empty> = None;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Angle {
    Left,
    Right,
}

/// Cardinal direction of a neighbouring block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

#[derive(Serialize)]
struct RotateBody {
    angle: Angle,
}

#[derive(Serialize)]
struct MoveBody {
    direction: Direction,
}

#[derive(Serialize)]
struct ScoutBody {
    distance: u32,
}

#[derive(Deserialize)]
struct HealthObj {
    health: Option<i32>,
}

#[derive(Deserialize)]
struct CounterObj {
    counter: Option<u32>,
}

#[derive(Deserialize)]
struct WatchObj {
    health_matrix: Option<Vec<Vec<i32>>>,
}

#[derive(Deserialize)]
struct ValueObj {
    value: Option<i32>,
}

/// Handle to the character controlled through a session.
///
/// Borrowing the session ties the handle's lifetime to it; once the session
/// is closed every command fails with [`ProtocolError::SessionClosed`].
#[derive(Debug)]
pub struct Player<'a> {
    session: &'a mut Session,
}

impl<'a> Player<'a> {
    pub(crate) fn new(session: &'a mut Session) -> Self {
        Self { session }
    }

    /// Turn the character left or right.
    #[instrument(skip(self))]
    pub async fn rotate(&mut self, angle: Angle) -> Result<()> {
        self.session
            .request::<_, IgnoredAny>(commands::ROTATE, Some(RotateBody { angle }))
            .await?;
        Ok(())
    }

    /// Step into the neighbouring block in `direction`.
    #[instrument(skip(self))]
    pub async fn move_to(&mut self, direction: Direction) -> Result<()> {
        self.session
            .request::<_, IgnoredAny>(commands::MOVE, Some(MoveBody { direction }))
            .await?;
        Ok(())
    }

    /// Attack whatever the character faces. Returns the target's remaining health.
    #[instrument(skip(self))]
    pub async fn attack(&mut self) -> Result<i32> {
        let obj: Option<HealthObj> = self.session.request(commands::ATTACK, NO_BODY).await?;
        obj.and_then(|o| o.health)
            .ok_or_else(|| invalid_response(commands::ATTACK, "obj.health"))
    }

    /// Number of opponents in radar range.
    #[instrument(skip(self))]
    pub async fn radar(&mut self) -> Result<u32> {
        let obj: Option<CounterObj> = self.session.request(commands::RADAR, NO_BODY).await?;
        obj.and_then(|o| o.counter)
            .ok_or_else(|| invalid_response(commands::RADAR, "obj.counter"))
    }

    /// Health of every visible block around the character.
    #[instrument(skip(self))]
    pub async fn watch(&mut self) -> Result<Vec<Vec<i32>>> {
        let obj: Option<WatchObj> = self.session.request(commands::WATCH, NO_BODY).await?;
        obj.and_then(|o| o.health_matrix)
            .ok_or_else(|| invalid_response(commands::WATCH, "obj.health_matrix"))
    }

    /// Number of opponents within `distance` blocks.
    #[instrument(skip(self))]
    pub async fn scout(&mut self, distance: u32) -> Result<u32> {
        let obj: Option<CounterObj> = self
            .session
            .request(commands::SCOUT, Some(ScoutBody { distance }))
            .await?;
        obj.and_then(|o| o.counter)
            .ok_or_else(|| invalid_response(commands::SCOUT, "obj.counter"))
    }

    #[instrument(skip(self))]
    pub async fn defend(&mut self) -> Result<()> {
        self.session
            .request::<_, IgnoredAny>(commands::DEFEND, NO_BODY)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn undefend(&mut self) -> Result<()> {
        self.session
            .request::<_, IgnoredAny>(commands::UNDEFEND, NO_BODY)
            .await?;
        Ok(())
    }

    /// The character's own health.
    #[instrument(skip(self))]
    pub async fn health(&mut self) -> Result<i32> {
        let obj: Option<ValueObj> = self.session.request(commands::HEALTH, NO_BODY).await?;
        obj.and_then(|o| o.value)
            .ok_or_else(|| invalid_response(commands::HEALTH, "obj.value"))
    }
}

fn invalid_response(kind: &str, field: &str) -> ProtocolError {
    ProtocolError::violation(
        SessionState::Ready,
        ERR_INVALID_RESPONSE,
        format!("{kind}.{field}"),
        "missing",
    )
}
