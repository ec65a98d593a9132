use super::GameMode;
use thiserror::Error;

/// Construction and entity-lookup failures.
///
/// The engine never partially applies a failed call.
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("tick rate {0} is outside the supported range [15, 120]")]
    InvalidTickRate(f32),

    #[error("malformed boost pad layout: {0}")]
    InvalidPadLayout(String),

    #[error(
        "collision meshes are uninitialized - call init(..) or init_from_mem(..) before creating an arena"
    )]
    InitMissing,

    #[error("no collision meshes were loaded for game mode {0:?}")]
    NoMeshesForMode(GameMode),

    #[error("no car with id {0}")]
    CarNotFound(u32),

    #[error("game mode {0:?} does not support this callback")]
    ModeUnsupported(GameMode),
}

/// Snapshot encode/decode failures. The arena is left unmodified.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("unexpected end of stream at offset {0}")]
    UnexpectedEnd(usize),

    #[error("bad magic number, not an arena snapshot")]
    BadMagic,

    #[error("unsupported snapshot format version {0}")]
    BadVersion(u32),

    #[error("malformed snapshot data at offset {0}: {1}")]
    Malformed(usize, &'static str),
}
