//! High-tickrate simulation of a rocket-powered car soccer game, built for
//! reinforcement-learning agents and replay analysis tools.
//!
//! Call [`init`] (or [`init_from_mem`] with pre-decoded geometry) once per
//! process, then create an [`Arena`](sim::Arena) per match. Independent
//! arenas may be stepped concurrently from separate threads.

pub mod consts;
pub mod math;
pub mod phys;
pub mod render_bridge;
pub mod sim;

mod collision_mesh;
mod logging;

pub use collision_mesh::CollisionMeshFile;
pub use sim::{Arena, GameMode, Team};

use ahash::AHashMap;
use collision_mesh::COLLISION_MESH_FILE_EXTENSION;
use phys::TriangleMeshShape;
use std::{
    fs,
    io::{Error as IoError, ErrorKind, Result as IoResult},
    path::Path,
    sync::{Arc, RwLock},
    time::Instant,
};

/// Default folder the dumped arena geometry is loaded from
pub const COLLISION_MESH_BASE_PATH: &str = "./collision_meshes";

/// Static collision geometry per mode, loaded once at startup and immutable
/// for the process lifetime afterwards
pub(crate) static ARENA_COLLISION_SHAPES: RwLock<
    Option<AHashMap<GameMode, Vec<Arc<TriangleMeshShape>>>>,
> = RwLock::new(None);

pub fn init_from_default(silent: bool) -> IoResult<()> {
    init(COLLISION_MESH_BASE_PATH, silent)
}

/// One-shot initialization: load collision mesh files from
/// `collision_meshes_folder/<mode>/`. Not re-entrant; a second call is a
/// logged no-op.
pub fn init<P: AsRef<Path>>(collision_meshes_folder: P, silent: bool) -> IoResult<()> {
    init_from_path(collision_meshes_folder.as_ref(), silent)
}

fn init_from_path(collision_meshes_folder: &Path, silent: bool) -> IoResult<()> {
    const GAMEMODES_WITH_UNIQUE_MESHES: [GameMode; 3] =
        [GameMode::Soccar, GameMode::Hoops, GameMode::Dropshot];

    if !collision_meshes_folder.exists() {
        return Err(IoError::new(
            ErrorKind::NotFound,
            format!("{} does not exist", collision_meshes_folder.display()),
        ));
    }

    if !collision_meshes_folder.is_dir() {
        return Err(IoError::new(
            ErrorKind::NotADirectory,
            format!("{} is not a directory", collision_meshes_folder.display()),
        ));
    }

    let mut mesh_file_map = AHashMap::new();

    for game_mode in GAMEMODES_WITH_UNIQUE_MESHES {
        let folder = collision_meshes_folder.join(game_mode.name());
        if !folder.exists() {
            continue;
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(folder)?.flatten() {
            let path = entry.path();
            if !path.is_file()
                || path
                    .extension()
                    .is_none_or(|ext| ext != COLLISION_MESH_FILE_EXTENSION)
            {
                continue;
            }

            files.push(fs::read(path)?);
        }

        mesh_file_map.insert(game_mode, files);
    }

    let mut decoded = AHashMap::new();
    for (game_mode, files) in mesh_file_map {
        let mut soups = Vec::with_capacity(files.len());
        for (i, bytes) in files.iter().enumerate() {
            match CollisionMeshFile::read_from_bytes(bytes) {
                Ok(mesh_file) => soups.push(mesh_file.into_triangles()),
                Err(err) => {
                    log::warn!("skipping collision mesh [{i}] for {}: {err}", game_mode.name());
                }
            }
        }
        decoded.insert(game_mode, soups);
    }

    init_from_mem(decoded, silent)
}

/// One-shot initialization from pre-decoded triangle soups, keyed by the mode
/// whose arena they form. Intended for tests and embedders that bundle their
/// own geometry.
pub fn init_from_mem(
    mesh_map: AHashMap<GameMode, Vec<Vec<phys::Triangle>>>,
    silent: bool,
) -> IoResult<()> {
    if !silent {
        let _ = logging::try_init();
    }

    let mut store = ARENA_COLLISION_SHAPES.write().unwrap();
    if store.is_some() {
        if !silent {
            log::warn!("init() called again after already initialized, ignoring");
        }
        return Ok(());
    }

    let start_time = Instant::now();
    if !silent {
        log::info!("initializing arena collision geometry...");
    }

    let mut shapes: AHashMap<GameMode, Vec<Arc<TriangleMeshShape>>> = AHashMap::new();
    for (game_mode, soups) in mesh_map {
        let mut meshes = Vec::with_capacity(soups.len());
        for tris in soups {
            if tris.is_empty() {
                continue;
            }
            meshes.push(Arc::new(TriangleMeshShape::new(tris)));
        }

        if !silent {
            log::info!(
                "loaded {} meshes for {}",
                meshes.len(),
                game_mode.name()
            );
        }
        shapes.insert(game_mode, meshes);
    }

    *store = Some(shapes);

    if !silent {
        log::info!(
            "finished initializing in {:.3}s",
            start_time.elapsed().as_secs_f32()
        );
    }

    Ok(())
}

/// Whether [`init`] or [`init_from_mem`] has completed
#[must_use]
pub fn is_initialized() -> bool {
    ARENA_COLLISION_SHAPES.read().unwrap().is_some()
}
