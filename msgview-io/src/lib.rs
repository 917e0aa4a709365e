//! Scene importers for msgview
//!
//! This crate reads the file formats the viewer accepts into a mini scene
//! graph [`Model`]: STL (binary and ASCII), Wavefront OBJ with MTL materials,
//! the binary MSG scene graph format and RIVL XML scenes. Animated STL lists
//! (`.astl`) load into one model per frame.

pub mod stl;
pub mod obj;
pub mod msg;
pub mod rivl;
pub mod error;

#[cfg(test)]
mod tests;

pub use error::*;
pub use stl::StlReader;
pub use obj::ObjReader;
pub use msg::{MsgReader, MsgWriter};
pub use rivl::RivlReader;

use msgview_core::{Model, Result};
use std::path::{Path, PathBuf};

/// Trait for importers that add the contents of a file to a model
pub trait SceneImporter {
    fn import<P: AsRef<Path>>(model: &mut Model, path: P) -> Result<()>;
}

/// The scene formats recognized by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneFormat {
    Stl,
    Msg,
    Rivl,
    Obj,
    /// A list of STL files, one animation frame each
    AnimatedStl,
}

impl SceneFormat {
    /// Detect the format from the (case-insensitive) file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "stl" => Some(SceneFormat::Stl),
            "msg" => Some(SceneFormat::Msg),
            "xml" => Some(SceneFormat::Rivl),
            "obj" => Some(SceneFormat::Obj),
            "astl" => Some(SceneFormat::AnimatedStl),
            _ => None,
        }
    }
}

fn unrecognized(path: &Path) -> msgview_core::Error {
    msgview_core::Error::UnsupportedFormat(format!(
        "unrecognized file format in filename '{}'",
        path.display()
    ))
}

/// Auto-detect format and add the file's contents to `model`
pub fn import_file<P: AsRef<Path>>(model: &mut Model, path: P) -> Result<()> {
    let path = path.as_ref();
    match SceneFormat::from_path(path) {
        Some(SceneFormat::Stl) => StlReader::import(model, path),
        Some(SceneFormat::Msg) => MsgReader::import(model, path),
        Some(SceneFormat::Rivl) => RivlReader::import(model, path),
        Some(SceneFormat::Obj) => ObjReader::import(model, path),
        Some(SceneFormat::AnimatedStl) => Err(msgview_core::Error::Unsupported(format!(
            "'{}' is an animation; load it with import_stl_animation",
            path.display()
        ))),
        None => Err(unrecognized(path)),
    }
}

/// List the STL files named by an `.astl` file. Paths are relative to the
/// list file; blank lines and `#` comments are skipped.
pub fn read_animation_list<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| base.join(line))
        .collect())
}

/// Load every frame of an animated STL list, one model per frame
pub fn import_stl_animation<P: AsRef<Path>>(frames: &mut Vec<Model>, path: P) -> Result<()> {
    let path = path.as_ref();
    let files = read_animation_list(path)?;
    if files.is_empty() {
        return Err(IoError::parse(path, "animation lists no frames").into());
    }

    let count = files.len();
    for file in files {
        let mut frame = Model::new();
        StlReader::import(&mut frame, &file)?;
        frames.push(frame);
    }
    log::info!("{}: loaded {} animation frames", path.display(), count);
    Ok(())
}
