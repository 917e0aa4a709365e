//! Command line arguments

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "msgview",
    version,
    about = "View STL, OBJ, MSG and RIVL scenes with a ray-casting renderer"
)]
pub struct Args {
    /// Renderer type to use
    #[arg(long, default_value = "raycast_eyelight")]
    pub renderer: String,

    /// Load an optional renderer module (repeatable)
    #[arg(long = "module", visible_alias = "plugin", value_name = "NAME")]
    pub modules: Vec<String>,

    /// Render a single frame to this PNG file instead of opening a window
    #[arg(short, long, value_name = "PNG")]
    pub output: Option<PathBuf>,

    /// Image or window size
    #[arg(long, value_name = "WxH", default_value = "1024x768", value_parser = parse_size)]
    pub size: (u32, u32),

    /// Scene files (.stl, .astl, .obj, .msg, .xml)
    pub files: Vec<PathBuf>,
}

pub fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    if w == 0 || h == 0 {
        return Err(format!("size must be positive, got {}x{}", w, h));
    }
    Ok((w, h))
}
