//! msgview: load scene files and look at them through a ray-casting renderer

mod cli;
mod frames;
mod scene;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use cli::Args;
use frames::RenderedFrames;
use msgview_core::{Bounded, BoundingBox, Material, Model};
use msgview_io::SceneFormat;
use msgview_render::{Device, FrameBuffer, PerspectiveCamera, Renderer};
use msgview_visualization::{ViewPort, ViewerConfig, ViewerWindow};
use std::path::Path;
use std::sync::Arc;

fn fatal(message: impl std::fmt::Display) -> ! {
    eprintln!("msgview fatal error : {}", message);
    eprintln!("{}", Args::command().render_usage());
    std::process::exit(1);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => {
            // --help and --version
            let _ = e.print();
            return;
        }
        Err(e) => {
            let message = e.to_string();
            let first = message.lines().next().unwrap_or_default();
            fatal(first.trim_start_matches("error: "))
        }
    };

    if let Err(e) = run(args) {
        fatal(format!("{:#}", e));
    }
}

/// Everything loaded from the command line files
struct Scene {
    model: Model,
    animation: Vec<Model>,
}

fn load_scene(files: &[impl AsRef<Path>]) -> Result<Scene> {
    let mut scene = Scene {
        model: Model::new(),
        animation: Vec::new(),
    };

    for file in files {
        let file = file.as_ref();
        let loaded = match SceneFormat::from_path(file) {
            Some(SceneFormat::AnimatedStl) => msgview_io::import_stl_animation(&mut scene.animation, file),
            _ => msgview_io::import_file(&mut scene.model, file),
        };
        loaded.with_context(|| format!("could not load '{}'", file.display()))?;
    }
    Ok(scene)
}

fn world_bounds(scene: &Scene) -> BoundingBox {
    if scene.model.is_empty() {
        if let Some(first) = scene.animation.first() {
            return first.bounding_box();
        }
    }
    scene.model.bounding_box()
}

fn run(args: Args) -> Result<()> {
    log::info!("starting to process cmdline arguments");

    let mut device = Device::new();
    for module in &args.modules {
        device.load_module(module)?;
    }

    let mut scene = load_scene(&args.files)?;
    let stats = scene.model.stats();
    println!("msgview: done parsing. found model with");
    println!("{}", stats);

    if stats.instanced_triangles == 0 && scene.animation.is_empty() {
        bail!("no (valid) input files specified - model contains no triangles");
    }

    if scene.model.material.is_empty() {
        log::info!("adding default material");
        scene.model.add_material(Material::default());
    }

    if scene.model.has_instancing() {
        bail!("found a scene that seems to contain instances, but msgview does not yet support instancing");
    }

    let render_model = Arc::new(scene::build_render_model(&scene.model)?);
    let animation = scene
        .animation
        .iter()
        .map(|frame| scene::build_render_model(frame).map(Arc::new))
        .collect::<msgview_core::Result<Vec<_>>>()?;
    if !scene.model.is_empty() && !animation.is_empty() {
        log::warn!("scene has both static geometry and an animation; showing the static geometry");
    }
    let animation = if scene.model.is_empty() { animation } else { Vec::new() };

    let mut camera = PerspectiveCamera::new();
    camera.set_pos([-1.0, 1.0, -1.0].into());
    camera.set_dir([1.0, -1.0, 1.0].into());
    camera.commit()?;

    let mut renderer = device.new_renderer(&args.renderer).map_err(|e| {
        log::info!("{}", available_renderers(&device));
        e
    })?;
    renderer.set_model(animation.first().cloned().unwrap_or(render_model));
    renderer.set_camera(camera);
    renderer.commit()?;

    let bounds = world_bounds(&scene);
    let (width, height) = args.size;

    match &args.output {
        Some(path) => render_to_file(renderer, &bounds, width, height, path),
        None => {
            let mut window = ViewerWindow::new(ViewerConfig {
                width,
                height,
                ..ViewerConfig::default()
            });
            window.set_world_bounds(&bounds);
            println!("MSG Viewer created. Press 'Q' to quit.");
            window.run(RenderedFrames::new(renderer, animation))?;
            Ok(())
        }
    }
}

fn available_renderers(device: &Device) -> String {
    let types: Vec<&str> = device.renderer_types().collect();
    format!("available renderers: {}", types.join(", "))
}

/// Render one frame of the world-bounds view without opening a window
fn render_to_file(mut renderer: Renderer, bounds: &BoundingBox, width: u32, height: u32, path: &Path) -> Result<()> {
    let mut viewport = ViewPort::default();
    viewport.aspect = width as f32 / height as f32;
    viewport.set_world_bounds(bounds);
    if let Some(camera) = renderer.camera_mut() {
        scene::apply_viewport(camera, &viewport)?;
    }

    let mut fb = FrameBuffer::new(width, height)?;
    let start = std::time::Instant::now();
    renderer.render_frame(&mut fb)?;
    log::info!("rendered {}x{} frame in {:.1?}", width, height, start.elapsed());

    let frame = fb.map();
    let image = image::RgbaImage::from_raw(width, height, frame.as_bytes().to_vec())
        .context("frame buffer does not match image size")?;
    image
        .save(path)
        .with_context(|| format!("could not write '{}'", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}
