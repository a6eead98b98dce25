//! Entry point: import a model, load its textures and build one frame of
//! shading constants.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, anyhow};
use asset::{ImporterRegistry, PixelPool, TextureLoadRegistry};
use corelib::{
    Vec3,
    camera::Camera,
    light::LightState,
    transform::{CoordinateSystem, LayerState, LayerTransform},
};
use renderer::{ModelBuffers, SceneTransformBuilder};

#[derive(Debug)]
struct Config {
    model: PathBuf,
    texture: Option<PathBuf>,
    transform: LayerTransform,
    width: u32,
    height: u32,
    light: bool,
    pool_buffers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: PathBuf::new(),
            texture: None,
            transform: LayerTransform::identity(),
            width: 1280,
            height: 720,
            light: true,
            pool_buffers: PixelPool::DEFAULT_MAX_RETAINED,
        }
    }
}

fn parse_vec3(value: &str, flag: &str) -> Result<Vec3> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("{flag} expects three comma-separated numbers, got '{value}'"))?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!("{flag} expects three comma-separated numbers, got '{value}'")),
    }
}

fn parse_on_off(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes")
}

/// Accepts `--key=value` flags; a bare argument is taken as the model path.
fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Config> {
    let mut cfg = Config::default();
    let mut model = None;

    for arg in args {
        if let Some(v) = arg.strip_prefix("--model=") {
            model = Some(PathBuf::from(v));
        } else if let Some(v) = arg.strip_prefix("--texture=") {
            cfg.texture = Some(PathBuf::from(v));
        } else if let Some(v) = arg.strip_prefix("--coord=") {
            cfg.transform.coordinate_system = v.parse::<CoordinateSystem>()?;
        } else if let Some(v) = arg.strip_prefix("--rotate=") {
            cfg.transform.rotation_deg = parse_vec3(v, "--rotate")?;
        } else if let Some(v) = arg.strip_prefix("--position=") {
            cfg.transform.position = parse_vec3(v, "--position")?;
        } else if let Some(v) = arg.strip_prefix("--pivot=") {
            cfg.transform.pivot = parse_vec3(v, "--pivot")?;
        } else if let Some(v) = arg.strip_prefix("--scale=") {
            let pct = v
                .parse::<f32>()
                .with_context(|| format!("--scale expects a percentage, got '{v}'"))?;
            cfg.transform.scale_percent = Vec3::splat(pct);
        } else if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    cfg.width = pw.max(1);
                    cfg.height = ph.max(1);
                }
            }
        } else if let Some(v) = arg.strip_prefix("--light=") {
            cfg.light = parse_on_off(v);
        } else if let Some(v) = arg.strip_prefix("--pool-buffers=") {
            cfg.pool_buffers = v
                .parse::<usize>()
                .with_context(|| format!("--pool-buffers expects a count, got '{v}'"))?;
        } else if arg.starts_with("--") {
            log::warn!("Ignoring unknown flag '{}'", arg);
        } else {
            model = Some(PathBuf::from(arg));
        }
    }

    cfg.model = model.ok_or_else(|| anyhow!("no model given (use --model=path/to/model.obj)"))?;
    Ok(cfg)
}

fn run(cfg: &Config) -> Result<()> {
    let importers = ImporterRegistry::with_default_importers();
    let model = importers
        .parse(&cfg.model)
        .with_context(|| format!("Failed to import {}", cfg.model.display()))?;
    let buffers = ModelBuffers::from_model(&model);

    let textures =
        TextureLoadRegistry::with_default_loaders(Arc::new(PixelPool::new(cfg.pool_buffers)));
    let texture_paths: BTreeSet<&Path> = match &cfg.texture {
        Some(path) => BTreeSet::from([path.as_path()]),
        None => buffers
            .draws
            .iter()
            .filter_map(|d| d.texture_path.as_deref())
            .collect(),
    };
    for path in texture_paths {
        match textures.load(path) {
            Ok(texture) => log::info!(
                "Texture {:?}: {}x{}, stride {}",
                path,
                texture.width(),
                texture.height(),
                texture.stride()
            ),
            Err(err) => log::warn!("Texture {:?} unavailable, part drawn untextured: {}", path, err),
        }
    }
    textures.dispose();

    let layer = LayerState {
        transform: cfg.transform,
        bounds: buffers.bounds,
    };
    let camera = Camera::default().for_viewport(cfg.width, cfg.height);
    let light = LightState {
        enabled: cfg.light,
        ..LightState::default()
    };
    let frame = SceneTransformBuilder::default().build(&layer, &camera, &light);

    log::info!(
        "Model: {} vertices ({} bytes), {} indices ({} bytes), center {:?}, scale {:.4}",
        buffers.vertices.len(),
        buffers.vertex_bytes().len(),
        buffers.indices.len(),
        buffers.index_bytes().len(),
        model.center,
        model.scale
    );
    for (i, draw) in buffers.draws.iter().enumerate() {
        let constants = frame.with_base_color(draw.base_color);
        log::info!(
            "Part {}: indices {:?}, base color {:?}, metallic {}, roughness {}, {} constant bytes",
            i,
            draw.indices,
            constants.base_color,
            draw.metallic,
            draw.roughness,
            constants.as_bytes().len()
        );
    }
    log::debug!("World matrix: {:?}", frame.world);
    log::debug!("World-view-projection: {:?}", frame.world_view_proj);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = parse_args(std::env::args().skip(1))?;
    log::info!(
        "Starting import of {} (coord={}, view={}x{}, light={})",
        cfg.model.display(),
        cfg.transform.coordinate_system,
        cfg.width,
        cfg.height,
        cfg.light
    );

    run(&cfg)?;

    log::info!("Done. Bye!");
    Ok(())
}
