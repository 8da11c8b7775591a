//! meshpick CLI - headless driver for the triangle picker
//!
//! Builds a procedural mesh, drives the viewer state with synthetic input
//! and reports picks, BVH statistics and timings.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;

use meshpick_math::Point2;
use meshpick_mesh::{primitives, Mesh};
use meshpick_raytrace::{mouse_to_object_space, Bvh, PickMode};

mod app;
mod camera;
mod config;
mod input;

use app::{AppState, Outcome};
use config::ViewerConfig;
use input::{InputEvent, Key, MouseButton};

/// Largest `--resolution` accepted for procedural meshes.
const MAX_RESOLUTION: u32 = 4096;

#[derive(Parser)]
#[command(name = "meshpick")]
#[command(about = "Fast ray-based triangle picking on meshes", long_about = None)]
struct Cli {
    /// Viewer configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick triangles under cursor positions
    Pick {
        #[command(flatten)]
        mesh: MeshArgs,
        /// Cursor position in window pixels, `X,Y` from the top-left (repeatable)
        #[arg(long = "at", value_parser = parse_pair, required = true)]
        at: Vec<(f64, f64)>,
        /// Right-drag by `DX,DY` pixels before picking
        #[arg(long, value_parser = parse_pair)]
        orbit: Option<(f64, f64)>,
        /// Override the configured pick mode
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print statistics of the BVH built over a mesh
    Stats {
        #[command(flatten)]
        mesh: MeshArgs,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Time BVH picking against a brute-force scan over a grid of cursors
    Bench {
        #[command(flatten)]
        mesh: MeshArgs,
        /// Cursor grid is SAMPLES x SAMPLES
        #[arg(long, default_value_t = 32)]
        samples: u32,
    },
    /// Feed a script of input events to the viewer state
    ///
    /// One event per line: `press left|right`, `release left|right`,
    /// `move X Y [DX DY]`, `key up|down|left|right|<char>`, `resize W H`,
    /// `drop sphere|grid|cube [RESOLUTION]`, `quit`. `#` starts a comment.
    Replay {
        #[command(flatten)]
        mesh: MeshArgs,
        /// Event script; standard input when omitted
        script: Option<PathBuf>,
    },
    /// Write the default configuration
    InitConfig {
        /// Destination file
        #[arg(default_value = "meshpick.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct MeshArgs {
    /// Procedural mesh to load
    #[arg(long, value_enum, default_value_t = MeshKind::Sphere)]
    mesh: MeshKind,
    /// Subdivisions (sphere segments, grid cells per side)
    #[arg(
        long,
        default_value_t = 64,
        value_parser = clap::value_parser!(u32).range(1..=MAX_RESOLUTION as i64)
    )]
    resolution: u32,
}

#[derive(Clone, Copy, ValueEnum)]
enum MeshKind {
    Sphere,
    Grid,
    Cube,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    FirstHit,
    Nearest,
}

impl From<ModeArg> for PickMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::FirstHit => PickMode::FirstHit,
            ModeArg::Nearest => PickMode::Nearest,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Pick {
            mesh,
            at,
            orbit,
            mode,
            json,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(mode) = mode {
                config.picking.mode = mode.into();
            }
            run_pick(config, &mesh, &at, orbit, json)?;
        }
        Commands::Stats { mesh, json } => {
            let config = load_config(cli.config.as_deref())?;
            run_stats(&config, &mesh, json)?;
        }
        Commands::Bench { mesh, samples } => {
            let config = load_config(cli.config.as_deref())?;
            run_bench(config, &mesh, samples)?;
        }
        Commands::Replay { mesh, script } => {
            let config = load_config(cli.config.as_deref())?;
            let text = match &script {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => std::io::read_to_string(std::io::stdin())?,
            };
            run_replay(config, &mesh, &text)?;
        }
        Commands::InitConfig { path, force } => {
            init_config(&path, force)?;
        }
    }

    Ok(())
}

fn parse_pair(s: &str) -> std::result::Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got `{s}`"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("`{}`: {e}", v.trim()))
    };
    Ok((parse(a)?, parse(b)?))
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => Ok(ViewerConfig::load(path)?),
        None => Ok(ViewerConfig::default()),
    }
}

fn build_mesh(args: &MeshArgs) -> Result<Mesh> {
    let res = args.resolution;
    if !(1..=MAX_RESOLUTION).contains(&res) {
        bail!("resolution must be between 1 and {MAX_RESOLUTION}, got {res}");
    }
    let mesh = match args.mesh {
        MeshKind::Sphere => primitives::uv_sphere(1.0, res, (res / 2).max(2))?,
        MeshKind::Grid => primitives::grid(res, res, 2.0)?,
        MeshKind::Cube => primitives::cube(2.0),
    };
    Ok(mesh)
}

fn run_pick(
    config: ViewerConfig,
    mesh: &MeshArgs,
    at: &[(f64, f64)],
    orbit: Option<(f64, f64)>,
    json: bool,
) -> Result<()> {
    let mode = config.picking.mode;
    let mut state = AppState::new(config, build_mesh(mesh)?);

    if let Some((dx, dy)) = orbit {
        state.handle_event(InputEvent::MouseButton {
            button: MouseButton::Right,
            pressed: true,
        });
        state.handle_event(InputEvent::MouseMotion {
            x: 0.0,
            y: 0.0,
            dx,
            dy,
        });
    }

    state.handle_event(InputEvent::MouseButton {
        button: MouseButton::Left,
        pressed: true,
    });

    let mut results = Vec::with_capacity(at.len());
    for &(x, y) in at {
        let outcome = state.handle_event(InputEvent::MouseMotion {
            x,
            y,
            dx: 0.0,
            dy: 0.0,
        });
        let triangle = match outcome {
            Outcome::Picked { id, .. } => Some(id),
            _ => None,
        };
        results.push((x, y, triangle));
    }

    if json {
        let picks: Vec<_> = results
            .iter()
            .map(|(x, y, triangle)| serde_json::json!({ "x": x, "y": y, "triangle": triangle }))
            .collect();
        let report = serde_json::json!({
            "mode": mode,
            "triangles": state.mesh().num_triangles(),
            "picks": picks,
            "highlighted": sorted_ids(&state),
            "overlays": state.highlights().len() + usize::from(state.bounding_box().is_some()),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let eye = state.camera().position();
        let dir = state.camera().view_direction();
        println!(
            "{} triangles, {} mode, eye ({:.3}, {:.3}, {:.3}) looking ({:.3}, {:.3}, {:.3})",
            state.mesh().num_triangles(),
            mode,
            eye.x,
            eye.y,
            eye.z,
            dir.x,
            dir.y,
            dir.z
        );
        for (x, y, triangle) in &results {
            match triangle {
                Some(id) => println!("  ({x}, {y}) -> triangle {id}"),
                None => println!("  ({x}, {y}) -> miss"),
            }
        }
        println!("highlighted: {:?}", sorted_ids(&state));
    }
    Ok(())
}

fn sorted_ids(state: &AppState) -> Vec<u32> {
    let mut ids: Vec<u32> = state.highlighted().iter().copied().collect();
    ids.sort_unstable();
    ids
}

fn run_replay(config: ViewerConfig, mesh: &MeshArgs, script: &str) -> Result<()> {
    let mut state = AppState::new(config, build_mesh(mesh)?);

    for (n, line) in script.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let event =
            parse_event(line).with_context(|| format!("line {}: `{line}`", n + 1))?;
        let outcome = state.handle_event(event);
        match outcome {
            Outcome::Ignored => {}
            Outcome::Picked { id, new } => {
                println!("{:>4}: picked {id}{}", n + 1, if new { "" } else { " (again)" })
            }
            other => println!("{:>4}: {other:?}", n + 1),
        }
        if outcome == Outcome::Quit {
            break;
        }
    }

    println!(
        "{} triangles, {} highlighted, bounding box overlay: {}",
        state.mesh().num_triangles(),
        state.highlights().len(),
        if state.bounding_box().is_some() { "yes" } else { "no" }
    );
    Ok(())
}

fn parse_event(line: &str) -> Result<InputEvent> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let num = |i: usize| -> Result<f64> {
        let word = words.get(i).context("missing number")?;
        word.parse::<f64>()
            .with_context(|| format!("`{word}` is not a number"))
    };
    let button = |i: usize| -> Result<MouseButton> {
        match words.get(i).copied() {
            Some("left") => Ok(MouseButton::Left),
            Some("right") => Ok(MouseButton::Right),
            other => bail!("unknown mouse button {other:?}"),
        }
    };

    let event = match words[0] {
        "quit" => InputEvent::Quit,
        "press" => InputEvent::MouseButton {
            button: button(1)?,
            pressed: true,
        },
        "release" => InputEvent::MouseButton {
            button: button(1)?,
            pressed: false,
        },
        "move" => InputEvent::MouseMotion {
            x: num(1)?,
            y: num(2)?,
            dx: if words.len() > 3 { num(3)? } else { 0.0 },
            dy: if words.len() > 4 { num(4)? } else { 0.0 },
        },
        "key" => {
            let key = match words.get(1).copied() {
                Some("up") => Key::Up,
                Some("down") => Key::Down,
                Some("left") => Key::Left,
                Some("right") => Key::Right,
                Some(word) => match word.chars().collect::<Vec<_>>()[..] {
                    [c] => Key::from(c),
                    _ => bail!("unknown key `{word}`"),
                },
                None => bail!("missing key"),
            };
            InputEvent::KeyDown(key)
        }
        "resize" => {
            let (w, h) = (num(1)?, num(2)?);
            if w < 1.0 || h < 1.0 {
                bail!("window size must be positive");
            }
            InputEvent::Resized {
                width: w as u32,
                height: h as u32,
            }
        }
        "drop" => {
            let kind = match words.get(1).copied() {
                Some("sphere") => MeshKind::Sphere,
                Some("grid") => MeshKind::Grid,
                Some("cube") => MeshKind::Cube,
                other => bail!("unknown mesh {other:?}"),
            };
            let resolution = if words.len() > 2 { num(2)? } else { 64.0 };
            let in_range = (1.0..=f64::from(MAX_RESOLUTION)).contains(&resolution);
            if !in_range || resolution.fract() != 0.0 {
                bail!("resolution must be a whole number between 1 and {MAX_RESOLUTION}");
            }
            InputEvent::MeshDropped(build_mesh(&MeshArgs {
                mesh: kind,
                resolution: resolution as u32,
            })?)
        }
        other => bail!("unknown event `{other}`"),
    };
    Ok(event)
}

fn run_stats(config: &ViewerConfig, mesh: &MeshArgs, json: bool) -> Result<()> {
    let mut mesh = build_mesh(mesh)?;
    if config.picking.fit_to_view {
        mesh.fit_to_view();
    }
    let start = Instant::now();
    let bvh = Bvh::build(mesh.into());
    let elapsed = start.elapsed();
    let stats = bvh.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("BVH built in {:.3} ms", elapsed.as_secs_f64() * 1e3);
    println!("  Triangles: {}", stats.triangle_count);
    println!("  Nodes: {}", stats.node_count);
    println!("  Leaves: {}", stats.leaf_count);
    println!("  Max depth: {}", stats.max_depth);
    println!("  Max leaf size: {}", stats.max_leaf_size);
    println!("  Mean leaf size: {:.2}", stats.mean_leaf_size);
    Ok(())
}

fn run_bench(config: ViewerConfig, mesh: &MeshArgs, samples: u32) -> Result<()> {
    if samples == 0 {
        bail!("--samples must be at least 1");
    }
    let state = AppState::new(config, build_mesh(mesh)?);
    let viewport = *state.viewport();
    let bvh = state.bvh();
    let mesh = bvh.mesh();
    let view_model = state.camera().view_matrix().then(mesh.model_matrix());
    let proj = state.projection();

    let cursors: Vec<Point2> = (0..samples)
        .flat_map(|j| {
            (0..samples).map(move |i| {
                Point2::new(
                    (f64::from(i) + 0.5) / f64::from(samples) * viewport.width,
                    (f64::from(j) + 0.5) / f64::from(samples) * viewport.height,
                )
            })
        })
        .collect();
    let rays: Vec<_> = cursors
        .iter()
        .filter_map(|c| mouse_to_object_space(c, &viewport, &view_model, &proj))
        .collect();

    let start = Instant::now();
    let bvh_hits: Vec<_> = rays.iter().map(|ray| bvh.pick_nearest(ray)).collect();
    let bvh_time = start.elapsed();

    let start = Instant::now();
    let brute_hits: Vec<_> = rays
        .iter()
        .map(|ray| {
            mesh.triangles()
                .iter()
                .filter_map(|tri| ray.intersect_mesh_triangle(mesh, tri).map(|h| h.t))
                .fold(None, |best: Option<f64>, t| Some(best.map_or(t, |b| b.min(t))))
        })
        .collect();
    let brute_time = start.elapsed();

    let hits = bvh_hits.iter().filter(|h| h.is_some()).count();
    let agree = bvh_hits
        .iter()
        .zip(&brute_hits)
        .filter(|(b, s)| match (b, s) {
            (Some(b), Some(s)) => (b.t - s).abs() < 1e-9,
            (None, None) => true,
            _ => false,
        })
        .count();

    let per_ray = |d: std::time::Duration| d.as_secs_f64() * 1e6 / rays.len().max(1) as f64;
    println!(
        "{} rays over {} triangles, {} hits",
        rays.len(),
        mesh.num_triangles(),
        hits
    );
    println!("  BVH nearest:  {:.2} us/ray", per_ray(bvh_time));
    println!("  Brute force:  {:.2} us/ray", per_ray(brute_time));
    println!(
        "  Speedup: {:.1}x",
        brute_time.as_secs_f64() / bvh_time.as_secs_f64().max(f64::EPSILON)
    );
    if agree != rays.len() {
        bail!("BVH and brute force disagree on {} ray(s)", rays.len() - agree);
    }
    println!("  All {} results match brute force", agree);
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    ViewerConfig::default()
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("600,450"), Ok((600.0, 450.0)));
        assert_eq!(parse_pair(" 1.5 , -2 "), Ok((1.5, -2.0)));
        assert!(parse_pair("600").is_err());
        assert!(parse_pair("a,b").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "meshpick", "pick", "--mesh", "grid", "--at", "10,20", "--at", "30,40", "--mode",
            "nearest",
        ])
        .unwrap();
        match cli.command {
            Commands::Pick { at, mode, .. } => {
                assert_eq!(at, vec![(10.0, 20.0), (30.0, 40.0)]);
                assert!(matches!(mode, Some(ModeArg::Nearest)));
            }
            _ => panic!("expected pick"),
        }
    }

    #[test]
    fn test_parse_event() {
        assert!(matches!(parse_event("quit").unwrap(), InputEvent::Quit));
        assert!(matches!(
            parse_event("press left").unwrap(),
            InputEvent::MouseButton {
                button: MouseButton::Left,
                pressed: true
            }
        ));
        match parse_event("move 10 20 3").unwrap() {
            InputEvent::MouseMotion { x, y, dx, dy } => {
                assert_eq!((x, y, dx, dy), (10.0, 20.0, 3.0, 0.0));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(parse_event("key q").unwrap(), InputEvent::KeyDown(Key::Q)));
        assert!(matches!(parse_event("key up").unwrap(), InputEvent::KeyDown(Key::Up)));
        match parse_event("drop cube").unwrap() {
            InputEvent::MeshDropped(mesh) => assert_eq!(mesh.num_triangles(), 12),
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse_event("press middle").is_err());
        assert!(parse_event("move 10").is_err());
        assert!(parse_event("resize 0 10").is_err());
        assert!(parse_event("jump").is_err());
    }

    #[test]
    fn test_replay_script() {
        let cube = MeshArgs {
            mesh: MeshKind::Cube,
            resolution: 1,
        };
        let script = "# pick the centre\npress left\nmove 600 450\nkey q\nresize 800 600\nquit\nkey z\n";
        run_replay(ViewerConfig::default(), &cube, script).unwrap();
        assert!(run_replay(ViewerConfig::default(), &cube, "fly").is_err());
    }

    #[test]
    fn test_build_mesh_kinds() {
        let args = |mesh| MeshArgs {
            mesh,
            resolution: 8,
        };
        assert_eq!(build_mesh(&args(MeshKind::Cube)).unwrap().num_triangles(), 12);
        assert_eq!(build_mesh(&args(MeshKind::Grid)).unwrap().num_triangles(), 128);
        assert_eq!(
            build_mesh(&args(MeshKind::Sphere)).unwrap().num_triangles(),
            2 * 8 * 3
        );
    }

    #[test]
    fn test_resolution_is_bounded() {
        let args = ["meshpick", "stats", "--mesh", "grid", "--resolution", "70000"];
        assert!(Cli::try_parse_from(args).is_err());
        assert!(Cli::try_parse_from(["meshpick", "stats", "--resolution", "0"]).is_err());
        assert!(Cli::try_parse_from(["meshpick", "stats", "--resolution", "4096"]).is_ok());

        let oversized = MeshArgs {
            mesh: MeshKind::Grid,
            resolution: 70_000,
        };
        assert!(build_mesh(&oversized).is_err());
        assert!(parse_event("drop grid 70000").is_err());
        assert!(parse_event("drop sphere 2.5").is_err());
    }
}
