// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use eikonal_mesh::cost::{TimeCostFunction, UniformCost, VertexCost};
use eikonal_mesh::io;
use eikonal_mesh::{
    Algorithm, EikonalSolver, Point, ProgressInfo, TriangleMesh, UpdateMethod, UNKNOWN_POTENTIAL,
};

#[derive(Parser)]
#[command(name = "eikonal-mesh", about = "Eikonal solver on a triangulated rectangle")]
struct Cli {
    /// Rectangle as x0,y0,width,height
    #[arg(long, default_value = "0,0,1,1")]
    extent: String,

    /// Cells per side as nx,ny (each cell is split into two triangles)
    #[arg(short = 'n', long, default_value = "32,32")]
    divisions: String,

    /// fmm, fim, parallel-fim, ifim, parallel-ifim or dfmm
    #[arg(short = 'a', long, default_value = "fmm")]
    algorithm: String,

    /// Two-point update: sethian or matrix
    #[arg(long, default_value = "sethian")]
    method: String,

    /// Source coordinates x,y (repeatable for multiple sources)
    #[arg(long, num_args = 1)]
    source: Vec<String>,

    /// Time cost: "uniform:<cost>", "speed:<speed>",
    /// "cost-file:<path>", or "speed-file:<path>"
    #[arg(long, default_value = "uniform:1.0")]
    cost: String,

    /// Convergence tolerance of the iterative variants
    #[arg(short = 't', long, default_value = "1e-10")]
    tolerance: f64,

    /// Number of Rayon worker threads for the parallel variants
    #[arg(long)]
    threads: Option<usize>,

    /// Safety limit on relaxation passes before aborting
    #[arg(long)]
    max_passes: Option<u64>,

    /// Output file path (.npy or .mat)
    #[arg(short = 'o', long, default_value = "potential.npy")]
    output: PathBuf,

    /// Print the interpolated potential at x,y after solving (repeatable)
    #[arg(long, num_args = 1)]
    query: Vec<String>,

    /// Print one line per relaxation pass to stderr
    #[arg(long)]
    progress: bool,

    /// Log debug diagnostics
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn parse_floats(s: &str, what: &str, count: usize) -> Result<Vec<f64>> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("invalid {}: expected comma-separated floats", what))?;
    if parts.len() != count {
        bail!("{} has {} components, expected {}", what, parts.len(), count);
    }
    Ok(parts)
}

fn parse_point(s: &str, what: &str) -> Result<Point> {
    let xy = parse_floats(s, what, 2)?;
    Ok(Point::new(xy[0], xy[1]))
}

fn parse_divisions(s: &str) -> Result<(usize, usize)> {
    let parts: Vec<usize> = s
        .split(',')
        .map(|p| p.trim().parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("invalid --divisions: expected nx,ny")?;
    match parts[..] {
        [nx, ny] if nx > 0 && ny > 0 => Ok((nx, ny)),
        _ => bail!("--divisions expects two positive integers, got '{}'", s),
    }
}

fn build_cost(mode: &str, num_vertices: usize) -> Result<Box<dyn TimeCostFunction>> {
    if let Some(val) = mode.strip_prefix("uniform:") {
        let val: f64 = val.parse().context("invalid uniform cost value")?;
        return Ok(Box::new(UniformCost::new(val)?));
    }
    if let Some(val) = mode.strip_prefix("speed:") {
        let val: f64 = val.parse().context("invalid uniform speed value")?;
        return Ok(Box::new(UniformCost::from_speed(val)?));
    }
    if let Some(path) = mode.strip_prefix("cost-file:") {
        let costs = io::load_costs(Path::new(path), num_vertices)
            .with_context(|| format!("loading costs from {}", path))?;
        return Ok(Box::new(VertexCost::new(costs)?));
    }
    if let Some(path) = mode.strip_prefix("speed-file:") {
        let costs = io::load_speeds_as_costs(Path::new(path), num_vertices)
            .with_context(|| format!("loading speeds from {}", path))?;
        return Ok(Box::new(VertexCost::new(costs)?));
    }
    bail!(
        "unknown --cost mode: '{}'. Expected 'uniform:<cost>', 'speed:<speed>', \
         'cost-file:<path>', or 'speed-file:<path>'",
        mode
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if cli.source.is_empty() {
        bail!("at least one --source must be specified");
    }
    let algorithm: Algorithm = cli.algorithm.parse()?;
    let method: UpdateMethod = cli.method.parse()?;

    let extent = parse_floats(&cli.extent, "--extent", 4)?;
    let (nx, ny) = parse_divisions(&cli.divisions)?;
    let mesh = TriangleMesh::rectangle(extent[0], extent[1], extent[2], extent[3], nx, ny)
        .context("building mesh")?;
    let mesh = Arc::new(mesh);

    let sources = cli
        .source
        .iter()
        .map(|s| parse_point(s, "--source"))
        .collect::<Result<Vec<_>>>()?;
    let cost = build_cost(&cli.cost, mesh.vertex_count())?;

    let mut solver = EikonalSolver::with_target_points(Arc::clone(&mesh), cost, algorithm, &sources)?
        .with_tolerance(cli.tolerance)?
        .with_update_method(method);
    if let Some(threads) = cli.threads {
        solver = solver.with_threads(threads)?;
    }
    if let Some(max_passes) = cli.max_passes {
        solver = solver.with_max_passes(max_passes);
    }
    if cli.progress {
        solver = solver.with_progress(Box::new(|info: ProgressInfo| {
            eprintln!(
                "[{:.3}s] pass={} active={}",
                info.elapsed.as_secs_f64(),
                info.passes,
                info.active_list_size,
            );
        }));
    }

    solver.solve()?;
    let stats = solver.stats();
    tracing::debug!(
        recomputations = stats.recomputations,
        unreachable = stats.unreachable,
        "solve statistics"
    );

    let potentials: Vec<f64> = (0..mesh.vertex_count())
        .map(|v| solver.potential(v))
        .collect();
    io::save_potentials(&cli.output, &potentials)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    for q in &cli.query {
        let p = parse_point(q, "--query")?;
        let t = solver.potential_at(p.x, p.y);
        if t >= UNKNOWN_POTENTIAL {
            println!("{} {} unknown", p.x, p.y);
        } else {
            println!("{} {} {}", p.x, p.y, t);
        }
    }

    Ok(())
}
