//! dae_mesh - COLLADA mesh converter
//!
//! Imports a .dae file into a single welded triangle mesh and writes it back out.

use std::path::PathBuf;

use anyhow::{Context, Result};
use dae_mesh::{export_mesh_to_dae, parse_dae_file, DaeExportConfig, DaeImportConfig};

const HELP: &str = "\
Usage: dae_mesh [OPTIONS] <INPUT> <OUTPUT>

Options:
  --triangulate-polylists  Fan triangulate <polylist> geometry
  --tool <NAME>            Authoring tool recorded in the output
  --comment <TEXT>         Replace the mesh comment
  -h, --help               Print help
";

struct Args {
    input: PathBuf,
    output: PathBuf,
    triangulate_polylists: bool,
    tool: Option<String>,
    comment: Option<String>,
}

fn parse_args() -> Result<Option<Args>> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{}", HELP);
        return Ok(None);
    }

    let triangulate_polylists = args.contains("--triangulate-polylists");
    let tool = args.opt_value_from_str("--tool")?;
    let comment = args.opt_value_from_str("--comment")?;
    let input = args.free_from_str().context("missing <INPUT>")?;
    let output = args.free_from_str().context("missing <OUTPUT>")?;

    let remaining = args.finish();
    if !remaining.is_empty() {
        log::warn!("Ignoring unused arguments: {:?}", remaining);
    }

    Ok(Some(Args {
        input,
        output,
        triangulate_polylists,
        tool,
        comment,
    }))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(args) = parse_args()? else {
        return Ok(());
    };

    let import_config = DaeImportConfig {
        triangulate_polylists: args.triangulate_polylists,
    };
    let mut mesh = parse_dae_file(&args.input, &import_config)
        .with_context(|| format!("failed to import {}", args.input.display()))?;

    if let Some(comment) = args.comment {
        mesh.comment = comment;
    }

    let mut export_config = DaeExportConfig::default();
    if let Some(tool) = args.tool {
        export_config.authoring_tool = tool;
    }
    export_mesh_to_dae(&mesh, &args.output, &export_config)
        .with_context(|| format!("failed to export {}", args.output.display()))?;

    Ok(())
}
