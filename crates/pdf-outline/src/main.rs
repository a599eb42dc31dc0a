use crate::prelude::*;
use clap::Parser;

mod error;
mod extract;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Extract a best-effort title and H1/H2/H3 heading outline from every PDF in a directory"
)]
pub struct App {
    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Directory scanned for `*.pdf` files
    #[clap(long, env = "PDF_OUTLINE_INPUT_DIR", default_value = "/app/input")]
    input_dir: std::path::PathBuf,

    /// Directory receiving one `*.json` outline per input file
    #[clap(long, env = "PDF_OUTLINE_OUTPUT_DIR", default_value = "/app/output")]
    output_dir: std::path::PathBuf,

    /// Abort on the first file that fails instead of continuing.
    #[clap(long, env = "PDF_OUTLINE_FAIL_FAST", default_value = "false")]
    fail_fast: bool,

    /// Suppress the per-file progress lines.
    #[clap(long, env = "PDF_OUTLINE_QUIET", default_value = "false")]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    crate::extract::run(app.global)
}
