// What you SEE:
// • The source image opens in a window with "Select ROI" written on it.
// • Drag a rectangle with the left mouse button, press Enter/Space to accept
//   (Esc or C cancels the drag).
// • The background of that region is removed by an external tool, the subject
//   gets a thick green outline and is pasted back where it was.
// • Then: Q quits, C clears back to the original image, any other key selects again.

mod draw;
mod error;
mod imageio;
mod logging;
mod remover;
mod select;
mod session;
mod types;
mod vision;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use draw::Drawer;
use remover::CommandRemover;
use select::Viewport;
use session::Session;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Outline the subject of a region you select", long_about = None)]
struct Cli {
    /// Image to edit
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Where the composited image is written after every selection
    #[arg(short, long, value_name = "OUTPUT", default_value = "output.png")]
    output: PathBuf,

    /// Directory for the intermediate images (default: a temporary directory)
    #[arg(long, value_name = "DIR")]
    work_dir: Option<PathBuf>,

    /// Background removal program; called as `PROGRAM ARGS... INPUT OUTPUT`
    #[arg(long, value_name = "PROGRAM", default_value = "rembg")]
    remover: String,

    /// Fixed arguments passed to the remover before the two paths
    #[arg(long = "remover-arg", value_name = "ARG", default_value = "i", allow_hyphen_values = true)]
    remover_args: Vec<String>,

    /// Largest window width; bigger images are shrunk to fit
    #[arg(long, default_value_t = 700)]
    window_width: u32,

    /// Largest window height; bigger images are shrunk to fit
    #[arg(long, default_value_t = 400)]
    window_height: u32,

    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose).context("failed to initialise logging")?;

    if let Err(e) = run(cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    /* --- Session: source image + scratch directory + remover --- */
    let remover = CommandRemover::new(cli.remover, cli.remover_args);
    let mut session = Session::open(cli.source, cli.output, cli.work_dir, remover)
        .context("failed to open session")?;

    /* --- Window sized to the image (shrunk to fit if needed) --- */
    let viewport = Viewport::fit(session.image().dimensions(), (cli.window_width, cli.window_height));
    let mut drawer = Drawer::new("Image", viewport)?;

    /* --- Main loop: select, outline, paste, wait for Q/C --- */
    session.run(&mut drawer)?;
    info!(output = %session.paths().output.display(), "done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remover_defaults_to_rembg_image_mode() {
        let cli = Cli::try_parse_from(["magic-outliner", "photo.jpg"]).unwrap();
        assert_eq!(cli.remover, "rembg");
        assert_eq!(cli.remover_args, vec!["i".to_string()]);
        assert_eq!(cli.output, PathBuf::from("output.png"));
    }

    #[test]
    fn remover_args_replace_the_default() {
        let cli = Cli::try_parse_from([
            "magic-outliner",
            "photo.jpg",
            "--remover",
            "backgroundremover",
            "--remover-arg",
            "-i",
        ])
        .unwrap();
        assert_eq!(cli.remover, "backgroundremover");
        assert_eq!(cli.remover_args, vec!["-i".to_string()]);
    }
}
