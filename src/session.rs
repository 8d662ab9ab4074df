//! The interaction loop.
//!
//! A [`Session`] owns the image being edited and the paths its artifacts are
//! written to. Each pass of [`Session::run`] asks the [`Frontend`] for a
//! region, cuts it out, has the background removed, outlines the foreground,
//! pastes it back and writes the result. `c` reloads the source image, `q`
//! ends the session.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::draw::{draw_text_5x7, text_height};
use crate::error::Error;
use crate::imageio;
use crate::remover::BackgroundRemover;
use crate::select::crop_roi;
use crate::types::{KeyAction, Roi, Selection};
use crate::vision;

pub const SELECT_PROMPT: &str = "Select ROI";
pub const EXIT_PROMPT: &str = "Press Q->Exit or C->Clear";

const SELECT_COLOR: Rgba<u8> = Rgba([0, 0, 255, 255]);
const EXIT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// The interactive side of the loop: a window, or a script in tests.
pub trait Frontend {
    /// Show `image` and block until the user picks a region (or gives up).
    fn select_roi(&mut self, image: &RgbaImage) -> Result<Selection, Error>;
    /// Put `image` on screen.
    fn show(&mut self, image: &RgbaImage) -> Result<(), Error>;
    /// Block until a key is pressed.
    fn wait_key(&mut self) -> Result<KeyAction, Error>;
}

/// Where one iteration writes its files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub roi: PathBuf,        // cropped region, input to the remover
    pub foreground: PathBuf, // remover output
    pub overlay: PathBuf,    // outlined foreground
    pub output: PathBuf,     // full composited image
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path, output: PathBuf) -> Self {
        Self {
            roi: dir.join("roi.png"),
            foreground: dir.join("roi_fg.png"),
            overlay: dir.join("overlay.png"),
            output,
        }
    }
}

pub struct Session<R> {
    source: PathBuf,
    image: RgbaImage,
    paths: ArtifactPaths,
    remover: R,
    // keeps the scratch directory alive for the session
    _workspace: Option<TempDir>,
}

impl<R: BackgroundRemover> Session<R> {
    /// Load `source` and prepare a working directory: `work_dir` if given,
    /// otherwise a fresh temporary one removed when the session drops.
    pub fn open(source: PathBuf, output: PathBuf, work_dir: Option<PathBuf>, remover: R) -> Result<Self, Error> {
        let image = imageio::load(&source)?;

        let (dir, workspace) = match work_dir {
            Some(dir) => {
                fs::create_dir_all(&dir)?;
                (dir, None)
            }
            None => {
                let tmp = tempfile::Builder::new().prefix("magic-outliner-").tempdir()?;
                (tmp.path().to_path_buf(), Some(tmp))
            }
        };
        let paths = ArtifactPaths::in_dir(&dir, output);

        info!(
            source = %source.display(),
            width = image.width(),
            height = image.height(),
            work_dir = %dir.display(),
            "session opened"
        );
        Ok(Self { source, image, paths, remover, _workspace: workspace })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Throw away every edit and reload the source image.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.image = imageio::load(&self.source)?;
        info!(source = %self.source.display(), "image cleared");
        Ok(())
    }

    /// One full pass for `roi`: crop, remove background, outline, composite, save.
    /// The session image is only modified once every earlier step succeeded.
    pub fn process(&mut self, roi: Roi) -> Result<(), Error> {
        let (crop, offset) = crop_roi(&self.image, roi)?;
        imageio::save(&crop, &self.paths.roi)?;
        debug!(%roi, path = %self.paths.roi.display(), "region saved");

        // a leftover file from the previous pass must not pass for fresh output
        if self.paths.foreground.exists() {
            fs::remove_file(&self.paths.foreground)?;
        }
        self.remover.remove_background(&self.paths.roi, &self.paths.foreground)?;
        let foreground = imageio::load(&self.paths.foreground)?;
        debug!(width = foreground.width(), height = foreground.height(), "foreground loaded");

        let overlay = vision::draw_outline(&foreground);
        imageio::save(&overlay, &self.paths.overlay)?;

        vision::composite(&mut self.image, &overlay, offset)?;
        imageio::save(&self.image, &self.paths.output)?;
        Ok(())
    }

    /// Select -> process -> show -> wait for a key, until `q` or the window closes.
    pub fn run<F: Frontend>(&mut self, frontend: &mut F) -> Result<(), Error> {
        loop {
            // drawn into the image on every pass, so it stays on screen and in the output
            self.draw_prompt(SELECT_PROMPT, 0.07, SELECT_COLOR);

            match frontend.select_roi(&self.image)? {
                Selection::Closed => {
                    info!("window closed");
                    break;
                }
                Selection::Cancelled => warn!("selection cancelled"),
                Selection::Region(roi) => match self.process(roi) {
                    Ok(()) => info!(%roi, output = %self.paths.output.display(), "region outlined"),
                    Err(e) if e.is_recoverable() => warn!(error = %e, "skipping selection"),
                    Err(e) => return Err(e),
                },
            }

            self.draw_prompt(EXIT_PROMPT, 0.95, EXIT_COLOR);
            frontend.show(&self.image)?;

            match frontend.wait_key()? {
                KeyAction::Quit => break,
                KeyAction::Clear => {
                    self.reset()?;
                    frontend.show(&self.image)?;
                }
                KeyAction::Other => {}
            }
        }
        Ok(())
    }

    /// Text at 4% from the left with its baseline at `baseline` of the height.
    fn draw_prompt(&mut self, text: &str, baseline: f64, color: Rgba<u8>) {
        let (w, h) = self.image.dimensions();
        let scale = prompt_scale(w, h);
        let x = (w as f64 * 0.04) as i32;
        let y = (h as f64 * baseline) as i32 - text_height(scale) as i32;
        draw_text_5x7(&mut self.image, x, y, text, scale, color);
    }
}

/// Glyph block size: grows with the image area, one block per ~0.6 megapixel.
fn prompt_scale(width: u32, height: u32) -> u32 {
    let area_mp = width as f64 * height as f64 / 1_000_000.0;
    (area_mp * 1.6).round().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::VecDeque;

    const GRAY: Rgba<u8> = Rgba([80, 80, 80, 255]);

    /// Writes an image the size of its input: transparent, with an opaque
    /// white square over the middle half.
    #[derive(Default)]
    struct FakeRemover {
        calls: Cell<usize>,
    }

    impl BackgroundRemover for FakeRemover {
        fn remove_background(&self, input: &Path, output: &Path) -> Result<(), Error> {
            self.calls.set(self.calls.get() + 1);
            let crop = imageio::load(input)?;
            let (w, h) = crop.dimensions();
            let fg = RgbaImage::from_fn(w, h, |x, y| {
                let inside = (w / 4..w * 3 / 4).contains(&x) && (h / 4..h * 3 / 4).contains(&y);
                if inside { Rgba([255, 255, 255, 255]) } else { Rgba([0, 0, 0, 0]) }
            });
            imageio::save(&fg, output)
        }
    }

    /// Claims success, writes nothing.
    struct SilentRemover;

    impl BackgroundRemover for SilentRemover {
        fn remove_background(&self, _input: &Path, output: &Path) -> Result<(), Error> {
            Err(Error::MissingOutput { program: "silent".into(), path: output.to_path_buf() })
        }
    }

    /// Succeeds, but writes an image larger than its input.
    struct WrongSizeRemover;

    impl BackgroundRemover for WrongSizeRemover {
        fn remove_background(&self, input: &Path, output: &Path) -> Result<(), Error> {
            let (w, h) = imageio::load(input)?.dimensions();
            imageio::save(&RgbaImage::from_pixel(w + 50, h + 50, Rgba([255, 255, 255, 255])), output)
        }
    }

    #[derive(Default)]
    struct ScriptedFrontend {
        selections: VecDeque<Selection>,
        keys: VecDeque<KeyAction>,
        shown: Vec<RgbaImage>,
    }

    impl ScriptedFrontend {
        fn new(selections: impl IntoIterator<Item = Selection>, keys: impl IntoIterator<Item = KeyAction>) -> Self {
            Self {
                selections: selections.into_iter().collect(),
                keys: keys.into_iter().collect(),
                shown: Vec::new(),
            }
        }
    }

    impl Frontend for ScriptedFrontend {
        fn select_roi(&mut self, _image: &RgbaImage) -> Result<Selection, Error> {
            Ok(self.selections.pop_front().unwrap_or(Selection::Closed))
        }

        fn show(&mut self, image: &RgbaImage) -> Result<(), Error> {
            self.shown.push(image.clone());
            Ok(())
        }

        fn wait_key(&mut self) -> Result<KeyAction, Error> {
            Ok(self.keys.pop_front().unwrap_or(KeyAction::Quit))
        }
    }

    fn fixture<R: BackgroundRemover>(dir: &Path, remover: R) -> Session<R> {
        let source = dir.join("source.png");
        imageio::save(&RgbaImage::from_pixel(100, 100, GRAY), &source).unwrap();
        Session::open(source, dir.join("output.png"), Some(dir.join("work")), remover).unwrap()
    }

    #[test]
    fn artifact_paths_live_in_work_dir() {
        let paths = ArtifactPaths::in_dir(Path::new("/tmp/w"), PathBuf::from("out.jpg"));
        assert_eq!(paths.roi, Path::new("/tmp/w/roi.png"));
        assert_eq!(paths.foreground, Path::new("/tmp/w/roi_fg.png"));
        assert_eq!(paths.overlay, Path::new("/tmp/w/overlay.png"));
        assert_eq!(paths.output, Path::new("out.jpg"));
    }

    #[test]
    fn prompt_scale_grows_with_area() {
        assert_eq!(prompt_scale(100, 100), 1);
        assert_eq!(prompt_scale(2000, 1500), 5);
    }

    #[test]
    fn one_pass_writes_every_artifact_and_composites() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = fixture(dir.path(), FakeRemover::default());
        let mut ui = ScriptedFrontend::new([Selection::Region(Roi::new(10, 10, 60, 60))], [KeyAction::Quit]);

        session.run(&mut ui).unwrap();

        let paths = session.paths().clone();
        assert_eq!(imageio::load(&paths.roi).unwrap().dimensions(), (60, 60));
        assert_eq!(imageio::load(&paths.foreground).unwrap().dimensions(), (60, 60));
        assert_eq!(imageio::load(&paths.overlay).unwrap().dimensions(), (60, 60));

        let output = imageio::load(&paths.output).unwrap();
        assert_eq!(output.dimensions(), (100, 100));
        assert_ne!(*output.get_pixel(40, 40), GRAY); // subject pasted
        assert_eq!(*output.get_pixel(12, 12), GRAY); // transparent corner of the crop
        assert_eq!(*output.get_pixel(99, 99), GRAY); // outside the crop
        assert_eq!(session.remover.calls.get(), 1);
        assert_eq!(ui.shown.len(), 1);
    }

    #[test]
    fn clear_reloads_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = fixture(dir.path(), FakeRemover::default());
        let mut ui = ScriptedFrontend::new(
            [Selection::Region(Roi::new(10, 10, 60, 60)), Selection::Closed],
            [KeyAction::Clear],
        );

        session.run(&mut ui).unwrap();

        // after clear only the fresh source (plus the select prompt) remains
        assert_eq!(*session.image().get_pixel(40, 40), GRAY);
        assert_eq!(ui.shown.len(), 2);
        assert_eq!(*ui.shown[1].get_pixel(40, 40), GRAY);
        assert_ne!(*ui.shown[0].get_pixel(40, 40), GRAY);
    }

    #[test]
    fn cancelled_and_empty_selections_skip_processing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = fixture(dir.path(), FakeRemover::default());
        let mut ui = ScriptedFrontend::new(
            [Selection::Cancelled, Selection::Region(Roi::new(5, 5, 0, 0))],
            [KeyAction::Other, KeyAction::Quit],
        );

        session.run(&mut ui).unwrap();

        assert_eq!(session.remover.calls.get(), 0);
        assert!(!session.paths().output.exists());
        assert_eq!(ui.shown.len(), 2);
    }

    #[test]
    fn prompts_are_burnt_into_the_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = fixture(dir.path(), FakeRemover::default());
        let mut ui = ScriptedFrontend::new([Selection::Cancelled], [KeyAction::Quit]);

        session.run(&mut ui).unwrap();

        let img = session.image();
        assert!((0..10).any(|y| (0..70).any(|x| *img.get_pixel(x, y) == SELECT_COLOR)));
        assert!((85..100).any(|y| (0..100).any(|x| *img.get_pixel(x, y) == EXIT_COLOR)));
    }

    #[test]
    fn remover_failure_is_fatal_and_leaves_image_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = fixture(dir.path(), SilentRemover);
        let mut ui = ScriptedFrontend::new([Selection::Region(Roi::new(10, 10, 60, 60))], Vec::new());

        let err = session.run(&mut ui).unwrap_err();

        assert!(matches!(err, Error::MissingOutput { .. }));
        assert_eq!(*session.image().get_pixel(40, 40), GRAY);
        assert!(!session.paths().output.exists());
    }

    #[test]
    fn oversized_remover_output_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = fixture(dir.path(), WrongSizeRemover);
        let mut ui = ScriptedFrontend::new([Selection::Region(Roi::new(10, 10, 60, 60))], [KeyAction::Quit]);

        session.run(&mut ui).unwrap();

        assert_eq!(*session.image().get_pixel(40, 40), GRAY);
        assert_eq!(*session.image().get_pixel(69, 69), GRAY);
        assert!(!session.paths().output.exists());
        assert_eq!(ui.shown.len(), 1);
    }

    #[test]
    fn missing_source_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let opened = Session::open(dir.path().join("absent.png"), dir.path().join("o.png"), None, SilentRemover);
        assert!(matches!(opened, Err(Error::Load { .. })));
    }
}
