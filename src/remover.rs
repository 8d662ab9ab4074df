// Background removal is delegated to an external program.
// We hand it a file, wait for it, and check that it actually produced one.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use tracing::{debug, trace};

use crate::error::Error;

/// Anything that can turn `input` into a transparent-background `output`.
pub trait BackgroundRemover {
    fn remove_background(&self, input: &Path, output: &Path) -> Result<(), Error>;
}

/// Runs `program args... <input> <output>` and waits for it (no timeout).
#[derive(Clone, Debug)]
pub struct CommandRemover {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandRemover {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<OsString>,
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl BackgroundRemover for CommandRemover {
    fn remove_background(&self, input: &Path, output: &Path) -> Result<(), Error> {
        debug!(
            program = %self.name(),
            input = %input.display(),
            output = %output.display(),
            "running background remover"
        );

        let result = Command::new(&self.program)
            .args(&self.args)
            .arg(input)
            .arg(output)
            .output()
            .map_err(|source| Error::Spawn {
                program: self.name(),
                source,
            })?;

        if !result.stdout.is_empty() {
            trace!(stdout = %String::from_utf8_lossy(&result.stdout).trim_end(), "remover stdout");
        }

        if !result.status.success() {
            return Err(Error::ExternalTool {
                program: self.name(),
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim_end().to_string(),
            });
        }

        if !output.is_file() {
            return Err(Error::MissingOutput {
                program: self.name(),
                path: output.to_path_buf(),
            });
        }

        Ok(())
    }
}
