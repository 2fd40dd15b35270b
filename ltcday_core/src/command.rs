use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::debug;

use crate::encoder::{EncodeError, EncodeRequest, LtcEncoder};

/// Encoder that delegates each segment to an external program.
///
/// The program is invoked as
/// `PROGRAM [ARGS...] --fps <rate> --start <HH:MM:SS:FF> --output <path>
/// --duration <seconds> --rate <hz> --bits <depth>` and must exit with status
/// zero after writing the output file.
#[derive(Clone, Debug)]
pub struct CommandEncoder {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

impl CommandEncoder {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Arguments placed before the generated options, e.g. a script path.
    pub fn leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args.extend(args.into_iter().map(Into::into));
        self
    }

    fn command(&self, request: &EncodeRequest<'_>) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .arg("--fps")
            .arg(request.frame_rate.to_string())
            .arg("--start")
            .arg(request.start.display_for(request.frame_rate))
            .arg("--output")
            .arg(request.output_path)
            .arg("--duration")
            .arg(request.duration_secs.to_string())
            .arg("--rate")
            .arg(request.sample_rate.to_string())
            .arg("--bits")
            .arg(request.bit_depth.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }
}

impl LtcEncoder for CommandEncoder {
    fn encode(&mut self, request: &EncodeRequest<'_>) -> Result<(), EncodeError> {
        let program = self.program.display().to_string();
        let mut command = self.command(request);
        debug!("running {command:?}");

        let output = command.output().map_err(|source| EncodeError::Spawn {
            program: program.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(EncodeError::ProcessFailed {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        if !request.output_path.is_file() {
            return Err(EncodeError::MissingOutput(request.output_path.to_path_buf()));
        }
        Ok(())
    }
}
