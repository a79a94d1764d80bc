// src/exec/redirect.rs

//! Resolving a [`ProcessSpec`]'s streams into `Stdio` handles.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::process::Stdio;

use crate::errors::{ProcessError, Result};
use crate::exec::spec::{OutputSink, ProcessSpec, StdinSource};

/// Opened streams for one child process.
///
/// `input` is set when stdin must be fed from memory; the caller writes it
/// to the piped stdin after spawning.
#[derive(Debug)]
pub struct Streams {
    pub stdin: Stdio,
    pub stdout: Stdio,
    pub stderr: Stdio,
    pub input: Option<Vec<u8>>,
}

pub fn open_streams(spec: &ProcessSpec) -> Result<Streams> {
    let (stdin, input) = match &spec.stdin {
        StdinSource::Inherit => (Stdio::inherit(), None),
        StdinSource::Bytes(bytes) => (Stdio::piped(), Some(bytes.clone())),
        StdinSource::File(path) => {
            let file = File::open(path).map_err(|e| redirect_error(path, e))?;
            (Stdio::from(file), None)
        }
    };

    let stdout_file = match &spec.stdout {
        OutputSink::File { path, append } => Some(open_output(path, *append)?),
        _ => None,
    };

    // Both streams naming the same file share one handle so their writes
    // interleave instead of clobbering each other.
    let stderr = match (&spec.stderr, &spec.stdout, &stdout_file) {
        (
            OutputSink::File { path: err_path, .. },
            OutputSink::File { path: out_path, .. },
            Some(file),
        ) if err_path == out_path => {
            Stdio::from(file.try_clone().map_err(|e| redirect_error(err_path, e))?)
        }
        (sink, _, _) => sink_stdio(sink, false)?,
    };

    let stdout = match stdout_file {
        Some(file) => Stdio::from(file),
        None => sink_stdio(&spec.stdout, true)?,
    };

    Ok(Streams {
        stdin,
        stdout,
        stderr,
        input,
    })
}

fn sink_stdio(sink: &OutputSink, is_stdout: bool) -> Result<Stdio> {
    match sink {
        OutputSink::Inherit => Ok(Stdio::inherit()),
        OutputSink::OwnStdout if is_stdout => Ok(Stdio::inherit()),
        OutputSink::OwnStderr if !is_stdout => Ok(Stdio::inherit()),
        OutputSink::OwnStdout => {
            own_stdout().map_err(|e| redirect_error(Path::new("&1"), e).into())
        }
        OutputSink::OwnStderr => {
            own_stderr().map_err(|e| redirect_error(Path::new("&2"), e).into())
        }
        OutputSink::File { path, append } => Ok(Stdio::from(open_output(path, *append)?)),
    }
}

fn open_output(path: &Path, append: bool) -> Result<File> {
    let mut opts = OpenOptions::new();
    opts.create(true);
    if append {
        opts.append(true);
    } else {
        opts.write(true).truncate(true);
    }
    opts.open(path).map_err(|e| redirect_error(path, e).into())
}

fn redirect_error(path: &Path, source: io::Error) -> ProcessError {
    ProcessError::Redirect {
        path: path.display().to_string(),
        source: source.into(),
    }
}

#[cfg(unix)]
fn own_stdout() -> io::Result<Stdio> {
    use std::os::fd::AsFd;
    Ok(Stdio::from(io::stdout().as_fd().try_clone_to_owned()?))
}

#[cfg(unix)]
fn own_stderr() -> io::Result<Stdio> {
    use std::os::fd::AsFd;
    Ok(Stdio::from(io::stderr().as_fd().try_clone_to_owned()?))
}

#[cfg(windows)]
fn own_stdout() -> io::Result<Stdio> {
    use std::os::windows::io::AsHandle;
    Ok(Stdio::from(io::stdout().as_handle().try_clone_to_owned()?))
}

#[cfg(windows)]
fn own_stderr() -> io::Result<Stdio> {
    use std::os::windows::io::AsHandle;
    Ok(Stdio::from(io::stderr().as_handle().try_clone_to_owned()?))
}
