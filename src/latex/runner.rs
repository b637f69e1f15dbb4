//! Launching the external LaTeX compiler.
//!
//! A render writes the templated source to a fixed file in the working
//! directory, spawns the compiler with that directory as its cwd and hands the
//! child to a watcher thread. The watcher blocks on the child's exit and sends a
//! single [`PipelineEvent::RenderFinished`] back to the event loop, so nothing on
//! the loop thread ever waits on the process.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{self, Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread;

use log::{debug, warn};

use super::events::{Completion, ExitOutcome, PipelineEvent};
use super::template::render_source;
use crate::error::RenderError;

pub const DEFAULT_EXECUTABLE: &str = "pdflatex";
pub const SOURCE_FILE: &str = "tex.tex";
pub const OUTPUT_FILE: &str = "tex.pdf";
pub const NONSTOP_FLAG: &str = "-interaction=nonstopmode";

/// Something that can compile a formula in the background.
///
/// Implementations must report every successful `start` with exactly one
/// completion carrying the same id.
pub trait RenderBackend {
    /// Write the source for `formula` and start compiling it. Returns the
    /// compiler's process id.
    fn start(&mut self, id: u64, formula: &str) -> Result<u32, RenderError>;

    /// Where a successful compile leaves its PDF.
    fn output_path(&self) -> PathBuf;

    /// Name used when reporting compiler faults.
    fn program_name(&self) -> String;
}

/// Runs a `pdflatex`-compatible executable in a private working directory.
#[derive(Debug, Clone)]
pub struct TexRunner {
    executable: PathBuf,
    flags: Vec<String>,
    work_dir: PathBuf,
    events: Sender<PipelineEvent>,
}

impl TexRunner {
    /// A relative `work_dir` is resolved against the current directory, since
    /// the compiler runs inside it.
    pub fn new(
        executable: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
        events: Sender<PipelineEvent>,
    ) -> Self {
        let work_dir = work_dir.into();
        Self {
            executable: executable.into(),
            flags: vec![NONSTOP_FLAG.to_string()],
            work_dir: path::absolute(&work_dir).unwrap_or(work_dir),
            events,
        }
    }

    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    pub fn source_path(&self) -> PathBuf {
        self.work_dir.join(SOURCE_FILE)
    }

    fn write_source(&self, formula: &str) -> Result<(), RenderError> {
        let path = self.source_path();
        fs::create_dir_all(&self.work_dir)
            .and_then(|()| fs::write(&path, render_source(formula)))
            .map_err(|source| RenderError::FileWrite { path, source })
    }

    fn spawn_error(&self, source: io::Error) -> RenderError {
        RenderError::Spawn {
            program: self.executable.clone(),
            source,
        }
    }
}

impl RenderBackend for TexRunner {
    fn start(&mut self, id: u64, formula: &str) -> Result<u32, RenderError> {
        self.write_source(formula)?;

        // Every started compiler must have a watcher to reap it.
        let (handoff, pending) = mpsc::channel::<Child>();
        let events = self.events.clone();
        thread::Builder::new()
            .name(format!("latex-watch-{id}"))
            .spawn(move || {
                let Ok(mut child) = pending.recv() else {
                    return;
                };
                let outcome = match child.wait() {
                    Ok(status) => ExitOutcome::from_status(status),
                    Err(err) => ExitOutcome::Fault {
                        code: None,
                        description: format!("failed to wait for compiler: {err}"),
                    },
                };
                debug!("render {id}: finished with {outcome:?}");
                if events
                    .send(PipelineEvent::RenderFinished(Completion { id, outcome }))
                    .is_err()
                {
                    warn!("render {id}: event loop is gone, dropping completion");
                }
            })
            .map_err(|source| self.spawn_error(source))?;

        let child = Command::new(&self.executable)
            .args(&self.flags)
            .arg(SOURCE_FILE)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| self.spawn_error(source))?;
        let pid = child.id();
        debug!("render {id}: started {} (pid {pid})", self.executable.display());

        if let Err(mpsc::SendError(mut child)) = handoff.send(child) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(self.spawn_error(io::Error::other("completion watcher exited early")));
        }

        Ok(pid)
    }

    fn output_path(&self) -> PathBuf {
        self.work_dir.join(OUTPUT_FILE)
    }

    fn program_name(&self) -> String {
        self.executable
            .file_name()
            .unwrap_or(self.executable.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

/// Locate `name` on the `PATH`.
///
/// Names containing a path separator are checked as given and returned as an
/// absolute path, because the compiler is started from the work directory.
pub fn find_executable(name: &str) -> Result<PathBuf, RenderError> {
    let path_var = env::var_os("PATH").unwrap_or_default();
    find_executable_in(name, &path_var)
}

/// Locate `name` in the directories listed by `path_var`.
pub fn find_executable_in(name: &str, path_var: &OsStr) -> Result<PathBuf, RenderError> {
    let not_found = || RenderError::ExecutableNotFound {
        name: name.to_string(),
    };

    let candidate = Path::new(name);
    if name.is_empty() {
        return Err(not_found());
    }
    if candidate.components().count() > 1 {
        return if is_executable(candidate) {
            path::absolute(candidate).map_err(|_| not_found())
        } else {
            Err(not_found())
        };
    }

    env::split_paths(path_var)
        .flat_map(|dir| {
            [
                dir.join(name),
                dir.join(format!("{name}{}", env::consts::EXE_SUFFIX)),
            ]
        })
        .find(|path| is_executable(path))
        .ok_or_else(not_found)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_failures_are_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();

        let (tx, _rx) = mpsc::channel();
        let mut runner = TexRunner::new("pdflatex", blocker.join("tex"), tx);
        let err = runner.start(1, "x").unwrap_err();
        assert!(matches!(err, RenderError::FileWrite { .. }));
    }

    #[test]
    fn spawn_failures_are_reported_after_the_source_is_written() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (tx, rx) = mpsc::channel();
        let mut runner = TexRunner::new(dir.path().join("missing-compiler"), dir.path(), tx);

        let err = runner.start(1, "x^2").unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
        let source = fs::read_to_string(runner.source_path()).unwrap();
        assert!(source.contains("\nx^2\n"));

        // The watcher gives up without reporting once the runner is gone.
        drop(runner);
        assert_eq!(
            rx.recv_timeout(std::time::Duration::from_secs(5)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        );
    }

    #[test]
    fn program_name_is_the_file_name() {
        let (tx, _rx) = mpsc::channel();
        let runner = TexRunner::new("/usr/bin/pdflatex", "/tmp", tx);
        assert_eq!(runner.program_name(), "pdflatex");
        assert_eq!(runner.output_path(), PathBuf::from("/tmp/tex.pdf"));
    }

    #[test]
    fn lookup_fails_for_unknown_programs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = find_executable_in("pdflatex", dir.path().as_os_str()).unwrap_err();
        assert!(matches!(err, RenderError::ExecutableNotFound { ref name } if name == "pdflatex"));
        assert!(find_executable_in("", dir.path().as_os_str()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn lookup_walks_the_path_and_requires_the_exec_bit() {
        use std::os::unix::fs::PermissionsExt;

        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        let plain = first.path().join("pdflatex");
        fs::write(&plain, "#!/bin/sh\n").unwrap();
        let script = second.path().join("pdflatex");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let path_var = env::join_paths([first.path(), second.path()]).unwrap();
        assert_eq!(find_executable_in("pdflatex", &path_var).unwrap(), script);

        let direct = script.to_string_lossy().into_owned();
        assert_eq!(find_executable_in(&direct, OsStr::new("")).unwrap(), script);
    }

    #[cfg(unix)]
    #[test]
    fn relative_executable_paths_are_made_absolute() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir_in(".").expect("tempdir");
        let script = dir.path().join("strictlatex");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(script.is_relative());

        let found = find_executable_in(&script.to_string_lossy(), OsStr::new("")).unwrap();
        assert!(found.is_absolute());
        assert!(found.ends_with("strictlatex"));
        assert_eq!(fs::canonicalize(&found).unwrap(), fs::canonicalize(&script).unwrap());
    }

    #[test]
    fn relative_work_dirs_are_made_absolute() {
        let (tx, _rx) = mpsc::channel();
        let runner = TexRunner::new("pdflatex", "formulas", tx);
        assert!(runner.source_path().is_absolute());
        assert!(runner.output_path().ends_with("formulas/tex.pdf"));
    }

    #[cfg(unix)]
    #[test]
    fn each_start_reports_exactly_one_completion() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("quicklatex");
        fs::write(&script, "#!/bin/sh\n[ -f \"$2\" ] || exit 1\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let (tx, rx) = mpsc::channel();
        let mut runner = TexRunner::new(&script, dir.path().join("work"), tx);
        runner.start(3, "x").unwrap();

        match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            PipelineEvent::RenderFinished(completion) => {
                assert_eq!(completion.id, 3);
                assert_eq!(completion.outcome, ExitOutcome::Success);
            }
            other => panic!("unexpected event {other:?}"),
        }
        drop(runner);
        assert!(rx.recv_timeout(Duration::from_secs(1)).is_err());
    }
}
