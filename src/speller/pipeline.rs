use std::io;
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline has no commands")]
    Empty,

    #[error("could not start `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("could not capture the output of `{program}`")]
    Pipe { program: String },
}

/// Failure of one stage, observed when the pipeline is waited on.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("`{program}` exited with {status}")]
    Exit { program: String, status: ExitStatus },

    #[error("could not wait for `{program}`: {error}")]
    Wait { program: String, error: io::Error },
}

/// A chain of external commands where each stage's stdout feeds the next
/// stage's stdin.
#[derive(Debug, Default)]
pub struct Pipeline {
    commands: Vec<Command>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Start every stage. The first stage reads from a null stdin, stderr of
    /// every stage is inherited, and the last stage's stdout is captured.
    ///
    /// If a later stage fails to start, the stages already running are
    /// killed and reaped before the error is returned.
    pub fn spawn(self) -> Result<RunningPipeline, PipelineError> {
        if self.commands.is_empty() {
            return Err(PipelineError::Empty);
        }

        let last = self.commands.len() - 1;
        let mut running = RunningPipeline {
            stages: Vec::with_capacity(self.commands.len()),
            stdout: None,
        };
        let mut upstream: Option<ChildStdout> = None;

        for (i, mut command) in self.commands.into_iter().enumerate() {
            let program = program_name(&command);
            let stdin = match upstream.take() {
                Some(out) => Stdio::from(out),
                None => Stdio::null(),
            };

            trace!("starting stage {}: {:?}", i, command);
            let mut child = command
                .stdin(stdin)
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .spawn()
                .map_err(|source| PipelineError::Spawn {
                    program: program.clone(),
                    source,
                })?;

            let stdout = child.stdout.take();
            running.stages.push(Stage {
                program: program.clone(),
                child,
            });
            let stdout = stdout.ok_or(PipelineError::Pipe { program })?;

            if i == last {
                running.stdout = Some(stdout);
            } else {
                upstream = Some(stdout);
            }
        }

        debug!("started pipeline of {} stage(s)", running.stages.len());
        Ok(running)
    }
}

struct Stage {
    program: String,
    child: Child,
}

/// Owns the child processes of a started [`Pipeline`].
///
/// Dropping it without calling [`RunningPipeline::wait`] kills and reaps
/// every stage that is still running.
pub struct RunningPipeline {
    stages: Vec<Stage>,
    stdout: Option<ChildStdout>,
}

impl RunningPipeline {
    /// Standard output of the last stage.
    pub fn stdout(&mut self) -> Option<&mut ChildStdout> {
        self.stdout.as_mut()
    }

    /// Close our end of the output pipe and wait for every stage, in order.
    /// Every failing stage is reported, not just the first.
    pub fn wait(mut self) -> Result<(), Vec<StageError>> {
        drop(self.stdout.take());

        let mut failures = Vec::new();
        for mut stage in self.stages.drain(..) {
            match stage.child.wait() {
                Ok(status) if status.success() => {
                    trace!("`{}` finished", stage.program);
                }
                Ok(status) => failures.push(StageError::Exit {
                    program: stage.program,
                    status,
                }),
                Err(error) => failures.push(StageError::Wait {
                    program: stage.program,
                    error,
                }),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }
}

impl Drop for RunningPipeline {
    fn drop(&mut self) {
        drop(self.stdout.take());
        for stage in &mut self.stages {
            if let Ok(None) = stage.child.try_wait() {
                debug!("killing `{}`", stage.program);
                let _ = stage.child.kill();
            }
            let _ = stage.child.wait();
        }
    }
}

fn program_name(command: &Command) -> String {
    command.get_program().to_string_lossy().into_owned()
}
