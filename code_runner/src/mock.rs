// src/mock.rs

//! In-memory [`ProcessExecutor`] that replays scripted responses.
//!
//! Responses are queued per program name and consumed in order. A response
//! may also create files, which is how a fake build "produces" its artifact.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::RunnerError;
use crate::executor::{CommandSpec, ProcessExecutor, ProcessOutput};

#[derive(Debug, Clone)]
pub enum Scripted {
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
        creates: Vec<PathBuf>,
    },
    Timeout,
    NotFound,
}

impl Scripted {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Scripted::Exit {
            code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            creates: Vec::new(),
        }
    }

    pub fn exit(code: i32, stdout: impl Into<String>) -> Self {
        Scripted::Exit {
            code,
            stdout: stdout.into(),
            stderr: String::new(),
            creates: Vec::new(),
        }
    }

    /// Adds a file the response creates (parents included) before returning.
    pub fn creating(mut self, path: impl Into<PathBuf>) -> Self {
        if let Scripted::Exit { creates, .. } = &mut self {
            creates.push(path.into());
        }
        self
    }

    pub fn with_stderr(mut self, text: impl Into<String>) -> Self {
        if let Scripted::Exit { stderr, .. } = &mut self {
            *stderr = text.into();
        }
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    responses: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    calls: Arc<Mutex<Vec<CommandSpec>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next invocation of `program`.
    pub fn script(&self, program: &str, response: Scripted) -> &Self {
        let mut map = self.responses.lock().unwrap();
        map.entry(program.to_string()).or_default().push_back(response);
        self
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }
}

#[async_trait]
impl ProcessExecutor for ScriptedExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput, RunnerError> {
        self.calls.lock().unwrap().push(spec.clone());

        let next = {
            let mut map = self.responses.lock().unwrap();
            map.get_mut(&spec.program).and_then(|q| q.pop_front())
        };

        match next.unwrap_or_else(|| Scripted::ok("")) {
            Scripted::Exit {
                code,
                stdout,
                stderr,
                creates,
            } => {
                for path in creates {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, b"")?;
                }
                Ok(ProcessOutput {
                    exit_code: Some(code),
                    stdout,
                    stderr,
                    truncated: false,
                })
            }
            Scripted::Timeout => Err(RunnerError::ProcessTimeout {
                program: spec.program.clone(),
                timeout: spec.timeout.unwrap_or(Duration::ZERO),
            }),
            Scripted::NotFound => Err(RunnerError::ToolInvocation {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
            }),
        }
    }
}
