//! Recording command runner for tests
//!
//! Never spawns anything. `flutter build` invocations materialize a small
//! output tree under their working directory so the archive step has
//! something to pack.

use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use super::subprocess::{CommandResult, CommandRunner, Invocation};

#[derive(Debug, Default)]
pub struct FakeRunner {
    calls: RefCell<Vec<Invocation>>,
    sent: RefCell<Vec<(String, Vec<u8>)>>,
    fail_program: Option<(String, i32)>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `program` exit with `code`
    pub fn failing(program: &str, code: i32) -> Self {
        Self {
            calls: RefCell::default(),
            sent: RefCell::default(),
            fail_program: Some((program.to_string(), code)),
        }
    }

    /// All invocations so far, in order
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Invocations of one program
    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls
            .borrow()
            .iter()
            .filter(|inv| inv.program == program)
            .cloned()
            .collect()
    }

    /// `(source path, contents)` of regular files handed to rsync
    ///
    /// Captured at call time, so scoped temporary files are still readable.
    pub fn sent_files(&self) -> Vec<(String, Vec<u8>)> {
        self.sent.borrow().clone()
    }

    fn capture_rsync_source(&self, invocation: &Invocation) {
        let n = invocation.args.len();
        if n < 2 {
            return;
        }
        let source = &invocation.args[n - 2];
        if let Ok(bytes) = std::fs::read(source) {
            self.sent.borrow_mut().push((source.clone(), bytes));
        }
    }

    fn simulate_flutter(invocation: &Invocation) -> Result<()> {
        let root = invocation.cwd.as_deref().unwrap_or_else(|| Path::new("."));
        let output = match invocation.args.get(1).map(String::as_str) {
            Some("web") => root.join("build/web"),
            Some("macos") => root.join("build/macos/Build/Products/Release/DataView.app"),
            _ => return Ok(()),
        };
        std::fs::create_dir_all(&output)?;
        std::fs::write(output.join("index.html"), "<html></html>")?;
        Ok(())
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandResult> {
        self.calls.borrow_mut().push(invocation.clone());

        if let Some((program, code)) = &self.fail_program {
            if *program == invocation.program {
                return Ok(CommandResult {
                    success: false,
                    exit_code: Some(*code),
                    duration: Duration::ZERO,
                });
            }
        }

        match invocation.program.as_str() {
            "flutter" => Self::simulate_flutter(invocation)?,
            "rsync" => self.capture_rsync_source(invocation),
            _ => {}
        }

        Ok(CommandResult {
            success: true,
            exit_code: Some(0),
            duration: Duration::ZERO,
        })
    }
}
