//! Process handoff.
//!
//! On Unix the current process image is replaced with `execvp`, so the command
//! keeps our PID and inherits the environment as it stands after resolution.

use tracing::info;

use crate::error::{Error, Result};

/// Replace the current process with `argv`. Returns `Ok(())` without doing
/// anything when `argv` is empty; otherwise only returns on failure.
#[cfg(unix)]
pub fn exec_command(argv: &[String]) -> Result<()> {
    use std::ffi::CString;

    let Some(program) = argv.first() else {
        return Ok(());
    };

    let args = argv
        .iter()
        .map(|arg| {
            CString::new(arg.as_bytes()).map_err(|_| Error::Exec {
                program: program.clone(),
                reason: format!("argument {arg:?} contains a NUL byte"),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(program = %program, args = argv.len() - 1, "Executing command");
    match nix::unistd::execvp(&args[0], &args) {
        Ok(never) => match never {},
        Err(errno) => Err(Error::Exec {
            program: program.clone(),
            reason: errno.desc().to_string(),
        }),
    }
}

/// Without `exec`, run the command to completion and exit with its status.
#[cfg(not(unix))]
pub fn exec_command(argv: &[String]) -> Result<()> {
    let Some(program) = argv.first() else {
        return Ok(());
    };

    info!(program = %program, args = argv.len() - 1, "Running command");
    let status = std::process::Command::new(program)
        .args(&argv[1..])
        .status()
        .map_err(|e| Error::Exec {
            program: program.clone(),
            reason: e.to_string(),
        })?;
    std::process::exit(status.code().unwrap_or(1));
}
