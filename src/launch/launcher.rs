use log::{debug, info};
use serde::Serialize;
use std::process::{Command, Stdio};

use super::resolve::LaunchCommand;
use super::strategy::LaunchStrategy;
use crate::error::LaunchError;

#[cfg(windows)]
const DETACHED_PROCESS: u32 = 0x0000_0008;
#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

/// Everything a launcher needs to start one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchPlan {
    pub command: LaunchCommand,
    /// Empty means "inherit"
    pub working_dir: String,
    pub strategy: LaunchStrategy,
}

/// Starts resolved launch plans.
///
/// Launches are fire-and-forget: implementations must not wait for or track
/// the started program.
pub trait ProcessLauncher {
    fn launch(&self, plan: &LaunchPlan) -> Result<(), LaunchError>;
}

/// Launcher backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, plan: &LaunchPlan) -> Result<(), LaunchError> {
        let target = &plan.command.exec_path;

        match plan.strategy {
            LaunchStrategy::UriOpen => {
                info!("Opening {}", target);
                open::that_detached(target).map_err(|source| LaunchError::Open {
                    target: target.clone(),
                    source,
                })
            }
            LaunchStrategy::ShellSpawn => {
                // std runs .bat/.cmd through cmd.exe itself, with escaped arguments
                info!("Running script {} {:?}", target, plan.command.args);
                let mut command = Command::new(target);
                command.args(&plan.command.args);
                spawn_detached(&mut command, target, &plan.working_dir)
            }
            LaunchStrategy::DirectSpawn => {
                info!("Spawning {} {:?}", target, plan.command.args);
                let mut command = Command::new(target);
                command.args(&plan.command.args);
                spawn_detached(&mut command, target, &plan.working_dir)
            }
        }
    }
}

fn spawn_detached(command: &mut Command, program: &str, working_dir: &str) -> Result<(), LaunchError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    if !working_dir.is_empty() {
        command.current_dir(working_dir);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Own process group so the game outlives us
        command.process_group(0);
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    let child = command.spawn().map_err(|source| LaunchError::Spawn {
        program: program.to_string(),
        source,
    })?;
    debug!("Started {} as pid {}", program, child.id());

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn spawn_failure_is_reported() {
        let plan = LaunchPlan {
            command: LaunchCommand {
                exec_path: "/definitely/not/here/game-binary".to_string(),
                args: vec![],
            },
            working_dir: String::new(),
            strategy: LaunchStrategy::DirectSpawn,
        };

        match SystemLauncher.launch(&plan) {
            Err(LaunchError::Spawn { program, .. }) => {
                assert_eq!(program, "/definitely/not/here/game-binary")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn spawns_real_program_detached() {
        let dir = tempfile::tempdir().unwrap();
        let plan = LaunchPlan {
            command: LaunchCommand {
                exec_path: "true".to_string(),
                args: vec![],
            },
            working_dir: dir.path().to_string_lossy().into_owned(),
            strategy: LaunchStrategy::DirectSpawn,
        };

        SystemLauncher.launch(&plan).unwrap();
    }

    #[test]
    fn scripts_receive_arguments_verbatim() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("start.sh");
        let out = dir.path().join("out.txt");
        std::fs::write(&script, "#!/bin/sh\nprintf '%s' \"$1\" > \"$2\"\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let plan = LaunchPlan {
            command: LaunchCommand {
                exec_path: script.to_string_lossy().into_owned(),
                args: vec!["a & b | c".to_string(), out.to_string_lossy().into_owned()],
            },
            working_dir: String::new(),
            strategy: LaunchStrategy::ShellSpawn,
        };
        // A fresh script can briefly be ETXTBSY while other tests fork
        let mut attempts = 0;
        while let Err(e) = SystemLauncher.launch(&plan) {
            attempts += 1;
            assert!(attempts < 20, "script never started: {}", e);
            std::thread::sleep(Duration::from_millis(50));
        }

        let deadline = Instant::now() + Duration::from_secs(10);
        while !out.exists() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "a & b | c");
    }
}
