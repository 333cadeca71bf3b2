use fleet_core::EngineError;
use fleet_model::{EnvironmentSpec, ExecCommand};

/// `docker run` arguments creating and starting `spec` in the background.
pub fn run_args(spec: &EnvironmentSpec) -> Vec<String> {
    let mut args: Vec<String> = vec!["run".into(), "-d".into(), "--name".into(), spec.name.clone()];
    if spec.tty {
        args.push("-t".into());
    }
    for dev in &spec.devices {
        args.push("--device".into());
        args.push(dev.as_cli_arg());
    }
    for bind in &spec.binds {
        args.push("-v".into());
        args.push(bind.clone());
    }
    for kv in spec.env.iter() {
        args.push("-e".into());
        args.push(kv.as_assignment());
    }
    push_each(&mut args, "--group-add", &spec.group_add);
    push_each(&mut args, "--security-opt", &spec.security_opt);
    push_each(&mut args, "--cap-add", &spec.cap_add);
    push_opt(&mut args, "--ipc", spec.ipc_mode.as_deref());
    push_opt(&mut args, "--network", spec.network_mode.as_deref());
    push_opt(&mut args, "-w", spec.working_dir.as_deref());
    args.push(spec.image.clone());
    args
}

pub fn exec_args(name: &str, cmd: &ExecCommand, detach: bool) -> Vec<String> {
    let mut args: Vec<String> = vec!["exec".into()];
    if detach {
        args.push("-d".into());
    }
    push_opt(&mut args, "-w", cmd.workdir.as_deref());
    args.push(name.to_string());
    args.extend(cmd.argv.iter().cloned());
    args
}

fn push_each(args: &mut Vec<String>, flag: &str, values: &[String]) {
    for v in values {
        args.push(flag.to_string());
        args.push(v.clone());
    }
}

fn push_opt(args: &mut Vec<String>, flag: &str, value: Option<&str>) {
    if let Some(v) = value {
        args.push(flag.to_string());
        args.push(v.to_string());
    }
}

/// Engine-level error recognised in the client's stderr, if any.
///
/// `target` is the image for `run` and the environment name otherwise.
pub fn classify_stderr(target: &str, stderr: &str) -> Option<EngineError> {
    let lower = stderr.to_ascii_lowercase();
    if lower.contains("unable to find image")
        || lower.contains("no such image")
        || lower.contains("pull access denied")
        || lower.contains("manifest unknown")
    {
        return Some(EngineError::ImageMissing {
            image: target.to_string(),
        });
    }
    if lower.contains("is already in use") {
        return Some(EngineError::Api {
            reason: stderr.trim().to_string(),
        });
    }
    if lower.contains("no such container") {
        return Some(EngineError::NotFound {
            name: target.to_string(),
        });
    }
    if lower.contains("is not running") {
        return Some(EngineError::NotRunning {
            name: target.to_string(),
        });
    }
    if lower.contains("cannot connect to the docker daemon") {
        return Some(EngineError::Unavailable {
            reason: stderr.trim().to_string(),
        });
    }
    None
}

/// Error for a failed `docker run`.
///
/// Unrecognised failures mean the container was created but did not start.
pub fn run_error(image: &str, stderr: &str) -> EngineError {
    match classify_stderr(image, stderr) {
        Some(
            e @ (EngineError::ImageMissing { .. }
            | EngineError::Unavailable { .. }
            | EngineError::Api { .. }),
        ) => e,
        _ => EngineError::LaunchFailed {
            reason: stderr.to_string(),
        },
    }
}
