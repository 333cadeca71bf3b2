//! Commands run inside an environment to bring up the notebook server.

use std::net::Ipv6Addr;

use fleet_model::{ExecCommand, FleetConfig, NotebookConfig, WorkerSlot};

/// `pip install` of the bootstrap package.
pub fn bootstrap_command(nb: &NotebookConfig) -> ExecCommand {
    ExecCommand::new([
        nb.python.as_str(),
        "-m",
        "pip",
        "install",
        "--quiet",
        nb.bootstrap_package.as_str(),
    ])
}

/// Background server launch with output redirected to the slot log.
///
/// Terminals are forced to a login shell so notebooks see the user's profile.
pub fn server_command(cfg: &FleetConfig, slot: &WorkerSlot) -> ExecCommand {
    let nb = &cfg.notebook;
    let terminado = format!(
        "--NotebookApp.terminado_settings='{{\"shell_command\": [\"{}\",\"-l\"]}}'",
        nb.login_shell
    );
    let script = format!(
        "nohup {python} -m jupyterlab --ip={ip} --port={port} --allow-root {terminado} > {log} 2>&1 &",
        python = nb.python,
        ip = nb.bind_address,
        port = slot.notebook_port,
        log = slot.log_path(&nb.log_dir),
    );
    let cmd = ExecCommand::shell(script);
    if cfg.working_dir.is_empty() {
        cmd
    } else {
        cmd.with_workdir(cfg.working_dir.as_str())
    }
}

/// Server introspection that prints running servers with their tokens.
pub fn list_command(nb: &NotebookConfig) -> ExecCommand {
    ExecCommand::new([nb.python.as_str(), "-m", "jupyter", "lab", "list"])
}

pub fn tail_command(nb: &NotebookConfig, slot: &WorkerSlot) -> ExecCommand {
    ExecCommand::shell(format!(
        "tail -n {} {}",
        nb.log_tail_lines,
        slot.log_path(&nb.log_dir)
    ))
}

/// Notebook URL; IPv6 hosts are bracketed.
pub fn access_url(host: &str, port: u16, token: &str) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("http://[{host}]:{port}/?token={token}")
    } else {
        format!("http://{host}:{port}/?token={token}")
    }
}
