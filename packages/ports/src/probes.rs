// ABOUTME: Host-level port probes backed by ss, lsof, netstat and a bind attempt
// ABOUTME: A probe only reports InUse on explicit evidence; missing tools yield Unknown

use std::io::ErrorKind;
use std::net::TcpListener;
use std::sync::Arc;
use tracing::debug;

use grove_core::CommandRunner;

use crate::{PortProbe, PortState};

/// Does any local-address column of a socket table end in `:<port>`?
///
/// `column` is the zero-based index of the local address field. Both `:` and
/// `.` are accepted as the port separator (`*.5173` is the BSD netstat form).
pub fn table_lists_port(table: &str, column: usize, port: u16) -> bool {
    let wanted = port.to_string();
    table.lines().any(|line| {
        line.split_whitespace()
            .nth(column)
            .and_then(|addr| addr.rsplit_once([':', '.']))
            .map(|(_, p)| p == wanted)
            .unwrap_or(false)
    })
}

/// `ss -tuln`
pub struct SocketTableProbe {
    runner: Arc<dyn CommandRunner>,
}

impl SocketTableProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl PortProbe for SocketTableProbe {
    fn name(&self) -> &'static str {
        "ss"
    }

    fn probe(&self, port: u16) -> PortState {
        match self.runner.run("ss", &["-tuln"]) {
            // Netid State Recv-Q Send-Q Local-Address:Port Peer-Address:Port
            Ok(table) if table_lists_port(&table, 4, port) => PortState::InUse,
            Ok(_) => PortState::Free,
            Err(e) => {
                debug!("ss probe unavailable: {}", e);
                PortState::Unknown
            }
        }
    }
}

/// `lsof -i :<port> -P -n`
pub struct LsofProbe {
    runner: Arc<dyn CommandRunner>,
}

impl LsofProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl PortProbe for LsofProbe {
    fn name(&self) -> &'static str {
        "lsof"
    }

    fn probe(&self, port: u16) -> PortState {
        let filter = format!(":{}", port);
        match self.runner.output("lsof", &["-i", &filter, "-P", "-n"]) {
            Ok(out) if out.success() && !out.stdout.trim().is_empty() => PortState::InUse,
            // lsof exits 1 when nothing matches
            Ok(out) if out.stdout.trim().is_empty() && out.stderr.trim().is_empty() => {
                PortState::Free
            }
            Ok(out) => {
                debug!("lsof probe inconclusive: {}", out.stderr.trim());
                PortState::Unknown
            }
            Err(e) => {
                debug!("lsof probe unavailable: {}", e);
                PortState::Unknown
            }
        }
    }
}

/// `netstat -tuln`
pub struct NetstatProbe {
    runner: Arc<dyn CommandRunner>,
}

impl NetstatProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl PortProbe for NetstatProbe {
    fn name(&self) -> &'static str {
        "netstat"
    }

    fn probe(&self, port: u16) -> PortState {
        match self.runner.run("netstat", &["-tuln"]) {
            // Proto Recv-Q Send-Q Local-Address Foreign-Address State
            Ok(table) if table_lists_port(&table, 3, port) => PortState::InUse,
            Ok(_) => PortState::Free,
            Err(e) => {
                debug!("netstat probe unavailable: {}", e);
                PortState::Unknown
            }
        }
    }
}

/// Try to bind the port on the loopback interface
#[derive(Debug, Default, Clone, Copy)]
pub struct BindProbe;

impl PortProbe for BindProbe {
    fn name(&self) -> &'static str {
        "bind"
    }

    fn probe(&self, port: u16) -> PortState {
        match TcpListener::bind(("127.0.0.1", port)) {
            Ok(_) => PortState::Free,
            Err(e) if e.kind() == ErrorKind::AddrInUse => PortState::InUse,
            Err(e) => {
                debug!("bind probe on {} inconclusive: {}", port, e);
                PortState::Unknown
            }
        }
    }
}

/// Every probe whose tool is installed, followed by the bind probe
pub fn system_probes(runner: Arc<dyn CommandRunner>) -> Vec<Box<dyn PortProbe>> {
    let mut probes: Vec<Box<dyn PortProbe>> = Vec::new();

    if which::which("ss").is_ok() {
        probes.push(Box::new(SocketTableProbe::new(runner.clone())));
    }
    if which::which("lsof").is_ok() {
        probes.push(Box::new(LsofProbe::new(runner.clone())));
    }
    if which::which("netstat").is_ok() {
        probes.push(Box::new(NetstatProbe::new(runner)));
    }
    probes.push(Box::new(BindProbe));

    debug!(
        "Port probes: {}",
        probes.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
    );
    probes
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_core::CommandOutput;
    use rstest::rstest;
    use std::io;

    const SS_OUTPUT: &str = "\
Netid State  Recv-Q Send-Q Local Address:Port  Peer Address:Port Process
udp   UNCONN 0      0      127.0.0.53%lo:53         0.0.0.0:*
tcp   LISTEN 0      511          0.0.0.0:51730      0.0.0.0:*
tcp   LISTEN 0      4096            [::]:3001          [::]:*
tcp   LISTEN 0      128        127.0.0.1:7432       0.0.0.0:*
";

    const NETSTAT_OUTPUT: &str = "\
Active Internet connections (only servers)
Proto Recv-Q Send-Q Local Address           Foreign Address         State
tcp        0      0 0.0.0.0:51730           0.0.0.0:*               LISTEN
tcp6       0      0 :::5174                 :::*                    LISTEN
";

    struct Fixed(io::Result<CommandOutput>);

    impl CommandRunner for Fixed {
        fn output(&self, _program: &str, _args: &[&str]) -> io::Result<CommandOutput> {
            match &self.0 {
                Ok(out) => Ok(out.clone()),
                Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
            }
        }
    }

    fn runner(result: io::Result<CommandOutput>) -> Arc<dyn CommandRunner> {
        Arc::new(Fixed(result))
    }

    #[rstest]
    #[case(51730, true)]
    #[case(5173, false)]
    #[case(3001, true)]
    #[case(7432, true)]
    #[case(53, true)]
    #[case(300, false)]
    fn test_ss_table_matches_whole_port(#[case] port: u16, #[case] expected: bool) {
        assert_eq!(table_lists_port(SS_OUTPUT, 4, port), expected);
    }

    #[rstest]
    #[case(5174, true)]
    #[case(5173, false)]
    #[case(51730, true)]
    fn test_netstat_table(#[case] port: u16, #[case] expected: bool) {
        assert_eq!(table_lists_port(NETSTAT_OUTPUT, 3, port), expected);
    }

    #[test]
    fn test_bsd_style_address() {
        let table = "tcp4  0  0  *.5173  *.*  LISTEN";
        assert!(table_lists_port(table, 3, 5173));
    }

    #[test]
    fn test_ss_probe_states() {
        let probe = SocketTableProbe::new(runner(Ok(CommandOutput::ok(SS_OUTPUT))));
        assert_eq!(probe.probe(3001), PortState::InUse);
        assert_eq!(probe.probe(5173), PortState::Free);

        let missing = SocketTableProbe::new(runner(Err(io::Error::new(
            io::ErrorKind::NotFound,
            "no ss",
        ))));
        assert_eq!(missing.probe(3001), PortState::Unknown);
    }

    #[test]
    fn test_lsof_probe_states() {
        let busy = LsofProbe::new(runner(Ok(CommandOutput::ok(
            "COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME\nnode 42 me 20u IPv4 0t0 TCP *:5173 (LISTEN)\n",
        ))));
        assert_eq!(busy.probe(5173), PortState::InUse);

        let free = LsofProbe::new(runner(Ok(CommandOutput::failed(1, ""))));
        assert_eq!(free.probe(5173), PortState::Free);

        let denied = LsofProbe::new(runner(Ok(CommandOutput::failed(1, "lsof: permission denied"))));
        assert_eq!(denied.probe(5173), PortState::Unknown);
    }

    #[test]
    fn test_netstat_probe_failure_is_unknown() {
        let probe = NetstatProbe::new(runner(Ok(CommandOutput::failed(
            64,
            "netstat: option requires an argument",
        ))));
        assert_eq!(probe.probe(5174), PortState::Unknown);
    }

    #[test]
    fn test_bind_probe_detects_listener() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        assert_eq!(BindProbe.probe(port), PortState::InUse);

        drop(listener);
        assert_ne!(BindProbe.probe(port), PortState::InUse);
    }
}
