// ABOUTME: Port allocation for grove worktrees
// ABOUTME: Scans each service class range, skipping registry reservations and ports bound on the host

pub mod probes;

use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use grove_core::{CommandRunner, Ports, Registry, ServiceClass};

pub use probes::{system_probes, BindProbe, LsofProbe, NetstatProbe, SocketTableProbe};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PortError {
    #[error("No free {class} ports available in range {min}-{max}. Free idle worktrees with `grove cleanup-bulk --stale <days>`")]
    Exhausted { class: ServiceClass, min: u16, max: u16 },

    #[error("{class} port {port} was taken after it was allocated")]
    Conflict { class: ServiceClass, port: u16 },
}

pub type Result<T> = std::result::Result<T, PortError>;

/// What a probe observed about one port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    InUse,
    Free,
    /// The probe could not tell (tool missing, permission denied)
    Unknown,
}

/// One way of observing whether a host port is bound
pub trait PortProbe: Send + Sync {
    fn name(&self) -> &'static str;
    fn probe(&self, port: u16) -> PortState;
}

pub struct PortAllocator {
    probes: Vec<Box<dyn PortProbe>>,
}

impl PortAllocator {
    pub fn new(probes: Vec<Box<dyn PortProbe>>) -> Self {
        Self { probes }
    }

    /// Allocator over every probe available on this machine
    pub fn with_system_probes(runner: Arc<dyn CommandRunner>) -> Self {
        Self::new(system_probes(runner))
    }

    /// True when any probe reports the port bound
    pub fn is_port_in_use(&self, port: u16) -> bool {
        self.probes.iter().any(|probe| {
            let in_use = probe.probe(port) == PortState::InUse;
            if in_use {
                debug!("Port {} reported in use by {} probe", port, probe.name());
            }
            in_use
        })
    }

    /// First port of the class range that is neither reserved nor bound
    pub fn find_free_port(&self, registry: &Registry, class: ServiceClass) -> Result<u16> {
        self.find_free_port_excluding(registry, class, &BTreeSet::new())
    }

    fn find_free_port_excluding(
        &self,
        registry: &Registry,
        class: ServiceClass,
        exclude: &BTreeSet<u16>,
    ) -> Result<u16> {
        let range = registry.port_range(class);
        let reserved = registry.used_ports(class);

        for port in range.min..=range.max {
            if reserved.contains(&port) || exclude.contains(&port) {
                continue;
            }
            if self.is_port_in_use(port) {
                continue;
            }
            debug!("Allocated {} port {}", class, port);
            return Ok(port);
        }

        Err(PortError::Exhausted {
            class,
            min: range.min,
            max: range.max,
        })
    }

    /// Allocate one port per class. Classes sharing a range never get the same port.
    pub fn find_all_ports(&self, registry: &Registry) -> Result<Ports> {
        let mut taken = BTreeSet::new();

        let frontend = self.find_free_port_excluding(registry, ServiceClass::Frontend, &taken)?;
        taken.insert(frontend);
        let backend = self.find_free_port_excluding(registry, ServiceClass::Backend, &taken)?;
        taken.insert(backend);
        let database = self.find_free_port_excluding(registry, ServiceClass::Database, &taken)?;

        let ports = Ports {
            frontend,
            backend,
            database,
        };
        info!("Allocated ports {}", ports);
        Ok(ports)
    }

    /// Re-check an allocated triple against the registry, and against the host
    /// for every class not listed in `skip_host_check_for`.
    pub fn validate_ports(
        &self,
        registry: &Registry,
        ports: &Ports,
        skip_host_check_for: &[ServiceClass],
    ) -> Result<()> {
        for class in ServiceClass::ALL {
            let port = ports.get(class);
            let reserved = registry.used_ports(class).contains(&port);
            let bound = !skip_host_check_for.contains(&class) && self.is_port_in_use(port);
            if reserved || bound {
                return Err(PortError::Conflict { class, port });
            }
        }
        Ok(())
    }
}
