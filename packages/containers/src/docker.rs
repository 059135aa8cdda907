// ABOUTME: Docker CLI implementation of the container runtime
// ABOUTME: Runs postgres per worktree with a named volume and polls pg_isready until it answers

use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

use grove_core::constants::{DB_CONTAINER_PORT, DB_CONTAINER_PREFIX};
use grove_core::{
    app_container_name, db_container_name, CommandRunner, DatabaseConfig, ExecError, HealthPolicy,
};

use crate::{ContainerError, ContainerRuntime, RemovalOutcome, Result, StartOutcome};

const DOCKER: &str = "docker";

pub struct DockerRuntime {
    runner: Arc<dyn CommandRunner>,
    database: DatabaseConfig,
    health: HealthPolicy,
}

impl DockerRuntime {
    pub fn new(runner: Arc<dyn CommandRunner>, database: DatabaseConfig, health: HealthPolicy) -> Self {
        Self {
            runner,
            database,
            health,
        }
    }

    /// `docker ps` filtered to one exact name
    fn query_name(&self, name: &str, running_only: bool) -> std::result::Result<bool, ExecError> {
        let name_filter = format!("name=^{}$", name);
        let mut args = vec!["ps"];
        if !running_only {
            args.push("-a");
        }
        args.extend(["--filter", name_filter.as_str()]);
        if running_only {
            args.extend(["--filter", "status=running"]);
        }
        args.extend(["--format", "{{.Names}}"]);

        let names = self.runner.run(DOCKER, &args)?;
        Ok(names.lines().any(|line| line.trim() == name))
    }

    fn pg_isready_args(&self) -> [String; 4] {
        [
            "-U".to_string(),
            self.database.user.clone(),
            "-d".to_string(),
            self.database.database.clone(),
        ]
    }

    fn create_database(&self, name: &str, port: u16) -> Result<()> {
        let publish = format!("{}:{}", port, DB_CONTAINER_PORT);
        let user = format!("POSTGRES_USER={}", self.database.user);
        let password = format!("POSTGRES_PASSWORD={}", self.database.password);
        let db = format!("POSTGRES_DB={}", self.database.database);
        // Volume shares the container name
        let volume = format!("{}:/var/lib/postgresql/data", name);
        let health_cmd = format!("pg_isready {}", self.pg_isready_args().join(" "));

        self.runner.run(
            DOCKER,
            &[
                "run",
                "-d",
                "--name",
                name,
                "-p",
                &publish,
                "-e",
                &user,
                "-e",
                &password,
                "-e",
                &db,
                "-v",
                &volume,
                "--health-cmd",
                &health_cmd,
                "--health-interval",
                "5s",
                "--health-timeout",
                "5s",
                "--health-retries",
                "10",
                &self.database.image,
            ],
        )?;
        Ok(())
    }

    /// Poll `pg_isready` inside the container within the attempt budget
    fn wait_until_ready(&self, name: &str) -> Result<()> {
        let readiness = self.pg_isready_args();
        let mut args = vec!["exec", name, "pg_isready"];
        args.extend(readiness.iter().map(String::as_str));

        info!("Waiting for database {} to become ready", name);
        for attempt in 1..=self.health.attempts {
            if self.runner.run(DOCKER, &args).is_ok() {
                info!("Database {} is ready", name);
                return Ok(());
            }
            debug!(
                "Database {} not ready (attempt {}/{})",
                name, attempt, self.health.attempts
            );
            if attempt < self.health.attempts {
                thread::sleep(self.health.interval);
            }
        }

        Err(ContainerError::DatabaseNotReady {
            container: name.to_string(),
            attempts: self.health.attempts,
        })
    }

    /// Stop and force-remove `name`; drop the same-named volume when asked
    fn remove_named(&self, name: &str, with_volume: bool) -> RemovalOutcome {
        let existed = match self.query_name(name, false) {
            Ok(existed) => existed,
            Err(e) => return RemovalOutcome::Failed(e.to_string()),
        };

        if existed {
            if self.query_name(name, true).unwrap_or(false) {
                // rm -f below still removes it if the stop fails
                let _ = self.runner.run_safe(DOCKER, &["stop", name]);
            }
            if let Err(e) = self.runner.run(DOCKER, &["rm", "-f", name]) {
                warn!("Failed to remove container {}: {}", name, e);
                return RemovalOutcome::Failed(e.to_string());
            }
        }

        if with_volume {
            let _ = self.runner.run_safe(DOCKER, &["volume", "rm", "-f", name]);
        }

        if existed {
            info!("Removed container {}", name);
            RemovalOutcome::Removed
        } else {
            debug!("Container {} was already removed", name);
            RemovalOutcome::NotFound
        }
    }
}

impl ContainerRuntime for DockerRuntime {
    fn is_available(&self) -> bool {
        self.runner.run_safe(DOCKER, &["info"]).is_some()
    }

    fn exists(&self, name: &str) -> bool {
        self.query_name(name, false).unwrap_or(false)
    }

    fn is_running(&self, name: &str) -> bool {
        self.query_name(name, true).unwrap_or(false)
    }

    fn start_database(&self, id: &str, port: u16) -> Result<StartOutcome> {
        let name = db_container_name(id);

        if self.query_name(&name, true)? {
            debug!("Database container {} already running", name);
            return Ok(StartOutcome::AlreadyRunning);
        }

        let outcome = if self.query_name(&name, false)? {
            info!("Starting existing database container {}", name);
            self.runner.run(DOCKER, &["start", &name])?;
            StartOutcome::Restarted
        } else {
            info!("Creating database container {} on port {}", name, port);
            self.create_database(&name, port)?;
            StartOutcome::Created
        };

        self.wait_until_ready(&name)?;
        Ok(outcome)
    }

    fn remove_database(&self, id: &str) -> RemovalOutcome {
        self.remove_named(&db_container_name(id), true)
    }

    fn remove_app_container(&self, id: &str) -> RemovalOutcome {
        self.remove_named(&app_container_name(id), false)
    }

    fn list_database_containers(&self) -> Vec<String> {
        let filter = format!("name={}", DB_CONTAINER_PREFIX);
        match self
            .runner
            .run(DOCKER, &["ps", "-a", "--filter", &filter, "--format", "{{.Names}}"])
        {
            Ok(names) => names
                .lines()
                .map(str::trim)
                .filter(|name| name.starts_with(DB_CONTAINER_PREFIX))
                .map(String::from)
                .collect(),
            Err(e) => {
                debug!("Could not list database containers: {}", e);
                Vec::new()
            }
        }
    }
}
