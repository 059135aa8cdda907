// ABOUTME: Docker runtime tests against a scripted command runner
// ABOUTME: Checks start idempotence, creation arguments, readiness timeout and idempotent removal

use grove_containers::{ContainerError, ContainerRuntime, DockerRuntime, RemovalOutcome, StartOutcome};
use grove_core::{CommandOutput, CommandRunner, DatabaseConfig, HealthPolicy};
use pretty_assertions::assert_eq;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers by command-line prefix; each prefix has a queue whose last reply repeats
#[derive(Default)]
struct ScriptedRunner {
    replies: Mutex<Vec<(String, Vec<CommandOutput>)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    fn on(self, prefix: &str, replies: Vec<CommandOutput>) -> Self {
        self.replies.lock().unwrap().push((prefix.to_string(), replies));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }
}

impl CommandRunner for ScriptedRunner {
    fn output(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let line = format!("{} {}", program, args.join(" "));
        self.calls.lock().unwrap().push(line.clone());

        let mut replies = self.replies.lock().unwrap();
        for (prefix, queue) in replies.iter_mut() {
            if line.starts_with(prefix.as_str()) {
                return Ok(if queue.len() > 1 {
                    queue.remove(0)
                } else {
                    queue[0].clone()
                });
            }
        }
        Ok(CommandOutput::failed(1, format!("no script for: {}", line)))
    }
}

const DB: &str = "grove-db-wt-feature-x";

fn runtime(runner: Arc<ScriptedRunner>, attempts: u32) -> DockerRuntime {
    DockerRuntime::new(
        runner,
        DatabaseConfig::default(),
        HealthPolicy {
            attempts,
            interval: Duration::ZERO,
        },
    )
}

fn ps_running() -> String {
    format!("docker ps --filter name=^{}$ --filter status=running", DB)
}

fn ps_all() -> String {
    format!("docker ps -a --filter name=^{}$", DB)
}

#[test]
fn test_running_database_is_left_alone() {
    let runner = Arc::new(
        ScriptedRunner::default().on(&ps_running(), vec![CommandOutput::ok(format!("{}\n", DB))]),
    );
    let outcome = runtime(runner.clone(), 3).start_database("feature-x", 7432).unwrap();

    assert_eq!(outcome, StartOutcome::AlreadyRunning);
    assert!(!runner.called("docker run"));
    assert!(!runner.called("docker exec"));
}

#[test]
fn test_stopped_database_is_restarted() {
    let runner = Arc::new(
        ScriptedRunner::default()
            .on(&ps_running(), vec![CommandOutput::ok("")])
            .on(&ps_all(), vec![CommandOutput::ok(DB)])
            .on("docker start", vec![CommandOutput::ok(DB)])
            .on("docker exec", vec![CommandOutput::ok("accepting connections")]),
    );
    let outcome = runtime(runner.clone(), 3).start_database("feature-x", 7432).unwrap();

    assert_eq!(outcome, StartOutcome::Restarted);
    assert!(runner.called(&format!("docker start {}", DB)));
    assert!(!runner.called("docker run"));
}

#[test]
fn test_new_database_is_created_with_volume_and_health_check() {
    let runner = Arc::new(
        ScriptedRunner::default()
            .on("docker ps", vec![CommandOutput::ok("")])
            .on("docker run", vec![CommandOutput::ok("abc123")])
            .on(
                "docker exec",
                vec![
                    CommandOutput::failed(1, "no response"),
                    CommandOutput::failed(1, "no response"),
                    CommandOutput::ok("accepting connections"),
                ],
            ),
    );
    let outcome = runtime(runner.clone(), 5).start_database("feature-x", 7433).unwrap();
    assert_eq!(outcome, StartOutcome::Created);

    let calls = runner.calls();
    let run = calls.iter().find(|c| c.starts_with("docker run")).unwrap();
    assert_eq!(
        run,
        &format!(
            "docker run -d --name {db} -p 7433:5432 -e POSTGRES_USER=grove -e POSTGRES_PASSWORD=grove_dev \
             -e POSTGRES_DB=grove -v {db}:/var/lib/postgresql/data --health-cmd pg_isready -U grove -d grove \
             --health-interval 5s --health-timeout 5s --health-retries 10 postgres:16-alpine",
            db = DB
        )
    );
    assert_eq!(calls.iter().filter(|c| c.starts_with("docker exec")).count(), 3);
}

#[test]
fn test_database_not_ready_after_budget() {
    let runner = Arc::new(
        ScriptedRunner::default()
            .on("docker ps", vec![CommandOutput::ok("")])
            .on("docker run", vec![CommandOutput::ok("abc123")])
            .on("docker exec", vec![CommandOutput::failed(2, "no response")]),
    );
    let err = runtime(runner.clone(), 4)
        .start_database("feature-x", 7432)
        .unwrap_err();

    match &err {
        ContainerError::DatabaseNotReady { container, attempts } => {
            assert_eq!(container, DB);
            assert_eq!(*attempts, 4);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("docker logs grove-db-wt-feature-x"));
    assert_eq!(
        runner.calls().iter().filter(|c| c.starts_with("docker exec")).count(),
        4
    );
}

#[test]
fn test_failed_docker_run_is_an_error() {
    let runner = Arc::new(
        ScriptedRunner::default()
            .on("docker ps", vec![CommandOutput::ok("")])
            .on("docker run", vec![CommandOutput::failed(125, "port is already allocated")]),
    );
    let err = runtime(runner, 2).start_database("feature-x", 7432).unwrap_err();
    assert!(matches!(err, ContainerError::Exec(_)));
    assert!(err.to_string().contains("port is already allocated"));
}

#[test]
fn test_remove_missing_database_is_not_found() {
    let runner = Arc::new(
        ScriptedRunner::default()
            .on("docker ps", vec![CommandOutput::ok("")])
            .on("docker volume rm", vec![CommandOutput::ok("")]),
    );
    let outcome = runtime(runner.clone(), 1).remove_database("feature-x");

    assert_eq!(outcome, RemovalOutcome::NotFound);
    assert!(!runner.called("docker rm"));
    assert!(runner.called(&format!("docker volume rm -f {}", DB)));
}

#[test]
fn test_remove_running_database_stops_removes_and_drops_volume() {
    let runner = Arc::new(
        ScriptedRunner::default()
            .on(&ps_running(), vec![CommandOutput::ok(DB)])
            .on(&ps_all(), vec![CommandOutput::ok(DB)])
            .on("docker stop", vec![CommandOutput::ok(DB)])
            .on("docker rm -f", vec![CommandOutput::ok(DB)])
            .on("docker volume rm", vec![CommandOutput::ok(DB)]),
    );
    let outcome = runtime(runner.clone(), 1).remove_database("feature-x");

    assert_eq!(outcome, RemovalOutcome::Removed);
    let calls = runner.calls();
    let stop = calls.iter().position(|c| c.starts_with("docker stop")).unwrap();
    let rm = calls.iter().position(|c| c.starts_with("docker rm -f")).unwrap();
    let volume = calls.iter().position(|c| c.starts_with("docker volume rm")).unwrap();
    assert!(stop < rm && rm < volume);
}

#[test]
fn test_remove_reports_unreachable_daemon_as_failure() {
    let runner = Arc::new(
        ScriptedRunner::default().on(
            "docker ps",
            vec![CommandOutput::failed(1, "Cannot connect to the Docker daemon")],
        ),
    );
    let outcome = runtime(runner, 1).remove_app_container("feature-x");
    assert!(outcome.is_failure());
}

#[test]
fn test_list_database_containers_filters_prefix() {
    let runner = Arc::new(ScriptedRunner::default().on(
        "docker ps -a --filter name=grove-db-wt-",
        vec![CommandOutput::ok(
            "grove-db-wt-a\nmy-grove-db-wt-b\ngrove-db-wt-c\n",
        )],
    ));
    assert_eq!(
        runtime(runner, 1).list_database_containers(),
        vec!["grove-db-wt-a".to_string(), "grove-db-wt-c".to_string()]
    );
}

#[test]
fn test_daemon_availability() {
    let up = Arc::new(ScriptedRunner::default().on("docker info", vec![CommandOutput::ok("Server: ok")]));
    assert!(runtime(up, 1).is_available());

    let down = Arc::new(ScriptedRunner::default());
    assert!(!runtime(down, 1).is_available());
}
