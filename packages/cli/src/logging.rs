// ABOUTME: tracing subscriber setup for the grove binary
// ABOUTME: Logs go to stderr so command output on stdout stays machine-readable

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

/// Filter directive for this run: `--debug` wins, then GROVE_LOG/RUST_LOG, then `warn`
pub fn filter_directive(debug: bool, configured: Option<&str>) -> String {
    if debug {
        return "debug".to_string();
    }
    configured.unwrap_or(DEFAULT_FILTER).to_string()
}

pub fn init(debug: bool, configured: Option<&str>) {
    let directive = filter_directive(debug, configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(false, None, "warn")]
    #[case(false, Some("grove_worktrees=info"), "grove_worktrees=info")]
    #[case(true, Some("error"), "debug")]
    #[case(true, None, "debug")]
    fn test_filter_directive(
        #[case] debug: bool,
        #[case] configured: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(filter_directive(debug, configured), expected);
    }
}
