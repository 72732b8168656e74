//! Timeout configuration and enforcement tests.

use std::time::Duration;

use concord::core::Panel;

#[test]
fn test_advisor_timeout_override() {
    let yaml = r#"
name: timeout_test
description: Panel with timeouts

advisor_timeout_seconds: 5

advisors:
  - id: fast
    role: quick take
    kind: static
    analysis: ok
    timeout_seconds: 2
"#;

    let panel = Panel::from_yaml(yaml).unwrap();

    // Panel default is 5 seconds
    assert_eq!(panel.advisor_timeout_seconds, 5);

    // Advisor-specific override is 2 seconds
    let timeout = panel.advisors[0].timeout(&panel);
    assert_eq!(timeout, Duration::from_secs(2));
}

#[test]
fn test_advisor_timeout_fallback_to_panel() {
    let yaml = r#"
name: timeout_test
description: Panel with only a panel-level timeout

advisor_timeout_seconds: 30

advisors:
  - id: no_override
    role: quick take
    kind: static
    analysis: ok
"#;

    let panel = Panel::from_yaml(yaml).unwrap();

    let timeout = panel.advisors[0].timeout(&panel);
    assert_eq!(timeout, Duration::from_secs(30));
}

#[test]
fn test_default_timeouts() {
    let yaml = r#"
name: defaults
advisors:
  - id: a
    role: r
    kind: static
    analysis: ok
"#;

    let panel = Panel::from_yaml(yaml).unwrap();

    assert_eq!(panel.advisor_timeout_seconds, 30);
    assert_eq!(panel.synthesis_timeout_seconds, 45);
    assert_eq!(panel.synthesis_timeout(), Duration::from_secs(45));
}

#[test]
fn test_timeout_yaml_parsing() {
    let yaml = r#"
name: custom_timeouts
description: Panel with custom timeouts

advisor_timeout_seconds: 120
synthesis_timeout_seconds: 15

thresholds:
  budget_relative_diff: 0.9

advisors:
  - id: one
    role: role one
    kind: subprocess
    command: advisor-cli
    timeout_seconds: 10

  - id: two
    role: role two
    kind: http
    endpoint: http://localhost:8085/analyze
"#;

    let panel = Panel::from_yaml(yaml).unwrap();

    assert_eq!(panel.advisor_timeout_seconds, 120);
    assert_eq!(panel.synthesis_timeout_seconds, 15);
    assert_eq!(panel.advisors[0].timeout_seconds, Some(10));
    assert_eq!(panel.advisors[1].timeout_seconds, None);
    assert!((panel.thresholds.budget_relative_diff - 0.9).abs() < 1e-9);
}

#[tokio::test]
async fn test_timeout_enforcement_simulation() {
    use std::time::Instant;

    // A quick operation completes within its budget
    let start = Instant::now();
    let timeout = Duration::from_millis(100);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(start.elapsed() < timeout);
}

#[tokio::test]
async fn test_slow_advisor_is_substituted() {
    use concord::adapters::StaticAdvisor;
    use concord::core::panel::PanelMember;
    use concord::core::{
        ConflictDetector, DecisionBuilder, KeywordSignalExtractor, MemorySessionStore,
        Orchestrator,
    };
    use concord::domain::SessionState;
    use std::sync::Arc;

    let members = vec![PanelMember {
        advisor: Arc::new(
            StaticAdvisor::new("slow", "slow role", "Never arrives.", 0.9)
                .with_delay(Duration::from_millis(300)),
        ),
        timeout: Duration::from_millis(30),
        context: String::new(),
    }];

    let orch = Orchestrator::new(
        members,
        Arc::new(KeywordSignalExtractor::default()),
        ConflictDetector::default(),
        DecisionBuilder::fallback_only(),
        Arc::new(MemorySessionStore::new()),
        0.7,
    );

    let session = orch.run("query").await;

    assert_eq!(session.state, SessionState::Completed);
    let result = &session.advisor_results["slow"];
    assert!(result.failed);
    assert_eq!(result.confidence, 0.0);
    assert!(result.analysis_text.contains("timed out"));
}
