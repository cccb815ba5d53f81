use std::collections::HashSet;
use std::fmt;

use crate::assertion::AssertionRegistry;
use crate::http::Method;
use crate::parser::types::Suite;
use crate::runner::graph::DependencyGraph;

/// 静态检查发现的问题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub suite: String,
    pub request: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    fn new(suite: &str, request: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            suite: suite.to_string(),
            request: request.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.request {
            Some(request) => write!(f, "{} › {}: {}", self.suite, request, self.message),
            None => write!(f, "{}: {}", self.suite, self.message),
        }
    }
}

/// 不发送任何请求，检查套件定义
pub fn validate(suites: &[Suite], registry: &AssertionRegistry) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (suite_idx, suite) in suites.iter().enumerate() {
        let suite_label = if suite.name.trim().is_empty() {
            issues.push(ValidationIssue::new(
                &format!("#{}", suite_idx + 1),
                None,
                "suite is missing a 'name'",
            ));
            format!("#{}", suite_idx + 1)
        } else {
            suite.name.clone()
        };

        let mut seen = HashSet::new();
        for (req_idx, request) in suite.requests.iter().enumerate() {
            let label = if request.name.trim().is_empty() {
                issues.push(ValidationIssue::new(
                    &suite_label,
                    Some(&format!("#{}", req_idx + 1)),
                    "request is missing a 'name'",
                ));
                format!("#{}", req_idx + 1)
            } else {
                request.name.clone()
            };
            let label = Some(label.as_str());

            if !request.name.trim().is_empty() && !seen.insert(request.name.as_str()) {
                issues.push(ValidationIssue::new(
                    &suite_label,
                    label,
                    "duplicate request name; only the first definition runs",
                ));
            }

            if request.url.trim().is_empty() {
                issues.push(ValidationIssue::new(&suite_label, label, "missing 'url'"));
            }

            if Method::parse(&request.method).is_err() {
                issues.push(ValidationIssue::new(
                    &suite_label,
                    label,
                    format!(
                        "invalid HTTP method '{}' (allowed: GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS)",
                        request.method
                    ),
                ));
            }

            if request.timeout_ms == Some(0) {
                issues.push(ValidationIssue::new(
                    &suite_label,
                    label,
                    "'timeout_ms' must be positive",
                ));
            }

            for expectation in &request.expect {
                if !registry.contains(&expectation.kind) {
                    issues.push(ValidationIssue::new(
                        &suite_label,
                        label,
                        format!("unknown expectation type '{}'", expectation.kind),
                    ));
                }
            }
        }

        let graph = DependencyGraph::build(suite);
        for (idx, missing) in graph.dangling() {
            issues.push(ValidationIssue::new(
                &suite_label,
                Some(&graph.request(*idx).name),
                format!("depends on unknown request '{}'", missing),
            ));
        }
        for idx in graph.unschedulable() {
            issues.push(ValidationIssue::new(
                &suite_label,
                Some(&graph.request(idx).name),
                "part of, or blocked by, a dependency cycle",
            ));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Expectation, TestRequest};

    fn registry() -> AssertionRegistry {
        AssertionRegistry::with_builtins()
    }

    #[test]
    fn test_valid_suite_has_no_issues() {
        let suite = Suite::new("auth")
            .with_request(
                TestRequest::new("login", "POST", "http://localhost/login")
                    .expect(Expectation::new("status-equals").with_param("code", 200_i64)),
            )
            .with_request(TestRequest::new("me", "get", "http://localhost/me").depends_on("login"));

        assert!(validate(&[suite], &registry()).is_empty());
    }

    #[test]
    fn test_reports_each_problem() {
        let suite = Suite::new("broken")
            .with_request(TestRequest::new("a", "FETCH", ""))
            .with_request(TestRequest::new("a", "GET", "http://localhost"))
            .with_request(
                TestRequest::new("b", "GET", "http://localhost")
                    .depends_on("ghost")
                    .with_timeout_ms(0)
                    .expect(Expectation::new("no-such-check")),
            );

        let messages: Vec<String> = validate(&[suite], &registry())
            .iter()
            .map(ToString::to_string)
            .collect();

        assert!(messages.contains(&"broken › a: missing 'url'".to_string()));
        assert!(messages.iter().any(|m| m.contains("invalid HTTP method 'FETCH'")));
        assert!(messages.iter().any(|m| m.contains("duplicate request name")));
        assert!(messages.contains(&"broken › b: 'timeout_ms' must be positive".to_string()));
        assert!(messages.contains(&"broken › b: unknown expectation type 'no-such-check'".to_string()));
        assert!(messages.contains(&"broken › b: depends on unknown request 'ghost'".to_string()));
        assert_eq!(messages.len(), 6);
    }

    #[test]
    fn test_reports_cycles_and_missing_names() {
        let suite = Suite::new("")
            .with_request(TestRequest::new("a", "GET", "http://localhost").depends_on("b"))
            .with_request(TestRequest::new("b", "GET", "http://localhost").depends_on("a"))
            .with_request(TestRequest::new("", "GET", "http://localhost"));

        let issues = validate(&[suite], &registry());
        assert!(issues.iter().any(|i| i.message == "suite is missing a 'name'"));
        assert!(issues.iter().any(|i| i.request.as_deref() == Some("#3")));
        let cyclic: Vec<_> = issues
            .iter()
            .filter(|i| i.message.contains("cycle"))
            .filter_map(|i| i.request.clone())
            .collect();
        assert_eq!(cyclic, vec!["a", "b"]);
    }
}
