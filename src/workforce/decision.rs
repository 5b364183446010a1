//! Parsing of the classifier's free-text routing reply.
//!
//! The classification call returns one opaque blob of text. This module turns
//! it into a structured [`RoutingDecision`] using a small line-oriented
//! grammar:
//!
//! ```text
//! SINGLE: <specialist name>
//!
//! MULTI: <name> -> <name> -> <name>
//! WORKFLOW: <one-line plan>
//!
//! NONE: <why no specialist fits>
//! ```
//!
//! The free-text protocol between this parser and the hosted classifier is
//! inherently fragile (models drift, add commentary, reorder lines), so the
//! parser is deliberately tolerant: it scans line by line for the first
//! recognized prefix and ignores any surrounding chatter. Prefixes are
//! case-sensitive. As a legacy compatibility path, a reply that consists of
//! nothing but an exact registered specialist name is accepted as a single
//! dispatch. Everything else becomes [`RoutingDecision::Malformed`], carrying
//! the original text for diagnostic display.
//!
//! # Example
//!
//! ```rust
//! use workforce::decision::{DecisionParser, RoutingDecision};
//! use workforce::specialist::SpecialistRoster;
//!
//! let parser = DecisionParser::new(&SpecialistRoster::default_roster());
//!
//! let decision = parser.parse("SINGLE: Content Writer");
//! assert_eq!(
//!     decision,
//!     RoutingDecision::Single { agent: "Content Writer".to_string() }
//! );
//! ```

use crate::workforce::specialist::SpecialistRoster;

/// Description used when a `MULTI:` line has no accompanying `WORKFLOW:` line.
pub const DEFAULT_WORKFLOW_DESCRIPTION: &str = "Multi-step workflow";

/// The parsed, structured form of the classifier's free-text reply.
///
/// Produced fresh per request and never persisted directly; only the
/// [`RoutingDecision::label`] projection ends up in the history store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Exactly one specialist should handle the task.
    Single {
        /// Name of the chosen specialist.
        agent: String,
    },
    /// An ordered chain of specialists, each seeing prior outputs.
    Multi {
        /// Chain members in execution order.
        agents: Vec<String>,
        /// One-line plan for the workflow.
        description: String,
    },
    /// The classifier found no suitable specialist.
    None {
        /// The classifier's explanation.
        message: String,
    },
    /// The reply matched no grammar case and no registered name.
    Malformed {
        /// The original reply, verbatim, for diagnostic display.
        raw_text: String,
    },
}

impl RoutingDecision {
    /// The route label to persist for this decision.
    ///
    /// Single dispatches persist the specialist name, chains persist a
    /// summary string, and everything else persists the `"None"` sentinel;
    /// raw malformed text is never stored as a label.
    pub fn label(&self) -> String {
        match self {
            RoutingDecision::Single { agent } => agent.clone(),
            RoutingDecision::Multi { agents, .. } => {
                format!("Multi-agent workflow: {}", agents.join(" -> "))
            }
            RoutingDecision::None { .. } | RoutingDecision::Malformed { .. } => {
                "None".to_string()
            }
        }
    }
}

/// Parser for classifier replies, configured with the known specialist names.
///
/// The name list is only consulted for the legacy bare-name fallback; the
/// prefixed grammar cases accept any agent text and leave existence checks to
/// the orchestrator.
pub struct DecisionParser {
    known_agents: Vec<String>,
}

impl DecisionParser {
    /// Build a parser over the names registered in `roster`.
    pub fn new(roster: &SpecialistRoster) -> Self {
        Self {
            known_agents: roster.names().iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Parse one classifier reply. Deterministic given its input.
    pub fn parse(&self, raw_text: &str) -> RoutingDecision {
        let lines: Vec<&str> = raw_text.lines().collect();

        for (i, line) in lines.iter().enumerate() {
            let line = line.trim_start();

            if let Some(rest) = line.strip_prefix("SINGLE:") {
                return RoutingDecision::Single {
                    agent: rest.trim().to_string(),
                };
            }

            if let Some(rest) = line.strip_prefix("MULTI:") {
                let agents: Vec<String> = rest
                    .split("->")
                    .map(|token| token.trim().to_string())
                    .filter(|token| !token.is_empty())
                    .collect();
                if agents.is_empty() {
                    return RoutingDecision::Malformed {
                        raw_text: raw_text.to_string(),
                    };
                }

                let description = lines[i + 1..]
                    .iter()
                    .find_map(|l| l.trim_start().strip_prefix("WORKFLOW:"))
                    .map(|rest| rest.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| DEFAULT_WORKFLOW_DESCRIPTION.to_string());

                return RoutingDecision::Multi {
                    agents,
                    description,
                };
            }

            if let Some(rest) = line.strip_prefix("NONE:") {
                return RoutingDecision::None {
                    message: rest.trim().to_string(),
                };
            }
        }

        // Legacy replies contained nothing but the chosen specialist's name.
        let trimmed = raw_text.trim();
        if self.known_agents.iter().any(|name| name == trimmed) {
            return RoutingDecision::Single {
                agent: trimmed.to_string(),
            };
        }

        RoutingDecision::Malformed {
            raw_text: raw_text.to_string(),
        }
    }
}
