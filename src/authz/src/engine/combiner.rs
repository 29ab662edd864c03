//! Strategies for reducing per-policy decisions into one final decision
//!
//! Decisions arrive in policy registration order. Only [`PriorityBased`]
//! looks at priorities.

use super::decision::Decision;

/// Reduces the decisions of all applicable policies into one
pub trait PolicyCombiner: Send + Sync {
    /// Strategy name; the engine records it under the `combiner` key of
    /// every combined decision
    fn name(&self) -> &str;

    fn combine(&self, decisions: Vec<Decision>) -> Decision;
}

/// Default strategy: the first denial wins, otherwise allow
#[derive(Debug, Default, Clone, Copy)]
pub struct AllMustAllow;

impl PolicyCombiner for AllMustAllow {
    fn name(&self) -> &str {
        "all_must_allow"
    }

    fn combine(&self, decisions: Vec<Decision>) -> Decision {
        decisions
            .into_iter()
            .find(|decision| !decision.allow)
            .unwrap_or_else(|| Decision::allow("All policies allow access"))
    }
}

/// The first allow wins, otherwise the last denial is reported
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyCanAllow;

impl PolicyCombiner for AnyCanAllow {
    fn name(&self) -> &str {
        "any_can_allow"
    }

    fn combine(&self, decisions: Vec<Decision>) -> Decision {
        let mut last_denial = None;
        for decision in decisions {
            if decision.allow {
                return decision;
            }
            last_denial = Some(decision);
        }

        last_denial.unwrap_or_else(|| Decision::deny("No policy allows access"))
    }
}

/// The highest-priority decision is returned verbatim. Ties keep
/// registration order.
#[derive(Debug, Default, Clone, Copy)]
pub struct PriorityBased;

impl PolicyCombiner for PriorityBased {
    fn name(&self) -> &str {
        "priority_based"
    }

    fn combine(&self, mut decisions: Vec<Decision>) -> Decision {
        // stable sort
        decisions.sort_by(|a, b| b.priority.cmp(&a.priority));
        decisions
            .into_iter()
            .next()
            .unwrap_or_else(|| Decision::deny("No decisions to combine"))
    }
}
