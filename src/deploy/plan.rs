//! Create-or-update planning.
//!
//! Planning is a pure function of the observed remote state, so the
//! create/update decision and its tagging rules are testable without a
//! provider.

use chrono::{DateTime, Utc};

use crate::aws::{RemoteStack, StackTag};

/// Tag recording who first created the stack.
pub const TAG_CREATED_BY: &str = "createdBy";

/// Tag recording when the stack was first created.
pub const TAG_CREATED_AT: &str = "createdAt";

/// Tag recording who last updated the stack.
pub const TAG_UPDATED_BY: &str = "updatedBy";

/// Tag recording when the stack was last updated.
pub const TAG_UPDATED_AT: &str = "updatedAt";

/// The planned provider action for a deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackAction {
    /// The stack is absent; create it with the given tags.
    Create {
        /// Tags for the new stack.
        tags: Vec<StackTag>,
    },
    /// The stack exists; update it with the given tags.
    Update {
        /// Prior tags preserved, update markers refreshed.
        tags: Vec<StackTag>,
    },
}

/// Plans the provider action for a deploy against observed remote state.
///
/// An absent stack yields a create tagged with `createdBy`/`createdAt`.
/// An existing stack yields an update that preserves every prior tag and
/// refreshes the `updatedBy`/`updatedAt` pair.
#[must_use]
pub fn plan_stack_action(
    existing: Option<&RemoteStack>,
    actor: &str,
    now: DateTime<Utc>,
) -> StackAction {
    let timestamp = now.to_rfc3339();

    existing.map_or_else(
        || StackAction::Create {
            tags: vec![
                tag(TAG_CREATED_BY, actor),
                tag(TAG_CREATED_AT, &timestamp),
            ],
        },
        |stack| {
            let mut tags: Vec<StackTag> = stack
                .tags
                .iter()
                .filter(|t| t.key != TAG_UPDATED_BY && t.key != TAG_UPDATED_AT)
                .cloned()
                .collect();
            tags.push(tag(TAG_UPDATED_BY, actor));
            tags.push(tag(TAG_UPDATED_AT, &timestamp));
            StackAction::Update { tags }
        },
    )
}

fn tag(key: &str, value: &str) -> StackTag {
    StackTag {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn remote_stack(tags: Vec<StackTag>) -> RemoteStack {
        RemoteStack {
            stack_id: "arn:aws:cloudformation:stack/Acme-api/1".to_string(),
            name: "Acme-api".to_string(),
            status: "CREATE_COMPLETE".to_string(),
            description: None,
            outputs: BTreeMap::new(),
            tags,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .expect("timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn test_absent_stack_plans_tagged_create() {
        let action = plan_stack_action(None, "strato/0.1.0", now());

        let StackAction::Create { tags } = action else {
            panic!("expected create");
        };
        assert!(tags.iter().any(|t| t.key == "createdBy" && t.value == "strato/0.1.0"));
        assert!(tags.iter().any(|t| t.key == "createdAt"));
    }

    #[test]
    fn test_existing_stack_plans_update_preserving_tags() {
        let existing = remote_stack(vec![
            tag("createdBy", "strato/0.0.9"),
            tag("createdAt", "2024-01-01T00:00:00+00:00"),
            tag("team", "platform"),
        ]);

        let action = plan_stack_action(Some(&existing), "strato/0.1.0", now());

        let StackAction::Update { tags } = action else {
            panic!("expected update");
        };
        // Prior tags survive untouched.
        assert!(tags.iter().any(|t| t.key == "createdBy" && t.value == "strato/0.0.9"));
        assert!(tags.iter().any(|t| t.key == "team" && t.value == "platform"));
        // The update pair is added.
        assert!(tags.iter().any(|t| t.key == "updatedBy" && t.value == "strato/0.1.0"));
        assert!(tags.iter().any(|t| t.key == "updatedAt"));
    }

    #[test]
    fn test_update_refreshes_stale_update_markers() {
        let existing = remote_stack(vec![
            tag("updatedBy", "strato/0.0.9"),
            tag("updatedAt", "2024-01-01T00:00:00+00:00"),
        ]);

        let action = plan_stack_action(Some(&existing), "strato/0.1.0", now());

        let StackAction::Update { tags } = action else {
            panic!("expected update");
        };
        let updated_by: Vec<_> = tags.iter().filter(|t| t.key == "updatedBy").collect();
        assert_eq!(updated_by.len(), 1);
        assert_eq!(updated_by[0].value, "strato/0.1.0");
    }
}
