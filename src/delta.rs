//! Update intent: which fields to send and which to clear.
//!
//! Remote update calls leave omitted fields untouched, so clearing an
//! attribute needs an explicit deletion token. [`UpdateDelta`] compares plan
//! against state field by field:
//!
//! - plan unknown: nothing is sent
//! - plan known and different from state: the new value is sent
//! - plan null while state was set: the field's deletion token is recorded

use crate::value::{SetValue, Value};

/// Accumulated changes for one remote update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDelta<A> {
    deletions: Vec<A>,
    changed: bool,
}

impl<A> Default for UpdateDelta<A> {
    fn default() -> Self {
        Self {
            deletions: Vec::new(),
            changed: false,
        }
    }
}

impl<A: Copy + Ord> UpdateDelta<A> {
    /// No changes yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value to send for a field, if any.
    ///
    /// `token` names the field in the remote deletion list; fields without
    /// one cannot be cleared and are left alone when the plan drops them.
    pub fn field<T>(&mut self, plan: &Value<T>, state: &Value<T>, token: Option<A>) -> Option<T>
    where
        T: Clone + PartialEq,
    {
        self.field_with(plan, state, token, T::clone)
    }

    /// Like [`field`](Self::field), converting the sent value with `expand`.
    pub fn field_with<T, U>(
        &mut self,
        plan: &Value<T>,
        state: &Value<T>,
        token: Option<A>,
        expand: impl FnOnce(&T) -> U,
    ) -> Option<U>
    where
        T: PartialEq,
    {
        match plan {
            Value::Unknown => None,
            Value::Known(value) if state.as_known() == Some(value) => None,
            Value::Known(value) => {
                self.changed = true;
                Some(expand(value))
            },
            Value::Null => {
                if !state.is_null() {
                    if let Some(token) = token {
                        self.delete(token);
                    }
                }
                None
            },
        }
    }

    /// Record element-level deletions for a keyed set.
    ///
    /// Every state element whose key is absent from a known plan and maps to
    /// a token adds that token. Null and unknown plans add nothing here;
    /// whole-attribute clearing goes through [`field`](Self::field).
    pub fn removed_elements<T, K>(
        &mut self,
        plan: &SetValue<T>,
        state: &SetValue<T>,
        key: impl Fn(&T) -> Option<K>,
        token: impl Fn(&K) -> Option<A>,
    ) where
        K: PartialEq,
    {
        let (Value::Known(plan), Value::Known(state)) = (plan, state) else {
            return;
        };
        let planned: Vec<K> = plan.iter().filter_map(&key).collect();
        for removed in state.iter().filter_map(&key).filter(|k| !planned.contains(k)) {
            if let Some(token) = token(&removed) {
                self.delete(token);
            }
        }
    }

    /// Record a deletion token.
    pub fn delete(&mut self, token: A) {
        if !self.deletions.contains(&token) {
            self.deletions.push(token);
        }
    }

    /// Whether the update call would change nothing.
    pub fn is_empty(&self) -> bool {
        !self.changed && self.deletions.is_empty()
    }

    /// The deletion list, in token order.
    pub fn into_deletions(mut self) -> Vec<A> {
        self.deletions.sort();
        self.deletions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::model::StackAttribute;
    use crate::value::{Set, StringValue};

    fn s(v: &str) -> StringValue {
        Value::known(v.to_string())
    }

    #[test]
    fn test_field_intents() {
        let mut delta = UpdateDelta::new();

        assert_eq!(delta.field(&Value::Unknown, &s("a"), Some(StackAttribute::Description)), None);
        assert!(delta.is_empty());

        assert_eq!(delta.field(&s("a"), &s("a"), Some(StackAttribute::Description)), None);
        assert!(delta.is_empty());

        assert_eq!(
            delta.field(&s("b"), &s("a"), Some(StackAttribute::Description)),
            Some("b".to_string())
        );
        assert!(!delta.is_empty());

        assert_eq!(delta.field(&StringValue::Null, &s("v1"), Some(StackAttribute::RedirectUrl)), None);
        assert_eq!(delta.field(&StringValue::Null, &StringValue::Null, Some(StackAttribute::FeedbackUrl)), None);
        assert_eq!(delta.into_deletions(), vec![StackAttribute::RedirectUrl]);
    }

    #[test]
    fn test_clear_without_token_is_ignored() {
        let mut delta: UpdateDelta<StackAttribute> = UpdateDelta::new();
        assert_eq!(delta.field(&StringValue::Null, &s("x"), None), None);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_removed_elements() {
        let state: SetValue<String> = Set::from(vec!["HOMEFOLDERS".to_string(), "ONE_DRIVE".to_string()]).into();
        let plan: SetValue<String> = Set::from(vec!["HOMEFOLDERS".to_string()]).into();

        let mut delta = UpdateDelta::new();
        delta.removed_elements(&plan, &state, |c| Some(c.clone()), |k| StackAttribute::for_connector(k));
        assert_eq!(delta.into_deletions(), vec![StackAttribute::StorageConnectorOneDrive]);

        let mut delta: UpdateDelta<StackAttribute> = UpdateDelta::new();
        delta.removed_elements(&Value::Unknown, &state, |c| Some(c.clone()), |k| {
            StackAttribute::for_connector(k)
        });
        assert!(delta.is_empty());
    }

    #[test]
    fn test_deletions_deduplicated_and_sorted() {
        let mut delta = UpdateDelta::new();
        delta.delete(StackAttribute::DisplayName);
        delta.delete(StackAttribute::RedirectUrl);
        delta.delete(StackAttribute::DisplayName);
        assert_eq!(
            delta.into_deletions(),
            vec![StackAttribute::RedirectUrl, StackAttribute::DisplayName]
        );
    }
}
