//! Tri-state attribute values.
//!
//! Every attribute the host exchanges with the provider is either *known*
//! (a concrete value), *unknown* (to be determined during apply) or *null*
//! (absent). [`Value`] models that as a sum type; there is no implicit
//! coercion between the three and downstream code pattern-matches.
//!
//! # Wire format
//!
//! Records travel as JSON objects. `null` or a missing key decodes to
//! [`Value::Null`], the string [`UNKNOWN_VALUE`] decodes to
//! [`Value::Unknown`] at any type, and everything else must decode into `T`.
//!
//! # Read rules
//!
//! How a remote value lands in state depends on who owns the attribute, see
//! [`ReadRule`]. Shapes implement [`Flatten`] once and the rule is chosen per
//! attribute.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::diagnostics::Diagnostics;

/// Sentinel the host uses for values that are not known until apply.
pub const UNKNOWN_VALUE: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

/// A tri-state attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value<T> {
    /// The attribute is absent.
    #[default]
    Null,
    /// The attribute will be determined later.
    Unknown,
    /// A concrete value.
    Known(T),
}

/// String attribute.
pub type StringValue = Value<String>;
/// 32-bit integer attribute.
pub type Int32Value = Value<i32>;
/// Boolean attribute.
pub type BoolValue = Value<bool>;
/// Unordered collection attribute.
pub type SetValue<T> = Value<Set<T>>;
/// String-keyed map attribute.
pub type MapValue<T> = Value<BTreeMap<String, T>>;

impl<T> Value<T> {
    /// The null value.
    pub fn null() -> Self {
        Self::Null
    }

    /// The unknown value.
    pub fn unknown() -> Self {
        Self::Unknown
    }

    /// A known value.
    pub fn known(value: T) -> Self {
        Self::Known(value)
    }

    /// Whether the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the value is unknown.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Whether the value is known.
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// The known value, if any.
    pub fn as_known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            _ => None,
        }
    }

    /// Take the known value, if any.
    pub fn into_known(self) -> Option<T> {
        match self {
            Self::Known(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the inner value.
    pub fn as_ref(&self) -> Value<&T> {
        match self {
            Self::Null => Value::Null,
            Self::Unknown => Value::Unknown,
            Self::Known(value) => Value::Known(value),
        }
    }

    /// Map the known value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Value<U> {
        match self {
            Self::Null => Value::Null,
            Self::Unknown => Value::Unknown,
            Self::Known(value) => Value::Known(f(value)),
        }
    }

    /// `None` becomes null.
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Known)
    }
}

impl<T: Clone> Value<T> {
    /// Clone out the known value; null and unknown become `None`.
    pub fn known_cloned(&self) -> Option<T> {
        self.as_known().cloned()
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(value: Option<T>) -> Self {
        Self::from_option(value)
    }
}

impl From<&str> for Value<String> {
    fn from(value: &str) -> Self {
        Self::Known(value.to_owned())
    }
}

impl<T: fmt::Display> fmt::Display for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Unknown => f.write_str("(known after apply)"),
            Self::Known(value) => value.fmt(f),
        }
    }
}

impl<T: Serialize> Serialize for Value<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Unknown => serializer.serialize_str(UNKNOWN_VALUE),
            Self::Known(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Value<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::String(s) if s == UNKNOWN_VALUE => Ok(Self::Unknown),
            raw => serde_json::from_value(raw)
                .map(Self::Known)
                .map_err(D::Error::custom),
        }
    }
}

/// An unordered collection compared as a multiset.
///
/// Elements keep insertion order for stable serialization, but equality
/// ignores order: two sets are equal iff every element occurs the same
/// number of times in both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Set<T>(Vec<T>);

impl<T> Set<T> {
    /// An empty set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// The elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Take the elements.
    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

impl<T: PartialEq> Set<T> {
    /// Whether `item` is an element.
    pub fn contains(&self, item: &T) -> bool {
        self.0.contains(item)
    }

    fn count(&self, item: &T) -> usize {
        self.0.iter().filter(|x| *x == item).count()
    }
}

impl<T> Default for Set<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> PartialEq for Set<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.0.iter().all(|x| self.count(x) == other.count(x))
    }
}

impl<T: Eq> Eq for Set<T> {}

impl<T> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T> From<Vec<T>> for Set<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<'a, T> IntoIterator for &'a Set<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T> IntoIterator for Set<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// How a remote value is projected into state on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRule {
    /// Unconditional projection; used to populate fresh state.
    DataSource,
    /// The user owns the attribute: null and unknown priors are preserved,
    /// a known prior follows the remote (absent remote means null).
    Owned,
    /// The remote is authoritative but the user may override: the remote
    /// wins when present, otherwise a known prior is retained.
    ComputedOptional,
}

/// Projection of a remote shape `R` into a state shape.
pub trait Flatten<R: ?Sized>: Sized {
    /// Project `remote` unconditionally.
    fn flatten(remote: &R) -> Self;

    /// Project `remote` against a known prior.
    ///
    /// Object shapes override this to apply the read rules field by field.
    fn flatten_owned(prior: &Self, remote: &R) -> Self {
        let _ = prior;
        Self::flatten(remote)
    }
}

impl<T: Clone> Flatten<T> for T {
    fn flatten(remote: &T) -> Self {
        remote.clone()
    }
}

impl<T: Clone> Flatten<Vec<T>> for Set<T> {
    fn flatten(remote: &Vec<T>) -> Self {
        Set(remote.clone())
    }
}

impl Flatten<chrono::DateTime<chrono::Utc>> for String {
    fn flatten(remote: &chrono::DateTime<chrono::Utc>) -> Self {
        remote.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

impl<T> Value<T> {
    /// Project an optional remote value under `rule`.
    pub fn read<R>(rule: ReadRule, prior: &Value<T>, remote: Option<&R>) -> Self
    where
        R: ?Sized,
        T: Flatten<R> + Clone,
    {
        match rule {
            ReadRule::DataSource => Self::from_option(remote.map(T::flatten)),
            ReadRule::Owned => match prior {
                Value::Null => Value::Null,
                Value::Unknown => Value::Unknown,
                Value::Known(prior) => {
                    Self::from_option(remote.map(|remote| T::flatten_owned(prior, remote)))
                },
            },
            ReadRule::ComputedOptional => match (remote, prior) {
                (Some(remote), Value::Known(prior)) => Value::Known(T::flatten_owned(prior, remote)),
                (Some(remote), _) => Value::Known(T::flatten(remote)),
                (None, Value::Known(prior)) => Value::Known(prior.clone()),
                (None, _) => Value::Null,
            },
        }
    }

    /// Ownership-preserving projection.
    pub fn owned<R>(prior: &Value<T>, remote: Option<&R>) -> Self
    where
        R: ?Sized,
        T: Flatten<R> + Clone,
    {
        Self::read(ReadRule::Owned, prior, remote)
    }

    /// Computed-optional projection.
    pub fn computed_optional<R>(prior: &Value<T>, remote: Option<&R>) -> Self
    where
        R: ?Sized,
        T: Flatten<R> + Clone,
    {
        Self::read(ReadRule::ComputedOptional, prior, remote)
    }

    /// Unconditional projection, for computed-only attributes.
    pub fn computed<R>(remote: Option<&R>) -> Self
    where
        R: ?Sized,
        T: Flatten<R> + Clone,
    {
        Self::read(ReadRule::DataSource, &Value::Null, remote)
    }
}

/// Project a remote list of objects into a set keyed by an identity field.
///
/// This is a left join on the prior set: each prior element whose key is
/// still present remotely is flattened against its remote counterpart; a
/// prior element whose key vanished becomes `placeholder(prior)`; remote
/// elements the prior never had are not introduced. Null and unknown priors
/// are preserved. Under [`ReadRule::DataSource`] the remote list is
/// projected as-is.
pub fn flatten_keyed_set<T, R, K>(
    rule: ReadRule,
    prior: &SetValue<T>,
    remote: Option<&[R]>,
    prior_key: impl Fn(&T) -> Option<K>,
    remote_key: impl Fn(&R) -> K,
    placeholder: impl Fn(&T) -> T,
) -> SetValue<T>
where
    T: Flatten<R> + Clone,
    K: PartialEq,
{
    let prior_items = match (rule, prior) {
        (ReadRule::DataSource, _) | (ReadRule::ComputedOptional, Value::Null | Value::Unknown) => {
            return Value::from_option(remote.map(|items| items.iter().map(T::flatten).collect()));
        },
        (ReadRule::Owned, Value::Null) => return Value::Null,
        (ReadRule::Owned, Value::Unknown) => return Value::Unknown,
        (_, Value::Known(items)) => items,
    };

    if prior_items.is_empty() {
        return Value::Known(Set::new());
    }
    let Some(remote) = remote else {
        return match rule {
            ReadRule::ComputedOptional => Value::Known(prior_items.clone()),
            _ => Value::Null,
        };
    };

    prior_items
        .iter()
        .map(|item| {
            let Some(key) = prior_key(item) else {
                return item.clone();
            };
            match remote.iter().find(|r| remote_key(r) == key) {
                Some(r) => T::flatten_owned(item, r),
                None => placeholder(item),
            }
        })
        .collect::<Set<T>>()
        .into()
}

impl<T> From<Set<T>> for SetValue<T> {
    fn from(set: Set<T>) -> Self {
        Value::Known(set)
    }
}

/// Decode a JSON record into its typed shape.
///
/// Unknown decodes to nothing and records nothing; the caller must guard.
/// A shape mismatch is recorded as an error diagnostic.
pub fn decode<T: DeserializeOwned>(
    raw: &serde_json::Value,
    what: &str,
    diags: &mut Diagnostics,
) -> Option<T> {
    if matches!(raw, serde_json::Value::String(s) if s == UNKNOWN_VALUE) {
        return None;
    }
    match serde_json::from_value(raw.clone()) {
        Ok(value) => Some(value),
        Err(err) => {
            diags.error(
                format!("Unable to decode {what}"),
                format!("The value does not match the expected shape: {err}"),
            );
            None
        },
    }
}

/// Encode a typed record as JSON.
pub fn encode<T: Serialize>(record: &T, what: &str, diags: &mut Diagnostics) -> Option<serde_json::Value> {
    match serde_json::to_value(record) {
        Ok(value) => Some(value),
        Err(err) => {
            diags.error(format!("Unable to encode {what}"), err.to_string());
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Connector {
        connector_type: StringValue,
        resource_identifier: StringValue,
    }

    #[derive(Debug, Clone)]
    struct RemoteConnector {
        connector_type: String,
        resource_identifier: Option<String>,
    }

    impl Flatten<RemoteConnector> for Connector {
        fn flatten(remote: &RemoteConnector) -> Self {
            Self {
                connector_type: Value::known(remote.connector_type.clone()),
                resource_identifier: Value::from_option(remote.resource_identifier.clone()),
            }
        }

        fn flatten_owned(prior: &Self, remote: &RemoteConnector) -> Self {
            Self {
                connector_type: Value::known(remote.connector_type.clone()),
                resource_identifier: Value::owned(
                    &prior.resource_identifier,
                    remote.resource_identifier.as_ref(),
                ),
            }
        }
    }

    fn connector(kind: &str, resource: Option<&str>) -> Connector {
        Connector {
            connector_type: kind.into(),
            resource_identifier: resource.map(str::to_owned).into(),
        }
    }

    fn remote(kind: &str, resource: Option<&str>) -> RemoteConnector {
        RemoteConnector {
            connector_type: kind.to_owned(),
            resource_identifier: resource.map(str::to_owned),
        }
    }

    fn keyed(prior: &SetValue<Connector>, remote_items: Option<&[RemoteConnector]>) -> SetValue<Connector> {
        flatten_keyed_set(
            ReadRule::Owned,
            prior,
            remote_items,
            |c: &Connector| c.connector_type.known_cloned(),
            |r: &RemoteConnector| r.connector_type.clone(),
            |c: &Connector| Connector {
                connector_type: c.connector_type.clone(),
                resource_identifier: Value::Null,
            },
        )
    }

    #[test]
    fn test_constructors_and_predicates() {
        let v: StringValue = Value::null();
        assert!(v.is_null() && !v.is_unknown() && !v.is_known());
        let v: StringValue = Value::unknown();
        assert!(v.is_unknown() && !v.is_known());
        let v = Value::known(3);
        assert!(v.is_known());
        assert_eq!(v.as_known(), Some(&3));
    }

    #[test]
    fn test_serde_tri_state() {
        #[derive(Debug, PartialEq, Default, Serialize, Deserialize)]
        #[serde(default)]
        struct Record {
            name: StringValue,
            count: Int32Value,
            enabled: BoolValue,
            tags: MapValue<String>,
        }

        let record: Record = serde_json::from_value(json!({
            "name": "s1",
            "count": UNKNOWN_VALUE,
            "tags": null,
        }))
        .unwrap();

        assert_eq!(record.name, Value::known("s1".to_string()));
        assert_eq!(record.count, Value::Unknown);
        assert_eq!(record.enabled, Value::Null);
        assert_eq!(record.tags, Value::Null);

        let encoded = serde_json::to_value(&record).unwrap();
        assert_eq!(
            encoded,
            json!({"name": "s1", "count": UNKNOWN_VALUE, "enabled": null, "tags": null})
        );
    }

    #[test]
    fn test_serde_type_mismatch() {
        let result: Result<Int32Value, _> = serde_json::from_value(json!("seven"));
        assert!(result.is_err());
    }

    #[test]
    fn test_set_equality_is_multiset() {
        let a: Set<&str> = ["x", "y", "y"].into_iter().collect();
        let b: Set<&str> = ["y", "x", "y"].into_iter().collect();
        let c: Set<&str> = ["x", "x", "y"].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Set::from(vec!["x", "y"]));
    }

    #[test]
    fn test_owned_read_rules() {
        let remote = "Auto".to_string();

        let prior: StringValue = Value::Null;
        assert_eq!(Value::owned(&prior, Some(&remote)), Value::Null);

        let prior: StringValue = Value::Unknown;
        assert_eq!(Value::owned(&prior, Some(&remote)), Value::Unknown);

        let prior: StringValue = "mine".into();
        assert_eq!(Value::<String>::owned(&prior, None::<&String>), Value::Null);
        assert_eq!(Value::owned(&prior, Some(&remote)), Value::known(remote.clone()));
    }

    #[test]
    fn test_computed_optional_rules() {
        let remote = true;
        assert_eq!(
            BoolValue::computed_optional(&Value::Null, Some(&remote)),
            Value::known(true)
        );
        assert_eq!(
            BoolValue::computed_optional(&Value::known(false), None::<&bool>),
            Value::known(false)
        );
        assert_eq!(
            Value::<bool>::computed_optional(&Value::Unknown, None::<&bool>),
            Value::Null
        );
    }

    #[test]
    fn test_datasource_rule_ignores_prior() {
        let remote = 5;
        assert_eq!(
            Int32Value::read(ReadRule::DataSource, &Value::Null, Some(&remote)),
            Value::known(5)
        );
        assert_eq!(Value::<i32>::computed(None::<&i32>), Value::Null);
    }

    #[test]
    fn test_timestamp_flatten() {
        let ts = chrono::DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let value: StringValue = Value::computed(Some(&ts));
        assert_eq!(value, Value::known("2024-03-01T12:00:00Z".to_string()));
    }

    #[test]
    fn test_keyed_set_left_join() {
        let prior: SetValue<Connector> = Set::from(vec![
            connector("HOMEFOLDERS", None),
            connector("ONE_DRIVE", Some("old")),
        ])
        .into();
        let remote_items = [
            remote("ONE_DRIVE", Some("new")),
            remote("GOOGLE_DRIVE", Some("g")),
        ];

        let result = keyed(&prior, Some(&remote_items));

        let expected: SetValue<Connector> = Set::from(vec![
            connector("HOMEFOLDERS", None),
            connector("ONE_DRIVE", Some("new")),
        ])
        .into();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_keyed_set_preserves_null_unknown_and_empty() {
        let items = [remote("HOMEFOLDERS", None)];
        assert_eq!(keyed(&Value::Null, Some(&items)), Value::Null);
        assert_eq!(keyed(&Value::Unknown, Some(&items)), Value::Unknown);
        assert_eq!(
            keyed(&Value::Known(Set::new()), Some(&items)),
            Value::Known(Set::new())
        );
        assert_eq!(keyed(&Value::Known(Set::new()), None), Value::Known(Set::new()));
    }

    #[test]
    fn test_keyed_set_remote_absent() {
        let prior: SetValue<Connector> = Set::from(vec![connector("HOMEFOLDERS", None)]).into();
        assert_eq!(keyed(&prior, None), Value::Null);
    }

    #[test]
    fn test_decode_accumulates_errors() {
        #[derive(Debug, Default, Deserialize)]
        #[serde(default)]
        struct Record {
            #[allow(dead_code)]
            count: Int32Value,
        }

        let mut diags = Diagnostics::new();
        assert!(decode::<Record>(&json!({"count": 1}), "state", &mut diags).is_some());
        assert!(diags.is_empty());

        assert!(decode::<Record>(&json!(UNKNOWN_VALUE), "plan", &mut diags).is_none());
        assert!(diags.is_empty());

        assert!(decode::<Record>(&json!({"count": "x"}), "plan", &mut diags).is_none());
        assert!(diags.has_error());
    }
}
