//! Attribute validators evaluated at plan time.
//!
//! Validators only ever see known values: [`check`] and [`check_each`] skip
//! null and unknown, so a rule that cannot be decided yet stays silent. The
//! cross-attribute helpers take a [`presence`] per field, where `None` means
//! "unknown, defer".

use regex::Regex;

use crate::arn::Arn;
use crate::diagnostics::Diagnostics;
use crate::value::{Set, Value};

pub(crate) const INVALID_VALUE: &str = "Invalid Attribute Value";
pub(crate) const INVALID_COMBINATION: &str = "Invalid Attribute Combination";

/// A rule over a known attribute value.
pub trait Validator<T: ?Sized> {
    /// Record a diagnostic at `path` if `value` breaks the rule.
    fn validate(&self, path: &str, value: &T, diags: &mut Diagnostics);
}

impl<T: ?Sized, V: Validator<T> + ?Sized> Validator<T> for &V {
    fn validate(&self, path: &str, value: &T, diags: &mut Diagnostics) {
        (**self).validate(path, value, diags);
    }
}

/// Run `validator` on `value` if it is known.
pub fn check<T, V>(diags: &mut Diagnostics, path: &str, value: &Value<T>, validator: &V)
where
    V: Validator<T> + ?Sized,
{
    if let Value::Known(value) = value {
        validator.validate(path, value, diags);
    }
}

/// Run `validator` on every element of a known set.
pub fn check_each<T, V>(diags: &mut Diagnostics, path: &str, value: &Value<Set<T>>, validator: &V)
where
    V: Validator<T> + ?Sized,
{
    if let Value::Known(items) = value {
        for item in items {
            validator.validate(path, item, diags);
        }
    }
}

/// The value parses as an ARN, optionally of a given service and resource prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArnValidator {
    service: Option<&'static str>,
    resource_prefix: Option<&'static str>,
}

impl ArnValidator {
    /// Any well-formed ARN.
    pub fn any() -> Self {
        Self::default()
    }

    /// An ARN of `service` whose resource starts with `resource_prefix`.
    pub fn of(service: &'static str, resource_prefix: &'static str) -> Self {
        Self {
            service: Some(service),
            resource_prefix: Some(resource_prefix),
        }
    }

    /// An ARN of `service`, any resource.
    pub fn service(service: &'static str) -> Self {
        Self {
            service: Some(service),
            resource_prefix: None,
        }
    }
}

impl Validator<String> for ArnValidator {
    fn validate(&self, path: &str, value: &String, diags: &mut Diagnostics) {
        let arn = match value.parse::<Arn>() {
            Ok(arn) => arn,
            Err(err) => {
                diags.attribute_error(path, INVALID_VALUE, format!("{path}: {err}"));
                return;
            },
        };
        if let Some(service) = self.service {
            if let Err(err) = arn.expect(service, self.resource_prefix.unwrap_or("")) {
                diags.attribute_error(path, INVALID_VALUE, format!("{path}: {err}"));
            }
        }
    }
}

/// The value matches a regular expression, compiled once.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    pattern: &'static str,
    regex: Result<Regex, regex::Error>,
    message: &'static str,
}

impl RegexValidator {
    /// Match `pattern`; `message` explains the rule to the user.
    pub fn new(pattern: &'static str, message: &'static str) -> Self {
        Self {
            pattern,
            regex: Regex::new(pattern),
            message,
        }
    }
}

impl Validator<String> for RegexValidator {
    fn validate(&self, path: &str, value: &String, diags: &mut Diagnostics) {
        match &self.regex {
            Ok(re) if re.is_match(value) => {},
            Ok(_) => diags.attribute_error(
                path,
                INVALID_VALUE,
                format!("{path} {}, got {value:?}", self.message),
            ),
            Err(err) => diags.attribute_error(
                path,
                "Invalid Validation Pattern",
                format!("pattern {:?} does not compile: {err}", self.pattern),
            ),
        }
    }
}

/// The value does not contain a reserved character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Excludes(pub char);

impl Validator<String> for Excludes {
    fn validate(&self, path: &str, value: &String, diags: &mut Diagnostics) {
        if value.contains(self.0) {
            diags.attribute_error(
                path,
                INVALID_VALUE,
                format!("{path} must not contain {:?}, got {value:?}", self.0),
            );
        }
    }
}

/// An integer in `[min, max]` that is a multiple of `step`, or zero when
/// allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepValidator {
    min: i32,
    max: i32,
    step: i32,
    allow_zero: bool,
}

impl StepValidator {
    /// Values in `[min, max]` divisible by `step`.
    pub fn new(min: i32, max: i32, step: i32) -> Self {
        Self {
            min,
            max,
            step: step.max(1),
            allow_zero: false,
        }
    }

    /// Values in `[min, max]`.
    pub fn range(min: i32, max: i32) -> Self {
        Self::new(min, max, 1)
    }

    /// Values of at least `min`.
    pub fn at_least(min: i32) -> Self {
        Self::range(min, i32::MAX)
    }

    /// Also accept zero.
    pub fn or_zero(mut self) -> Self {
        self.allow_zero = true;
        self
    }
}

impl Validator<i32> for StepValidator {
    fn validate(&self, path: &str, value: &i32, diags: &mut Diagnostics) {
        let value = *value;
        if self.allow_zero && value == 0 {
            return;
        }
        if value < self.min || value > self.max {
            let zero = if self.allow_zero { "0 or " } else { "" };
            diags.attribute_error(
                path,
                INVALID_VALUE,
                format!("{path} must be {zero}between {} and {}, got {value}", self.min, self.max),
            );
        } else if value % self.step != 0 {
            diags.attribute_error(
                path,
                INVALID_VALUE,
                format!("{path} must be a multiple of {}, got {value}", self.step),
            );
        }
    }
}

/// The value is one of a fixed set of strings.
#[derive(Debug, Clone, Copy)]
pub struct OneOf(pub &'static [&'static str]);

impl Validator<String> for OneOf {
    fn validate(&self, path: &str, value: &String, diags: &mut Diagnostics) {
        if !self.0.contains(&value.as_str()) {
            diags.attribute_error(
                path,
                INVALID_VALUE,
                format!("{path} must be one of [{}], got {value:?}", self.0.join(", ")),
            );
        }
    }
}

/// The set has at least one element.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonEmpty;

impl<T> Validator<Set<T>> for NonEmpty {
    fn validate(&self, path: &str, value: &Set<T>, diags: &mut Diagnostics) {
        if value.is_empty() {
            diags.attribute_error(path, INVALID_VALUE, format!("{path} must contain at least one element"));
        }
    }
}

/// Whether an attribute is set: `Some(true)` when known, `Some(false)` when
/// null, `None` when unknown.
pub fn presence<T>(value: &Value<T>) -> Option<bool> {
    match value {
        Value::Null => Some(false),
        Value::Unknown => None,
        Value::Known(_) => Some(true),
    }
}

/// Exactly one of `fields` must be set.
pub fn exactly_one_of(diags: &mut Diagnostics, fields: &[(&str, Option<bool>)]) {
    let mut set = 0;
    for (_, present) in fields {
        match present {
            None => return,
            Some(true) => set += 1,
            Some(false) => {},
        }
    }
    if set != 1 {
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let path = names.first().copied().unwrap_or_default();
        diags.attribute_error(
            path,
            INVALID_COMBINATION,
            format!("exactly one of [{}] must be specified", names.join(", ")),
        );
    }
}

/// `path` must not be set; `reason` names the condition that forbids it.
pub fn conflicts(diags: &mut Diagnostics, path: &str, present: Option<bool>, reason: &str) {
    if present == Some(true) {
        diags.attribute_error(
            path,
            INVALID_COMBINATION,
            format!("{path} cannot be specified when {reason}"),
        );
    }
}

/// `path` must be set; `reason` names the condition that requires it.
pub fn required(diags: &mut Diagnostics, path: &str, present: Option<bool>, reason: &str) {
    if present == Some(false) {
        diags.attribute_error(
            path,
            INVALID_COMBINATION,
            format!("{path} must be specified when {reason}"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<T, V: Validator<T>>(validator: V, value: Value<T>) -> Diagnostics {
        let mut diags = Diagnostics::new();
        check(&mut diags, "attr", &value, &validator);
        diags
    }

    #[test]
    fn test_validators_skip_null_and_unknown() {
        assert!(run(OneOf(&["A"]), Value::<String>::Null).is_empty());
        assert!(run(OneOf(&["A"]), Value::<String>::Unknown).is_empty());
        assert!(run(StepValidator::new(60, 120, 60), Value::Unknown).is_empty());
    }

    #[test]
    fn test_arn_validator() {
        let role = ArnValidator::of("iam", "role/");
        assert!(run(role, Value::known("arn:aws:iam::123456789012:role/streaming".to_string())).is_empty());

        let diags = run(role, Value::known("arn:aws:iam::123456789012:user/bob".to_string()));
        assert!(diags.has_error());

        let diags = run(ArnValidator::any(), Value::known("not-an-arn".to_string()));
        assert!(diags.has_error());

        let pca = ArnValidator::service("acm-pca");
        assert!(run(
            pca,
            Value::known("arn:aws:acm-pca:us-east-1:123456789012:certificate-authority/x".to_string())
        )
        .is_empty());
    }

    #[test]
    fn test_regex_validator() {
        let name = RegexValidator::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]{0,100}$", "must start with a letter or digit");
        assert!(run(&name, Value::known("fleet-1".to_string())).is_empty());
        assert!(run(&name, Value::known("fleet_2".to_string())).is_empty());

        let diags = run(name, Value::known("-fleet".to_string()));
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.attribute.as_deref(), Some("attr"));
        assert!(diag.detail.as_deref().unwrap().contains("must start with"));
    }

    #[test]
    fn test_regex_validator_reports_bad_pattern() {
        let diags = run(RegexValidator::new("(", "unused"), Value::known("x".to_string()));
        assert_eq!(
            diags.iter().next().map(|d| d.summary.as_str()),
            Some("Invalid Validation Pattern")
        );
    }

    #[test]
    fn test_excludes() {
        assert!(run(Excludes('|'), Value::known("ada@example.com".to_string())).is_empty());
        assert!(run(Excludes('|'), Value::known("a|b@example.com".to_string())).has_error());
    }

    #[test]
    fn test_step_validator() {
        let duration = StepValidator::new(600, 432_000, 60);
        assert!(run(duration, Value::known(600)).is_empty());
        assert!(run(duration, Value::known(57_600)).is_empty());
        assert!(run(duration, Value::known(590)).has_error());
        assert!(run(duration, Value::known(661)).has_error());
        assert!(run(duration, Value::known(0)).has_error());

        let idle = StepValidator::new(60, 360_000, 60).or_zero();
        assert!(run(idle, Value::known(0)).is_empty());
        assert!(run(idle, Value::known(30)).has_error());

        assert!(run(StepValidator::at_least(1), Value::known(1)).is_empty());
        assert!(run(StepValidator::at_least(1), Value::known(0)).has_error());
    }

    #[test]
    fn test_one_of_and_non_empty() {
        let fleet_type = OneOf(&["ON_DEMAND", "ALWAYS_ON", "ELASTIC"]);
        assert!(run(fleet_type, Value::known("ELASTIC".to_string())).is_empty());
        assert!(run(fleet_type, Value::known("SPOT".to_string())).has_error());

        assert!(run(NonEmpty, Value::known(Set::<String>::new())).has_error());
        assert!(run(NonEmpty, Value::known(Set::from(vec!["WINDOWS".to_string()]))).is_empty());
    }

    #[test]
    fn test_check_each() {
        let mut diags = Diagnostics::new();
        let families: Value<Set<String>> =
            Value::known(Set::from(vec!["WINDOWS".to_string(), "BEOS".to_string()]));
        check_each(&mut diags, "platforms", &families, &OneOf(&["WINDOWS"]));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_exactly_one_of() {
        let mut diags = Diagnostics::new();
        exactly_one_of(&mut diags, &[("image_name", Some(true)), ("image_arn", Some(false))]);
        assert!(diags.is_empty());

        exactly_one_of(&mut diags, &[("image_name", Some(true)), ("image_arn", None)]);
        assert!(diags.is_empty());

        exactly_one_of(&mut diags, &[("image_name", Some(false)), ("image_arn", Some(false))]);
        exactly_one_of(&mut diags, &[("image_name", Some(true)), ("image_arn", Some(true))]);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_conflicts_and_required() {
        let mut diags = Diagnostics::new();
        conflicts(&mut diags, "compute_capacity", None, "fleet_type is ELASTIC");
        required(&mut diags, "vpc_config", None, "fleet_type is ELASTIC");
        assert!(diags.is_empty());

        conflicts(&mut diags, "compute_capacity", Some(true), "fleet_type is ELASTIC");
        required(&mut diags, "vpc_config", Some(false), "fleet_type is ELASTIC");
        let details: Vec<_> = diags.iter().filter_map(|d| d.detail.clone()).collect();
        assert_eq!(
            details,
            vec![
                "compute_capacity cannot be specified when fleet_type is ELASTIC".to_string(),
                "vpc_config must be specified when fleet_type is ELASTIC".to_string(),
            ]
        );
    }
}
