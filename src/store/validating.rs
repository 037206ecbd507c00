//! Store decorator validating records and queries against per-field rules.

use crate::context::Context;
use crate::error::AppError;
use crate::store::Store;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Constraints for one serialized field. Unset constraints are not checked.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FieldRule {
    /// Field must be present, non-null and, for strings, non-empty.
    #[serde(default)]
    pub required: bool,
    /// `email` or `uuid`.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

impl FieldRule {
    pub fn required() -> Self {
        FieldRule {
            required: true,
            ..Self::default()
        }
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn length(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub fn allowed(mut self, values: Vec<Value>) -> Self {
        self.allowed = Some(values);
        self
    }
}

/// Rules keyed by serialized field name. Checked in field-name order so the
/// first reported failure is stable.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationRules {
    fields: BTreeMap<String, FieldRule>,
}

impl ValidationRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.insert(name.into(), rule);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate any serializable value. `kind` names it in error messages.
    pub fn validate<T: Serialize>(&self, kind: &str, value: &T) -> Result<(), AppError> {
        if self.is_empty() {
            return Ok(());
        }
        let body = match serde_json::to_value(value)? {
            Value::Object(m) => m,
            _ => {
                return Err(AppError::Validation(format!(
                    "{} must serialize to an object",
                    kind
                )))
            }
        };
        for (field, rule) in &self.fields {
            let val = body.get(field);
            if rule.required && is_blank(val) {
                return Err(AppError::Validation(format!(
                    "{}.{} is required",
                    kind, field
                )));
            }
            if let Some(v) = val {
                validate_field(kind, field, v, rule)?;
            }
        }
        Ok(())
    }
}

fn is_blank(val: Option<&Value>) -> bool {
    match val {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn validate_field(kind: &str, col: &str, v: &Value, rule: &FieldRule) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    if let Some(format) = &rule.format {
        validate_format(kind, col, v, format)?;
    }
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() > max as usize {
                return Err(AppError::Validation(format!(
                    "{}.{} must be at most {} characters",
                    kind, col, max
                )));
            }
        }
    }
    if let Some(min) = rule.min_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() < min as usize {
                return Err(AppError::Validation(format!(
                    "{}.{} must be at least {} characters",
                    kind, col, min
                )));
            }
        }
    }
    if let Some(ref pattern) = rule.pattern {
        let re = Regex::new(pattern)
            .map_err(|_| AppError::Validation(format!("invalid pattern for {}.{}", kind, col)))?;
        if let Some(s) = v.as_str() {
            if !re.is_match(s) {
                return Err(AppError::Validation(format!(
                    "{}.{} does not match required pattern",
                    kind, col
                )));
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::Validation(format!(
                "{}.{} must be one of: {:?}",
                kind,
                col,
                allowed.iter().take(5).collect::<Vec<_>>()
            )));
        }
    }
    if let Some(min) = rule.minimum {
        if let Some(n) = v.as_f64() {
            if n < min {
                return Err(AppError::Validation(format!(
                    "{}.{} must be at least {}",
                    kind, col, min
                )));
            }
        }
    }
    if let Some(max) = rule.maximum {
        if let Some(n) = v.as_f64() {
            if n > max {
                return Err(AppError::Validation(format!(
                    "{}.{} must be at most {}",
                    kind, col, max
                )));
            }
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn validate_format(kind: &str, col: &str, v: &Value, format: &str) -> Result<(), AppError> {
    let Some(s) = v.as_str() else {
        return Ok(());
    };
    match format.to_lowercase().as_str() {
        "email" => {
            if !s.contains('@') || s.len() < 3 {
                return Err(AppError::Validation(format!("{}.{} must be a valid email", kind, col)));
            }
        }
        "uuid" => {
            if uuid::Uuid::parse_str(s).is_err() {
                return Err(AppError::Validation(format!("{}.{} must be a valid UUID", kind, col)));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Validates the record on create/update and the query on list before
/// delegating. Read and delete pass straight through.
pub struct ValidatingStore<S> {
    inner: S,
    resource_kind: String,
    query_kind: String,
    resource_rules: ValidationRules,
    query_rules: ValidationRules,
}

impl<S> ValidatingStore<S> {
    pub fn new(inner: S, resource_rules: ValidationRules, query_rules: ValidationRules) -> Self {
        ValidatingStore {
            inner,
            resource_kind: "resource".to_string(),
            query_kind: "query".to_string(),
            resource_rules,
            query_rules,
        }
    }

    /// Names used as the prefix of error messages, e.g. `User.name is required`.
    pub fn with_names(
        mut self,
        resource_kind: impl Into<String>,
        query_kind: impl Into<String>,
    ) -> Self {
        self.resource_kind = resource_kind.into();
        self.query_kind = query_kind.into();
        self
    }
}

#[async_trait]
impl<R, Q, P, S> Store<R, Q, P> for ValidatingStore<S>
where
    R: Serialize + Send + Sync + 'static,
    Q: Serialize + Send + Sync + 'static,
    P: Send + Sync + 'static,
    S: Store<R, Q, P>,
{
    async fn create(&self, ctx: &Context, resource: &mut R) -> Result<(), AppError> {
        self.resource_rules.validate(&self.resource_kind, &*resource)?;
        self.inner.create(ctx, resource).await
    }

    async fn read(&self, ctx: &Context, pkey: &P, query: &Q) -> Result<R, AppError> {
        self.inner.read(ctx, pkey, query).await
    }

    async fn update(&self, ctx: &Context, pkey: &P, resource: &mut R) -> Result<(), AppError> {
        self.resource_rules.validate(&self.resource_kind, &*resource)?;
        self.inner.update(ctx, pkey, resource).await
    }

    async fn delete(&self, ctx: &Context, pkey: &P) -> Result<(), AppError> {
        self.inner.delete(ctx, pkey).await
    }

    async fn list(&self, ctx: &Context, query: &Q) -> Result<Vec<R>, AppError> {
        self.query_rules.validate(&self.query_kind, query)?;
        self.inner.list(ctx, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;
    use crate::store::MapStore;
    use serde_json::json;

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    struct Account {
        id: u64,
        name: String,
        email: String,
        age: u32,
    }

    impl Resource<u64> for Account {
        fn pkey(&self) -> u64 {
            self.id
        }

        fn set_pkey(&mut self, pkey: u64) {
            self.id = pkey;
        }
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    struct Search {
        name: String,
    }

    fn account_rules() -> ValidationRules {
        ValidationRules::new()
            .field("name", FieldRule::required().length(None, Some(8)))
            .field("email", FieldRule::default().format("email"))
            .field("age", FieldRule::default().range(Some(18.0), None))
    }

    fn store() -> impl Store<Account, Search, u64> {
        ValidatingStore::new(
            MapStore::<Account, Search, u64>::new(),
            account_rules(),
            ValidationRules::new().field("name", FieldRule::required()),
        )
        .with_names("Account", "Search")
    }

    fn valid() -> Account {
        Account {
            id: 0,
            name: "ann".into(),
            email: "ann@example.com".into(),
            age: 30,
        }
    }

    #[tokio::test]
    async fn valid_record_is_created() {
        let store = store();
        let mut a = valid();
        store.create(&Context::new(), &mut a).await.unwrap();
        assert_eq!(a.id, 1);
    }

    #[tokio::test]
    async fn empty_required_string_is_rejected_before_store() {
        let store = store();
        let ctx = Context::new();
        let mut a = Account {
            name: String::new(),
            ..valid()
        };
        let err = store.create(&ctx, &mut a).await.unwrap_err();
        assert_eq!(err.to_string(), "Account.name is required");
        assert_eq!(a.id, 0);
        assert!(store.list(&ctx, &Search { name: "x".into() }).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_is_validated() {
        let store = store();
        let ctx = Context::new();
        let mut a = valid();
        store.create(&ctx, &mut a).await.unwrap();
        let mut bad = Account {
            age: 12,
            ..valid()
        };
        let err = store.update(&ctx, &1, &mut bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "Account.age must be at least 18");
    }

    #[tokio::test]
    async fn list_validates_query() {
        let store = store();
        let err = store
            .list(&Context::new(), &Search::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Search.name is required");
    }

    #[test]
    fn format_length_and_allowed_rules() {
        let rules = ValidationRules::new()
            .field("email", FieldRule::default().format("email"))
            .field("name", FieldRule::default().length(Some(2), Some(4)))
            .field("role", FieldRule::default().allowed(vec![json!("admin"), json!("user")]))
            .field("code", FieldRule::default().pattern("^[A-Z]{3}$"));

        assert!(rules
            .validate("x", &json!({"email": "a@b", "name": "abc", "role": "user", "code": "ABC"}))
            .is_ok());
        assert!(rules.validate("x", &json!({"email": "nope"})).is_err());
        assert!(rules.validate("x", &json!({"name": "a"})).is_err());
        assert!(rules.validate("x", &json!({"name": "abcde"})).is_err());
        assert!(rules.validate("x", &json!({"role": "root"})).is_err());
        assert!(rules.validate("x", &json!({"code": "abc"})).is_err());
    }

    #[test]
    fn rules_load_from_json() {
        let rules: ValidationRules =
            serde_json::from_value(json!({"name": {"required": true, "max_length": 3}})).unwrap();
        assert!(rules.validate("x", &json!({"name": "abcd"})).is_err());
        assert!(rules.validate("x", &json!({})).is_err());
        assert!(rules.validate("x", &json!({"name": "abc"})).is_ok());
    }

    #[test]
    fn non_object_value_is_rejected() {
        let rules = ValidationRules::new().field("a", FieldRule::required());
        assert!(matches!(rules.validate("x", &json!(3)), Err(AppError::Validation(_))));
    }
}
