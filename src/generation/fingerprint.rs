//! Deterministic cache keys for generation requests
//!
//! Two requests with the same model, prompt and parameters map to the same
//! key no matter in which order their parameters (or nested objects) were
//! assembled. The key embeds the canonical form of the request rather than a
//! digest of it, so distinct requests never share a key.

use crate::cache::CacheKey;
use crate::generation::types::{GenerationRequest, Parameters};
use serde_json::{json, Value};

/// Prefix shared by every generation fingerprint
pub const FINGERPRINT_PREFIX: &str = "generation";

/// Builds the fingerprint of a generation request
#[derive(Debug, Clone)]
pub struct FingerprintBuilder {
    model: String,
    prompt: String,
    params: Parameters,
}

impl FingerprintBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: String::new(),
            params: Parameters::new(),
        }
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Add a parameter to the key
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: &Parameters) -> Self {
        self.params
            .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Build the cache key: `generation:<model>:<canonical JSON>`
    ///
    /// The JSON part is `{"model":"..","params":{..},"prompt":".."}` with every
    /// object's keys sorted.
    pub fn build(self) -> CacheKey {
        let body = canonical(&json!({
            "model": &self.model,
            "prompt": &self.prompt,
            "params": &self.params,
        }));
        format!("{}:{}:{}", FINGERPRINT_PREFIX, self.model, body)
    }
}

/// Fingerprint of a request
pub fn fingerprint(request: &GenerationRequest) -> CacheKey {
    FingerprintBuilder::new(&request.model)
        .prompt(&request.prompt)
        .params(&request.parameters)
        .build()
}

/// Copy of `value` with every object's keys in sorted order
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonical(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_format() {
        let key = FingerprintBuilder::new("stability-ai/sdxl")
            .prompt("a red fox")
            .build();
        assert_eq!(key, r#"generation:stability-ai/sdxl:{"model":"stability-ai/sdxl","params":{},"prompt":"a red fox"}"#);
    }

    #[test]
    fn test_inputs_that_could_run_together_stay_distinct() {
        let split_early = FingerprintBuilder::new("m")
            .prompt("a")
            .param("b", "c")
            .build();
        let split_late = FingerprintBuilder::new("m")
            .prompt(r#"a","params":{"b":"c"#)
            .build();
        assert_ne!(split_early, split_late);

        let number = FingerprintBuilder::new("m").prompt("p").param("n", 1).build();
        let text = FingerprintBuilder::new("m").prompt("p").param("n", "1").build();
        assert_ne!(number, text);
    }

    #[test]
    fn test_parameter_order_does_not_matter() {
        let first = GenerationRequest::new("m", "a red fox", "user-1")
            .with_parameter("width", 1024)
            .with_parameter("style", json!({"tone": "warm", "grain": 0.2}));
        let second = GenerationRequest::new("m", "a red fox", "user-2")
            .with_parameter("style", json!({"grain": 0.2, "tone": "warm"}))
            .with_parameter("width", 1024);

        assert_eq!(fingerprint(&first), fingerprint(&second));
    }

    #[test]
    fn test_different_inputs_differ() {
        let base = GenerationRequest::new("m", "a red fox", "u").with_parameter("width", 1024);

        let mut other_prompt = base.clone();
        other_prompt.prompt = "a blue fox".to_string();
        assert_ne!(fingerprint(&base), fingerprint(&other_prompt));

        let other_param = base.clone().with_parameter("width", 512);
        assert_ne!(fingerprint(&base), fingerprint(&other_param));

        let mut other_model = base.clone();
        other_model.model = "n".to_string();
        assert_ne!(fingerprint(&base), fingerprint(&other_model));
    }

    #[test]
    fn test_priority_and_user_are_not_part_of_the_key() {
        use crate::generation::types::Priority;

        let a = GenerationRequest::new("m", "p", "alice").with_priority(Priority::Low);
        let b = GenerationRequest::new("m", "p", "bob").with_priority(Priority::High);
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_canonical_sorts_nested_objects() {
        let value = json!({"b": [{"z": 1, "y": 2}], "a": null});
        assert_eq!(canonical(&value).to_string(), r#"{"a":null,"b":[{"y":2,"z":1}]}"#);
    }
}
