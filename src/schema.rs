use crate::error::{ConfigError, GraphError};
use crate::model::WorkflowNode;
use crate::value::Value;
use ahash::AHashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;

/// The kind of value a declared parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Number,
    Integer,
    Text,
    Boolean,
    Object,
    List,
    Any,
}

impl ParamKind {
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ParamKind::Any, _) => true,
            (ParamKind::Number, Value::Number(_)) => true,
            (ParamKind::Integer, Value::Number(n)) => n.fract() == 0.0,
            (ParamKind::Text, Value::Text(_)) => true,
            (ParamKind::Boolean, Value::Bool(_)) => true,
            (ParamKind::Object, Value::Map(_)) => true,
            (ParamKind::List, Value::List(_)) => true,
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::Number => "number",
            ParamKind::Integer => "integer",
            ParamKind::Text => "text",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
            ParamKind::List => "list",
            ParamKind::Any => "any",
        }
    }
}

/// Why a parameter value failed its declared spec.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterViolation {
    Missing,
    Invalid(String),
}

/// A single declared parameter of a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
}

impl ParameterSpec {
    pub fn new(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
            min: None,
            max: None,
            pattern: None,
            options: Vec::new(),
        }
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, ParamKind::Number)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, ParamKind::Integer)
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, ParamKind::Text)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, ParamKind::Boolean)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn options<I, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Checks a (possibly absent) value against this spec.
    ///
    /// Returns `None` when the value is acceptable.
    pub fn check(&self, value: Option<&Value>) -> Option<ParameterViolation> {
        let value = match value {
            Some(v) if !v.is_unset() => v,
            _ if self.required => return Some(ParameterViolation::Missing),
            _ => return None,
        };

        if !self.kind.accepts(value) {
            return Some(ParameterViolation::Invalid(format!(
                "expected {}, found {} '{}'",
                self.kind.name(),
                value.kind_name(),
                value
            )));
        }

        if let Value::Number(n) = value {
            if let Some(min) = self.min.filter(|min| n < min) {
                return Some(ParameterViolation::Invalid(format!(
                    "value {} is below the minimum {}",
                    value,
                    Value::Number(min)
                )));
            }
            if let Some(max) = self.max.filter(|max| n > max) {
                return Some(ParameterViolation::Invalid(format!(
                    "value {} is above the maximum {}",
                    value,
                    Value::Number(max)
                )));
            }
        }

        if let (Some(pattern), Value::Text(text)) = (&self.pattern, value) {
            match Regex::new(pattern) {
                Ok(re) if re.is_match(text) => {}
                Ok(_) => {
                    return Some(ParameterViolation::Invalid(format!(
                        "'{}' does not match pattern '{}'",
                        text, pattern
                    )));
                }
                Err(e) => {
                    return Some(ParameterViolation::Invalid(format!(
                        "declared pattern '{}' is malformed: {}",
                        pattern, e
                    )));
                }
            }
        }

        if !self.options.is_empty() && !self.options.contains(value) {
            let allowed: Vec<String> = self.options.iter().map(|o| o.to_string()).collect();
            return Some(ParameterViolation::Invalid(format!(
                "'{}' is not one of [{}]",
                value,
                allowed.join(", ")
            )));
        }

        None
    }
}

/// The declared parameter set of one node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSchema {
    pub node_type: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

impl ParameterSchema {
    pub fn new(node_type: &str) -> Self {
        Self {
            node_type: node_type.to_string(),
            parameters: Vec::new(),
        }
    }

    pub fn with(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn spec(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Parameter schemas keyed by node type.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: AHashMap<String, ParameterSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schemas for the built-in laboratory unit operations.
    pub fn laboratory() -> Self {
        let mut registry = Self::new();
        registry.register(ParameterSchema::new("start"));
        registry.register(ParameterSchema::new("end"));
        registry.register(
            ParameterSchema::new("hotplateControl")
                .with(ParameterSpec::number("temperature").required().range(25.0, 400.0))
                .with(ParameterSpec::number("duration").required().range(0.0, 86_400.0))
                .with(ParameterSpec::integer("stirringSpeed").range(0.0, 1500.0)),
        );
        registry.register(
            ParameterSchema::new("solutionPreparation")
                .with(ParameterSpec::number("volume").required().range(0.0, 10_000.0))
                .with(
                    ParameterSpec::text("source_labware")
                        .required()
                        .options(["vial_rack_2", "vial_rack_7", "vial_rack_11", "nis_reactor"]),
                )
                .with(ParameterSpec::text("source_well").pattern("^[A-D][1-6]$"))
                .with(ParameterSpec::text("pipette_type").options([
                    "p1000_single_gen2",
                    "p300_single_gen2",
                    "p20_single_gen2",
                ])),
        );
        registry.register(
            ParameterSchema::new("wait")
                .with(ParameterSpec::number("duration").required().range(0.0, 86_400.0)),
        );
        registry
    }

    pub fn register(&mut self, schema: ParameterSchema) {
        self.schemas.insert(schema.node_type.clone(), schema);
    }

    pub fn get(&self, node_type: &str) -> Option<&ParameterSchema> {
        self.schemas.get(node_type)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Parses a JSON array of schemas.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let schemas: Vec<ParameterSchema> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for schema in schemas {
            registry.register(schema);
        }
        Ok(registry)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Rejects present parameter values whose kind contradicts the node type's schema.
    ///
    /// Missing and out-of-range values are accepted here and left to validation.
    pub fn check_types(&self, node: &WorkflowNode) -> Result<(), GraphError> {
        let Some(schema) = self.get(&node.node_type) else {
            return Ok(());
        };
        for (name, value) in &node.parameters {
            let Some(spec) = schema.spec(name) else {
                continue;
            };
            if !value.is_unset() && !spec.kind.accepts(value) {
                return Err(GraphError::InvalidParameterType {
                    node_id: node.id.clone(),
                    parameter: name.clone(),
                    expected: spec.kind.name().to_string(),
                    found: value.kind_name().to_string(),
                });
            }
        }
        Ok(())
    }
}
