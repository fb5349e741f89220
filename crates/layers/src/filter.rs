use serde_json::{Map, Value, json};

/// Layer filter.
///
/// `Nothing` is an explicit always-false predicate; it never depends on a
/// property value that could collide with real data.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// No filter: every feature of the source is rendered.
    #[default]
    All,
    Nothing,
    /// `property == value`.
    Eq { property: String, value: Value },
}

impl Filter {
    pub fn property_eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, properties: &Map<String, Value>) -> bool {
        match self {
            Filter::All => true,
            Filter::Nothing => false,
            Filter::Eq { property, value } => properties.get(property) == Some(value),
        }
    }

    /// Renderer expression form; `All` is the absent (null) filter.
    pub fn to_json(&self) -> Value {
        match self {
            Filter::All => Value::Null,
            Filter::Nothing => Value::Bool(false),
            Filter::Eq { property, value } => json!(["==", ["get", property], value]),
        }
    }
}
