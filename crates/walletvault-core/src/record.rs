use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

/// The only fields of a stored wallet or account record the store inspects.
/// Everything else in the payload is opaque and passed through untouched.
///
/// Both fields are kept as raw JSON values and interpreted one at a time, so a payload whose
/// `name` is not a string still yields its `uuid` and the other way round.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RecordHeader {
    #[serde(default)]
    uuid: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
}

impl RecordHeader {
    /// Decode the header fields from a JSON object payload.
    pub fn decode(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Parsed `uuid` field, if present and a well formed string.
    pub fn id(&self) -> Option<Uuid> {
        self.uuid
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|raw| Uuid::parse_str(raw).ok())
    }

    /// The `name` field when it is a string.
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().and_then(Value::as_str)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name() == Some(name)
    }

    pub fn has_id(&self, id: Uuid) -> bool {
        self.id() == Some(id)
    }
}
