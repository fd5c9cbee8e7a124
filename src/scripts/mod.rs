//! Script descriptors: the unit of generated code handed back to the Studio plugin.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod extract;

pub use extract::{extract_scripts, strip_code_fences};

pub const DEFAULT_SCRIPT_NAME: &str = "GeneratedScript";
pub const DEFAULT_SCRIPT_TYPE: &str = "Script";
pub const DEFAULT_PARENT: &str = "ServerScriptService";
pub const DEFAULT_CODE: &str = "-- No code generated";
pub const EMPTY_CODE: &str = "-- Empty response";

/// One generated script and where it should be placed in the DataModel.
///
/// `script_type` and `parent` are passed through as-is; the plugin decides
/// what to do with values outside `Script`/`LocalScript`/`ModuleScript`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptDescriptor {
    pub script_name: String,
    pub script_type: String,
    pub parent: String,
    pub code: String,
}

impl ScriptDescriptor {
    /// A descriptor with every field defaulted except `code`.
    pub fn placeholder(code: impl Into<String>) -> Self {
        Self {
            script_name: DEFAULT_SCRIPT_NAME.to_string(),
            script_type: DEFAULT_SCRIPT_TYPE.to_string(),
            parent: DEFAULT_PARENT.to_string(),
            code: code.into(),
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        let script_name = text_field(obj, "scriptName")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SCRIPT_NAME.to_string());
        Self {
            script_name,
            script_type: text_field(obj, "scriptType")
                .unwrap_or_else(|| DEFAULT_SCRIPT_TYPE.to_string()),
            parent: text_field(obj, "parent").unwrap_or_else(|| DEFAULT_PARENT.to_string()),
            code: text_field(obj, "code").unwrap_or_else(|| DEFAULT_CODE.to_string()),
        }
    }
}

/// Read a field as text. Scalars are coerced; null, arrays and objects count as missing.
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Textual form of an arbitrary JSON value: strings as their content, everything else as JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a parsed model reply of any shape into a non-empty descriptor list.
///
/// A lone object becomes a one-element list, any other non-list value becomes a
/// placeholder carrying the value as code, and non-object list items are dropped.
pub fn normalize_scripts(value: &Value) -> Vec<ScriptDescriptor> {
    let items = match value {
        Value::Object(_) => std::slice::from_ref(value),
        Value::Array(items) => items.as_slice(),
        other => return vec![ScriptDescriptor::placeholder(render_value(other))],
    };

    let scripts: Vec<ScriptDescriptor> = items
        .iter()
        .filter_map(Value::as_object)
        .map(ScriptDescriptor::from_object)
        .collect();

    if scripts.is_empty() {
        vec![ScriptDescriptor::placeholder(EMPTY_CODE)]
    } else {
        scripts
    }
}
