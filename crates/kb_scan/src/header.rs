use serde_json::Value;
use std::collections::BTreeMap;

/// Result of looking for a metadata header at the top of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderBlock {
    /// No `---` block at the top of the file (or an unterminated/empty one).
    Missing,
    /// A delimited block exists but is not a valid YAML mapping.
    Malformed(String),
    /// Parsed fields plus the 1-based line number of the closing delimiter.
    Parsed {
        fields: BTreeMap<String, Value>,
        end_line: u32,
    },
}

/// Extract the YAML metadata header from document content.
///
/// The header is the block between a leading `---` line (optional BOM
/// tolerated) and the next `---` or `...` line. Fields are parsed through
/// serde_yaml and converted to JSON values for uniform downstream handling.
pub fn extract_header(input: &str) -> HeaderBlock {
    let mut lines = input.lines();

    let Some(first) = lines.next() else {
        return HeaderBlock::Missing;
    };
    if first.trim_start_matches('\u{feff}').trim_end() != "---" {
        return HeaderBlock::Missing;
    }

    let mut yaml_lines: Vec<&str> = Vec::new();
    let mut end_line: u32 = 1;
    let mut closed = false;

    for line in lines {
        end_line += 1;
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            closed = true;
            break;
        }
        yaml_lines.push(line);
    }

    if !closed || yaml_lines.is_empty() {
        return HeaderBlock::Missing;
    }

    let raw_yaml = yaml_lines.join("\n");
    match parse_yaml_to_json_map(&raw_yaml) {
        Ok(map) => HeaderBlock::Parsed {
            fields: map,
            end_line,
        },
        Err(err) => HeaderBlock::Malformed(err),
    }
}

fn parse_yaml_to_json_map(yaml: &str) -> Result<BTreeMap<String, Value>, String> {
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|err| err.to_string())?;
    let json_value: Value =
        serde_json::to_value(yaml_value).map_err(|err| err.to_string())?;

    match json_value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(format!(
            "header block is not a key/value mapping (got {})",
            value_type_name(&other)
        )),
    }
}

pub(crate) fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
