//! Front matter / body split for Markdown notes

use anyhow::{Context, Result, bail};
use serde_yaml::{Mapping, Value};

const DELIMITER: &str = "---";

/// Markdown note split into its YAML header and body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub metadata: Mapping,
    pub body: String,
    /// Header exactly as it appeared in the source (delimiters included)
    header: String,
}

impl Document {
    /// Split `text` into metadata and body
    ///
    /// Text without a leading `---` line is all body. An opening delimiter
    /// with no closing one, or YAML that is not a mapping, is an error.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut lines = text.split_inclusive('\n');
        let Some(first) = lines.next() else {
            return Ok(Self::default());
        };
        if first.trim_end() != DELIMITER {
            return Ok(Self {
                metadata: Mapping::new(),
                body: text.to_string(),
                header: String::new(),
            });
        }

        let mut offset = first.len();
        let mut yaml_end = None;
        for line in lines {
            let trimmed = line.trim_end();
            if trimmed == DELIMITER || trimmed == "..." {
                yaml_end = Some((offset, offset + line.len()));
                break;
            }
            offset += line.len();
        }

        let Some((yaml_end, header_end)) = yaml_end else {
            bail!("front matter is not terminated by a closing '---' line");
        };

        let yaml = &text[first.len()..yaml_end];
        let metadata = if yaml.trim().is_empty() {
            Mapping::new()
        } else {
            match serde_yaml::from_str::<Value>(yaml).context("invalid YAML front matter")? {
                Value::Mapping(map) => map,
                Value::Null => Mapping::new(),
                other => bail!("front matter must be a mapping, got {:?}", other),
            }
        };

        let rest = &text[header_end..];
        let body = rest.trim_start_matches(['\n', '\r']);
        let header = text[..header_end + (rest.len() - body.len())].to_string();

        Ok(Self {
            metadata,
            body: body.to_string(),
            header,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Metadata value rendered as text, empty when absent
    pub fn get_text(&self, key: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// Re-emit metadata with serde_yaml followed by the body
    pub fn serialize(&self) -> Result<String> {
        if self.metadata.is_empty() {
            return Ok(self.body.clone());
        }
        let yaml = serde_yaml::to_string(&self.metadata).context("failed to encode front matter")?;
        Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n\n{}", self.body))
    }

    /// Original header text verbatim followed by a replacement body
    pub fn with_body(&self, body: &str) -> String {
        let mut out = String::with_capacity(self.header.len() + body.len());
        out.push_str(&self.header);
        out.push_str(body);
        out
    }
}
