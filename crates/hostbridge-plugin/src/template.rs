/// Source templates with `{{ name }}` placeholders
///
/// Templates are parsed once into text and placeholder segments, then
/// rendered against a set of bindings. Every placeholder must be bound.

use std::collections::BTreeMap;
use std::fmt::Display;

use crate::error::{PluginError, Result};

/// Name of the function exported by [`ADD_TEMPLATE`]
pub const ADD_SYMBOL: &str = "add";

/// Plugin source exporting `add(x) = x + number`
pub const ADD_TEMPLATE: &str = r#"#[no_mangle]
pub extern "C" fn add(x: i64) -> i64 {
    x.wrapping_add({{ number }})
}
"#;

/// Values substituted into a template, keyed by placeholder name
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: BTreeMap<String, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to the display form of `value`
    pub fn insert(&mut self, name: impl Into<String>, value: impl Display) -> &mut Self {
        self.values.insert(name.into(), value.to_string());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Placeholder(String),
}

/// A parsed template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template text
    ///
    /// Fails on an unclosed `{{` or on a placeholder whose name is empty or
    /// contains characters other than ASCII letters, digits and `_`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = text;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }

            let after_open = &rest[start + 2..];
            let end = after_open.find("}}").ok_or_else(|| PluginError::Template {
                offset: offset + start,
                message: "unclosed placeholder".into(),
            })?;

            let name = after_open[..end].trim();
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(PluginError::Template {
                    offset: offset + start,
                    message: format!("invalid placeholder name `{}`", name),
                });
            }
            segments.push(Segment::Placeholder(name.to_string()));

            let consumed = start + 2 + end + 2;
            rest = &rest[consumed..];
            offset += consumed;
        }

        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Names of all placeholders, in order of appearance
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Substitute every placeholder from `bindings`
    pub fn render(&self, bindings: &Bindings) -> Result<String> {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => output.push_str(text),
                Segment::Placeholder(name) => {
                    let value = bindings
                        .get(name)
                        .ok_or_else(|| PluginError::MissingBinding(name.clone()))?;
                    output.push_str(value);
                }
            }
        }
        Ok(output)
    }
}

/// Render [`ADD_TEMPLATE`] with `number` as the added constant
pub fn render_add_plugin(number: i64) -> Result<String> {
    let template = Template::parse(ADD_TEMPLATE)?;
    template.render(&Bindings::new().with("number", number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_add_plugin() {
        let source = render_add_plugin(23).unwrap();
        assert!(source.contains("pub extern \"C\" fn add(x: i64) -> i64"));
        assert!(source.contains("x.wrapping_add(23)"));
        assert!(!source.contains("{{"));
    }

    #[test]
    fn test_negative_number() {
        let source = render_add_plugin(-5).unwrap();
        assert!(source.contains("x.wrapping_add(-5)"));
    }

    #[test]
    fn test_placeholders() {
        let template = Template::parse("{{a}} and {{ b }} and {{a}}").unwrap();
        let names: Vec<&str> = template.placeholders().collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_missing_binding() {
        let template = Template::parse("x + {{ number }}").unwrap();
        let err = template.render(&Bindings::new()).unwrap_err();
        assert!(matches!(err, PluginError::MissingBinding(name) if name == "number"));
    }

    #[test]
    fn test_unclosed_placeholder() {
        let err = Template::parse("abc {{ number").unwrap_err();
        assert!(matches!(err, PluginError::Template { offset: 4, .. }));
    }

    #[test]
    fn test_invalid_placeholder_name() {
        let err = Template::parse("ok {{ a }} then {{ .Number }}").unwrap_err();
        assert!(matches!(err, PluginError::Template { offset: 16, .. }));
    }

    #[test]
    fn test_text_only() {
        let template = Template::parse("no placeholders here").unwrap();
        assert_eq!(template.placeholders().count(), 0);
        assert_eq!(template.render(&Bindings::new()).unwrap(), "no placeholders here");
    }
}
