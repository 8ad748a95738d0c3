//! Typed view over the stored template JSON.
//!
//! The settings row keeps whatever the designer submitted, byte-for-byte.
//! Rendering needs structure, so this module parses that JSON leniently:
//! recognized component kinds become typed variants, unrecognized kinds are
//! dropped, and malformed entries never fail the whole report.

use serde::Deserialize;
use serde_json::Value;

/// Global style knobs applied to every page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportStyles {
    pub font_size: u32,
    pub header_color: String,
    pub border_style: String,
}

impl Default for ReportStyles {
    fn default() -> Self {
        Self {
            font_size: 12,
            header_color: "#1a3c6e".to_string(),
            border_style: "solid".to_string(),
        }
    }
}

/// One renderable block. Kind-specific fields come from the component's
/// free-form `data` bag; anything missing falls back at render time.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
    HeaderText {
        title: Option<String>,
        subtitle: Option<String>,
    },
    PatientInfo,
    ResultTable,
    Logo {
        url: Option<String>,
    },
    Notes {
        heading: Option<String>,
    },
    ConsultantSection {
        name: Option<String>,
        designation: Option<String>,
    },
    AnalyteSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateComponent {
    pub id: String,
    pub font_size: Option<u32>,
    pub kind: ComponentKind,
}

#[derive(Debug, Clone)]
pub struct ParsedTemplate {
    pub components: Vec<TemplateComponent>,
    pub styles: ReportStyles,
}

#[derive(Deserialize)]
struct RawTemplate {
    #[serde(default)]
    components: Vec<Value>,
    #[serde(default)]
    styles: ReportStyles,
}

#[derive(Deserialize)]
struct RawComponent {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
    #[serde(rename = "fontSize", default)]
    font_size: Option<u32>,
}

fn str_field(data: &Value, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn kind_from_raw(kind: &str, data: &Value) -> Option<ComponentKind> {
    match kind {
        "header-text" => Some(ComponentKind::HeaderText {
            title: str_field(data, "title"),
            subtitle: str_field(data, "subtitle"),
        }),
        "patient-info" => Some(ComponentKind::PatientInfo),
        "result-table" => Some(ComponentKind::ResultTable),
        "logo" => Some(ComponentKind::Logo {
            url: str_field(data, "url"),
        }),
        "notes" => Some(ComponentKind::Notes {
            heading: str_field(data, "heading"),
        }),
        "consultant-section" => Some(ComponentKind::ConsultantSection {
            name: str_field(data, "name"),
            designation: str_field(data, "designation"),
        }),
        "analyte-summary" => Some(ComponentKind::AnalyteSummary),
        _ => None,
    }
}

/// Parse the stored template JSON. Never fails: a template that cannot be
/// read at all yields the empty component list, which the renderer replaces
/// with the fallback layout.
pub fn parse_template(value: &Value) -> ParsedTemplate {
    let raw: RawTemplate = match serde_json::from_value(value.clone()) {
        Ok(raw) => raw,
        Err(_) => {
            return ParsedTemplate {
                components: Vec::new(),
                styles: ReportStyles::default(),
            }
        }
    };

    let components = raw
        .components
        .into_iter()
        .filter_map(|entry| {
            let raw: RawComponent = serde_json::from_value(entry).ok()?;
            let kind = kind_from_raw(&raw.kind, &raw.data)?;
            Some(TemplateComponent {
                id: raw.id.unwrap_or_default(),
                font_size: raw.font_size,
                kind,
            })
        })
        .collect();

    ParsedTemplate {
        components,
        styles: raw.styles,
    }
}

/// Layout used when a template has no components (or none were saved):
/// header, patient info, result table, notes, in that order.
pub fn fallback_components() -> Vec<TemplateComponent> {
    let kinds = [
        ComponentKind::HeaderText {
            title: None,
            subtitle: None,
        },
        ComponentKind::PatientInfo,
        ComponentKind::ResultTable,
        ComponentKind::Notes { heading: None },
    ];
    kinds
        .into_iter()
        .enumerate()
        .map(|(i, kind)| TemplateComponent {
            id: format!("fallback-{i}"),
            font_size: None,
            kind,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recognized_kinds_parse() {
        let template = json!({
            "components": [
                {"id": "c1", "type": "header-text", "data": {"title": "Report"}},
                {"id": "c2", "type": "result-table", "data": {}},
                {"id": "c3", "type": "consultant-section",
                 "data": {"name": "Dr. Rao", "designation": "Pathologist"}}
            ],
            "styles": {"fontSize": 14, "headerColor": "#000", "borderStyle": "dashed"}
        });

        let parsed = parse_template(&template);
        assert_eq!(parsed.components.len(), 3);
        assert_eq!(
            parsed.components[0].kind,
            ComponentKind::HeaderText {
                title: Some("Report".into()),
                subtitle: None
            }
        );
        assert_eq!(parsed.styles.font_size, 14);
        assert_eq!(parsed.styles.border_style, "dashed");
    }

    #[test]
    fn unknown_kinds_are_skipped() {
        let template = json!({
            "components": [
                {"id": "c1", "type": "hologram", "data": {}},
                {"id": "c2", "type": "patient-info", "data": {}}
            ]
        });

        let parsed = parse_template(&template);
        assert_eq!(parsed.components.len(), 1);
        assert_eq!(parsed.components[0].kind, ComponentKind::PatientInfo);
    }

    #[test]
    fn malformed_template_yields_empty_list() {
        let parsed = parse_template(&json!("not an object"));
        assert!(parsed.components.is_empty());
        assert_eq!(parsed.styles.font_size, ReportStyles::default().font_size);
    }

    #[test]
    fn missing_styles_use_defaults() {
        let parsed = parse_template(&json!({"components": []}));
        assert_eq!(parsed.styles.header_color, "#1a3c6e");
    }

    #[test]
    fn per_component_font_size_survives() {
        let template = json!({
            "components": [
                {"id": "c1", "type": "notes", "data": {}, "fontSize": 10}
            ]
        });
        let parsed = parse_template(&template);
        assert_eq!(parsed.components[0].font_size, Some(10));
    }

    #[test]
    fn fallback_layout_order() {
        let kinds: Vec<_> = fallback_components()
            .into_iter()
            .map(|c| c.kind)
            .collect();
        assert!(matches!(kinds[0], ComponentKind::HeaderText { .. }));
        assert!(matches!(kinds[1], ComponentKind::PatientInfo));
        assert!(matches!(kinds[2], ComponentKind::ResultTable));
        assert!(matches!(kinds[3], ComponentKind::Notes { .. }));
    }
}
