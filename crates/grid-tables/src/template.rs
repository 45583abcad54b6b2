use bson::{Bson, Document};
use regex::Regex;

use crate::config::TableConfig;
use crate::error::TableError;
use crate::format::ValueFormat;
use crate::highlight::Highlighter;
use crate::render::{RowRenderer, cell_to_string};

const PLACEHOLDER: &str = r"\{\{\s*([A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)\s*\}\}";

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Value(Vec<String>),
}

/// A cell template with `{{ key }}` and `{{ key.sub }}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, String> {
        let pattern = Regex::new(PLACEHOLDER).map_err(|e| e.to_string())?;
        let mut segments = Vec::new();
        let mut last = 0;
        for caps in pattern.captures_iter(source) {
            let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            push_text(&mut segments, &source[last..whole.start()])?;
            segments.push(Segment::Value(
                path.as_str().split('.').map(str::to_string).collect(),
            ));
            last = whole.end();
        }
        push_text(&mut segments, &source[last..])?;
        Ok(Self { segments })
    }

    /// First path segment of every placeholder.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Value(path) => path.first().map(String::as_str),
            Segment::Text(_) => None,
        })
    }

    /// Missing values render as nothing. Values are HTML-escaped; template
    /// text is not.
    pub fn render(&self, context: &Document) -> String {
        self.render_highlighted(context, None)
    }

    /// As [`Template::render`], with the search term marked inside each
    /// substituted value. Template text is never highlighted.
    pub fn render_highlighted(
        &self,
        context: &Document,
        highlighter: Option<&Highlighter>,
    ) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Value(path) => {
                    if let Some(value) = lookup(context, path) {
                        let raw = cell_to_string(value);
                        let escaped = html_escape::encode_safe(&raw);
                        match highlighter {
                            Some(h) => out.push_str(&h.apply(&escaped)),
                            None => out.push_str(&escaped),
                        }
                    }
                }
            }
        }
        out
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str) -> Result<(), String> {
    if text.contains("{{") || text.contains("}}") {
        return Err(format!("malformed placeholder in: {text}"));
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text.to_string()));
    }
    Ok(())
}

fn lookup<'a>(context: &'a Document, path: &[String]) -> Option<&'a Bson> {
    let (first, rest) = path.split_first()?;
    let mut current = context.get(first)?;
    for segment in rest {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Template variable name for a column path.
pub fn context_key(field: &str) -> String {
    field.replace('.', "_")
}

#[derive(Debug, Clone)]
struct RenderColumn {
    key: String,
    format: Option<ValueFormat>,
}

/// Renders rows through the table's value formats and cell templates, with
/// optional search highlighting.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    columns: Vec<RenderColumn>,
    templates: Vec<Template>,
    highlight: bool,
}

impl TemplateRenderer {
    pub fn from_config(config: &TableConfig) -> Result<Self, TableError> {
        let columns: Vec<RenderColumn> = config
            .columns
            .iter()
            .map(|c| RenderColumn {
                key: context_key(&c.name),
                format: c.format.clone(),
            })
            .collect();

        let templates = config
            .row
            .iter()
            .map(|source| Template::parse(source).map_err(TableError::Config))
            .collect::<Result<Vec<_>, _>>()?;

        for key in templates.iter().flat_map(Template::keys) {
            if !columns.iter().any(|c| c.key == key) {
                return Err(TableError::Config(format!(
                    "template references unknown column: {key}"
                )));
            }
        }

        Ok(Self {
            columns,
            templates,
            highlight: config.highlight_search,
        })
    }

    fn context(&self, cells: &[Bson]) -> Document {
        let mut context = Document::new();
        for (column, cell) in self.columns.iter().zip(cells) {
            let value = match &column.format {
                Some(format) => format.apply(cell),
                None => cell.clone(),
            };
            context.insert(column.key.clone(), value);
        }
        context
    }
}

impl RowRenderer for TemplateRenderer {
    fn render(&self, cells: &[Bson], search: &str) -> Vec<String> {
        let context = self.context(cells);
        let highlighter = Highlighter::new(search).filter(|_| self.highlight);

        if self.templates.is_empty() {
            self.columns
                .iter()
                .map(|column| {
                    let value = context.get(&column.key).unwrap_or(&Bson::Null);
                    let text = match value {
                        Bson::Document(formatted) if column.format.is_some() => formatted
                            .get("formatted")
                            .map(cell_to_string)
                            .unwrap_or_default(),
                        other => cell_to_string(other),
                    };
                    let escaped = html_escape::encode_safe(&text);
                    match &highlighter {
                        Some(h) => h.apply(&escaped),
                        None => escaped.into_owned(),
                    }
                })
                .collect()
        } else {
            self.templates
                .iter()
                .map(|t| t.render_highlighted(&context, highlighter.as_ref()))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnConfig;
    use bson::doc;

    fn config(row: &[&str]) -> TableConfig {
        TableConfig {
            collection: "users".into(),
            columns: vec![
                ColumnConfig::new("name"),
                ColumnConfig::new("address.city"),
                ColumnConfig {
                    name: "created".into(),
                    format: Some(ValueFormat::Date {
                        format: "%Y-%m-%d".into(),
                    }),
                },
            ],
            row: row.iter().map(|s| s.to_string()).collect(),
            ..TableConfig::default()
        }
    }

    fn cells() -> Vec<Bson> {
        vec![
            Bson::String("Ada <admin>".into()),
            Bson::String("London".into()),
            Bson::Int64(1_700_000_000),
        ]
    }

    #[test]
    fn parses_text_and_placeholders() {
        let t = Template::parse("<b>{{ name }}</b> from {{address_city}}").unwrap();
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["name", "address_city"]);
    }

    #[test]
    fn unterminated_placeholder_is_rejected() {
        assert!(Template::parse("{{ name ").is_err());
        assert!(Template::parse("{{ }}").is_err());
    }

    #[test]
    fn templates_escape_values_not_markup() {
        let renderer = TemplateRenderer::from_config(&config(&[
            "<b>{{ name }}</b>",
            "{{ address_city }} on {{ created.formatted }}",
        ]))
        .unwrap();
        assert_eq!(
            renderer.render(&cells(), ""),
            vec![
                "<b>Ada &lt;admin&gt;</b>".to_string(),
                "London on 2023-11-14".to_string(),
            ]
        );
    }

    #[test]
    fn without_templates_each_column_is_a_cell() {
        let renderer = TemplateRenderer::from_config(&config(&[])).unwrap();
        assert_eq!(
            renderer.render(&cells(), ""),
            vec!["Ada &lt;admin&gt;", "London", "2023-11-14"]
        );
    }

    #[test]
    fn missing_values_render_empty() {
        let renderer = TemplateRenderer::from_config(&config(&["[{{ address_city }}]"])).unwrap();
        let row = vec![Bson::String("Ada".into()), Bson::Null, Bson::Null];
        assert_eq!(renderer.render(&row, ""), vec!["[]"]);
    }

    #[test]
    fn highlight_only_when_enabled() {
        let mut cfg = config(&["{{ address_city }}"]);
        let plain = TemplateRenderer::from_config(&cfg).unwrap();
        assert_eq!(plain.render(&cells(), "lon"), vec!["London"]);

        cfg.highlight_search = true;
        let highlighted = TemplateRenderer::from_config(&cfg).unwrap();
        assert_eq!(
            highlighted.render(&cells(), "lon"),
            vec![r#"<span class="textHighlighted">Lon</span>don"#]
        );
    }

    #[test]
    fn highlight_leaves_template_markup_alone() {
        let mut cfg = config(&["<b>{{ name }}</b> in {{ address_city }}"]);
        cfg.highlight_search = true;
        let renderer = TemplateRenderer::from_config(&cfg).unwrap();
        let row = vec![
            Bson::String("Bob".into()),
            Bson::String("Lisbon".into()),
            Bson::Null,
        ];
        assert_eq!(
            renderer.render(&row, "b"),
            vec![concat!(
                r#"<b><span class="textHighlighted">B</span>ob</b>"#,
                r#" in Lis<span class="textHighlighted">b</span>on"#,
            )]
        );
    }

    #[test]
    fn unknown_template_key_is_a_config_error() {
        let err = TemplateRenderer::from_config(&config(&["{{ email }}"])).unwrap_err();
        assert!(matches!(err, TableError::Config(_)));
    }

    #[test]
    fn context_keys_flatten_dots() {
        assert_eq!(context_key("address.geo.lat"), "address_geo_lat");
        let renderer = TemplateRenderer::from_config(&config(&[])).unwrap();
        let context = renderer.context(&cells());
        assert_eq!(context.get_str("address_city").unwrap(), "London");
        assert_eq!(
            context.get_document("created").unwrap(),
            &doc! { "unix": 1_700_000_000_i64, "formatted": "2023-11-14" }
        );
    }
}
