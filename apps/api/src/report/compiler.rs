//! Report Compiler: turns a reconciled template tree plus CV data into a LaTeX document.
//!
//! Layout per visible group:
//! - a group band, then per section a section band
//! - unless merged: an optional attribute-group banner row and the column-header row
//! - one single-row table block per record, so long cells never pin neighbouring rows
//!   to the same page
//!
//! Compilation never fails on data. Malformed records degrade to their raw text and
//! sections without a live schema are skipped.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::models::record::CvDataRecordRow;
use crate::models::schema::SectionSchemaRow;
use crate::report::columns::{default_report_layout, ReportLayout};
use crate::report::escape::{latex_escape, latex_escape_with_breaks, SOFT_BREAK};
use crate::report::markup::{band, multicolumn, table_block, PREAMBLE, TERMINATOR};
use crate::schema::{AttributeKind, SchemaCatalog, SectionSchema};
use crate::template::model::{PreparedSection, Template};

// ────────────────────────────────────────────────────────────────────────────
// Context
// ────────────────────────────────────────────────────────────────────────────

/// A record's `data_details`, parsed once up front.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordDetails {
    Fields(Map<String, Value>),
    /// `data_details` that was not a JSON object, kept verbatim.
    Raw(String),
}

impl RecordDetails {
    pub fn parse(data_section_id: &str, raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => RecordDetails::Fields(fields),
            Ok(_) => {
                warn!(section = %data_section_id, "Record details are not an object; rendering raw");
                RecordDetails::Raw(raw.to_string())
            }
            Err(e) => {
                warn!(section = %data_section_id, error = %e, "Unparseable record details; rendering raw");
                RecordDetails::Raw(raw.to_string())
            }
        }
    }
}

/// Everything the compiler reads besides the template itself.
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    pub catalog: SchemaCatalog,
    records: HashMap<String, Vec<RecordDetails>>,
}

impl CompileContext {
    /// Records keep their supplied order within each section.
    pub fn new(catalog: SchemaCatalog, records: &[CvDataRecordRow]) -> Self {
        let mut by_section: HashMap<String, Vec<RecordDetails>> = HashMap::new();
        for row in records {
            by_section
                .entry(row.data_section_id.clone())
                .or_default()
                .push(RecordDetails::parse(&row.data_section_id, &row.data_details));
        }
        CompileContext {
            catalog,
            records: by_section,
        }
    }

    pub fn records_for(&self, data_section_id: &str) -> &[RecordDetails] {
        self.records
            .get(data_section_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entry points
// ────────────────────────────────────────────────────────────────────────────

/// Compiles straight from raw rows with the default layout. The service goes
/// through `compile_with` so it can reuse its catalog and configured layout.
#[allow(dead_code)]
pub fn compile(
    template: &Template,
    schemas: &[SectionSchemaRow],
    records: &[CvDataRecordRow],
) -> String {
    let ctx = CompileContext::new(SchemaCatalog::from_rows(schemas), records);
    compile_with(template, &ctx, &default_report_layout())
}

pub fn compile_with(template: &Template, ctx: &CompileContext, layout: &ReportLayout) -> String {
    let l = layout.table_width_fraction;
    let mut out = String::from(PREAMBLE);

    for group in template.reportable_groups() {
        out.push_str(&band(&latex_escape(&group.title), "groupband", true, l, true));

        for section in &group.prepared_sections {
            let Some(schema) = ctx.catalog.get(&section.data_section_id) else {
                warn!(
                    section = %section.data_section_id,
                    "No live schema for section; skipping in report"
                );
                continue;
            };
            let records = ctx.records_for(&section.data_section_id);
            render_section(&mut out, section, schema, records, layout);
        }

        out.push_str(&format!("\\vspace{{{}pt}}\n", layout.group_spacing_pt));
    }

    if template.show_declaration {
        render_declaration(&mut out, layout);
    }

    out.push_str(TERMINATOR);
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

fn render_section(
    out: &mut String,
    section: &PreparedSection,
    schema: &SectionSchema,
    records: &[RecordDetails],
    layout: &ReportLayout,
) {
    let l = layout.table_width_fraction;
    let visible = section.visible_attributes();
    let numbering = section.include_row_number_column;
    let merged = section.merge_visible_attributes;

    let mut title = latex_escape(section.display_title());
    if section.show_row_count {
        title.push_str(&format!(" ({})", records.len()));
    }
    out.push_str(&band(&title, "sectionband", false, l, false));

    let ratios = column_ratios(visible.len(), numbering, merged, layout);

    if !merged && !visible.is_empty() {
        let mut header_rows = Vec::with_capacity(2);
        if section.has_user_groups() {
            header_rows.push(banner_row(section, numbering));
        }
        header_rows.push(header_row(section, &visible, numbering));
        out.push_str(&table_block(&ratios, l, &header_rows, false));
    }

    for (i, record) in records.iter().enumerate() {
        let mut cells = if merged {
            vec![merged_cell(section, schema, &visible, record)]
        } else {
            attribute_cells(section, schema, &visible, record)
        };
        if numbering {
            cells.insert(0, (i + 1).to_string());
        }
        out.push_str(&table_block(&ratios, l, &[cells.join(" & ")], false));
    }
}

fn column_ratios(visible: usize, numbering: bool, merged: bool, layout: &ReportLayout) -> Vec<f64> {
    match (merged, numbering) {
        (true, true) => vec![1.0, layout.merged_row_number_ratio],
        (true, false) => vec![1.0],
        (false, _) => {
            let columns = visible.max(1) + usize::from(numbering);
            vec![1.0; columns]
        }
    }
}

/// Attribute-group titles spanning their columns. The shown bucket stays blank.
fn banner_row(section: &PreparedSection, numbering: bool) -> String {
    let mut cells = Vec::new();
    if numbering {
        cells.push(multicolumn(1, true, ""));
    }
    for group in section.visible_groups().filter(|g| !g.attributes.is_empty()) {
        let first = cells.is_empty();
        cells.push(multicolumn(group.attributes.len(), first, &latex_escape(&group.title)));
    }
    format!("\\rowcolor{{headerrow}}{}", cells.join(" & "))
}

fn header_row(section: &PreparedSection, visible: &[&str], numbering: bool) -> String {
    let mut cells: Vec<String> = Vec::with_capacity(visible.len() + 1);
    if numbering {
        cells.push("\\textbf{Row \\#}".to_string());
    }
    for attribute in visible {
        cells.push(format!(
            "\\textbf{{{}}}",
            latex_escape(section.attribute_label(attribute))
        ));
    }
    format!("\\rowcolor{{headerrow}}{}", cells.join(" & "))
}

fn attribute_cells(
    section: &PreparedSection,
    schema: &SectionSchema,
    visible: &[&str],
    record: &RecordDetails,
) -> Vec<String> {
    let width = visible.len().max(1);
    match record {
        RecordDetails::Raw(raw) => {
            let mut cells = vec![String::new(); width];
            cells[0] = latex_escape_with_breaks(raw);
            cells
        }
        RecordDetails::Fields(fields) => {
            if visible.is_empty() {
                return vec![String::new()];
            }
            visible
                .iter()
                .map(|attribute| {
                    let mut cell = latex_escape_with_breaks(&attribute_value(schema, fields, attribute));
                    for note in note_lines(section, schema, fields, attribute) {
                        cell.push_str(&note);
                    }
                    cell
                })
                .collect()
        }
    }
}

fn merged_cell(
    section: &PreparedSection,
    schema: &SectionSchema,
    visible: &[&str],
    record: &RecordDetails,
) -> String {
    match record {
        RecordDetails::Raw(raw) => latex_escape_with_breaks(raw),
        RecordDetails::Fields(fields) => {
            let mut cell = visible
                .iter()
                .map(|attribute| attribute_value(schema, fields, attribute))
                .filter(|value| !value.is_empty())
                .map(|value| latex_escape_with_breaks(&value))
                .collect::<Vec<_>>()
                .join(&format!(",{SOFT_BREAK} "));
            for attribute in visible {
                for note in note_lines(section, schema, fields, attribute) {
                    cell.push_str(&note);
                }
            }
            cell
        }
    }
}

/// Annotation lines attached to `attribute`'s cell. The noted attribute is read
/// whether or not it is visible itself.
fn note_lines(
    section: &PreparedSection,
    schema: &SectionSchema,
    fields: &Map<String, Value>,
    attribute: &str,
) -> Vec<String> {
    let Some(notes) = &section.note_settings else {
        return Vec::new();
    };
    notes
        .iter()
        .filter(|n| n.attribute_to_associate_note == attribute)
        .filter_map(|n| {
            let value = attribute_value(schema, fields, &n.attribute);
            if value.is_empty() {
                return None;
            }
            let body = latex_escape_with_breaks(&value);
            Some(if n.display_attribute_name {
                format!(
                    "\\newline\\textit{{{}: {body}}}",
                    latex_escape(section.attribute_label(&n.attribute))
                )
            } else {
                format!("\\newline\\textit{{{body}}}")
            })
        })
        .collect()
}

/// The unescaped display string of one attribute. Unknown attributes and missing
/// fields yield an empty string.
fn attribute_value(schema: &SectionSchema, fields: &Map<String, Value>, attribute: &str) -> String {
    let Some(descriptor) = schema.attribute(attribute) else {
        return String::new();
    };
    fields
        .get(&descriptor.field_key)
        .map(|v| format_value(descriptor.kind, v))
        .unwrap_or_default()
}

pub fn format_value(kind: AttributeKind, value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => yes_no(*b).to_string(),
        Value::String(s) if kind == AttributeKind::Boolean => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => "Yes".to_string(),
            "false" | "no" | "0" => "No".to_string(),
            _ => s.clone(),
        },
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| format_value(kind, item))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "Yes"
    } else {
        "No"
    }
}

fn render_declaration(out: &mut String, layout: &ReportLayout) {
    out.push_str("\\vspace{12pt}\n");
    out.push_str("\\noindent\\textbf{Declaration}\\par\n");
    out.push_str(&format!(
        "\\noindent {}\\par\n",
        latex_escape(&layout.declaration_text)
    ));
    out.push_str("\\vspace{24pt}\n");
    out.push_str("\\noindent Signature: \\rule{6cm}{0.4pt}\\hfill Date: \\rule{4cm}{0.4pt}\\par\n");
}
