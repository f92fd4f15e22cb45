//! Template Tree Model: Groups → Prepared Sections → Attribute Groups → Attributes.
//!
//! The whole tree is persisted as a single JSON document. Two kinds of reserved buckets
//! are structurally pinned:
//! - the hidden group (`HIDDEN_GROUP_ID`), always the last element of `Template.groups`
//! - the hidden-attributes group (`HIDDEN_ATTRIBUTES_ID`), always index 0 of a section's
//!   `attribute_groups`

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::schema::SectionSchema;

pub const HIDDEN_GROUP_ID: &str = "hidden-group";
pub const HIDDEN_GROUP_TITLE: &str = "Hidden Sections";
pub const HIDDEN_ATTRIBUTES_ID: &str = "hidden-attributes";
pub const HIDDEN_ATTRIBUTES_TITLE: &str = "Hidden Attributes";
pub const SHOWN_ATTRIBUTES_ID: &str = "shown-attributes";

// ────────────────────────────────────────────────────────────────────────────
// Template
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub title: String,
    #[serde(default = "default_true")]
    pub sort_ascending: bool,
    #[serde(default)]
    pub created_with_role: String,
    #[serde(default)]
    pub show_declaration: bool,
    #[serde(default)]
    pub groups: Vec<Group>,
}

fn default_true() -> bool {
    true
}

impl Template {
    /// A fresh template: every live section is parked in the hidden group.
    pub fn new<'a>(
        title: impl Into<String>,
        created_with_role: impl Into<String>,
        schemas: impl IntoIterator<Item = &'a SectionSchema>,
    ) -> Self {
        let mut hidden = Group::hidden();
        hidden.prepared_sections = schemas
            .into_iter()
            .map(PreparedSection::from_schema)
            .collect();
        Template {
            title: title.into(),
            sort_ascending: true,
            created_with_role: created_with_role.into(),
            show_declaration: false,
            groups: vec![hidden],
        }
    }

    /// Groups that end up in the compiled report.
    pub fn reportable_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| !g.is_hidden())
    }

    /// The durable form of the template: the hidden group is a view artifact that
    /// is rebuilt from the live schema on every load.
    pub fn without_hidden_group(&self) -> Template {
        Template {
            groups: self.reportable_groups().cloned().collect(),
            ..self.clone()
        }
    }
}

pub fn hidden_group_index(groups: &[Group]) -> Option<usize> {
    groups.iter().position(Group::is_hidden)
}

// ────────────────────────────────────────────────────────────────────────────
// Group
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub prepared_sections: Vec<PreparedSection>,
}

impl Group {
    pub fn new(title: impl Into<String>) -> Self {
        Group {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            prepared_sections: Vec::new(),
        }
    }

    pub fn hidden() -> Self {
        Group {
            id: HIDDEN_GROUP_ID.to_string(),
            title: HIDDEN_GROUP_TITLE.to_string(),
            prepared_sections: Vec::new(),
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.id == HIDDEN_GROUP_ID
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Prepared section
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSettings {
    #[serde(default)]
    pub numerically: bool,
    #[serde(default = "default_true")]
    pub ascending: bool,
    #[serde(default)]
    pub selected_attribute: Option<String>,
}

impl Default for SortSettings {
    fn default() -> Self {
        SortSettings {
            numerically: false,
            ascending: true,
            selected_attribute: None,
        }
    }
}

/// Renders `attribute` as an annotation under `attribute_to_associate_note`'s cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSetting {
    pub attribute: String,
    #[serde(default)]
    pub display_attribute_name: bool,
    pub attribute_to_associate_note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedSection {
    pub data_section_id: String,
    #[serde(default)]
    pub data_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renamed_section_title: Option<String>,
    #[serde(default)]
    pub sort: SortSettings,
    #[serde(default)]
    pub attribute_groups: Vec<AttributeGroup>,
    #[serde(default)]
    pub attribute_rename_map: BTreeMap<String, String>,
    #[serde(default)]
    pub show_row_count: bool,
    #[serde(default)]
    pub include_row_number_column: bool,
    #[serde(default)]
    pub merge_visible_attributes: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_settings: Option<Vec<NoteSetting>>,
    #[serde(default)]
    pub modified: bool,
    #[serde(default, deserialize_with = "deserialize_description_set")]
    pub modified_description: Vec<String>,
    /// Snapshot of the schema's typed classification at the last reconciliation.
    /// `Null` means no snapshot was ever taken.
    #[serde(default)]
    pub attributes_type: Value,
}

fn deserialize_description_set<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    let mut seen = HashSet::new();
    Ok(raw.into_iter().filter(|d| seen.insert(d.clone())).collect())
}

impl PreparedSection {
    /// A section configured with every schema attribute visible.
    pub fn from_schema(schema: &SectionSchema) -> Self {
        PreparedSection {
            data_section_id: schema.data_section_id.clone(),
            data_type: schema.data_type.clone(),
            title: schema.title.clone(),
            renamed_section_title: None,
            sort: SortSettings::default(),
            attribute_groups: vec![
                AttributeGroup::hidden(Vec::new()),
                AttributeGroup::shown(schema.display_names().map(String::from).collect()),
            ],
            attribute_rename_map: BTreeMap::new(),
            show_row_count: false,
            include_row_number_column: false,
            merge_visible_attributes: false,
            note_settings: None,
            modified: false,
            modified_description: Vec::new(),
            attributes_type: schema.attributes_type.clone(),
        }
    }

    /// Marks the section as drifted. Descriptions behave as an ordered set.
    pub fn flag(&mut self, description: &str) {
        self.modified = true;
        if !self.modified_description.iter().any(|d| d == description) {
            self.modified_description.push(description.to_string());
        }
    }

    /// Clears drift markers once the user has acknowledged them.
    pub fn resolve(&mut self) {
        self.modified = false;
        self.modified_description.clear();
    }

    pub fn display_title(&self) -> &str {
        match self.renamed_section_title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => &self.title,
        }
    }

    pub fn attribute_label<'a>(&'a self, attribute: &'a str) -> &'a str {
        self.attribute_rename_map
            .get(attribute)
            .map(String::as_str)
            .unwrap_or(attribute)
    }

    pub fn hidden_group_index(&self) -> Option<usize> {
        self.attribute_groups.iter().position(AttributeGroup::is_hidden)
    }

    pub fn attribute_group_index(&self, id: &str) -> Option<usize> {
        self.attribute_groups.iter().position(|g| g.id == id)
    }

    /// Non-hidden attribute groups in stored order.
    pub fn visible_groups(&self) -> impl Iterator<Item = &AttributeGroup> {
        self.attribute_groups.iter().filter(|g| !g.is_hidden())
    }

    /// Union of the non-hidden groups' attributes, in stored order.
    pub fn visible_attributes(&self) -> Vec<&str> {
        self.visible_groups()
            .flat_map(|g| g.attributes.iter().map(String::as_str))
            .collect()
    }

    pub fn visible_count(&self) -> usize {
        self.visible_groups().map(|g| g.attributes.len()).sum()
    }

    /// Every attribute name held anywhere in the section.
    pub fn attribute_names(&self) -> HashSet<&str> {
        self.attribute_groups
            .iter()
            .flat_map(|g| g.attributes.iter().map(String::as_str))
            .collect()
    }

    /// True when the user has defined groupings beyond the two reserved buckets.
    pub fn has_user_groups(&self) -> bool {
        self.attribute_groups.iter().any(|g| !g.is_reserved())
    }

    /// The hidden-attributes group, created at index 0 if missing and moved there if
    /// stored elsewhere.
    pub fn hidden_group_mut(&mut self) -> &mut AttributeGroup {
        match self.hidden_group_index() {
            Some(0) => {}
            Some(i) => {
                let group = self.attribute_groups.remove(i);
                self.attribute_groups.insert(0, group);
            }
            None => self
                .attribute_groups
                .insert(0, AttributeGroup::hidden(Vec::new())),
        }
        &mut self.attribute_groups[0]
    }

    /// The default visible bucket, created right after the hidden group if missing.
    pub fn shown_group_mut(&mut self) -> &mut AttributeGroup {
        let index = match self.attribute_group_index(SHOWN_ATTRIBUTES_ID) {
            Some(i) => i,
            None => {
                let at = usize::from(self.hidden_group_index() == Some(0));
                self.attribute_groups
                    .insert(at, AttributeGroup::shown(Vec::new()));
                at
            }
        };
        &mut self.attribute_groups[index]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Attribute group
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeGroup {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl AttributeGroup {
    pub fn new(title: impl Into<String>) -> Self {
        AttributeGroup {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            attributes: Vec::new(),
        }
    }

    pub fn hidden(attributes: Vec<String>) -> Self {
        AttributeGroup {
            id: HIDDEN_ATTRIBUTES_ID.to_string(),
            title: HIDDEN_ATTRIBUTES_TITLE.to_string(),
            attributes,
        }
    }

    /// The shown bucket carries no title; it renders as a blank banner span.
    pub fn shown(attributes: Vec<String>) -> Self {
        AttributeGroup {
            id: SHOWN_ATTRIBUTES_ID.to_string(),
            title: String::new(),
            attributes,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.id == HIDDEN_ATTRIBUTES_ID
    }

    pub fn is_reserved(&self) -> bool {
        self.id == HIDDEN_ATTRIBUTES_ID || self.id == SHOWN_ATTRIBUTES_ID
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Builds a section with the given hidden and shown attributes.
    pub(crate) fn section(id: &str, hidden: &[&str], shown: &[&str]) -> PreparedSection {
        PreparedSection {
            data_section_id: id.to_string(),
            data_type: "education".to_string(),
            title: "Education".to_string(),
            renamed_section_title: None,
            sort: SortSettings::default(),
            attribute_groups: vec![
                AttributeGroup::hidden(hidden.iter().map(|s| s.to_string()).collect()),
                AttributeGroup::shown(shown.iter().map(|s| s.to_string()).collect()),
            ],
            attribute_rename_map: BTreeMap::new(),
            show_row_count: false,
            include_row_number_column: false,
            merge_visible_attributes: false,
            note_settings: None,
            modified: false,
            modified_description: Vec::new(),
            attributes_type: json!({"date": {"Year": {}}}),
        }
    }

    pub(crate) fn group(id: &str, title: &str, sections: Vec<PreparedSection>) -> Group {
        Group {
            id: id.to_string(),
            title: title.to_string(),
            prepared_sections: sections,
        }
    }

    #[test]
    fn test_flag_deduplicates_descriptions() {
        let mut s = section("DS01", &[], &["Degree"]);
        s.flag("Section title was renamed.");
        s.flag("Section title was renamed.");
        assert!(s.modified);
        assert_eq!(s.modified_description.len(), 1);
    }

    #[test]
    fn test_deserialize_dedupes_stored_descriptions() {
        let raw = json!({
            "data_section_id": "DS01",
            "title": "Education",
            "modified": true,
            "modified_description": ["a", "b", "a"]
        });
        let s: PreparedSection = serde_json::from_value(raw).unwrap();
        assert_eq!(s.modified_description, vec!["a", "b"]);
        assert!(s.sort.ascending);
        assert_eq!(s.attributes_type, Value::Null);
    }

    #[test]
    fn test_display_title_prefers_rename() {
        let mut s = section("DS01", &[], &["Degree"]);
        assert_eq!(s.display_title(), "Education");
        s.renamed_section_title = Some("Degrees".to_string());
        assert_eq!(s.display_title(), "Degrees");
        s.renamed_section_title = Some("   ".to_string());
        assert_eq!(s.display_title(), "Education");
    }

    #[test]
    fn test_visible_attributes_skip_hidden_group() {
        let s = section("DS01", &["Notes"], &["Degree", "Year"]);
        assert_eq!(s.visible_attributes(), vec!["Degree", "Year"]);
        assert_eq!(s.visible_count(), 2);
        assert!(!s.has_user_groups());
    }

    #[test]
    fn test_hidden_group_mut_repins_to_front() {
        let mut s = section("DS01", &["Notes"], &["Degree"]);
        s.attribute_groups.swap(0, 1);
        s.hidden_group_mut().attributes.push("Extra".to_string());
        assert!(s.attribute_groups[0].is_hidden());
        assert_eq!(s.attribute_groups[0].attributes, vec!["Notes", "Extra"]);
    }

    #[test]
    fn test_shown_group_mut_created_after_hidden() {
        let mut s = section("DS01", &["Notes"], &[]);
        s.attribute_groups.truncate(1);
        s.shown_group_mut().attributes.push("Degree".to_string());
        assert_eq!(s.attribute_groups[1].id, SHOWN_ATTRIBUTES_ID);
    }

    #[test]
    fn test_without_hidden_group_strips_only_hidden() {
        let template = Template {
            title: "CV".to_string(),
            sort_ascending: true,
            created_with_role: "faculty".to_string(),
            show_declaration: false,
            groups: vec![
                group("g1", "Education", vec![section("DS01", &[], &["Degree"])]),
                group(HIDDEN_GROUP_ID, HIDDEN_GROUP_TITLE, vec![section("DS02", &[], &["Title"])]),
            ],
        };
        let durable = template.without_hidden_group();
        assert_eq!(durable.groups.len(), 1);
        assert_eq!(durable.groups[0].id, "g1");
        assert_eq!(durable.title, "CV");
    }
}
