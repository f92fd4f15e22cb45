//! Structural edits that are not drags: creating, renaming and removing buckets,
//! per-section display options, and acknowledging drift.
//!
//! Each edit preserves the tree invariants on its own: new groups are inserted ahead of
//! the hidden group, removed buckets hand their contents to a reserved bucket, and the
//! reserved buckets themselves cannot be removed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::template::index::SectionIndex;
use crate::template::model::{
    hidden_group_index, AttributeGroup, Group, NoteSetting, PreparedSection, SortSettings,
    Template,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TemplateEdit {
    SetTemplateSettings {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        sort_ascending: Option<bool>,
        #[serde(default)]
        show_declaration: Option<bool>,
    },
    AddGroup {
        title: String,
    },
    RenameGroup {
        group_id: String,
        title: String,
    },
    RemoveGroup {
        group_id: String,
    },
    AddAttributeGroup {
        section_id: String,
        title: String,
    },
    RenameAttributeGroup {
        section_id: String,
        attribute_group_id: String,
        title: String,
    },
    RemoveAttributeGroup {
        section_id: String,
        attribute_group_id: String,
    },
    RenameSection {
        section_id: String,
        #[serde(default)]
        title: Option<String>,
    },
    RenameAttribute {
        section_id: String,
        attribute: String,
        label: String,
    },
    SetSectionOptions {
        section_id: String,
        #[serde(default)]
        show_row_count: Option<bool>,
        #[serde(default)]
        include_row_number_column: Option<bool>,
        #[serde(default)]
        merge_visible_attributes: Option<bool>,
    },
    SetSort {
        section_id: String,
        sort: SortSettings,
    },
    SetNoteSettings {
        section_id: String,
        note_settings: Vec<NoteSetting>,
    },
    ResolveModifications {
        section_id: String,
    },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EditError {
    #[error("unknown group '{0}'")]
    UnknownGroup(String),

    #[error("unknown section '{0}'")]
    UnknownSection(String),

    #[error("unknown attribute group '{0}'")]
    UnknownAttributeGroup(String),

    #[error("section '{section_id}' has no attribute '{attribute}'")]
    UnknownAttribute { section_id: String, attribute: String },

    #[error("the hidden group cannot be changed this way")]
    ReservedGroup,

    #[error("reserved attribute group '{0}' cannot be changed this way")]
    ReservedAttributeGroup(String),

    #[error("title must not be empty")]
    EmptyTitle,
}

impl EditError {
    pub fn code(&self) -> &'static str {
        match self {
            EditError::UnknownGroup(_) => "UNKNOWN_GROUP",
            EditError::UnknownSection(_) => "UNKNOWN_SECTION",
            EditError::UnknownAttributeGroup(_) => "UNKNOWN_ATTRIBUTE_GROUP",
            EditError::UnknownAttribute { .. } => "UNKNOWN_ATTRIBUTE",
            EditError::ReservedGroup => "RESERVED_GROUP",
            EditError::ReservedAttributeGroup(_) => "RESERVED_ATTRIBUTE_GROUP",
            EditError::EmptyTitle => "EMPTY_TITLE",
        }
    }
}

/// Applies one structural edit. Like moves, validation happens before mutation.
pub fn apply_edit(
    template: &mut Template,
    index: &SectionIndex,
    edit: &TemplateEdit,
) -> Result<(), EditError> {
    match edit {
        TemplateEdit::SetTemplateSettings {
            title,
            sort_ascending,
            show_declaration,
        } => {
            if let Some(title) = title {
                template.title = non_empty(title)?;
            }
            if let Some(v) = sort_ascending {
                template.sort_ascending = *v;
            }
            if let Some(v) = show_declaration {
                template.show_declaration = *v;
            }
        }

        TemplateEdit::AddGroup { title } => {
            let group = Group::new(non_empty(title)?);
            let at = hidden_group_index(&template.groups).unwrap_or(template.groups.len());
            template.groups.insert(at, group);
        }

        TemplateEdit::RenameGroup { group_id, title } => {
            let title = non_empty(title)?;
            let group = user_group_mut(&mut template.groups, group_id)?;
            group.title = title;
        }

        TemplateEdit::RemoveGroup { group_id } => {
            let position = user_group_position(&template.groups, group_id)?;
            let removed = template.groups.remove(position);
            let hidden = match hidden_group_index(&template.groups) {
                Some(i) => i,
                None => {
                    template.groups.push(Group::hidden());
                    template.groups.len() - 1
                }
            };
            template.groups[hidden]
                .prepared_sections
                .extend(removed.prepared_sections);
        }

        TemplateEdit::AddAttributeGroup { section_id, title } => {
            let group = AttributeGroup::new(non_empty(title)?);
            section_mut(template, index, section_id)?
                .attribute_groups
                .push(group);
        }

        TemplateEdit::RenameAttributeGroup {
            section_id,
            attribute_group_id,
            title,
        } => {
            let title = non_empty(title)?;
            let section = section_mut(template, index, section_id)?;
            let i = user_attribute_group_position(section, attribute_group_id)?;
            section.attribute_groups[i].title = title;
        }

        TemplateEdit::RemoveAttributeGroup {
            section_id,
            attribute_group_id,
        } => {
            let section = section_mut(template, index, section_id)?;
            let i = user_attribute_group_position(section, attribute_group_id)?;
            let removed = section.attribute_groups.remove(i);
            section
                .shown_group_mut()
                .attributes
                .extend(removed.attributes);
        }

        TemplateEdit::RenameSection { section_id, title } => {
            let section = section_mut(template, index, section_id)?;
            section.renamed_section_title = title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from);
        }

        TemplateEdit::RenameAttribute {
            section_id,
            attribute,
            label,
        } => {
            let section = section_mut(template, index, section_id)?;
            require_attribute(section, attribute)?;
            let label = label.trim();
            if label.is_empty() || label == attribute {
                section.attribute_rename_map.remove(attribute);
            } else {
                section
                    .attribute_rename_map
                    .insert(attribute.clone(), label.to_string());
            }
        }

        TemplateEdit::SetSectionOptions {
            section_id,
            show_row_count,
            include_row_number_column,
            merge_visible_attributes,
        } => {
            let section = section_mut(template, index, section_id)?;
            if let Some(v) = show_row_count {
                section.show_row_count = *v;
            }
            if let Some(v) = include_row_number_column {
                section.include_row_number_column = *v;
            }
            if let Some(v) = merge_visible_attributes {
                section.merge_visible_attributes = *v;
            }
        }

        TemplateEdit::SetSort { section_id, sort } => {
            let section = section_mut(template, index, section_id)?;
            if let Some(attribute) = &sort.selected_attribute {
                require_attribute(section, attribute)?;
            }
            section.sort = sort.clone();
        }

        TemplateEdit::SetNoteSettings {
            section_id,
            note_settings,
        } => {
            let section = section_mut(template, index, section_id)?;
            for note in note_settings {
                require_attribute(section, &note.attribute)?;
                require_attribute(section, &note.attribute_to_associate_note)?;
            }
            section.note_settings = if note_settings.is_empty() {
                None
            } else {
                Some(note_settings.clone())
            };
        }

        TemplateEdit::ResolveModifications { section_id } => {
            section_mut(template, index, section_id)?.resolve();
        }
    }
    Ok(())
}

/// True for edits that add, remove or relocate sections, after which the section
/// index has to be rebuilt.
pub fn changes_structure(edit: &TemplateEdit) -> bool {
    matches!(
        edit,
        TemplateEdit::AddGroup { .. } | TemplateEdit::RemoveGroup { .. }
    )
}

fn non_empty(title: &str) -> Result<String, EditError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err(EditError::EmptyTitle)
    } else {
        Ok(trimmed.to_string())
    }
}

fn user_group_position(groups: &[Group], group_id: &str) -> Result<usize, EditError> {
    let position = groups
        .iter()
        .position(|g| g.id == group_id)
        .ok_or_else(|| EditError::UnknownGroup(group_id.to_string()))?;
    if groups[position].is_hidden() {
        return Err(EditError::ReservedGroup);
    }
    Ok(position)
}

fn user_group_mut<'a>(groups: &'a mut [Group], group_id: &str) -> Result<&'a mut Group, EditError> {
    let position = user_group_position(groups, group_id)?;
    Ok(&mut groups[position])
}

fn section_mut<'a>(
    template: &'a mut Template,
    index: &SectionIndex,
    section_id: &str,
) -> Result<&'a mut PreparedSection, EditError> {
    index
        .section_mut(&mut template.groups, section_id)
        .ok_or_else(|| EditError::UnknownSection(section_id.to_string()))
}

fn user_attribute_group_position(
    section: &PreparedSection,
    attribute_group_id: &str,
) -> Result<usize, EditError> {
    let i = section
        .attribute_group_index(attribute_group_id)
        .ok_or_else(|| EditError::UnknownAttributeGroup(attribute_group_id.to_string()))?;
    if section.attribute_groups[i].is_reserved() {
        return Err(EditError::ReservedAttributeGroup(attribute_group_id.to_string()));
    }
    Ok(i)
}

fn require_attribute(section: &PreparedSection, attribute: &str) -> Result<(), EditError> {
    if section.attribute_names().contains(attribute) {
        Ok(())
    } else {
        Err(EditError::UnknownAttribute {
            section_id: section.data_section_id.clone(),
            attribute: attribute.to_string(),
        })
    }
}
