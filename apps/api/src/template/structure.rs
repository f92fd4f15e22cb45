use std::collections::HashSet;

use thiserror::Error;

use crate::template::model::{Template, HIDDEN_GROUP_ID};

/// A broken structural invariant found in a template tree.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StructureViolation {
    #[error("hidden group must be the last group")]
    HiddenGroupNotLast,

    #[error("template has more than one hidden group")]
    DuplicateHiddenGroup,

    #[error("duplicate group id '{0}'")]
    DuplicateGroupId(String),

    #[error("section '{0}' appears more than once")]
    DuplicateSection(String),

    #[error("section '{0}': hidden attribute group must be first")]
    HiddenAttributesNotFirst(String),

    #[error("section '{0}': at least one attribute must stay visible")]
    NoVisibleAttribute(String),
}

/// Checks every structural invariant of the tree and returns all violations found.
pub fn check_structure(template: &Template) -> Vec<StructureViolation> {
    let mut violations = Vec::new();

    let hidden_positions: Vec<usize> = template
        .groups
        .iter()
        .enumerate()
        .filter(|(_, g)| g.id == HIDDEN_GROUP_ID)
        .map(|(i, _)| i)
        .collect();
    if hidden_positions.len() > 1 {
        violations.push(StructureViolation::DuplicateHiddenGroup);
    }
    if let Some(&last_hidden) = hidden_positions.last() {
        if last_hidden + 1 != template.groups.len() {
            violations.push(StructureViolation::HiddenGroupNotLast);
        }
    }

    let mut group_ids = HashSet::new();
    let mut section_ids = HashSet::new();
    for group in &template.groups {
        if !group.is_hidden() && !group_ids.insert(group.id.as_str()) {
            violations.push(StructureViolation::DuplicateGroupId(group.id.clone()));
        }
        for section in &group.prepared_sections {
            let id = section.data_section_id.clone();
            if !section_ids.insert(section.data_section_id.as_str()) {
                violations.push(StructureViolation::DuplicateSection(id.clone()));
            }
            if matches!(section.hidden_group_index(), Some(i) if i != 0) {
                violations.push(StructureViolation::HiddenAttributesNotFirst(id.clone()));
            }
            if section.visible_count() == 0 && !section.attribute_names().is_empty() {
                violations.push(StructureViolation::NoVisibleAttribute(id));
            }
        }
    }

    violations
}
