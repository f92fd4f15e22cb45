//! Schema Reconciler: brings a persisted template tree back in line with the live schema.
//!
//! # Rules
//! - A section whose `data_section_id` no longer exists upstream is dropped silently.
//! - Attributes removed upstream are removed from whichever group holds them.
//! - Attributes added upstream land in the hidden-attributes group, never a visible one.
//! - Title and attribute-type drift adopt the live value.
//!
//! Every change is recorded in `modified_description`; nothing here ever clears it.
//! Running `reconcile` twice against the same catalog is a no-op the second time.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::schema::{structurally_equal, SchemaCatalog};
use crate::template::model::{hidden_group_index, Group, PreparedSection};

pub const ATTRIBUTES_CHANGED: &str = "Attributes were renamed, added, or deleted.";
pub const TITLE_RENAMED: &str = "Section title was renamed.";
pub const ATTRIBUTE_TYPES_CHANGED: &str = "Attribute types were changed.";

/// Reconciles every prepared section of every group against the live catalog.
pub fn reconcile(groups: Vec<Group>, catalog: &SchemaCatalog) -> Vec<Group> {
    groups
        .into_iter()
        .map(|mut group| {
            group.prepared_sections = std::mem::take(&mut group.prepared_sections)
                .into_iter()
                .filter_map(|section| reconcile_section(section, catalog))
                .collect();
            group
        })
        .collect()
}

/// Reconciles one section. Returns `None` when the section no longer exists upstream.
pub fn reconcile_section(
    mut section: PreparedSection,
    catalog: &SchemaCatalog,
) -> Option<PreparedSection> {
    let Some(schema) = catalog.get(&section.data_section_id) else {
        debug!(
            section = %section.data_section_id,
            "Dropping prepared section missing from live schema"
        );
        return None;
    };

    let live: HashSet<&str> = schema.display_names().collect();
    let mut attributes_changed = false;

    for group in &mut section.attribute_groups {
        let before = group.attributes.len();
        group.attributes.retain(|a| live.contains(a.as_str()));
        if group.attributes.len() != before {
            attributes_changed = true;
        }
    }

    let present: HashSet<String> = section
        .attribute_names()
        .into_iter()
        .map(String::from)
        .collect();
    let added: Vec<String> = schema
        .display_names()
        .filter(|name| !present.contains(*name))
        .map(String::from)
        .collect();

    if !added.is_empty() {
        debug!(
            section = %section.data_section_id,
            added = ?added,
            "New upstream attributes placed in hidden group"
        );
        attributes_changed = true;
    }
    // Pins the hidden bucket at index 0 even when nothing new arrived.
    section.hidden_group_mut().attributes.extend(added);

    prune_references(&mut section, &live);

    if attributes_changed {
        section.flag(ATTRIBUTES_CHANGED);
    }

    if section.title != schema.title {
        section.title = schema.title.clone();
        section.flag(TITLE_RENAMED);
    }

    if section.attributes_type.is_null() {
        section.attributes_type = schema.attributes_type.clone();
    } else if !structurally_equal(&section.attributes_type, &schema.attributes_type) {
        section.attributes_type = schema.attributes_type.clone();
        section.flag(ATTRIBUTE_TYPES_CHANGED);
    }

    section.data_type = schema.data_type.clone();

    Some(section)
}

/// Drops rename-map entries, note settings and sort keys that name removed attributes.
fn prune_references(section: &mut PreparedSection, live: &HashSet<&str>) {
    section
        .attribute_rename_map
        .retain(|attr, _| live.contains(attr.as_str()));

    if let Some(notes) = section.note_settings.as_mut() {
        notes.retain(|n| {
            live.contains(n.attribute.as_str()) && live.contains(n.attribute_to_associate_note.as_str())
        });
    }

    if let Some(selected) = section.sort.selected_attribute.as_deref() {
        if !live.contains(selected) {
            section.sort.selected_attribute = None;
        }
    }
}

/// Rebuilds the hidden group after load.
///
/// Saved templates never contain the hidden group, so every live section that no
/// group references is parked there as a fresh section. The hidden group is
/// created if absent and moved to the tail if stored anywhere else.
pub fn restore_hidden_group(groups: &mut Vec<Group>, catalog: &SchemaCatalog) {
    let mut hidden = match hidden_group_index(groups) {
        Some(i) => groups.remove(i),
        None => Group::hidden(),
    };

    let referenced: HashSet<String> = groups
        .iter()
        .chain(std::iter::once(&hidden))
        .flat_map(|g| g.prepared_sections.iter())
        .map(|s| s.data_section_id.clone())
        .collect();

    let fresh: Vec<PreparedSection> = catalog
        .iter()
        .filter(|schema| !referenced.contains(&schema.data_section_id))
        .map(PreparedSection::from_schema)
        .collect();
    if !fresh.is_empty() {
        info!(count = fresh.len(), "Parking unreferenced sections in hidden group");
    }
    hidden.prepared_sections.extend(fresh);

    groups.push(hidden);
}
