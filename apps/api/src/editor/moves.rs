//! Reorder engine: the single `apply_move` entry point behind every drag in the tree.
//!
//! # Pinned buckets
//! - group domain: the hidden group never moves and nothing may be dropped at or past it
//! - attribute-group domain: index 0 belongs to the hidden-attributes group
//! - attribute domain: the last visible attribute of a section cannot be hidden
//!
//! Every rejection is checked before the tree is touched, so a rejected move is a no-op.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::template::index::SectionIndex;
use crate::template::model::{hidden_group_index, Group};

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveDomain {
    /// Container ids are ignored; indices address `Template.groups`.
    Group,
    /// Container ids are Group ids.
    Section,
    /// Container ids are the owning section's `data_section_id`.
    AttributeGroup,
    /// Container ids are AttributeGroup ids inside `section_id`.
    Attribute { section_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub container_id: String,
    pub index: usize,
}

impl Location {
    #[cfg(test)]
    pub fn new(container_id: impl Into<String>, index: usize) -> Self {
        Location {
            container_id: container_id.into(),
            index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub domain: MoveDomain,
    pub source: Location,
    pub destination: Location,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MoveRejected {
    #[error("the hidden group cannot be moved")]
    HiddenGroupPinned,

    #[error("groups cannot be placed at or after the hidden group")]
    PastHiddenGroup,

    #[error("the hidden attribute group cannot be moved or displaced")]
    HiddenAttributeGroupPinned,

    #[error("section '{section_id}' must keep at least one visible attribute")]
    LastVisibleAttribute { section_id: String },

    #[error("unknown container '{0}'")]
    UnknownContainer(String),

    #[error("index {index} is out of range for '{container_id}'")]
    IndexOutOfRange { container_id: String, index: usize },
}

impl MoveRejected {
    /// Rejections the user should be told about rather than silently ignored.
    pub fn is_user_warning(&self) -> bool {
        matches!(self, MoveRejected::LastVisibleAttribute { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            MoveRejected::HiddenGroupPinned => "HIDDEN_GROUP_PINNED",
            MoveRejected::PastHiddenGroup => "PAST_HIDDEN_GROUP",
            MoveRejected::HiddenAttributeGroupPinned => "HIDDEN_ATTRIBUTE_GROUP_PINNED",
            MoveRejected::LastVisibleAttribute { .. } => "LAST_VISIBLE_ATTRIBUTE",
            MoveRejected::UnknownContainer(_) => "UNKNOWN_CONTAINER",
            MoveRejected::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

/// Applies one move to the tree. `index` must be current for `groups`; callers rebuild
/// it after a successful move.
pub fn apply_move(
    groups: &mut Vec<Group>,
    index: &SectionIndex,
    request: &MoveRequest,
) -> Result<(), MoveRejected> {
    let result = match &request.domain {
        MoveDomain::Group => move_group(groups, request.source.index, request.destination.index),
        MoveDomain::Section => move_section(groups, &request.source, &request.destination),
        MoveDomain::AttributeGroup => move_attribute_group(groups, index, request),
        MoveDomain::Attribute { section_id } => {
            move_attribute(groups, index, section_id, &request.source, &request.destination)
        }
    };

    if let Err(rejection) = &result {
        debug!(reason = %rejection, domain = ?request.domain, "Move rejected");
    }
    result
}

/// Splice-out / splice-in within one vector. `to` is the element's final index.
fn reposition<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}

fn check_index(container_id: &str, index: usize, len: usize) -> Result<(), MoveRejected> {
    if index < len {
        Ok(())
    } else {
        Err(MoveRejected::IndexOutOfRange {
            container_id: container_id.to_string(),
            index,
        })
    }
}

fn move_group(groups: &mut Vec<Group>, from: usize, to: usize) -> Result<(), MoveRejected> {
    check_index("groups", from, groups.len())?;
    check_index("groups", to, groups.len())?;

    if groups[from].is_hidden() {
        return Err(MoveRejected::HiddenGroupPinned);
    }
    if let Some(hidden) = hidden_group_index(groups) {
        if to >= hidden {
            return Err(MoveRejected::PastHiddenGroup);
        }
    }

    reposition(groups, from, to);
    Ok(())
}

fn group_position(groups: &[Group], id: &str) -> Result<usize, MoveRejected> {
    groups
        .iter()
        .position(|g| g.id == id)
        .ok_or_else(|| MoveRejected::UnknownContainer(id.to_string()))
}

fn move_section(
    groups: &mut [Group],
    source: &Location,
    destination: &Location,
) -> Result<(), MoveRejected> {
    let src = group_position(groups, &source.container_id)?;
    let dst = group_position(groups, &destination.container_id)?;

    check_index(
        &source.container_id,
        source.index,
        groups[src].prepared_sections.len(),
    )?;

    if src == dst {
        let sections = &mut groups[src].prepared_sections;
        check_index(&destination.container_id, destination.index, sections.len())?;
        reposition(sections, source.index, destination.index);
        return Ok(());
    }

    // Across containers the destination may be one past the end (append).
    check_index(
        &destination.container_id,
        destination.index,
        groups[dst].prepared_sections.len() + 1,
    )?;
    let section = groups[src].prepared_sections.remove(source.index);
    groups[dst]
        .prepared_sections
        .insert(destination.index, section);
    Ok(())
}

fn move_attribute_group(
    groups: &mut [Group],
    index: &SectionIndex,
    request: &MoveRequest,
) -> Result<(), MoveRejected> {
    let section_id = &request.source.container_id;
    let section = index
        .section_mut(groups, section_id)
        .ok_or_else(|| MoveRejected::UnknownContainer(section_id.clone()))?;

    let (from, to) = (request.source.index, request.destination.index);
    let len = section.attribute_groups.len();
    check_index(section_id, from, len)?;
    check_index(section_id, to, len)?;

    let hidden = section.hidden_group_index();
    if hidden == Some(from) || hidden == Some(to) || to == 0 {
        return Err(MoveRejected::HiddenAttributeGroupPinned);
    }

    reposition(&mut section.attribute_groups, from, to);
    Ok(())
}

fn move_attribute(
    groups: &mut [Group],
    index: &SectionIndex,
    section_id: &str,
    source: &Location,
    destination: &Location,
) -> Result<(), MoveRejected> {
    let section = index
        .section_mut(groups, section_id)
        .ok_or_else(|| MoveRejected::UnknownContainer(section_id.to_string()))?;

    let src = section
        .attribute_group_index(&source.container_id)
        .ok_or_else(|| MoveRejected::UnknownContainer(source.container_id.clone()))?;
    let dst = section
        .attribute_group_index(&destination.container_id)
        .ok_or_else(|| MoveRejected::UnknownContainer(destination.container_id.clone()))?;

    check_index(
        &source.container_id,
        source.index,
        section.attribute_groups[src].attributes.len(),
    )?;
    let dst_len = section.attribute_groups[dst].attributes.len();
    let dst_limit = if src == dst { dst_len } else { dst_len + 1 };
    check_index(&destination.container_id, destination.index, dst_limit)?;

    let hiding =
        section.attribute_groups[dst].is_hidden() && !section.attribute_groups[src].is_hidden();
    if hiding && section.visible_count() <= 1 {
        return Err(MoveRejected::LastVisibleAttribute {
            section_id: section_id.to_string(),
        });
    }

    if src == dst {
        reposition(
            &mut section.attribute_groups[src].attributes,
            source.index,
            destination.index,
        );
    } else {
        let attribute = section.attribute_groups[src].attributes.remove(source.index);
        section.attribute_groups[dst]
            .attributes
            .insert(destination.index, attribute);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::model::tests::{group, section};
    use crate::template::model::{
        AttributeGroup, HIDDEN_ATTRIBUTES_ID, HIDDEN_GROUP_ID, HIDDEN_GROUP_TITLE,
        SHOWN_ATTRIBUTES_ID,
    };

    fn tree() -> Vec<Group> {
        vec![
            group("g1", "Education", vec![section("DS01", &[], &["Degree", "Year"])]),
            group("g2", "Research", vec![section("DS02", &["Pages"], &["Title"])]),
            group("g3", "Service", vec![]),
            group(
                HIDDEN_GROUP_ID,
                HIDDEN_GROUP_TITLE,
                vec![section("DS03", &[], &["Award"])],
            ),
        ]
    }

    fn request(domain: MoveDomain, from: (&str, usize), to: (&str, usize)) -> MoveRequest {
        MoveRequest {
            domain,
            source: Location::new(from.0, from.1),
            destination: Location::new(to.0, to.1),
        }
    }

    fn run(groups: &mut Vec<Group>, req: MoveRequest) -> Result<(), MoveRejected> {
        let index = SectionIndex::build(groups);
        apply_move(groups, &index, &req)
    }

    fn ids(groups: &[Group]) -> Vec<&str> {
        groups.iter().map(|g| g.id.as_str()).collect()
    }

    // ── group domain ────────────────────────────────────────────────────────

    #[test]
    fn test_group_move_reorders() {
        let mut groups = tree();
        run(&mut groups, request(MoveDomain::Group, ("", 0), ("", 2))).unwrap();
        assert_eq!(ids(&groups), vec!["g2", "g3", "g1", HIDDEN_GROUP_ID]);
    }

    #[test]
    fn test_group_move_onto_hidden_slot_rejected() {
        let mut groups = tree();
        let before = groups.clone();
        let err = run(&mut groups, request(MoveDomain::Group, ("", 0), ("", 3))).unwrap_err();
        assert_eq!(err, MoveRejected::PastHiddenGroup);
        assert_eq!(groups, before);
    }

    #[test]
    fn test_hidden_group_cannot_move() {
        let mut groups = tree();
        let err = run(&mut groups, request(MoveDomain::Group, ("", 3), ("", 0))).unwrap_err();
        assert_eq!(err, MoveRejected::HiddenGroupPinned);
    }

    #[test]
    fn test_hidden_group_stays_last_after_move_sequence() {
        let mut groups = tree();
        let moves = [(0, 1), (2, 0), (1, 3), (3, 1), (0, 2), (1, 1), (2, 2), (0, 0)];
        for (from, to) in moves {
            let _ = run(&mut groups, request(MoveDomain::Group, ("", from), ("", to)));
            assert_eq!(groups.last().unwrap().id, HIDDEN_GROUP_ID);
        }
    }

    #[test]
    fn test_group_move_out_of_range_rejected() {
        let mut groups = tree();
        let err = run(&mut groups, request(MoveDomain::Group, ("", 9), ("", 0))).unwrap_err();
        assert!(matches!(err, MoveRejected::IndexOutOfRange { .. }));
    }

    // ── section domain ──────────────────────────────────────────────────────

    #[test]
    fn test_section_move_across_groups() {
        let mut groups = tree();
        run(&mut groups, request(MoveDomain::Section, ("g1", 0), ("g2", 1))).unwrap();
        assert!(groups[0].prepared_sections.is_empty());
        let ids: Vec<&str> = groups[1]
            .prepared_sections
            .iter()
            .map(|s| s.data_section_id.as_str())
            .collect();
        assert_eq!(ids, vec!["DS02", "DS01"]);
    }

    #[test]
    fn test_section_move_into_hidden_group() {
        let mut groups = tree();
        run(&mut groups, request(MoveDomain::Section, ("g2", 0), (HIDDEN_GROUP_ID, 0))).unwrap();
        assert_eq!(groups[3].prepared_sections[0].data_section_id, "DS02");
        assert_eq!(groups[3].prepared_sections.len(), 2);
    }

    #[test]
    fn test_section_reorders_within_group() {
        let mut groups = tree();
        groups[0]
            .prepared_sections
            .push(section("DS04", &[], &["Grant"]));
        run(&mut groups, request(MoveDomain::Section, ("g1", 1), ("g1", 0))).unwrap();
        let ids: Vec<&str> = groups[0]
            .prepared_sections
            .iter()
            .map(|s| s.data_section_id.as_str())
            .collect();
        assert_eq!(ids, vec!["DS04", "DS01"]);
    }

    #[test]
    fn test_section_reorder_past_end_rejected() {
        let mut groups = tree();
        groups[0]
            .prepared_sections
            .push(section("DS04", &[], &["Grant"]));
        let before = groups.clone();
        let err = run(&mut groups, request(MoveDomain::Section, ("g1", 0), ("g1", 2))).unwrap_err();
        assert_eq!(
            err,
            MoveRejected::IndexOutOfRange {
                container_id: "g1".to_string(),
                index: 2
            }
        );
        assert_eq!(groups, before);
    }

    #[test]
    fn test_section_move_unknown_group_rejected() {
        let mut groups = tree();
        let err = run(&mut groups, request(MoveDomain::Section, ("g1", 0), ("nope", 0))).unwrap_err();
        assert_eq!(err, MoveRejected::UnknownContainer("nope".to_string()));
        assert_eq!(groups, tree());
    }

    // ── attribute-group domain ──────────────────────────────────────────────

    fn tree_with_user_groups() -> Vec<Group> {
        let mut groups = tree();
        let s = &mut groups[0].prepared_sections[0];
        let mut dates = AttributeGroup::new("Dates");
        dates.id = "dates".to_string();
        let mut place = AttributeGroup::new("Place");
        place.id = "place".to_string();
        s.attribute_groups.push(dates);
        s.attribute_groups.push(place);
        groups
    }

    #[test]
    fn test_attribute_group_reorders() {
        let mut groups = tree_with_user_groups();
        run(&mut groups, request(MoveDomain::AttributeGroup, ("DS01", 3), ("DS01", 1))).unwrap();
        let order: Vec<&str> = groups[0].prepared_sections[0]
            .attribute_groups
            .iter()
            .map(|g| g.id.as_str())
            .collect();
        assert_eq!(order, vec![HIDDEN_ATTRIBUTES_ID, "place", SHOWN_ATTRIBUTES_ID, "dates"]);
    }

    #[test]
    fn test_attribute_group_into_slot_zero_rejected() {
        let mut groups = tree_with_user_groups();
        let err = run(&mut groups, request(MoveDomain::AttributeGroup, ("DS01", 2), ("DS01", 0)))
            .unwrap_err();
        assert_eq!(err, MoveRejected::HiddenAttributeGroupPinned);
    }

    #[test]
    fn test_hidden_attribute_group_cannot_move() {
        let mut groups = tree_with_user_groups();
        let err = run(&mut groups, request(MoveDomain::AttributeGroup, ("DS01", 0), ("DS01", 2)))
            .unwrap_err();
        assert_eq!(err, MoveRejected::HiddenAttributeGroupPinned);
    }

    // ── attribute domain ────────────────────────────────────────────────────

    fn attribute_move(section: &str, from: (&str, usize), to: (&str, usize)) -> MoveRequest {
        request(
            MoveDomain::Attribute {
                section_id: section.to_string(),
            },
            from,
            to,
        )
    }

    #[test]
    fn test_attribute_hidden_when_others_remain() {
        let mut groups = tree();
        run(
            &mut groups,
            attribute_move("DS01", (SHOWN_ATTRIBUTES_ID, 1), (HIDDEN_ATTRIBUTES_ID, 0)),
        )
        .unwrap();
        let s = &groups[0].prepared_sections[0];
        assert_eq!(s.attribute_groups[0].attributes, vec!["Year"]);
        assert_eq!(s.visible_attributes(), vec!["Degree"]);
    }

    #[test]
    fn test_last_visible_attribute_cannot_be_hidden() {
        let mut groups = tree();
        let before = groups.clone();
        let err = run(
            &mut groups,
            attribute_move("DS02", (SHOWN_ATTRIBUTES_ID, 0), (HIDDEN_ATTRIBUTES_ID, 0)),
        )
        .unwrap_err();
        assert!(err.is_user_warning());
        assert_eq!(
            err,
            MoveRejected::LastVisibleAttribute {
                section_id: "DS02".to_string()
            }
        );
        assert_eq!(groups, before);
    }

    #[test]
    fn test_single_degree_attribute_cannot_be_hidden() {
        let mut groups = vec![group("g1", "Education", vec![section("DS01", &[], &["Degree"])])];
        let before = groups.clone();
        let err = run(
            &mut groups,
            attribute_move("DS01", (SHOWN_ATTRIBUTES_ID, 0), (HIDDEN_ATTRIBUTES_ID, 0)),
        )
        .unwrap_err();
        assert!(matches!(err, MoveRejected::LastVisibleAttribute { .. }));
        assert_eq!(groups, before);
    }

    #[test]
    fn test_reordering_inside_hidden_group_allowed_with_one_visible() {
        let mut groups = vec![group(
            "g1",
            "Research",
            vec![section("DS02", &["Pages", "Volume"], &["Title"])],
        )];
        run(
            &mut groups,
            attribute_move("DS02", (HIDDEN_ATTRIBUTES_ID, 1), (HIDDEN_ATTRIBUTES_ID, 0)),
        )
        .unwrap();
        assert_eq!(
            groups[0].prepared_sections[0].attribute_groups[0].attributes,
            vec!["Volume", "Pages"]
        );
    }

    #[test]
    fn test_attribute_moves_between_visible_groups() {
        let mut groups = tree_with_user_groups();
        let before = groups[0].prepared_sections[0].visible_count();
        run(
            &mut groups,
            attribute_move("DS01", (SHOWN_ATTRIBUTES_ID, 1), ("dates", 0)),
        )
        .unwrap();
        let s = &groups[0].prepared_sections[0];
        assert_eq!(s.attribute_groups[1].attributes, vec!["Degree"]);
        assert_eq!(s.attribute_groups[2].attributes, vec!["Year"]);
        assert_eq!(s.visible_count(), before);
    }

    #[test]
    fn test_attribute_reorder_past_end_rejected() {
        let mut groups = tree();
        let before = groups.clone();
        let err = run(
            &mut groups,
            attribute_move("DS01", (SHOWN_ATTRIBUTES_ID, 0), (SHOWN_ATTRIBUTES_ID, 2)),
        )
        .unwrap_err();
        assert!(matches!(err, MoveRejected::IndexOutOfRange { index: 2, .. }));
        assert_eq!(groups, before);
    }

    #[test]
    fn test_visible_floor_holds_after_move_sequence() {
        let mut groups = tree();
        let moves = [
            attribute_move("DS01", (SHOWN_ATTRIBUTES_ID, 0), (HIDDEN_ATTRIBUTES_ID, 0)),
            attribute_move("DS01", (SHOWN_ATTRIBUTES_ID, 0), (HIDDEN_ATTRIBUTES_ID, 0)),
            attribute_move("DS01", (HIDDEN_ATTRIBUTES_ID, 1), (SHOWN_ATTRIBUTES_ID, 0)),
            attribute_move("DS01", (SHOWN_ATTRIBUTES_ID, 0), (HIDDEN_ATTRIBUTES_ID, 1)),
            attribute_move("DS01", (SHOWN_ATTRIBUTES_ID, 1), (HIDDEN_ATTRIBUTES_ID, 2)),
        ];
        for m in moves {
            let _ = run(&mut groups, m);
            assert!(groups[0].prepared_sections[0].visible_count() >= 1);
        }
    }

    #[test]
    fn test_attribute_move_unknown_section_rejected() {
        let mut groups = tree();
        let err = run(
            &mut groups,
            attribute_move("DS99", (SHOWN_ATTRIBUTES_ID, 0), (HIDDEN_ATTRIBUTES_ID, 0)),
        )
        .unwrap_err();
        assert_eq!(err, MoveRejected::UnknownContainer("DS99".to_string()));
    }

    #[test]
    fn test_move_request_deserializes_from_json() {
        let req: MoveRequest = serde_json::from_value(serde_json::json!({
            "domain": {"kind": "attribute", "section_id": "DS01"},
            "source": {"container_id": "shown-attributes", "index": 0},
            "destination": {"container_id": "hidden-attributes", "index": 0}
        }))
        .unwrap();
        assert_eq!(
            req.domain,
            MoveDomain::Attribute {
                section_id: "DS01".to_string()
            }
        );
    }
}
