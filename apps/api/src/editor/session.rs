use tracing::debug;

use crate::editor::edits::{apply_edit, changes_structure, EditError, TemplateEdit};
use crate::editor::moves::{apply_move, MoveRejected, MoveRequest};
use crate::reconcile::{reconcile, restore_hidden_group};
use crate::schema::SchemaCatalog;
use crate::template::index::SectionIndex;
use crate::template::model::Template;

/// An open template: reconciled against the live schema, hidden group restored,
/// and a section index kept in step with every mutation.
#[derive(Debug, Clone)]
pub struct EditSession {
    template: Template,
    index: SectionIndex,
}

impl EditSession {
    pub fn open(mut template: Template, catalog: &SchemaCatalog) -> Self {
        let groups = std::mem::take(&mut template.groups);
        template.groups = reconcile(groups, catalog);
        restore_hidden_group(&mut template.groups, catalog);
        let index = SectionIndex::build(&template.groups);
        debug!(sections = index.len(), "Opened template session");
        EditSession { template, index }
    }

    pub fn apply_move(&mut self, request: &MoveRequest) -> Result<(), MoveRejected> {
        apply_move(&mut self.template.groups, &self.index, request)?;
        self.index = SectionIndex::build(&self.template.groups);
        Ok(())
    }

    pub fn apply_edit(&mut self, edit: &TemplateEdit) -> Result<(), EditError> {
        apply_edit(&mut self.template, &self.index, edit)?;
        if changes_structure(edit) {
            self.index = SectionIndex::build(&self.template.groups);
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn template(&self) -> &Template {
        &self.template
    }

    #[cfg(test)]
    pub fn index(&self) -> &SectionIndex {
        &self.index
    }

    pub fn into_template(self) -> Template {
        self.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::moves::{Location, MoveDomain};
    use crate::schema::tests::schema_row;
    use crate::template::model::HIDDEN_GROUP_ID;
    use serde_json::json;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::from_rows(&[
            schema_row("DS01", "Education", json!({"Degree": "degree", "Year": "year"})),
            schema_row("DS02", "Awards", json!({"Award": "award"})),
        ])
    }

    #[test]
    fn test_open_restores_hidden_group_for_saved_template() {
        let saved = Template::new("Annual CV", "faculty", std::iter::empty()).without_hidden_group();
        let session = EditSession::open(saved, &catalog());
        let groups = &session.template().groups;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, HIDDEN_GROUP_ID);
        assert_eq!(groups[0].prepared_sections.len(), 2);
        assert!(session.index().contains("DS02"));
    }

    #[test]
    fn test_index_follows_moves_and_group_edits() {
        let mut session = EditSession::open(
            Template::new("Annual CV", "faculty", std::iter::empty()),
            &catalog(),
        );
        session
            .apply_edit(&TemplateEdit::AddGroup {
                title: "Education".to_string(),
            })
            .unwrap();
        let group_id = session.template().groups[0].id.clone();
        assert_eq!(session.index().locate("DS01").unwrap().group_index, 1);

        session
            .apply_move(&MoveRequest {
                domain: MoveDomain::Section,
                source: Location::new(HIDDEN_GROUP_ID, 0),
                destination: Location::new(group_id, 0),
            })
            .unwrap();
        assert_eq!(session.index().locate("DS01").unwrap().group_index, 0);

        session
            .apply_edit(&TemplateEdit::RenameSection {
                section_id: "DS01".to_string(),
                title: Some("Degrees".to_string()),
            })
            .unwrap();
        let template = session.into_template();
        assert_eq!(
            template.groups[0].prepared_sections[0].display_title(),
            "Degrees"
        );
    }

    #[test]
    fn test_rejected_move_leaves_tree_untouched() {
        let mut session = EditSession::open(
            Template::new("Annual CV", "faculty", std::iter::empty()),
            &catalog(),
        );
        let before = session.template().clone();
        let err = session
            .apply_move(&MoveRequest {
                domain: MoveDomain::Group,
                source: Location::new("", 0),
                destination: Location::new("", 0),
            })
            .unwrap_err();
        assert_eq!(err, MoveRejected::HiddenGroupPinned);
        assert_eq!(session.template(), &before);
    }
}
