use std::collections::HashMap;

use crate::template::model::{Group, PreparedSection};

/// Where a prepared section currently lives in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLocation {
    pub group_index: usize,
    pub section_index: usize,
}

/// `data_section_id` → location. Rebuilt after every structural mutation so lookups
/// never rescan the tree.
#[derive(Debug, Clone, Default)]
pub struct SectionIndex {
    entries: HashMap<String, SectionLocation>,
}

impl SectionIndex {
    pub fn build(groups: &[Group]) -> Self {
        let mut entries = HashMap::new();
        for (group_index, group) in groups.iter().enumerate() {
            for (section_index, section) in group.prepared_sections.iter().enumerate() {
                entries.insert(
                    section.data_section_id.clone(),
                    SectionLocation {
                        group_index,
                        section_index,
                    },
                );
            }
        }
        Self { entries }
    }

    pub fn locate(&self, data_section_id: &str) -> Option<&SectionLocation> {
        self.entries.get(data_section_id)
    }

    #[cfg(test)]
    pub fn contains(&self, data_section_id: &str) -> bool {
        self.entries.contains_key(data_section_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn section<'a>(&self, groups: &'a [Group], data_section_id: &str) -> Option<&'a PreparedSection> {
        let loc = self.locate(data_section_id)?;
        groups
            .get(loc.group_index)?
            .prepared_sections
            .get(loc.section_index)
    }

    pub fn section_mut<'a>(
        &self,
        groups: &'a mut [Group],
        data_section_id: &str,
    ) -> Option<&'a mut PreparedSection> {
        let loc = self.locate(data_section_id)?;
        groups
            .get_mut(loc.group_index)?
            .prepared_sections
            .get_mut(loc.section_index)
    }
}
