//! Template sections and the per-build section maps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use packstead_settings::{merge_arrays, merge_settings, Arrays, Settings};

/// Reserved builder section merged into every concrete builder.
pub const COMMON: &str = "common";

/// Settings and arrays for one builder, post-processor or provisioner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSection {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default, skip_serializing_if = "Arrays::is_empty")]
    pub arrays: Arrays,
}

impl TemplateSection {
    pub fn merge_settings(&mut self, newer: &Settings) {
        self.settings = merge_settings(&self.settings, newer);
    }

    pub fn merge_arrays(&mut self, newer: &Arrays) {
        self.arrays = merge_arrays(&self.arrays, newer);
    }

    /// Layer `newer` over this section: settings first, then arrays.
    pub fn merge(&mut self, newer: &TemplateSection) {
        self.merge_settings(&newer.settings);
        self.merge_arrays(&newer.arrays);
    }
}

/// The `[build]` table of any layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSections {
    #[serde(default)]
    pub builder_types: Vec<String>,

    #[serde(default)]
    pub builders: BTreeMap<String, TemplateSection>,

    #[serde(default)]
    pub post_processor_types: Vec<String>,

    #[serde(default)]
    pub post_processors: BTreeMap<String, TemplateSection>,

    #[serde(default)]
    pub provisioner_types: Vec<String>,

    #[serde(default)]
    pub provisioners: BTreeMap<String, TemplateSection>,
}

impl BuildSections {
    /// Layer `newer` over these sections.
    ///
    /// A non-empty type list replaces the current one. The `common`
    /// builder takes settings only; its arrays are not merged.
    pub fn update(&mut self, newer: &BuildSections) {
        replace_types(&mut self.builder_types, &newer.builder_types);
        replace_types(&mut self.post_processor_types, &newer.post_processor_types);
        replace_types(&mut self.provisioner_types, &newer.provisioner_types);

        for (kind, section) in &newer.builders {
            let current = self.builders.entry(kind.clone()).or_default();
            if kind == COMMON {
                current.merge_settings(&section.settings);
            } else {
                current.merge(section);
            }
        }
        merge_sections(&mut self.post_processors, &newer.post_processors);
        merge_sections(&mut self.provisioners, &newer.provisioners);
    }
}

fn replace_types(current: &mut Vec<String>, newer: &[String]) {
    if !newer.is_empty() {
        *current = newer.to_vec();
    }
}

fn merge_sections(
    current: &mut BTreeMap<String, TemplateSection>,
    newer: &BTreeMap<String, TemplateSection>,
) {
    for (kind, section) in newer {
        match current.get_mut(kind) {
            Some(existing) => existing.merge(section),
            None => {
                current.insert(kind.clone(), section.clone());
            }
        }
    }
}
