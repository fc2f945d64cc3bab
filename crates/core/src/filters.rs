//! Catalog of the filters the search backend understands, plus the toggle
//! operations the filter modal performs on [`SearchFilters`].

use crate::search::SearchFilters;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterOption {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const SOURCES: &[FilterOption] = &[
    FilterOption { id: "arxiv", name: "arXiv", description: "Research papers and preprints" },
    FilterOption { id: "math-overflow", name: "Math Overflow", description: "Research-level mathematics" },
    FilterOption { id: "math-stack-exchange", name: "Math Stack Exchange", description: "Mathematics Q&A" },
    FilterOption { id: "mathematica", name: "Mathematica", description: "Wolfram documentation" },
    FilterOption { id: "wikipedia", name: "Wikipedia", description: "Mathematical articles" },
    FilterOption { id: "youtube", name: "YouTube", description: "Educational videos" },
    FilterOption { id: "proof-wiki", name: "ProofWiki", description: "Formal Proofs" },
];

pub const MEDIA_TYPES: &[FilterOption] = &[
    FilterOption { id: "article", name: "Articles", description: "Text-based content" },
    FilterOption { id: "pdf", name: "PDFs", description: "Research papers and documents" },
    FilterOption { id: "video", name: "Videos", description: "Educational videos and lectures" },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterGroup {
    Sources,
    MediaTypes,
}

impl FilterGroup {
    pub fn options(self) -> &'static [FilterOption] {
        match self {
            FilterGroup::Sources => SOURCES,
            FilterGroup::MediaTypes => MEDIA_TYPES,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            FilterGroup::Sources => "Sources",
            FilterGroup::MediaTypes => "Media Types",
        }
    }

    pub fn other(self) -> Self {
        match self {
            FilterGroup::Sources => FilterGroup::MediaTypes,
            FilterGroup::MediaTypes => FilterGroup::Sources,
        }
    }
}

impl SearchFilters {
    fn group_mut(&mut self, group: FilterGroup) -> &mut Vec<String> {
        match group {
            FilterGroup::Sources => &mut self.sources,
            FilterGroup::MediaTypes => &mut self.media_types,
        }
    }

    pub fn group(&self, group: FilterGroup) -> &[String] {
        match group {
            FilterGroup::Sources => &self.sources,
            FilterGroup::MediaTypes => &self.media_types,
        }
    }

    pub fn contains(&self, group: FilterGroup, id: &str) -> bool {
        self.group(group).iter().any(|s| s == id)
    }

    pub fn toggle(&mut self, group: FilterGroup, id: &str) {
        let list = self.group_mut(group);
        if let Some(pos) = list.iter().position(|s| s == id) {
            list.remove(pos);
        } else {
            list.push(id.to_string());
        }
    }

    pub fn select_all(&mut self, group: FilterGroup) {
        *self.group_mut(group) = group.options().iter().map(|o| o.id.to_string()).collect();
    }

    pub fn clear_group(&mut self, group: FilterGroup) {
        self.group_mut(group).clear();
    }

    /// Drops ids the catalog no longer offers (e.g. from an older saved state).
    pub fn retain_known(&mut self) {
        for group in [FilterGroup::Sources, FilterGroup::MediaTypes] {
            let opts = group.options();
            self.group_mut(group)
                .retain(|id| opts.iter().any(|o| o.id == id.as_str()));
        }
    }
}
