//! Column-wrap oracle supplied by the presentation layer.
//!
//! The front end measures how many items of a section fit in one rendered
//! column; navigation only consumes the number.

use crate::nav::section::Section;
use std::collections::HashMap;

/// Reports how many items one rendered column of a section holds.
pub trait ColumnLayout {
    /// Items per column. Values below one are treated as one.
    fn items_per_column(&self, section: Section) -> usize;
}

impl<F> ColumnLayout for F
where
    F: Fn(Section) -> usize,
{
    fn items_per_column(&self, section: Section) -> usize {
        self(section)
    }
}

/// Every section renders as one unbounded column, so Left/Right always
/// leave the section.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleColumn;

impl ColumnLayout for SingleColumn {
    fn items_per_column(&self, _section: Section) -> usize {
        usize::MAX
    }
}

/// Fixed per-section column heights, with a fallback for unlisted sections.
#[derive(Debug, Clone)]
pub struct FixedColumns {
    fallback: usize,
    per_section: HashMap<Section, usize>,
}

impl FixedColumns {
    pub fn new(fallback: usize) -> Self {
        Self {
            fallback: fallback.max(1),
            per_section: HashMap::new(),
        }
    }

    pub fn with(mut self, section: Section, items_per_column: usize) -> Self {
        self.per_section.insert(section, items_per_column.max(1));
        self
    }
}

impl ColumnLayout for FixedColumns {
    fn items_per_column(&self, section: Section) -> usize {
        self.per_section
            .get(&section)
            .copied()
            .unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnLayout, FixedColumns, SingleColumn};
    use crate::nav::section::Section;

    #[test]
    fn fixed_columns_falls_back_for_unlisted_sections() {
        let layout = FixedColumns::new(3).with(Section::Down, 0);
        assert_eq!(layout.items_per_column(Section::Down), 1);
        assert_eq!(layout.items_per_column(Section::Up), 3);
    }

    #[test]
    fn closures_act_as_layouts() {
        let layout = |section: Section| if section == Section::Left { 2 } else { 5 };
        assert_eq!(layout.items_per_column(Section::Left), 2);
        assert_eq!(SingleColumn.items_per_column(Section::Left), usize::MAX);
    }
}
