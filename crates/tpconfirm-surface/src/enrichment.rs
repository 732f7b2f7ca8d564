use tpconfirm_protocol::EnrichmentKind;

use crate::placeholder::Placeholders;

/// A region whose text must be re-rendered once enrichment data arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetTemplate {
    pub slot: usize,
    pub lines: Vec<String>,
}

/// Per-surface record of which regions await which data, and the values
/// currently shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentState {
    pub sender: String,
    pub region: String,
    pub dimension: String,
    pub region_targets: Vec<TargetTemplate>,
    pub dimension_targets: Vec<TargetTemplate>,
    pub identity_targets: Vec<usize>,
}

impl EnrichmentState {
    pub fn new(sender: impl Into<String>, region: impl Into<String>, dimension: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            region: region.into(),
            dimension: dimension.into(),
            region_targets: Vec::new(),
            dimension_targets: Vec::new(),
            identity_targets: Vec::new(),
        }
    }

    pub fn placeholders(&self) -> Placeholders {
        Placeholders {
            sender: self.sender.clone(),
            region: self.region.clone(),
            dimension: self.dimension.clone(),
        }
    }

    pub fn text_targets(&self, kind: EnrichmentKind) -> &[TargetTemplate] {
        match kind {
            EnrichmentKind::Region => &self.region_targets,
            EnrichmentKind::Dimension => &self.dimension_targets,
            EnrichmentKind::Identity => &[],
        }
    }

    pub fn has_targets(&self, kind: EnrichmentKind) -> bool {
        match kind {
            EnrichmentKind::Region => !self.region_targets.is_empty(),
            EnrichmentKind::Dimension => !self.dimension_targets.is_empty(),
            EnrichmentKind::Identity => !self.identity_targets.is_empty(),
        }
    }

    pub fn set_value(&mut self, kind: EnrichmentKind, value: impl Into<String>) {
        match kind {
            EnrichmentKind::Region => self.region = value.into(),
            EnrichmentKind::Dimension => self.dimension = value.into(),
            EnrichmentKind::Identity => {}
        }
    }

    /// Renders the lines of every target of `kind` with the current values.
    pub fn render_targets(&self, kind: EnrichmentKind) -> Vec<(usize, Vec<String>)> {
        let placeholders = self.placeholders();
        self.text_targets(kind)
            .iter()
            .map(|target| (target.slot, placeholders.render_lines(&target.lines)))
            .collect()
    }
}
