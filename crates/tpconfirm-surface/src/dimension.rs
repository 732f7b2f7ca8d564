use tpconfirm_config::DimensionMaterialsToml;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    Overworld,
    Nether,
    End,
}

impl DimensionKind {
    pub fn classify(dimension: &str) -> Self {
        let name = dimension.trim().to_ascii_lowercase();
        let name = name.rsplit(':').next().unwrap_or(name.as_str());
        if name.contains("nether") {
            Self::Nether
        } else if name == "end" || name.ends_with("_end") || name.contains("the_end") {
            Self::End
        } else {
            Self::Overworld
        }
    }
}

/// Material shown for each dimension kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionMaterials {
    pub overworld: String,
    pub nether: String,
    pub end: String,
}

impl DimensionMaterials {
    pub fn material_for(&self, dimension: &str) -> &str {
        match DimensionKind::classify(dimension) {
            DimensionKind::Overworld => &self.overworld,
            DimensionKind::Nether => &self.nether,
            DimensionKind::End => &self.end,
        }
    }
}

impl From<&DimensionMaterialsToml> for DimensionMaterials {
    fn from(value: &DimensionMaterialsToml) -> Self {
        Self {
            overworld: value.overworld.clone(),
            nether: value.nether.clone(),
            end: value.end.clone(),
        }
    }
}
