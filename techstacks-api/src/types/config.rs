//! Configuration option types

use serde::{Deserialize, Serialize};
use techstacks_core::TechnologyTier;

/// One selectable tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TierOption {
    /// Machine value accepted by `tier` parameters
    pub value: TechnologyTier,
    /// Display label
    pub title: String,
}

/// Static option lists for client forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConfigOptionsResponse {
    pub tiers: Vec<TierOption>,
}

impl ConfigOptionsResponse {
    /// Every tier in display order.
    pub fn all_tiers() -> Self {
        Self {
            tiers: TechnologyTier::ALL
                .into_iter()
                .map(|tier| TierOption {
                    value: tier,
                    title: tier.title().to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tiers_in_display_order() {
        let options = ConfigOptionsResponse::all_tiers();
        assert_eq!(options.tiers.len(), TechnologyTier::ALL.len());
        assert_eq!(options.tiers[0].value, TechnologyTier::ProgrammingLanguage);
        assert_eq!(options.tiers[0].title, "Programming Languages");
    }
}
