use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::PropertyDetail;

/// Tri-state of a space checkbox in the report builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Checked,
    Unchecked,
    Indeterminate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AssetSelection {
    asset_id: Uuid,
    selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SpaceSelection {
    space_id: Uuid,
    selected: bool,
    assets: Vec<AssetSelection>,
}

impl SpaceSelection {
    fn any_asset_selected(&self) -> bool {
        self.assets.iter().any(|a| a.selected)
    }

    /// Re-derive the parent flag from the children. Spaces without assets
    /// keep whatever was set on them directly.
    fn sync_from_assets(&mut self) {
        if !self.assets.is_empty() {
            self.selected = self.any_asset_selected();
        }
    }

    fn set_all(&mut self, selected: bool) {
        self.selected = selected;
        for asset in &mut self.assets {
            asset.selected = selected;
        }
    }
}

/// Which spaces and assets of a property go into a report.
///
/// For every space that has assets, the space is selected iff at least one
/// of its assets is selected. Every mutating method keeps that true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSelection {
    spaces: Vec<SpaceSelection>,
}

impl ReportSelection {
    pub fn from_detail(detail: &PropertyDetail, selected: bool) -> Self {
        let spaces = detail
            .spaces
            .iter()
            .map(|s| SpaceSelection {
                space_id: s.space.id,
                selected,
                assets: s
                    .assets
                    .iter()
                    .map(|a| AssetSelection { asset_id: a.id, selected })
                    .collect(),
            })
            .collect();

        Self { spaces }
    }

    fn space_mut(&mut self, space_id: Uuid) -> Option<&mut SpaceSelection> {
        self.spaces.iter_mut().find(|s| s.space_id == space_id)
    }

    fn space(&self, space_id: Uuid) -> Option<&SpaceSelection> {
        self.spaces.iter().find(|s| s.space_id == space_id)
    }

    /// Flip a space and carry all of its assets with it. Returns the new
    /// state (`false` for unknown spaces).
    pub fn toggle_space(&mut self, space_id: Uuid) -> bool {
        match self.space_mut(space_id) {
            Some(space) => {
                let next = !space.selected;
                space.set_all(next);
                next
            }
            None => false,
        }
    }

    /// Set a space and all of its assets. Returns whether the space exists.
    pub fn set_space(&mut self, space_id: Uuid, selected: bool) -> bool {
        match self.space_mut(space_id) {
            Some(space) => {
                space.set_all(selected);
                true
            }
            None => false,
        }
    }

    /// Flip one asset; its space follows. Returns the asset's new state
    /// (`false` for unknown ids).
    pub fn toggle_asset(&mut self, space_id: Uuid, asset_id: Uuid) -> bool {
        let Some(space) = self.space_mut(space_id) else {
            return false;
        };
        let Some(asset) = space.assets.iter_mut().find(|a| a.asset_id == asset_id) else {
            return false;
        };

        asset.selected = !asset.selected;
        let next = asset.selected;
        space.sync_from_assets();
        next
    }

    /// Set one asset; its space follows. Returns whether the asset exists.
    pub fn set_asset(&mut self, space_id: Uuid, asset_id: Uuid, selected: bool) -> bool {
        let Some(space) = self.space_mut(space_id) else {
            return false;
        };
        let Some(asset) = space.assets.iter_mut().find(|a| a.asset_id == asset_id) else {
            return false;
        };

        asset.selected = selected;
        space.sync_from_assets();
        true
    }

    /// Space that holds `asset_id`, if any
    pub fn space_of(&self, asset_id: Uuid) -> Option<Uuid> {
        self.spaces
            .iter()
            .find(|s| s.assets.iter().any(|a| a.asset_id == asset_id))
            .map(|s| s.space_id)
    }

    pub fn select_all(&mut self) {
        for space in &mut self.spaces {
            space.set_all(true);
        }
    }

    pub fn clear(&mut self) {
        for space in &mut self.spaces {
            space.set_all(false);
        }
    }

    pub fn is_space_selected(&self, space_id: Uuid) -> bool {
        self.space(space_id).is_some_and(|s| s.selected)
    }

    pub fn is_asset_selected(&self, space_id: Uuid, asset_id: Uuid) -> bool {
        self.space(space_id)
            .and_then(|s| s.assets.iter().find(|a| a.asset_id == asset_id))
            .is_some_and(|a| a.selected)
    }

    pub fn space_state(&self, space_id: Uuid) -> Option<CheckState> {
        let space = self.space(space_id)?;
        let selected = space.assets.iter().filter(|a| a.selected).count();

        let state = if space.assets.is_empty() {
            if space.selected { CheckState::Checked } else { CheckState::Unchecked }
        } else if selected == 0 {
            CheckState::Unchecked
        } else if selected == space.assets.len() {
            CheckState::Checked
        } else {
            CheckState::Indeterminate
        };

        Some(state)
    }

    pub fn selected_spaces(&self) -> Vec<Uuid> {
        self.spaces.iter().filter(|s| s.selected).map(|s| s.space_id).collect()
    }

    pub fn selected_assets(&self, space_id: Uuid) -> Vec<Uuid> {
        self.space(space_id)
            .map(|s| s.assets.iter().filter(|a| a.selected).map(|a| a.asset_id).collect())
            .unwrap_or_default()
    }

    pub fn selected_asset_count(&self) -> usize {
        self.spaces
            .iter()
            .map(|s| s.assets.iter().filter(|a| a.selected).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        !self.spaces.iter().any(|s| s.selected)
    }

    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.spaces
            .iter()
            .filter(|s| !s.assets.is_empty())
            .all(|s| s.selected == s.any_asset_selected())
    }
}
