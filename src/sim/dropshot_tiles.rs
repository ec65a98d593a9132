use crate::{consts::dropshot, sim::Team};
use glam::Vec3A;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileState {
    #[default]
    Full,
    Damaged,
    Broken,
}

impl TryFrom<u8> for TileState {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Full),
            1 => Ok(Self::Damaged),
            2 => Ok(Self::Broken),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropshotTile {
    pub pos: Vec3A,
    pub state: TileState,
}

/// The 140-tile dropshot floor, 70 hexagonal tiles per team side.
///
/// Per side, tiles run in 7 rows from the back wall towards midfield,
/// widening from 7 to 13 tiles per row.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropshotTilesState {
    tiles: Vec<DropshotTile>,
}

impl Default for DropshotTilesState {
    fn default() -> Self {
        Self::new()
    }
}

/// Center-to-center spacing of adjacent tiles within a row
fn tile_width() -> f32 {
    3.0f32.sqrt() * dropshot::TILE_HEX_RADIUS * 0.5
}

impl DropshotTilesState {
    #[must_use]
    pub fn new() -> Self {
        let row_pitch = dropshot::TILE_HEX_RADIUS * 0.75;
        let width = tile_width();
        let back_y = 4500.0;

        let mut tiles = Vec::with_capacity(dropshot::NUM_TILES);
        for team in Team::ALL {
            let y_dir = team.get_y_dir();
            for (row, &count) in dropshot::TILE_ROWS.iter().enumerate() {
                let y = (back_y - row as f32 * row_pitch) * y_dir;
                for col in 0..count {
                    let x = (col as f32 - (count - 1) as f32 * 0.5) * width;
                    tiles.push(DropshotTile {
                        pos: Vec3A::new(x, y, 0.0),
                        state: TileState::Full,
                    });
                }
            }
        }

        debug_assert_eq!(tiles.len(), dropshot::NUM_TILES);
        Self { tiles }
    }

    #[must_use]
    pub fn tiles(&self) -> &[DropshotTile] {
        &self.tiles
    }

    /// Tiles belonging to one team's side, in construction order
    pub fn team_tiles(&self, team: Team) -> impl Iterator<Item = &DropshotTile> {
        let range = match team {
            Team::Blue => 0..dropshot::NUM_TILES_PER_TEAM,
            Team::Orange => dropshot::NUM_TILES_PER_TEAM..dropshot::NUM_TILES,
        };
        self.tiles[range].iter()
    }

    pub fn reset(&mut self) {
        for tile in &mut self.tiles {
            tile.state = TileState::Full;
        }
    }

    /// Replace the full tile set, e.g. from a deserialized snapshot.
    /// The slice must hold exactly 140 tiles.
    pub fn set_all(&mut self, tiles: &[DropshotTile]) {
        assert_eq!(tiles.len(), dropshot::NUM_TILES);
        self.tiles.clear();
        self.tiles.extend_from_slice(tiles);
    }

    /// Index of the tile on `team`'s side closest in XY to `pos`, if any
    /// lies within one tile width
    #[must_use]
    pub fn tile_under(&self, pos: Vec3A, team: Team) -> Option<usize> {
        let offset = match team {
            Team::Blue => 0,
            Team::Orange => dropshot::NUM_TILES_PER_TEAM,
        };

        let mut best: Option<(usize, f32)> = None;
        for (i, tile) in self.team_tiles(team).enumerate() {
            let dist_sq = (tile.pos - pos).truncate().length_squared();
            if best.is_none_or(|(_, d)| dist_sq < d) {
                best = Some((i + offset, dist_sq));
            }
        }

        let width = tile_width();
        best.filter(|&(_, d)| d < width * width).map(|(i, _)| i)
    }

    #[must_use]
    pub fn is_broken_under(&self, pos: Vec3A) -> bool {
        let team = Team::from_team_y(pos.y);
        self.tile_under(pos, team)
            .is_some_and(|i| self.tiles[i].state == TileState::Broken)
    }

    fn damage_tile(tile: &mut DropshotTile, amount: i32) {
        tile.state = match (tile.state, amount) {
            (TileState::Full, 1) => TileState::Damaged,
            (TileState::Full, _) => TileState::Broken,
            _ => TileState::Broken,
        };
    }

    /// Apply a charged-ball impact centered on the tile at `center_idx`.
    ///
    /// The center tile takes the full charge; with charge >= 2, neighbors
    /// within `charge - 1` rings take one damage step each.
    /// Returns the indices of every tile that changed state.
    pub fn apply_damage(&mut self, center_idx: usize, charge_level: i32) -> Vec<usize> {
        let mut changed = Vec::new();
        let center_pos = self.tiles[center_idx].pos;
        let center_team = Team::from_team_y(center_pos.y);

        let before = self.tiles[center_idx].state;
        Self::damage_tile(&mut self.tiles[center_idx], charge_level.min(2));
        if self.tiles[center_idx].state != before {
            changed.push(center_idx);
        }

        if charge_level >= 2 {
            let rings = (charge_level - 1) as f32;
            let spread_radius = rings * tile_width() * 1.1;

            for i in 0..self.tiles.len() {
                if i == center_idx {
                    continue;
                }

                let tile = &self.tiles[i];
                if Team::from_team_y(tile.pos.y) != center_team
                    || tile.state == TileState::Broken
                {
                    continue;
                }

                let dist = (tile.pos - center_pos).truncate().length();
                if dist <= spread_radius {
                    let before = self.tiles[i].state;
                    Self::damage_tile(&mut self.tiles[i], 1);
                    if self.tiles[i].state != before {
                        changed.push(i);
                    }
                }
            }
        }

        changed
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn layout_has_140_tiles_split_by_side() {
        let tiles = DropshotTilesState::new();
        assert_eq!(tiles.tiles().len(), 140);
        assert_eq!(tiles.team_tiles(Team::Blue).count(), 70);
        assert!(tiles.team_tiles(Team::Blue).all(|t| t.pos.y < 0.0));
        assert!(tiles.team_tiles(Team::Orange).all(|t| t.pos.y > 0.0));
    }

    #[test]
    fn charge_one_damages_only_the_hit_tile() {
        let mut tiles = DropshotTilesState::new();
        let idx = tiles
            .tile_under(tiles.tiles()[80].pos, Team::Orange)
            .unwrap();

        let changed = tiles.apply_damage(idx, 1);
        assert_eq!(changed, vec![idx]);
        assert_eq!(tiles.tiles()[idx].state, TileState::Damaged);

        // A second damaging hit breaks it
        tiles.apply_damage(idx, 1);
        assert_eq!(tiles.tiles()[idx].state, TileState::Broken);
    }

    #[test]
    fn charge_two_breaks_center_and_spreads() {
        let mut tiles = DropshotTilesState::new();
        // A mid-row tile, away from the side edges
        let center = 70 + 40;

        let changed = tiles.apply_damage(center, 2);
        assert_eq!(tiles.tiles()[center].state, TileState::Broken);
        assert!(changed.len() > 1, "neighbors should take spread damage");

        for &i in &changed {
            if i != center {
                assert_eq!(tiles.tiles()[i].state, TileState::Damaged);
                assert!(tiles.tiles()[i].pos.y > 0.0, "spread crossed midfield");
            }
        }
    }

    #[test]
    fn broken_detection_under_position() {
        let mut tiles = DropshotTilesState::new();
        let pos = tiles.tiles()[100].pos;
        assert!(!tiles.is_broken_under(pos));

        tiles.apply_damage(100, 2);
        assert!(tiles.is_broken_under(pos));
    }
}
