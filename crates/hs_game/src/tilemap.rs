//! Level tile layer and object layer.
//!
//! A level is authored as rows of characters plus a legend mapping each
//! character to tile properties. Gameplay reads `collides` and `is_lava` at
//! collision time; the optional colour is only used for drawing.
//!
//! World space is y-down with the origin at the top-left corner of the map.
//! Movement against the grid is **axis-separable move-and-slide**: resolve X
//! first, then resolve Y using the already-corrected X. Every tile that ends up
//! flush against the moved box on its leading edge is reported as a contact so
//! the caller can run per-tile callbacks.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::body::Aabb;

const EMPTY_TILES: [char; 2] = ['.', ' '];

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: String,
    pub level_id: String,
    pub tile_size: u32,
    pub rows: Vec<String>,
    pub legend: HashMap<String, TileProperties>,
    #[serde(default)]
    pub objects: Vec<LevelObject>,
    pub player_spawn: SpawnPoint,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TileProperties {
    #[serde(default)]
    pub collides: bool,
    #[serde(default, alias = "isLava")]
    pub is_lava: bool,
    #[serde(default)]
    pub color: Option<[f32; 4]>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LevelObject {
    pub name: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blocked {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl Blocked {
    pub fn any(self) -> bool {
        self.left || self.right || self.up || self.down
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileContact {
    pub tile_x: i32,
    pub tile_y: i32,
    pub is_lava: bool,
}

#[derive(Debug, Clone)]
pub struct MoveResult {
    pub aabb: Aabb,
    pub blocked: Blocked,
    pub contacts: Vec<TileContact>,
}

#[derive(Debug, Clone)]
pub struct Tilemap {
    pub level_id: String,
    pub tile_size: f32,
    pub width: i32,
    pub height: i32,
    pub player_spawn: SpawnPoint,
    pub objects: Vec<LevelObject>,
    kinds: Vec<TileProperties>,
    tiles: Vec<Option<u16>>,
}

impl Tilemap {
    pub fn from_file(file: LevelFile) -> Result<Self, String> {
        validate_level_file(&file)?;

        let mut kinds = Vec::new();
        let mut kind_by_char = HashMap::new();
        let mut legend: Vec<_> = file.legend.into_iter().collect();
        legend.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, props) in legend {
            let ch = key.chars().next().unwrap_or(' ');
            kind_by_char.insert(ch, kinds.len() as u16);
            kinds.push(props);
        }

        let width = file.rows[0].chars().count() as i32;
        let height = file.rows.len() as i32;
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for row in &file.rows {
            for ch in row.chars() {
                tiles.push(kind_by_char.get(&ch).copied());
            }
        }

        Ok(Self {
            level_id: file.level_id,
            tile_size: file.tile_size as f32,
            width,
            height,
            player_spawn: file.player_spawn,
            objects: file.objects,
            kinds,
            tiles,
        })
    }

    pub fn width_in_pixels(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    pub fn height_in_pixels(&self) -> f32 {
        self.height as f32 * self.tile_size
    }

    pub fn tile_at(&self, x: i32, y: i32) -> Option<&TileProperties> {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return None;
        }
        let kind = self.tiles[(y * self.width + x) as usize]?;
        self.kinds.get(kind as usize)
    }

    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.tile_at(x, y).is_some_and(|t| t.collides)
    }

    /// Every placed tile with its top-left corner in world space.
    pub fn tiles_iter(&self) -> impl Iterator<Item = (f32, f32, &TileProperties)> {
        self.tiles.iter().enumerate().filter_map(move |(i, kind)| {
            let props = self.kinds.get((*kind)? as usize)?;
            let x = (i as i32 % self.width) as f32 * self.tile_size;
            let y = (i as i32 / self.width) as f32 * self.tile_size;
            Some((x, y, props))
        })
    }

    pub fn objects_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a LevelObject> {
        self.objects.iter().filter(move |o| o.name == name)
    }

    pub fn overlaps_solid(&self, aabb: Aabb) -> bool {
        const EPS: f32 = 0.001;
        let x0 = self.world_to_cell(aabb.center_x - aabb.half_w + EPS);
        let x1 = self.world_to_cell(aabb.center_x + aabb.half_w - EPS);
        let y0 = self.world_to_cell(aabb.center_y - aabb.half_h + EPS);
        let y1 = self.world_to_cell(aabb.center_y + aabb.half_h - EPS);
        (y0..=y1).any(|y| (x0..=x1).any(|x| self.is_solid(x, y)))
    }

    /// Moves in slices no longer than half a tile so fast bodies cannot skip
    /// over a one-tile floor or wall. An axis stops moving once it is blocked.
    pub fn move_and_collide(&self, aabb: Aabb, dx: f32, dy: f32) -> MoveResult {
        let max_slice = self.tile_size * 0.5;
        let slices = (dx.abs().max(dy.abs()) / max_slice).ceil().max(1.0) as u32;
        let (step_x, step_y) = (dx / slices as f32, dy / slices as f32);

        let mut contacts = Vec::new();
        let mut blocked = Blocked::default();
        let mut moved = aabb;

        for _ in 0..slices {
            let slice_dx = if blocked.left || blocked.right { 0.0 } else { step_x };
            let slice_dy = if blocked.up || blocked.down { 0.0 } else { step_y };
            if slice_dx == 0.0 && slice_dy == 0.0 {
                break;
            }

            let (resolved_x, collided_x) = self.resolve_axis_x(moved, slice_dx, &mut contacts);
            moved.center_x = resolved_x;
            let (resolved_y, collided_y) = self.resolve_axis_y(moved, slice_dy, &mut contacts);
            moved.center_y = resolved_y;

            blocked.left |= collided_x && slice_dx < 0.0;
            blocked.right |= collided_x && slice_dx > 0.0;
            blocked.up |= collided_y && slice_dy < 0.0;
            blocked.down |= collided_y && slice_dy > 0.0;
        }

        MoveResult {
            aabb: moved,
            blocked,
            contacts,
        }
    }

    fn resolve_axis_x(&self, aabb: Aabb, dx: f32, contacts: &mut Vec<TileContact>) -> (f32, bool) {
        if dx == 0.0 {
            return (aabb.center_x, false);
        }

        const EPS: f32 = 0.001;
        let mut candidate_x = aabb.center_x + dx;
        let y0 = self.world_to_cell(aabb.center_y - aabb.half_h + EPS);
        let y1 = self.world_to_cell(aabb.center_y + aabb.half_h - EPS);
        let mut hits = Vec::new();

        if dx > 0.0 {
            let x_cell = self.world_to_cell(candidate_x + aabb.half_w - EPS);
            for y in y0..=y1 {
                if self.is_solid(x_cell, y) {
                    let limit = self.cell_min(x_cell) - aabb.half_w;
                    hits.push((x_cell, y, limit));
                    candidate_x = candidate_x.min(limit);
                }
            }
            // Never push opposite to the direction of travel.
            candidate_x = candidate_x.max(aabb.center_x);
        } else {
            let x_cell = self.world_to_cell(candidate_x - aabb.half_w + EPS);
            for y in y0..=y1 {
                if self.is_solid(x_cell, y) {
                    let limit = self.cell_max(x_cell) + aabb.half_w;
                    hits.push((x_cell, y, limit));
                    candidate_x = candidate_x.max(limit);
                }
            }
            candidate_x = candidate_x.min(aabb.center_x);
        }

        self.record_contacts(&hits, candidate_x, contacts);
        let collided = (candidate_x - (aabb.center_x + dx)).abs() > 0.0001;
        (candidate_x, collided)
    }

    fn resolve_axis_y(&self, aabb: Aabb, dy: f32, contacts: &mut Vec<TileContact>) -> (f32, bool) {
        if dy == 0.0 {
            return (aabb.center_y, false);
        }

        const EPS: f32 = 0.001;
        let mut candidate_y = aabb.center_y + dy;
        let x0 = self.world_to_cell(aabb.center_x - aabb.half_w + EPS);
        let x1 = self.world_to_cell(aabb.center_x + aabb.half_w - EPS);
        let mut hits = Vec::new();

        if dy > 0.0 {
            let y_cell = self.world_to_cell(candidate_y + aabb.half_h - EPS);
            for x in x0..=x1 {
                if self.is_solid(x, y_cell) {
                    let limit = self.cell_min(y_cell) - aabb.half_h;
                    hits.push((x, y_cell, limit));
                    candidate_y = candidate_y.min(limit);
                }
            }
            candidate_y = candidate_y.max(aabb.center_y);
        } else {
            let y_cell = self.world_to_cell(candidate_y - aabb.half_h + EPS);
            for x in x0..=x1 {
                if self.is_solid(x, y_cell) {
                    let limit = self.cell_max(y_cell) + aabb.half_h;
                    hits.push((x, y_cell, limit));
                    candidate_y = candidate_y.max(limit);
                }
            }
            candidate_y = candidate_y.min(aabb.center_y);
        }

        self.record_contacts(&hits, candidate_y, contacts);
        let collided = (candidate_y - (aabb.center_y + dy)).abs() > 0.0001;
        (candidate_y, collided)
    }

    fn record_contacts(&self, hits: &[(i32, i32, f32)], resolved: f32, contacts: &mut Vec<TileContact>) {
        for &(tile_x, tile_y, limit) in hits {
            if (limit - resolved).abs() <= 0.01 {
                contacts.push(TileContact {
                    tile_x,
                    tile_y,
                    is_lava: self.tile_at(tile_x, tile_y).is_some_and(|t| t.is_lava),
                });
            }
        }
    }

    fn world_to_cell(&self, world: f32) -> i32 {
        (world / self.tile_size).floor() as i32
    }

    fn cell_min(&self, cell: i32) -> f32 {
        cell as f32 * self.tile_size
    }

    fn cell_max(&self, cell: i32) -> f32 {
        (cell + 1) as f32 * self.tile_size
    }
}

pub fn load_level_from_path(path: &Path) -> Result<Tilemap, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let file: LevelFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse level JSON {}: {e}", path.display()))?;
    Tilemap::from_file(file)
}

fn validate_level_file(file: &LevelFile) -> Result<(), String> {
    if file.tile_size == 0 {
        return Err("Level validation failed: tile_size must be > 0".to_string());
    }
    if file.rows.is_empty() {
        return Err("Level validation failed: rows array is empty".to_string());
    }
    let width = file.rows[0].chars().count();
    if width == 0 {
        return Err("Level validation failed: rows must not be empty strings".to_string());
    }

    for key in file.legend.keys() {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if !EMPTY_TILES.contains(&ch) => {}
            _ => {
                return Err(format!(
                    "Level validation failed: legend key '{key}' must be a single non-empty tile character"
                ));
            }
        }
    }

    for (row_index, row) in file.rows.iter().enumerate() {
        if row.chars().count() != width {
            return Err(format!(
                "Level validation failed: row {row_index} has {} tiles, expected {width}",
                row.chars().count()
            ));
        }
        for ch in row.chars() {
            if !EMPTY_TILES.contains(&ch) && !file.legend.contains_key(&ch.to_string()) {
                return Err(format!(
                    "Level validation failed: row {row_index} uses unknown tile '{ch}'"
                ));
            }
        }
    }

    let world_w = (width as u32 * file.tile_size) as f32;
    let world_h = (file.rows.len() as u32 * file.tile_size) as f32;
    let inside = |x: f32, y: f32| x >= 0.0 && x <= world_w && y >= 0.0 && y <= world_h;

    if !inside(file.player_spawn.x, file.player_spawn.y) {
        return Err(format!(
            "Level validation failed: player_spawn ({}, {}) is outside the map",
            file.player_spawn.x, file.player_spawn.y
        ));
    }
    for object in &file.objects {
        if !inside(object.x, object.y) {
            return Err(format!(
                "Level validation failed: object '{}' at ({}, {}) is outside the map",
                object.name, object.x, object.y
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "hs_level_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    /// 40 x 12 tiles of 18 px. Solid floor on the bottom row with lava in
    /// columns 20..=23, a wall at column 30 and two coins.
    pub(crate) fn test_level() -> Tilemap {
        let mut rows: Vec<String> = (0..11).map(|_| ".".repeat(40)).collect();
        let mut wall_row: Vec<char> = ".".repeat(40).chars().collect();
        wall_row[30] = '#';
        rows[9] = wall_row.iter().collect();
        rows[10] = wall_row.iter().collect();
        let mut floor: Vec<char> = "#".repeat(40).chars().collect();
        for ch in floor.iter_mut().take(24).skip(20) {
            *ch = 'L';
        }
        rows.push(floor.into_iter().collect());

        let json = serde_json::json!({
            "version": "0.1",
            "level_id": "test",
            "tile_size": 18,
            "rows": rows,
            "legend": {
                "#": { "collides": true },
                "L": { "collides": true, "isLava": true, "color": [1.0, 0.3, 0.0, 1.0] }
            },
            "objects": [
                { "name": "coin", "x": 90.0, "y": 190.0 },
                { "name": "coin", "x": 500.0, "y": 100.0 }
            ],
            "player_spawn": { "x": 30.0, "y": 180.0 }
        });
        let file: LevelFile = serde_json::from_value(json).expect("test level json");
        Tilemap::from_file(file).expect("test level is valid")
    }

    fn box_at(x: f32, y: f32) -> Aabb {
        Aabb {
            center_x: x,
            center_y: y,
            half_w: 8.0,
            half_h: 8.0,
        }
    }

    #[test]
    fn load_level_valid_file_parses() {
        let path = temp_file_path("valid");
        fs::write(
            &path,
            r#####"{
              "version":"0.1",
              "level_id":"tiny",
              "tile_size":18,
              "rows":["....", ".L..", "####"],
              "legend":{"#":{"collides":true},"L":{"collides":true,"isLava":true}},
              "objects":[{"name":"coin","x":20,"y":20}],
              "player_spawn":{"x":9,"y":9}
            }"#####,
        )
        .expect("write temp file");

        let map = load_level_from_path(&path).expect("valid level should load");
        assert_eq!(map.width, 4);
        assert_eq!(map.height, 3);
        assert_eq!(map.width_in_pixels(), 72.0);
        assert!(map.is_solid(0, 2));
        assert!(map.tile_at(1, 1).is_some_and(|t| t.is_lava));
        assert!(!map.is_solid(0, 0));
        assert_eq!(map.objects_named("coin").count(), 1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let path = temp_file_path("ragged");
        fs::write(
            &path,
            r#####"{
              "version":"0.1",
              "level_id":"tiny",
              "tile_size":18,
              "rows":["....", "###"],
              "legend":{"#":{"collides":true}},
              "player_spawn":{"x":9,"y":9}
            }"#####,
        )
        .expect("write temp file");

        let err = load_level_from_path(&path).expect_err("ragged rows should fail");
        assert!(err.contains("row 1"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_tile_is_rejected() {
        let path = temp_file_path("unknown");
        fs::write(
            &path,
            r#"{
              "version":"0.1",
              "level_id":"tiny",
              "tile_size":18,
              "rows":["..X."],
              "legend":{},
              "player_spawn":{"x":9,"y":9}
            }"#,
        )
        .expect("write temp file");

        let err = load_level_from_path(&path).expect_err("unknown tile should fail");
        assert!(err.contains("unknown tile 'X'"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn falling_box_lands_on_floor_and_reports_contacts() {
        let map = test_level();
        let floor_top = 11.0 * 18.0;
        let result = map.move_and_collide(box_at(50.0, floor_top - 10.0), 0.0, 20.0);
        assert!(result.blocked.down);
        assert!((result.aabb.center_y - (floor_top - 8.0)).abs() < 0.001);
        assert!(!result.contacts.is_empty());
        assert!(result.contacts.iter().all(|c| c.tile_y == 11 && !c.is_lava));
    }

    #[test]
    fn standing_on_lava_reports_lava_contact() {
        let map = test_level();
        let floor_top = 11.0 * 18.0;
        let lava_x = 21.5 * 18.0;
        let result = map.move_and_collide(box_at(lava_x, floor_top - 8.0), 0.0, 0.5);
        assert!(result.blocked.down);
        assert!(result.contacts.iter().all(|c| c.is_lava));
    }

    #[test]
    fn wall_blocks_horizontal_motion() {
        let map = test_level();
        let wall_left = 30.0 * 18.0;
        let start = box_at(wall_left - 20.0, 10.0 * 18.0);
        let result = map.move_and_collide(start, 60.0, 0.0);
        assert!(result.blocked.right);
        assert!(!result.blocked.left);
        assert!((result.aabb.center_x - (wall_left - 8.0)).abs() < 0.001);
    }

    #[test]
    fn moving_up_never_pushes_down() {
        let map = test_level();
        let start = box_at(50.0, 11.0 * 18.0 - 8.0);
        let result = map.move_and_collide(start, 0.0, -10.0);
        assert!(result.aabb.center_y <= start.center_y);
        assert!(!result.blocked.any());
    }

    #[test]
    fn overlaps_solid_detects_embedded_boxes() {
        let map = test_level();
        assert!(map.overlaps_solid(box_at(50.0, 11.0 * 18.0)));
        assert!(!map.overlaps_solid(box_at(50.0, 50.0)));
    }

    #[test]
    fn shipped_level_loads_with_ground_under_the_spawn() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/levels/level1.json");
        let map = load_level_from_path(&path).expect("shipped level should load");
        let spawn_col = (map.player_spawn.x / map.tile_size) as i32;
        let spawn_row = (map.player_spawn.y / map.tile_size) as i32;
        assert!(!map.is_solid(spawn_col, spawn_row));
        assert!(map.is_solid(spawn_col, spawn_row + 1));
        assert!(map.objects_named("coin").count() > 0);
    }
}
