//! Plain-text rendering of the world's logical state.

use std::collections::BTreeMap;

use chipway_core::{Cell, EntityKind, TileKind};
use chipway_world::{query, World};

/// Renders one glyph per cell using the level legend.
///
/// Bodies draw over pickups, gates and teleporters, which draw over the floor.
/// Closed gates are `=`, open gates `_`, switches `S` and teleporter sources `T`.
pub(crate) fn render(world: &World) -> String {
    let (width, height) = query::level(world).dimensions();
    let overlay = overlay(world);
    let tiles = query::tile_layer(world);

    let mut out = String::with_capacity(((width + 1) * height) as usize);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let cell = Cell::new(x, y);
            let glyph = overlay
                .get(&cell)
                .copied()
                .unwrap_or_else(|| tile_glyph(tiles.kind(cell)));
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

fn overlay(world: &World) -> BTreeMap<Cell, char> {
    let mut glyphs = BTreeMap::new();
    for teleporter in query::teleporters(world) {
        let _ = glyphs.insert(teleporter.source, 'T');
    }
    for switch in query::switches(world) {
        let _ = glyphs.insert(switch.cell, 'S');
    }
    for gate in query::gates(world) {
        let glyph = if gate.open { '_' } else { '=' };
        for cell in gate.cells {
            let _ = glyphs.insert(cell, glyph);
        }
    }
    for (cell, _) in query::remaining_pickups(world) {
        let _ = glyphs.insert(cell, 'C');
    }
    for entity in query::entity_view(world).iter() {
        let _ = glyphs.insert(entity.cell, entity_glyph(entity.kind));
    }
    glyphs
}

fn entity_glyph(kind: EntityKind) -> char {
    match kind {
        EntityKind::Player => 'P',
        EntityKind::Enemy => 'E',
        EntityKind::Moveable => 'M',
        EntityKind::Destructible => 'D',
    }
}

fn tile_glyph(kind: TileKind) -> char {
    match kind {
        TileKind::Empty => '.',
        TileKind::Wall => '#',
        TileKind::Moveable => 'B',
        TileKind::Destructible => 'X',
        TileKind::Win => 'W',
        TileKind::KeyBlocking => 'K',
    }
}
