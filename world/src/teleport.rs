//! Teleporter links and the relay that moves subjects between them.

use std::collections::BTreeSet;

use chipway_core::{
    Cell, EntityKind, Event, RelaySubject, TeleportState, TeleporterId, TileKind,
};
use tracing::{debug, info};

use crate::{level::TeleporterSpec, World};

#[derive(Clone, Copy, Debug, PartialEq)]
enum LinkState {
    Armed,
    Cooling { remaining: f32 },
    Spent,
}

#[derive(Clone, Debug)]
pub(crate) struct TeleportLink {
    pub(crate) source: Cell,
    pub(crate) destination: Cell,
    single_use: bool,
    require_reentry: bool,
    cooldown: f32,
    allow_moveables: bool,
    state: LinkState,
    relayed: Option<RelaySubject>,
    suppressed: BTreeSet<RelaySubject>,
}

impl TeleportLink {
    pub(crate) fn new(spec: &TeleporterSpec) -> Self {
        Self {
            source: spec.source,
            destination: spec.destination,
            single_use: spec.single_use,
            require_reentry: spec.require_reentry,
            cooldown: spec.cooldown.max(0.0),
            allow_moveables: spec.allow_moveables,
            state: LinkState::Armed,
            relayed: None,
            suppressed: BTreeSet::new(),
        }
    }

    /// Link that never relays, used for misconfigured teleporters.
    pub(crate) fn disabled(spec: &TeleporterSpec) -> Self {
        Self {
            state: LinkState::Spent,
            ..Self::new(spec)
        }
    }

    pub(crate) fn state(&self) -> TeleportState {
        match self.state {
            LinkState::Armed => TeleportState::Armed,
            LinkState::Cooling { .. } => TeleportState::Cooling,
            LinkState::Spent => TeleportState::Spent,
        }
    }

    pub(crate) fn advance(&mut self, dt: f32) {
        if let LinkState::Cooling { remaining } = &mut self.state {
            *remaining = (*remaining - dt).max(0.0);
        }
    }

    fn after_relay(&mut self, subject: RelaySubject) {
        self.relayed = Some(subject);
        self.state = if self.single_use {
            LinkState::Spent
        } else if self.require_reentry || self.cooldown > 0.0 {
            LinkState::Cooling {
                remaining: self.cooldown,
            }
        } else {
            LinkState::Armed
        };
    }

    fn try_rearm(&mut self, relayed_in_zone: bool) {
        let LinkState::Cooling { remaining } = self.state else {
            return;
        };
        if remaining > 0.0 || (self.require_reentry && relayed_in_zone) {
            return;
        }
        self.state = LinkState::Armed;
        self.relayed = None;
    }

    fn reset(&mut self) {
        self.state = LinkState::Armed;
        self.relayed = None;
        self.suppressed.clear();
    }
}

impl World {
    /// Relays the subject resting on the link's source to its destination.
    ///
    /// Returns `false` without changing state when the link is not armed, the
    /// subject is absent, moving or ineligible, or the destination is blocked.
    pub fn try_relay(
        &mut self,
        link: TeleporterId,
        subject: RelaySubject,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let Some(entry) = self.teleporters.get(&link) else {
            return false;
        };
        if entry.state != LinkState::Armed || entry.suppressed.contains(&subject) {
            return false;
        }
        if !self.is_relay_candidate(entry, subject) {
            return false;
        }
        let (source, destination) = (entry.source, entry.destination);
        if source == destination || !self.is_relay_destination_open(destination, subject) {
            debug!(link = link.get(), ?destination, "teleport destination blocked");
            return false;
        }

        let position = self.grid.cell_center(destination);
        match subject {
            RelaySubject::Entity(id) => {
                if !self.registry.relocate(id, destination) {
                    return false;
                }
                if let Some(entity) = self.registry.get_mut(id) {
                    entity.position = position;
                    entity.motion = None;
                }
            }
            RelaySubject::MoveableTile => {
                if !self.tiles.slide(source, destination) {
                    return false;
                }
            }
        }

        out_events.push(Event::TeleportEntered {
            link,
            subject,
            position: self.grid.cell_center(source),
        });
        out_events.push(Event::TeleportExited {
            link,
            subject,
            position,
        });
        info!(link = link.get(), ?subject, ?source, ?destination, "teleported");

        for (id, other) in self.teleporters.iter_mut() {
            if *id == link {
                other.after_relay(subject);
            } else if other.source == destination && other.require_reentry {
                let _ = other.suppressed.insert(subject);
            }
        }

        if let RelaySubject::Entity(id) = subject {
            self.handle_arrival(id, out_events);
        }
        true
    }

    /// Re-arms a link regardless of its current state.
    pub fn reset_teleporter(&mut self, link: TeleporterId) -> bool {
        match self.teleporters.get_mut(&link) {
            Some(entry) => {
                entry.reset();
                true
            }
            None => false,
        }
    }

    pub(crate) fn advance_teleporters(&mut self, dt: f32) {
        for link in self.teleporters.values_mut() {
            link.advance(dt);
        }
    }

    /// Evaluates every link in identifier order, relaying eligible subjects.
    pub(crate) fn resolve_teleports(&mut self, out_events: &mut Vec<Event>) {
        let ids: Vec<TeleporterId> = self.teleporters.keys().copied().collect();
        for id in ids {
            self.refresh_link(id);
            let Some(link) = self.teleporters.get(&id) else {
                continue;
            };
            if link.state != LinkState::Armed {
                continue;
            }
            let candidates = self.subjects_at(link.source);
            for subject in candidates {
                if self.try_relay(id, subject, out_events) {
                    break;
                }
            }
        }
    }

    fn refresh_link(&mut self, id: TeleporterId) {
        let Some(link) = self.teleporters.get(&id) else {
            return;
        };
        let source = link.source;
        let still_present: BTreeSet<RelaySubject> = link
            .suppressed
            .iter()
            .copied()
            .filter(|subject| self.is_in_zone(*subject, source))
            .collect();
        let relayed_in_zone = link
            .relayed
            .map_or(false, |subject| self.is_in_zone(subject, source));
        if let Some(link) = self.teleporters.get_mut(&id) {
            link.suppressed = still_present;
            link.try_rearm(relayed_in_zone);
        }
    }

    fn subjects_at(&self, cell: Cell) -> Vec<RelaySubject> {
        let mut subjects = Vec::new();
        if let Some(entity) = self.registry.occupant(cell) {
            subjects.push(RelaySubject::Entity(entity.id));
        }
        if self.tiles.has_moveable(cell) {
            subjects.push(RelaySubject::MoveableTile);
        }
        subjects
    }

    fn is_in_zone(&self, subject: RelaySubject, source: Cell) -> bool {
        match subject {
            RelaySubject::Entity(id) => self
                .registry
                .get(id)
                .map_or(false, |entity| entity.cell == source),
            RelaySubject::MoveableTile => self.tiles.has_moveable(source),
        }
    }

    fn is_relay_candidate(&self, link: &TeleportLink, subject: RelaySubject) -> bool {
        if !self.is_in_zone(subject, link.source) {
            return false;
        }
        match subject {
            RelaySubject::Entity(id) => self.registry.get(id).map_or(false, |entity| {
                let kind_allowed = match entity.kind {
                    EntityKind::Player => true,
                    EntityKind::Moveable => link.allow_moveables,
                    EntityKind::Enemy | EntityKind::Destructible => false,
                };
                kind_allowed && !entity.is_moving()
            }),
            RelaySubject::MoveableTile => {
                link.allow_moveables && !self.slides.iter().any(|slide| slide.to == link.source)
            }
        }
    }

    /// Moveables may land on a destructible; the next destruction scan
    /// crushes it. Everything else needs a clear cell.
    fn is_relay_destination_open(&self, destination: Cell, subject: RelaySubject) -> bool {
        let crushes = self.is_moveable_subject(subject);
        let floor_blocks = match self.tiles.floor(destination) {
            TileKind::Wall => true,
            TileKind::Destructible => !crushes,
            _ => false,
        };
        let fixture_blocks = !crushes && self.registry.fixture_at(destination).is_some();
        self.level.contains(destination)
            && !floor_blocks
            && !fixture_blocks
            && !self.tiles.has_moveable(destination)
            && !self.gates.is_closed(destination)
            && self.registry.occupant(destination).is_none()
    }

    fn is_moveable_subject(&self, subject: RelaySubject) -> bool {
        match subject {
            RelaySubject::MoveableTile => true,
            RelaySubject::Entity(id) => self
                .registry
                .get(id)
                .map_or(false, |entity| entity.kind == EntityKind::Moveable),
        }
    }
}
