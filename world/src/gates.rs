//! Gates that block cells while closed and the switches that toggle them.

use std::collections::BTreeMap;

use chipway_core::{Cell, GateId, SwitchId};

#[derive(Clone, Debug)]
pub(crate) struct Gate {
    pub(crate) cells: Vec<Cell>,
    pub(crate) open: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Switch {
    pub(crate) cell: Cell,
    pub(crate) on: bool,
    pub(crate) gates: Vec<GateId>,
}

/// Result of toggling a switch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SwitchFlip {
    pub(crate) on: bool,
    pub(crate) gates: Vec<(GateId, bool)>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct GateBoard {
    gates: BTreeMap<GateId, Gate>,
    switches: BTreeMap<SwitchId, Switch>,
}

impl GateBoard {
    pub(crate) fn add_gate(&mut self, id: GateId, gate: Gate) {
        let _ = self.gates.insert(id, gate);
    }

    pub(crate) fn add_switch(&mut self, id: SwitchId, switch: Switch) {
        let _ = self.switches.insert(id, switch);
    }

    pub(crate) fn has_gate(&self, id: GateId) -> bool {
        self.gates.contains_key(&id)
    }

    pub(crate) fn is_closed(&self, cell: Cell) -> bool {
        self.gates
            .values()
            .any(|gate| !gate.open && gate.cells.contains(&cell))
    }

    pub(crate) fn gate(&self, id: GateId) -> Option<&Gate> {
        self.gates.get(&id)
    }

    pub(crate) fn gates(&self) -> impl Iterator<Item = (GateId, &Gate)> {
        self.gates.iter().map(|(id, gate)| (*id, gate))
    }

    pub(crate) fn switches(&self) -> impl Iterator<Item = (SwitchId, &Switch)> {
        self.switches.iter().map(|(id, switch)| (*id, switch))
    }

    pub(crate) fn switch_at(&self, cell: Cell) -> Option<SwitchId> {
        self.switches
            .iter()
            .find(|(_, switch)| switch.cell == cell)
            .map(|(id, _)| *id)
    }

    /// Sets a gate's state. Returns `Some(open)` only when the state changed.
    pub(crate) fn set_open(&mut self, id: GateId, open: bool) -> Option<bool> {
        let gate = self.gates.get_mut(&id)?;
        if gate.open == open {
            return None;
        }
        gate.open = open;
        Some(open)
    }

    /// Flips a switch and every gate it controls.
    pub(crate) fn flip(&mut self, id: SwitchId) -> Option<SwitchFlip> {
        let switch = self.switches.get_mut(&id)?;
        switch.on = !switch.on;
        let on = switch.on;
        let targets = switch.gates.clone();
        let mut gates = Vec::with_capacity(targets.len());
        for gate_id in targets {
            if let Some(gate) = self.gates.get_mut(&gate_id) {
                gate.open = !gate.open;
                gates.push((gate_id, gate.open));
            }
        }
        Some(SwitchFlip { on, gates })
    }
}
