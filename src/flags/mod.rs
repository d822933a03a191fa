// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Selecting antennas to flag so that no long baselines remain.
 */

pub mod error;

pub use error::InvalidInput;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

/// A position in the local east, north, height frame of the array [metres].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Enh {
    pub e: f64,
    pub n: f64,
    pub h: f64,
}

impl Enh {
    /// The Euclidean distance between two positions [metres].
    pub fn distance(&self, other: &Enh) -> f64 {
        let de = self.e - other.e;
        let dn = self.n - other.n;
        let dh = self.h - other.h;
        (de * de + dn * dn + dh * dh).sqrt()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Antenna<I> {
    /// Unique identifier, e.g. the metafits antenna index or a tile name.
    pub id: I,

    pub pos: Enh,

    /// Was this antenna already flagged (e.g. for calibration reasons)?
    pub flagged: bool,
}

impl<I> Antenna<I> {
    pub fn new(id: I, e: f64, n: f64, h: f64) -> Self {
        Self {
            id,
            pos: Enh { e, n, h },
            flagged: false,
        }
    }

    /// Is this antenna further than `core_radius` metres (horizontally) from
    /// the array centre?
    pub fn is_outside_core(&self, core_radius: f64) -> bool {
        self.pos.e.hypot(self.pos.n) > core_radius
    }
}

impl<I: Display> Antenna<I> {
    fn check_position(&self) -> Result<(), InvalidInput> {
        let components = [("east", self.pos.e), ("north", self.pos.n), ("height", self.pos.h)];
        for &(component, value) in components.iter() {
            if !value.is_finite() {
                return Err(InvalidInput::MissingPosition {
                    id: self.id.to_string(),
                    component,
                });
            }
        }
        Ok(())
    }
}

/// An undirected graph of antennas, where each edge is a baseline longer than
/// the maximum allowed length. Every supplied antenna is a node, even if it
/// has no edges.
#[derive(Clone, Debug, PartialEq)]
pub struct ConflictGraph<I: Ord> {
    adjacency: BTreeMap<I, BTreeSet<I>>,
}

impl<I: Ord + Clone + Display> ConflictGraph<I> {
    /// Build the graph by checking every unordered pair of antennas.
    pub fn new(antennas: &[Antenna<I>], max_distance: f64) -> Result<Self, InvalidInput> {
        if max_distance.is_nan() {
            return Err(InvalidInput::NanMaxDistance);
        }
        if max_distance < 0.0 {
            return Err(InvalidInput::NegativeMaxDistance(max_distance));
        }

        let mut adjacency: BTreeMap<I, BTreeSet<I>> = BTreeMap::new();
        for ant in antennas {
            ant.check_position()?;
            if adjacency.insert(ant.id.clone(), BTreeSet::new()).is_some() {
                return Err(InvalidInput::DuplicateId(ant.id.to_string()));
            }
        }

        for (i, ant1) in antennas.iter().enumerate() {
            for ant2 in &antennas[i + 1..] {
                if ant1.pos.distance(&ant2.pos) > max_distance {
                    // Both ids were inserted above.
                    if let Some(set) = adjacency.get_mut(&ant1.id) {
                        set.insert(ant2.id.clone());
                    }
                    if let Some(set) = adjacency.get_mut(&ant2.id) {
                        set.insert(ant1.id.clone());
                    }
                }
            }
        }

        Ok(Self { adjacency })
    }
}

impl<I: Ord + Clone> ConflictGraph<I> {
    /// The number of antennas still in the graph.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn num_edges(&self) -> usize {
        self.adjacency.values().map(|s| s.len()).sum::<usize>() / 2
    }

    /// The number of long baselines this antenna still forms. `None` if the
    /// antenna isn't in the graph.
    pub fn degree(&self, id: &I) -> Option<usize> {
        self.adjacency.get(id).map(|s| s.len())
    }

    pub fn neighbours(&self, id: &I) -> Option<&BTreeSet<I>> {
        self.adjacency.get(id)
    }

    /// The antenna with the most long baselines. On a tie the smallest id
    /// wins. `None` if the graph has no antennas.
    pub fn highest_degree(&self) -> Option<(&I, usize)> {
        let mut best: Option<(&I, usize)> = None;
        // Ids are iterated in ascending order, so only a strictly larger
        // degree replaces the current best.
        for (id, neighbours) in &self.adjacency {
            match best {
                Some((_, d)) if neighbours.len() <= d => (),
                _ => best = Some((id, neighbours.len())),
            }
        }
        best
    }

    /// Remove an antenna and all of its edges. Returns whether the antenna was
    /// present.
    pub fn remove(&mut self, id: &I) -> bool {
        match self.adjacency.remove(id) {
            None => false,
            Some(neighbours) => {
                for n in &neighbours {
                    if let Some(set) = self.adjacency.get_mut(n) {
                        set.remove(id);
                    }
                }
                true
            }
        }
    }
}

/// Get the antennas that need to be flagged so that no remaining baseline is
/// longer than `max_distance` metres. This is the greedy vertex cover
/// heuristic; the antenna with the most long baselines (smallest id on a tie)
/// is removed until no long baselines remain. The result is in removal order.
///
/// Fails if `max_distance` is negative, an antenna position is incomplete, or
/// an id is duplicated.
pub fn select_flags<I: Ord + Clone + Display>(
    antennas: &[Antenna<I>],
    max_distance: f64,
) -> Result<Vec<I>, InvalidInput> {
    let mut graph = ConflictGraph::new(antennas, max_distance)?;
    let mut flags = vec![];
    loop {
        let id = match graph.highest_degree() {
            Some((id, degree)) if degree > 0 => id.clone(),
            _ => break,
        };
        graph.remove(&id);
        flags.push(id);
    }
    Ok(flags)
}

/// Flag the antennas needed to remove long baselines among the antennas not
/// already flagged, and return those together with the already-flagged
/// antennas.
pub fn combined_flags<I: Ord + Clone + Display>(
    antennas: &[Antenna<I>],
    max_distance: f64,
) -> Result<BTreeSet<I>, InvalidInput> {
    let (flagged, unflagged): (Vec<_>, Vec<_>) =
        antennas.iter().cloned().partition(|a| a.flagged);
    let mut all: BTreeSet<I> = flagged.into_iter().map(|a| a.id).collect();
    all.extend(select_flags(&unflagged, max_distance)?);
    Ok(all)
}
