//! Hopcroft–Karp maximum bipartite matching.
//!
//! Givers form the left side, receivers the right side; an edge means the
//! pairing is allowed. The draw is feasible exactly when the maximum matching
//! is perfect.

#![expect(
    clippy::indexing_slicing,
    reason = "positions are drawn from adjacency lists bounded by the vertex counts"
)]

use std::collections::VecDeque;

const UNREACHED: usize = usize::MAX;

/// Result of a maximum matching run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Matching {
    receiver_of: Vec<Option<usize>>,
}

impl Matching {
    /// Number of matched givers.
    pub(crate) fn size(&self) -> usize {
        self.receiver_of.iter().flatten().count()
    }

    /// Givers left without a receiver.
    pub(crate) fn unmatched(&self) -> usize {
        self.receiver_of.len() - self.size()
    }

    /// Receivers indexed by giver, when every giver is matched.
    pub(crate) fn into_perfect(self) -> Option<Vec<usize>> {
        self.receiver_of.into_iter().collect()
    }
}

/// Compute a maximum matching.
///
/// `adjacency[g]` lists the receivers giver `g` may be paired with, in the
/// order they should be tried. Receivers are numbered `0..receivers`.
pub(crate) fn maximum_matching(adjacency: &[Vec<usize>], receivers: usize) -> Matching {
    let mut search = Search {
        adjacency,
        receiver_of: vec![None; adjacency.len()],
        giver_of: vec![None; receivers],
        layer: vec![UNREACHED; adjacency.len()],
    };

    while search.build_layers() {
        for giver in 0..adjacency.len() {
            if search.receiver_of[giver].is_none() {
                search.augment(giver);
            }
        }
    }

    Matching {
        receiver_of: search.receiver_of,
    }
}

struct Search<'a> {
    adjacency: &'a [Vec<usize>],
    receiver_of: Vec<Option<usize>>,
    giver_of: Vec<Option<usize>>,
    layer: Vec<usize>,
}

impl Search<'_> {
    /// Breadth-first layering from the free givers. Returns whether an
    /// augmenting path exists.
    fn build_layers(&mut self) -> bool {
        let mut queue = VecDeque::new();
        for (giver, receiver) in self.receiver_of.iter().enumerate() {
            if receiver.is_none() {
                self.layer[giver] = 0;
                queue.push_back(giver);
            } else {
                self.layer[giver] = UNREACHED;
            }
        }

        let mut found = false;
        while let Some(giver) = queue.pop_front() {
            for &receiver in &self.adjacency[giver] {
                match self.giver_of[receiver] {
                    None => found = true,
                    Some(next) if self.layer[next] == UNREACHED => {
                        self.layer[next] = self.layer[giver] + 1;
                        queue.push_back(next);
                    }
                    Some(_) => {}
                }
            }
        }
        found
    }

    /// Depth-first search for an augmenting path along the layers.
    fn augment(&mut self, giver: usize) -> bool {
        let adjacency = self.adjacency;
        for &receiver in &adjacency[giver] {
            let reachable = match self.giver_of[receiver] {
                None => true,
                Some(next) => self.layer[next] == self.layer[giver] + 1 && self.augment(next),
            };
            if reachable {
                self.receiver_of[giver] = Some(receiver);
                self.giver_of[receiver] = Some(giver);
                return true;
            }
        }
        self.layer[giver] = UNREACHED;
        false
    }
}
