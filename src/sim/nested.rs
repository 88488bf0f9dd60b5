//! Batch shapes.
//!
//! Every batch operation comes in two shapes: one item per agent, or a
//! beam of items per agent. [`Batch`] carries the shape with the data so a
//! single structured map serves both.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::SimError;

/// Shape selector for operations that create a batch from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Nesting {
    #[default]
    Flat,
    Beamed,
}

/// Per-agent data, optionally with a beam of alternatives per agent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Batch<T> {
    Flat(Vec<T>),
    Beamed(Vec<Vec<T>>),
}

impl<T> Batch<T> {
    /// Builds a batch of the given shape from one item per agent.
    ///
    /// Beamed batches get a beam of length one per agent.
    pub fn from_agents(nesting: Nesting, items: Vec<T>) -> Self {
        match nesting {
            Nesting::Flat => Batch::Flat(items),
            Nesting::Beamed => Batch::Beamed(items.into_iter().map(|item| vec![item]).collect()),
        }
    }

    pub fn nesting(&self) -> Nesting {
        match self {
            Batch::Flat(_) => Nesting::Flat,
            Batch::Beamed(_) => Nesting::Beamed,
        }
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        match self {
            Batch::Flat(items) => items.len(),
            Batch::Beamed(beams) => beams.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items of agent `agent`: one for flat batches, the whole beam otherwise.
    pub fn agent(&self, agent: usize) -> Option<&[T]> {
        match self {
            Batch::Flat(items) => items.get(agent).map(std::slice::from_ref),
            Batch::Beamed(beams) => beams.get(agent).map(Vec::as_slice),
        }
    }

    /// Iterates every item in agent order, then beam order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        match self {
            Batch::Flat(items) => Box::new(items.iter()),
            Batch::Beamed(beams) => Box::new(beams.iter().flatten()),
        }
    }

    pub fn as_flat(&self) -> Option<&[T]> {
        match self {
            Batch::Flat(items) => Some(items),
            Batch::Beamed(_) => None,
        }
    }

    pub fn into_flat(self) -> Option<Vec<T>> {
        match self {
            Batch::Flat(items) => Some(items),
            Batch::Beamed(_) => None,
        }
    }

    pub fn into_beamed(self) -> Option<Vec<Vec<T>>> {
        match self {
            Batch::Flat(_) => None,
            Batch::Beamed(beams) => Some(beams),
        }
    }

    /// Applies `f` to every item, keeping the shape. `f` also receives the
    /// agent index.
    pub fn try_map<R, E>(
        &self,
        mut f: impl FnMut(usize, &T) -> Result<R, E>,
    ) -> Result<Batch<R>, E> {
        Ok(match self {
            Batch::Flat(items) => Batch::Flat(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| f(i, item))
                    .collect::<Result<_, _>>()?,
            ),
            Batch::Beamed(beams) => Batch::Beamed(
                beams
                    .iter()
                    .enumerate()
                    .map(|(i, beam)| {
                        beam.iter()
                            .map(|item| f(i, item))
                            .collect::<Result<Vec<R>, E>>()
                    })
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    pub fn map<R>(&self, mut f: impl FnMut(&T) -> R) -> Batch<R> {
        match self.try_map(|_, item| Ok::<R, std::convert::Infallible>(f(item))) {
            Ok(batch) => batch,
            Err(never) => match never {},
        }
    }

    /// Pairs items of two batches of identical shape.
    pub fn zip<'a, U>(&'a self, other: &'a Batch<U>) -> Result<Batch<(&'a T, &'a U)>, SimError> {
        check_len(self.len(), other.len())?;
        match (self, other) {
            (Batch::Flat(a), Batch::Flat(b)) => Ok(Batch::Flat(a.iter().zip(b).collect())),
            (Batch::Beamed(a), Batch::Beamed(b)) => a
                .iter()
                .zip(b)
                .map(|(beam_a, beam_b)| {
                    check_len(beam_a.len(), beam_b.len())?;
                    Ok(beam_a.iter().zip(beam_b).collect::<Vec<_>>())
                })
                .collect::<Result<_, _>>()
                .map(Batch::Beamed),
            _ => Err(SimError::NestingMismatch),
        }
    }
}

fn check_len(expected: usize, actual: usize) -> Result<(), SimError> {
    if expected == actual {
        Ok(())
    } else {
        Err(SimError::ShapeMismatch { expected, actual })
    }
}

/// Maps `f` over `(simulator, item)` pairs in the shape of `items`.
///
/// Flat batches use beam slot 0 of each agent; beamed batches use slot `j`
/// for the `j`-th beam element. The agent count must equal the number of
/// simulator rows and no beam may exceed the row width.
pub(crate) fn structured_map<S, T, R>(
    sims: &mut [Vec<S>],
    items: &Batch<T>,
    mut f: impl FnMut(&mut S, &T) -> Result<R, SimError>,
) -> Result<Batch<R>, SimError> {
    check_len(sims.len(), items.len())?;
    match items {
        Batch::Flat(items) => sims
            .iter_mut()
            .zip(items)
            .enumerate()
            .map(|(agent, (row, item))| {
                let sim = row.first_mut().ok_or(SimError::BeamOverflow {
                    agent,
                    len: 1,
                    beam_size: 0,
                })?;
                f(sim, item)
            })
            .collect::<Result<_, _>>()
            .map(Batch::Flat),
        Batch::Beamed(beams) => sims
            .iter_mut()
            .zip(beams)
            .enumerate()
            .map(|(agent, (row, beam))| {
                if beam.len() > row.len() {
                    return Err(SimError::BeamOverflow {
                        agent,
                        len: beam.len(),
                        beam_size: row.len(),
                    });
                }
                row.iter_mut()
                    .zip(beam)
                    .map(|(sim, item)| f(sim, item))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<_, _>>()
            .map(Batch::Beamed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_agents_wraps_beams() {
        let b = Batch::from_agents(Nesting::Beamed, vec![1, 2]);
        assert_eq!(b, Batch::Beamed(vec![vec![1], vec![2]]));
        assert_eq!(b.len(), 2);
        assert_eq!(b.nesting(), Nesting::Beamed);
    }

    #[test]
    fn iter_walks_agents_then_beams() {
        let b = Batch::Beamed(vec![vec![1, 2], vec![3]]);
        assert_eq!(b.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(b.agent(0), Some(&[1, 2][..]));
    }

    #[test]
    fn zip_rejects_mixed_shapes() {
        let a = Batch::Flat(vec![1]);
        let b = Batch::Beamed(vec![vec![1]]);
        assert_eq!(a.zip(&b).unwrap_err(), SimError::NestingMismatch);
    }

    #[test]
    fn zip_rejects_ragged_beams() {
        let a = Batch::Beamed(vec![vec![1, 2]]);
        let b = Batch::Beamed(vec![vec!['x']]);
        assert_eq!(
            a.zip(&b).unwrap_err(),
            SimError::ShapeMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn structured_map_uses_slot_zero_when_flat() {
        let mut sims = vec![vec![10, 20], vec![30, 40]];
        let out = structured_map(&mut sims, &Batch::Flat(vec![1, 2]), |s, x| {
            *s += x;
            Ok(*s)
        })
        .unwrap();
        assert_eq!(out, Batch::Flat(vec![11, 32]));
        assert_eq!(sims, vec![vec![11, 20], vec![32, 40]]);
    }

    #[test]
    fn structured_map_walks_beam_slots() {
        let mut sims = vec![vec![0, 0, 0]];
        let out = structured_map(&mut sims, &Batch::Beamed(vec![vec![5, 6]]), |s, x| {
            *s = *x;
            Ok(*x * 2)
        })
        .unwrap();
        assert_eq!(out, Batch::Beamed(vec![vec![10, 12]]));
        assert_eq!(sims, vec![vec![5, 6, 0]]);
    }

    #[test]
    fn structured_map_rejects_wide_beams() {
        let mut sims = vec![vec![0]];
        let err = structured_map(&mut sims, &Batch::Beamed(vec![vec![1, 2]]), |_, _| Ok(()))
            .unwrap_err();
        assert_eq!(
            err,
            SimError::BeamOverflow {
                agent: 0,
                len: 2,
                beam_size: 1
            }
        );
    }

    #[test]
    fn structured_map_checks_agent_count() {
        let mut sims = vec![vec![0], vec![0]];
        let err = structured_map(&mut sims, &Batch::Flat(vec![1]), |_, _| Ok(())).unwrap_err();
        assert_eq!(
            err,
            SimError::ShapeMismatch {
                expected: 2,
                actual: 1
            }
        );
    }
}
