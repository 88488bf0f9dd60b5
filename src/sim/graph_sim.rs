//! Reference simulator that evaluates discretized viewing on the graph.
//!
//! No images are rendered. Navigable locations are the graph neighbours
//! whose bearing falls inside the horizontal field of view of the current
//! discretized view, which is what the oracle and the episode engine
//! consume. Elevation does not hide a neighbour, so stairs stay reachable.

use std::sync::Arc;

use super::action::PrimitiveAction;
use super::error::SimError;
use super::simulator::{Simulator, SimulatorFactory};
use super::state::{NavigableLocation, SimState, SimulatorSettings};
use crate::graph::{NavGraphStore, Point3};
use crate::units::{
    elevation_band, heading_index, view_step, wrap_heading, wrap_relative, HEADING_COUNT,
};
use crate::Id;

#[derive(Debug, Clone)]
struct Cursor {
    scan_id: Id,
    viewpoint_id: Id,
    heading: f64,
    elevation: f64,
    step: u32,
}

/// Simulator backed by a shared [`NavGraphStore`].
#[derive(Debug, Clone)]
pub struct GraphSimulator {
    graphs: Arc<NavGraphStore>,
    half_hfov: f64,
    cursor: Option<Cursor>,
}

impl GraphSimulator {
    pub fn new(graphs: Arc<NavGraphStore>, settings: &SimulatorSettings) -> Self {
        Self {
            graphs,
            half_hfov: settings.camera.hfov() / 2.0,
            cursor: None,
        }
    }

    fn cursor(&self) -> Result<&Cursor, SimError> {
        self.cursor.as_ref().ok_or(SimError::NoEpisode)
    }

    /// Neighbours visible from the cursor, nearest to view centre first.
    fn navigable_from(
        &self,
        cursor: &Cursor,
        origin: Point3,
    ) -> Result<Vec<NavigableLocation>, SimError> {
        let graph = self.graphs.graph(&cursor.scan_id)?;
        let mut visible: Vec<(f64, NavigableLocation)> = graph
            .neighbors(&cursor.viewpoint_id)?
            .into_iter()
            .filter_map(|vp| {
                let rel_heading = wrap_relative(origin.bearing_to(&vp.position) - cursor.heading);
                let rel_elevation = origin.elevation_to(&vp.position) - cursor.elevation;
                if rel_heading.abs() > self.half_hfov {
                    return None;
                }
                let centre_distance = rel_heading.hypot(rel_elevation);
                Some((
                    centre_distance,
                    NavigableLocation {
                        viewpoint_id: vp.id.clone(),
                        rel_heading,
                        rel_elevation,
                        point: vp.position,
                    },
                ))
            })
            .collect();
        visible.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then_with(|| a.1.viewpoint_id.cmp(&b.1.viewpoint_id))
        });
        Ok(visible.into_iter().map(|(_, loc)| loc).collect())
    }
}

impl Simulator for GraphSimulator {
    fn new_episode(
        &mut self,
        scan_id: &str,
        viewpoint_id: &str,
        heading: f64,
        elevation: f64,
    ) -> Result<(), SimError> {
        let graph = self.graphs.graph(scan_id)?;
        graph.require(viewpoint_id)?;
        let band = elevation_band(elevation);
        self.cursor = Some(Cursor {
            scan_id: scan_id.to_string(),
            viewpoint_id: viewpoint_id.to_string(),
            heading: wrap_heading(heading),
            elevation: (band as f64 - 1.0) * view_step(),
            step: 0,
        });
        Ok(())
    }

    fn make_action(&mut self, action: PrimitiveAction) -> Result<(), SimError> {
        let state = self.state()?;
        let cursor = self.cursor.as_mut().ok_or(SimError::NoEpisode)?;

        if action.index > 0 {
            let target = state.navigable_locations.get(action.index).ok_or_else(|| {
                SimError::NavigableIndexOutOfRange {
                    index: action.index,
                    available: state.navigable_locations.len(),
                    viewpoint: cursor.viewpoint_id.clone(),
                }
            })?;
            cursor.viewpoint_id = target.viewpoint_id.clone();
        } else {
            if action.heading != 0 {
                cursor.heading = wrap_heading(cursor.heading + action.heading as f64 * view_step());
            }
            let band = elevation_band(cursor.elevation) as i64 + action.elevation.signum() as i64;
            cursor.elevation = (band.clamp(0, 2) as f64 - 1.0) * view_step();
        }
        cursor.step += 1;
        Ok(())
    }

    fn state(&self) -> Result<SimState, SimError> {
        let cursor = self.cursor()?;
        let origin = self
            .graphs
            .graph(&cursor.scan_id)?
            .position(&cursor.viewpoint_id)?;
        let here = NavigableLocation {
            viewpoint_id: cursor.viewpoint_id.clone(),
            rel_heading: 0.0,
            rel_elevation: 0.0,
            point: origin,
        };

        let mut navigable_locations = vec![here.clone()];
        navigable_locations.extend(self.navigable_from(cursor, origin)?);

        Ok(SimState {
            scan_id: cursor.scan_id.clone(),
            location: here,
            heading: cursor.heading,
            elevation: cursor.elevation,
            view_index: elevation_band(cursor.elevation) * HEADING_COUNT
                + heading_index(cursor.heading),
            step: cursor.step,
            navigable_locations,
        })
    }
}

/// Creates [`GraphSimulator`]s sharing one graph store.
#[derive(Debug, Clone)]
pub struct GraphSimulatorFactory {
    graphs: Arc<NavGraphStore>,
}

impl GraphSimulatorFactory {
    pub fn new(graphs: Arc<NavGraphStore>) -> Self {
        Self { graphs }
    }
}

impl SimulatorFactory for GraphSimulatorFactory {
    type Sim = GraphSimulator;

    fn create(&self, settings: &SimulatorSettings) -> Result<GraphSimulator, SimError> {
        if !settings.discretized_viewing {
            return Err(SimError::Config(
                "graph simulator only supports discretized viewing".into(),
            ));
        }
        if settings.camera.width == 0 || settings.camera.height == 0 {
            return Err(SimError::Config("camera resolution must be non-zero".into()));
        }
        Ok(GraphSimulator::new(Arc::clone(&self.graphs), settings))
    }
}
