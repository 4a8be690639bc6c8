// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{EikonalError, Result};
use crate::mesh::{Point, VertexId};

/// Time cost (inverse speed, `1 / F`) sampled at mesh vertices.
///
/// Implementations that change over time report it through `needs_update`;
/// the solver then calls `update` and re-solves.
pub trait TimeCostFunction: Send + Sync {
    /// Time cost at a vertex. Must be positive and finite.
    fn cost_at(&self, vertex: VertexId, position: Point) -> f64;

    /// Whether the cost field changed since the last `update`.
    fn needs_update(&self) -> bool {
        false
    }

    /// Acknowledge pending changes.
    fn update(&mut self) {}
}

impl<T: TimeCostFunction + ?Sized> TimeCostFunction for Box<T> {
    fn cost_at(&self, vertex: VertexId, position: Point) -> f64 {
        (**self).cost_at(vertex, position)
    }

    fn needs_update(&self) -> bool {
        (**self).needs_update()
    }

    fn update(&mut self) {
        (**self).update()
    }
}

fn validate(vertex: VertexId, value: f64) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EikonalError::InvalidCost { vertex, value });
    }
    Ok(value)
}

/// The same time cost everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformCost {
    cost: f64,
}

impl UniformCost {
    /// Uniform time cost.
    pub fn new(cost: f64) -> Result<Self> {
        Ok(UniformCost {
            cost: validate(0, cost)?,
        })
    }

    /// Uniform cost for a uniform speed `F` (cost `1 / F`).
    pub fn from_speed(speed: f64) -> Result<Self> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(EikonalError::InvalidSpeed {
                index: 0,
                value: speed,
            });
        }
        Self::new(1.0 / speed)
    }
}

impl Default for UniformCost {
    fn default() -> Self {
        UniformCost { cost: 1.0 }
    }
}

impl TimeCostFunction for UniformCost {
    fn cost_at(&self, _vertex: VertexId, _position: Point) -> f64 {
        self.cost
    }
}

/// Per-vertex time cost table, e.g. derived from local crowd density.
///
/// Vertices beyond the table (inserted after construction) use the default
/// cost.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexCost {
    costs: Vec<f64>,
    default_cost: f64,
    dirty: bool,
}

impl VertexCost {
    /// Table of time costs indexed by vertex.
    pub fn new(costs: Vec<f64>) -> Result<Self> {
        for (vertex, &value) in costs.iter().enumerate() {
            validate(vertex, value)?;
        }
        Ok(VertexCost {
            costs,
            default_cost: 1.0,
            dirty: false,
        })
    }

    /// Table built from per-vertex speeds.
    pub fn from_speeds(speeds: &[f64]) -> Result<Self> {
        Self::new(crate::io::speeds_to_costs(speeds)?)
    }

    /// Cost used for vertices outside the table (builder method). Default 1.
    pub fn with_default(mut self, cost: f64) -> Result<Self> {
        self.default_cost = validate(self.costs.len(), cost)?;
        Ok(self)
    }

    /// Change the cost of one vertex, marking the field dirty.
    pub fn set(&mut self, vertex: VertexId, cost: f64) -> Result<()> {
        let cost = validate(vertex, cost)?;
        if vertex >= self.costs.len() {
            self.costs.resize(vertex + 1, self.default_cost);
        }
        if self.costs[vertex] != cost {
            self.costs[vertex] = cost;
            self.dirty = true;
        }
        Ok(())
    }

    /// Multiply every cost by `factor`, marking the field dirty.
    pub fn scale(&mut self, factor: f64) -> Result<()> {
        validate(0, factor)?;
        for c in &mut self.costs {
            *c *= factor;
        }
        self.default_cost *= factor;
        self.dirty = true;
        Ok(())
    }

    /// The cost table.
    pub fn costs(&self) -> &[f64] {
        &self.costs
    }
}

impl TimeCostFunction for VertexCost {
    fn cost_at(&self, vertex: VertexId, _position: Point) -> f64 {
        self.costs.get(vertex).copied().unwrap_or(self.default_cost)
    }

    fn needs_update(&self) -> bool {
        self.dirty
    }

    fn update(&mut self) {
        self.dirty = false;
    }
}

/// Time cost given by a function of position.
pub struct PositionCost<F> {
    cost: F,
    dirty: bool,
}

impl<F> PositionCost<F>
where
    F: Fn(Point) -> f64 + Send + Sync,
{
    /// Wrap a position-dependent cost.
    pub fn new(cost: F) -> Self {
        PositionCost { cost, dirty: false }
    }

    /// Replace the function, marking the field dirty.
    pub fn replace(&mut self, cost: F) {
        self.cost = cost;
        self.dirty = true;
    }

    /// Mark the field dirty without replacing it, for functions capturing
    /// shared state.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }
}

impl<F> TimeCostFunction for PositionCost<F>
where
    F: Fn(Point) -> f64 + Send + Sync,
{
    fn cost_at(&self, _vertex: VertexId, position: Point) -> f64 {
        (self.cost)(position)
    }

    fn needs_update(&self) -> bool {
        self.dirty
    }

    fn update(&mut self) {
        self.dirty = false;
    }
}
