#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure A* planner that turns a clicked goal into a sequence of hero steps.

use std::{cmp::Reverse, collections::BinaryHeap};

use magic_tower_core::{CellCoord, Direction, GridType, TowerFloor};

/// Planner that reuses its search buffers between requests.
#[derive(Debug, Default)]
pub struct Pathfinder {
    costs: Vec<Option<u64>>,
    came_from: Vec<Option<CellCoord>>,
    frontier: BinaryHeap<Reverse<(u64, u32, u32)>>,
}

impl Pathfinder {
    /// Creates a planner with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans a route from `start` to `goal` on the provided floor.
    ///
    /// The returned steps exclude `start` and are ordered from the goal back
    /// toward the start, so callers consume them by popping from the end. An
    /// empty sequence means there is nothing to do: the goal equals the start,
    /// the goal is an obstacle or lies outside the floor, or it is unreachable.
    pub fn plan(&mut self, floor: &TowerFloor, start: CellCoord, goal: CellCoord) -> Vec<CellCoord> {
        if start == goal || !floor.contains(start) || !floor.contains(goal) {
            return Vec::new();
        }
        if floor.get(goal).kind.is_obstacle() {
            return Vec::new();
        }

        self.prepare_workspace(floor);
        let difficult_cost = u64::from(floor.length()) + u64::from(floor.width());

        self.set_cost(floor, start, 0);
        self.frontier.push(Reverse((
            heuristic(start, goal),
            start.x(),
            start.y(),
        )));

        while let Some(Reverse((priority, x, y))) = self.frontier.pop() {
            let current = CellCoord::new(x, y);
            if current == goal {
                break;
            }

            let Some(current_cost) = self.cost(floor, current) else {
                continue;
            };
            if priority > current_cost + heuristic(current, goal) {
                continue;
            }

            for direction in expansion_order(current) {
                let Some(next) = current.step(direction) else {
                    continue;
                };
                if !floor.contains(next) {
                    continue;
                }

                let kind = floor.get(next).kind;
                let Some(step_cost) = traversal_cost(kind, difficult_cost) else {
                    continue;
                };

                let new_cost = current_cost + step_cost;
                let improves = self
                    .cost(floor, next)
                    .map_or(true, |known| new_cost < known);
                if !improves {
                    continue;
                }

                self.set_cost(floor, next, new_cost);
                self.set_came_from(floor, next, current);
                self.frontier.push(Reverse((
                    new_cost + heuristic(next, goal),
                    next.x(),
                    next.y(),
                )));
            }
        }

        self.reconstruct(floor, start, goal)
    }

    fn prepare_workspace(&mut self, floor: &TowerFloor) {
        let cell_count = usize::try_from(u64::from(floor.length()) * u64::from(floor.width()))
            .unwrap_or(0);

        self.costs.clear();
        self.costs.resize(cell_count, None);
        self.came_from.clear();
        self.came_from.resize(cell_count, None);
        self.frontier.clear();
    }

    fn reconstruct(&self, floor: &TowerFloor, start: CellCoord, goal: CellCoord) -> Vec<CellCoord> {
        if self.cost(floor, goal).is_none() {
            return Vec::new();
        }

        let mut steps = Vec::new();
        let mut current = goal;
        while current != start {
            steps.push(current);
            match self.predecessor(floor, current) {
                Some(previous) => current = previous,
                None => return Vec::new(),
            }
        }
        steps
    }

    fn cost(&self, floor: &TowerFloor, cell: CellCoord) -> Option<u64> {
        index(floor, cell).and_then(|offset| self.costs.get(offset).copied().flatten())
    }

    fn set_cost(&mut self, floor: &TowerFloor, cell: CellCoord, cost: u64) {
        if let Some(slot) = index(floor, cell).and_then(|offset| self.costs.get_mut(offset)) {
            *slot = Some(cost);
        }
    }

    fn predecessor(&self, floor: &TowerFloor, cell: CellCoord) -> Option<CellCoord> {
        index(floor, cell).and_then(|offset| self.came_from.get(offset).copied().flatten())
    }

    fn set_came_from(&mut self, floor: &TowerFloor, cell: CellCoord, previous: CellCoord) {
        if let Some(slot) = index(floor, cell).and_then(|offset| self.came_from.get_mut(offset)) {
            *slot = Some(previous);
        }
    }
}

/// Plans a route with a throwaway [`Pathfinder`].
#[must_use]
pub fn find_path(floor: &TowerFloor, start: CellCoord, goal: CellCoord) -> Vec<CellCoord> {
    Pathfinder::new().plan(floor, start, goal)
}

/// Cost of entering a tile, or `None` for obstacles.
///
/// Floors and items cost one step. Everything else that is not an obstacle
/// costs `difficult_cost`, which steers routes around monsters, doors, npcs
/// and stairs without forbidding them.
#[must_use]
pub fn traversal_cost(kind: GridType, difficult_cost: u64) -> Option<u64> {
    match kind {
        GridType::Boundary | GridType::Wall => None,
        GridType::Floor | GridType::Item => Some(1),
        GridType::Stairs
        | GridType::Door
        | GridType::Npc
        | GridType::Monster
        | GridType::Unknown => Some(difficult_cost),
    }
}

// Alternating the order on even cells bends paths into staircases instead of
// long L shapes.
fn expansion_order(cell: CellCoord) -> [Direction; 4] {
    let mut order = Direction::ALL;
    if (u64::from(cell.x()) + u64::from(cell.y())) % 2 == 0 {
        order.reverse();
    }
    order
}

fn heuristic(from: CellCoord, to: CellCoord) -> u64 {
    u64::from(from.manhattan_distance(to))
}

fn index(floor: &TowerFloor, cell: CellCoord) -> Option<usize> {
    if !floor.contains(cell) {
        return None;
    }
    let row = usize::try_from(cell.y()).ok()?;
    let column = usize::try_from(cell.x()).ok()?;
    let length = usize::try_from(floor.length()).ok()?;
    row.checked_mul(length)?.checked_add(column)
}
