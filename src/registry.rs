//! Registry of live grids, owned by the host application

use std::fmt;
use tracing::debug;

use crate::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(usize);

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grid#{}", self.0)
    }
}

/// Keeps track of the grids a host has created. Ids are never reused.
#[derive(Default)]
pub struct GridRegistry {
    grids: Vec<(GridId, Grid)>,
    next_grid_id: usize,
}

impl GridRegistry {
    pub fn new() -> Self {
        Self {
            grids: Vec::new(),
            next_grid_id: 1,
        }
    }

    /// Add a grid and return its id. Registering the same grid twice
    /// returns the existing id.
    pub fn register(&mut self, grid: Grid) -> GridId {
        if let Some((id, _)) = self.grids.iter().find(|(_, g)| g.ptr_eq(&grid)) {
            return *id;
        }
        // Default-constructed registries start at zero
        let id = GridId(self.next_grid_id.max(1));
        self.next_grid_id = id.0 + 1;
        debug!(target: "grid", "Registered '{}' as {}", grid.name(), id);
        self.grids.push((id, grid));
        id
    }

    /// Remove a grid. The grid is destroyed unless `keep_alive` is set.
    pub fn unregister(&mut self, id: GridId, keep_alive: bool) -> Option<Grid> {
        let position = self.grids.iter().position(|(gid, _)| *gid == id)?;
        let (_, grid) = self.grids.remove(position);
        if !keep_alive {
            grid.destroy();
        }
        debug!(target: "grid", "Unregistered {}", id);
        Some(grid)
    }

    pub fn get(&self, id: GridId) -> Option<&Grid> {
        self.grids
            .iter()
            .find(|(gid, _)| *gid == id)
            .map(|(_, grid)| grid)
    }

    pub fn find_by_name(&self, name: &str) -> Option<GridId> {
        self.grids
            .iter()
            .find(|(_, grid)| grid.name() == name)
            .map(|(id, _)| *id)
    }

    pub fn ids(&self) -> Vec<GridId> {
        self.grids.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Destroy and drop every grid
    pub fn clear(&mut self) {
        for (_, grid) in self.grids.drain(..) {
            grid.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::data::datatable::{DataTable, SchemaField};
    use crate::subgrid::SubgridSpec;
    use std::rc::Rc;

    fn create_grid(name: &str) -> Grid {
        let table = Rc::new(DataTable::new(name, vec![SchemaField::new("id")]));
        Grid::new(
            name,
            GridConfig::default(),
            table.clone(),
            vec![SubgridSpec::main(table)],
        )
        .unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = GridRegistry::new();
        let a = registry.register(create_grid("a"));
        let b = registry.register(create_grid("b"));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find_by_name("b"), Some(b));
        assert_eq!(registry.get(a).map(|g| g.name()), Some("a"));
    }

    #[test]
    fn test_register_same_grid_twice() {
        let mut registry = GridRegistry::new();
        let grid = create_grid("a");
        let first = registry.register(grid.clone());
        assert_eq!(registry.register(grid), first);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_destroys_unless_kept() {
        let mut registry = GridRegistry::new();
        let a = registry.register(create_grid("a"));
        let b = registry.register(create_grid("b"));

        let kept = registry.unregister(a, true).unwrap();
        assert!(!kept.is_destroyed());
        let dropped = registry.unregister(b, false).unwrap();
        assert!(dropped.is_destroyed());

        assert!(registry.is_empty());
        assert!(registry.unregister(a, false).is_none());
    }

    #[test]
    fn test_ids_not_reused() {
        let mut registry = GridRegistry::default();
        let a = registry.register(create_grid("a"));
        registry.unregister(a, false);
        let b = registry.register(create_grid("b"));
        assert_ne!(a, b);
    }
}
