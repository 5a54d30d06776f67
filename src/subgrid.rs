//! Subgrids: the horizontal bands of a grid (header, main body, footer...)
//! and the data model behind each.

use anyhow::{bail, Result};
use std::fmt;
use std::rc::Rc;

use crate::data::data_provider::{DataCallbackSource, DataModel, MainDataModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubgridRole {
    Main,
    Header,
    Filter,
    Summary,
    Footer,
}

impl fmt::Display for SubgridRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Main => "main",
            Self::Header => "header",
            Self::Filter => "filter",
            Self::Summary => "summary",
            Self::Footer => "footer",
        };
        f.write_str(name)
    }
}

/// The model behind a subgrid. Only the main subgrid needs row identity.
#[derive(Clone)]
pub enum SubgridDataModel {
    Main(Rc<dyn MainDataModel>),
    Secondary(Rc<dyn DataModel>),
}

impl SubgridDataModel {
    pub fn row_count(&self) -> usize {
        match self {
            Self::Main(model) => model.get_row_count(),
            Self::Secondary(model) => model.get_row_count(),
        }
    }

    pub fn callback_source(&self) -> Option<&dyn DataCallbackSource> {
        match self {
            Self::Main(model) => model.callback_source(),
            Self::Secondary(model) => model.callback_source(),
        }
    }
}

/// Subgrid definition handed to `Grid::new`
#[derive(Clone)]
pub struct SubgridSpec {
    pub role: SubgridRole,
    pub model: SubgridDataModel,
}

impl SubgridSpec {
    pub fn main(model: Rc<dyn MainDataModel>) -> Self {
        Self {
            role: SubgridRole::Main,
            model: SubgridDataModel::Main(model),
        }
    }

    pub fn secondary(role: SubgridRole, model: Rc<dyn DataModel>) -> Self {
        Self {
            role,
            model: SubgridDataModel::Secondary(model),
        }
    }
}

pub struct Subgrid {
    pub(crate) role: SubgridRole,
    pub(crate) model: SubgridDataModel,
    /// Row count last seen, for models that cannot push changes
    pub(crate) known_row_count: usize,
    /// Whether a callback listener was attached
    pub(crate) subscribed: bool,
}

impl Subgrid {
    pub(crate) fn new(spec: SubgridSpec) -> Self {
        let known_row_count = spec.model.row_count();
        Self {
            role: spec.role,
            model: spec.model,
            known_row_count,
            subscribed: false,
        }
    }

    pub fn role(&self) -> SubgridRole {
        self.role
    }

    pub fn model(&self) -> &SubgridDataModel {
        &self.model
    }

    pub fn row_count(&self) -> usize {
        self.model.row_count()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}

/// Check there is exactly one main subgrid backed by a main data model and
/// return it
pub fn find_main_subgrid(specs: &[SubgridSpec]) -> Result<(usize, Rc<dyn MainDataModel>)> {
    let mains: Vec<usize> = specs
        .iter()
        .enumerate()
        .filter(|(_, s)| s.role == SubgridRole::Main)
        .map(|(i, _)| i)
        .collect();
    match mains.as_slice() {
        [] => bail!("Grid needs a main subgrid, none was configured"),
        [index] => match &specs[*index].model {
            SubgridDataModel::Main(model) => Ok((*index, Rc::clone(model))),
            SubgridDataModel::Secondary(_) => {
                bail!("The main subgrid must be backed by a main data model")
            }
        },
        several => bail!(
            "Grid needs exactly one main subgrid, {} were configured",
            several.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::{DataTable, SchemaField};

    fn table() -> Rc<DataTable> {
        Rc::new(DataTable::new("t", vec![SchemaField::new("a")]))
    }

    #[test]
    fn test_exactly_one_main_subgrid() {
        let header = SubgridSpec::secondary(SubgridRole::Header, table());
        let main = SubgridSpec::main(table());

        assert!(find_main_subgrid(&[header.clone()]).is_err());
        assert!(find_main_subgrid(&[main.clone(), main.clone()]).is_err());
        let (index, _) = find_main_subgrid(&[header, main]).unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn test_main_role_needs_main_model() {
        let spec = SubgridSpec {
            role: SubgridRole::Main,
            model: SubgridDataModel::Secondary(table()),
        };
        assert!(find_main_subgrid(&[spec]).is_err());
    }
}
