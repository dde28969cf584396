//! Selection of the columns that make it to the output
use log::warn;

use crate::{error::ConfigError, Row};

/// Number of columns a selection can tell apart. Column `i` and column
/// `i + WIDTH` share the same bit.
pub const WIDTH: usize = 64;

/// Parses a comma separated list of column indexes such as `"0, 2,5"`.
///
/// Spaces around each index are ignored. A single invalid token fails the
/// whole list.
pub fn parse_column_list(list: &str) -> Result<Vec<usize>, ConfigError> {
    list.split(',')
        .map(|token| {
            token
                .trim_matches(' ')
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidColumn(token.to_string()))
        })
        .collect()
}

/// A fixed width bit mask where bit `i` set means column `i` is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnSelection {
    mask: u64,
}

impl ColumnSelection {
    /// Sets one bit per index and, if `invert` is true, complements the whole
    /// mask afterwards so that exactly the listed columns are dropped.
    pub fn build<I>(indices: I, invert: bool) -> ColumnSelection
    where
        I: IntoIterator<Item = usize>,
    {
        let mut mask = 0u64;

        for index in indices {
            mask |= 1u64 << (index % WIDTH);
        }

        if invert {
            mask = !mask;
        }

        ColumnSelection { mask }
    }

    /// Keeps only the given columns
    pub fn include<I: IntoIterator<Item = usize>>(indices: I) -> ColumnSelection {
        ColumnSelection::build(indices, false)
    }

    /// Keeps every column but the given ones
    pub fn exclude<I: IntoIterator<Item = usize>>(indices: I) -> ColumnSelection {
        ColumnSelection::build(indices, true)
    }

    /// Builds the selection from the raw command line lists. An empty string
    /// counts as a missing list.
    pub fn from_lists(
        inclusion: Option<&str>,
        exclusion: Option<&str>,
    ) -> Result<ColumnSelection, ConfigError> {
        let inclusion = inclusion.filter(|l| !l.is_empty());
        let exclusion = exclusion.filter(|l| !l.is_empty());

        let (list, invert) = match (inclusion, exclusion) {
            (Some(_), Some(_)) => return Err(ConfigError::BothColumnLists),
            (Some(list), None) => (list, false),
            (None, Some(list)) => (list, true),
            (None, None) => {
                warn!("no columns given with -k or -d, every field will be dropped");
                return Ok(ColumnSelection::default());
            }
        };

        let indices = parse_column_list(list)?;

        for &index in indices.iter().filter(|&&i| i >= WIDTH) {
            warn!(
                "column {} is past the {} columns a selection can hold and aliases column {}",
                index,
                WIDTH,
                index % WIDTH
            );
        }

        Ok(ColumnSelection::build(indices, invert))
    }

    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Tells if the field at `index` is kept
    pub fn retains(&self, index: usize) -> bool {
        (self.mask >> (index % WIDTH)) & 1 == 1
    }

    /// Drops the fields this selection doesn't retain, compacting the row in
    /// place. The order of the surviving fields is preserved.
    pub fn project(&self, row: &mut Row) {
        let mut index = 0;

        row.retain(|_| {
            let keep = self.retains(index);
            index += 1;
            keep
        });
    }
}
