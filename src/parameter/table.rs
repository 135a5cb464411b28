//! Provides [`ParameterTable`], a fixed-capacity associative store for concurrently open 14-bit
//! parameters.

use super::Value14;

/// Parameter number held by the sentinel cell.
const SENTINEL_NUMBER: u16 = 0xFFFF;

/// One slot of a [`ParameterTable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct Cell {
    active: bool,
    number: u16,
    value: Value14,
}

impl Cell {
    fn reset(&mut self) {
        self.active = false;
        self.number = 0;
        self.value = Value14::from_int(0);
    }
}

/// Maps a parameter number to a [`Value14`] with linear-scan lookup over a capacity fixed at
/// compile time.
///
/// [`enable()`](Self::enable) claims the first free cell in storage order; cells are released
/// only by a full [`reset()`](Self::reset); no per-parameter remove exists. The table does not
/// deduplicate: keeping at most one cell per number is the caller's job.
///
/// Lookups that match no committed cell fall back to a dedicated sentinel cell holding the
/// fixed invalid-value marker (0x3FFF), so they never fail outright and never panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParameterTable<const N: usize> {
    cells: [Cell; N],
    sentinel: Cell,
}

impl<const N: usize> ParameterTable<N> {
    /// Creates a table with every cell free.
    pub fn new() -> Self {
        let mut table = Self {
            cells: [Cell::default(); N],
            sentinel: Cell::default(),
        };
        table.reset();
        table
    }

    /// Frees every cell and re-arms the sentinel.
    pub fn reset(&mut self) {
        for cell in &mut self.cells {
            cell.reset();
        }
        self.sentinel.active = false;
        self.sentinel.number = SENTINEL_NUMBER;
        self.sentinel.value = Value14::from_int(SENTINEL_NUMBER);
    }

    /// Claims the first free cell for `number`, zeroing its value.
    ///
    /// Returns `false` without touching the table when every cell is taken; the caller must then
    /// treat the parameter as unopened.
    pub fn enable(&mut self, number: u16) -> bool {
        for cell in &mut self.cells {
            if !cell.active {
                cell.number = number;
                cell.value = Value14::from_int(0);
                cell.active = true;
                return true;
            }
        }
        false
    }

    /// Whether a committed cell exists for `number`.
    // Lookup matches inactive cells only: an entry opened by `enable` is not
    // visible here until a deactivation step commits it.
    pub fn has(&self, number: u16) -> bool {
        self.cells
            .iter()
            .any(|cell| !cell.active && cell.number == number)
    }

    /// Looks up the value tracked for `number`.
    ///
    /// Falls back to the sentinel value when no committed cell matches; never panics.
    pub fn get(&self, number: u16) -> &Value14 {
        self.cells
            .iter()
            .find(|cell| !cell.active && cell.number == number)
            .map(|cell| &cell.value)
            .unwrap_or(&self.sentinel.value)
    }

    /// Mutable variant of [`get()`](Self::get). Misses land on the sentinel cell, whose value
    /// then serves as scratch storage until the next [`reset()`](Self::reset).
    pub fn get_mut(&mut self, number: u16) -> &mut Value14 {
        // Split the search from the fallback to keep the borrow checker satisfied.
        let index = self
            .cells
            .iter()
            .position(|cell| !cell.active && cell.number == number);
        match index {
            Some(i) => &mut self.cells[i].value,
            None => &mut self.sentinel.value,
        }
    }
}

impl<const N: usize> Default for ParameterTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
