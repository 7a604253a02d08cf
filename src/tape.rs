//! The memory tape: a fixed ring of byte cells with a single cursor.

/// Number of cells on a default tape.
pub const TAPE_CAPACITY: usize = 32768;

/// Errors raised by tape accessors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TapeError {
    /// The cursor does not index a cell. Motion always wraps, so this only
    /// fires if the tape's own bookkeeping is broken.
    #[error("index is out of range while {op} value (index={index}, capacity={capacity})")]
    OutOfRange {
        index: usize,
        capacity: usize,
        op: &'static str,
    },
}

/// A circular tape of `u8` cells, all zero on creation.
///
/// Cursor motion wraps in both directions, and cell arithmetic wraps modulo 256.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Vec<u8>,
    cursor: usize,
}

impl Tape {
    /// Create a tape of [`TAPE_CAPACITY`] cells.
    pub fn new() -> Self {
        Self::with_capacity(TAPE_CAPACITY)
    }

    /// Create a tape with a custom number of cells (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: vec![0; capacity.max(1)],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor one cell to the right, wrapping to 0 past the end.
    pub fn advance(&mut self) -> usize {
        self.cursor = (self.cursor + 1) % self.capacity();
        self.cursor
    }

    /// Move the cursor one cell to the left, wrapping to the last cell from 0.
    pub fn retreat(&mut self) -> usize {
        let capacity = self.capacity();
        self.cursor = (self.cursor + capacity - 1) % capacity;
        self.cursor
    }

    pub fn increment(&mut self) -> Result<u8, TapeError> {
        let cell = self.cell_mut("incrementing")?;
        *cell = cell.wrapping_add(1);
        Ok(*cell)
    }

    pub fn decrement(&mut self) -> Result<u8, TapeError> {
        let cell = self.cell_mut("decrementing")?;
        *cell = cell.wrapping_sub(1);
        Ok(*cell)
    }

    /// Value of the cell under the cursor.
    pub fn read(&self) -> Result<u8, TapeError> {
        self.cells
            .get(self.cursor)
            .copied()
            .ok_or_else(|| self.out_of_range("getting"))
    }

    /// Overwrite the cell under the cursor and return the stored value.
    pub fn write(&mut self, value: u8) -> Result<u8, TapeError> {
        let cell = self.cell_mut("setting")?;
        *cell = value;
        Ok(value)
    }

    fn cell_mut(&mut self, op: &'static str) -> Result<&mut u8, TapeError> {
        let err = self.out_of_range(op);
        self.cells.get_mut(self.cursor).ok_or(err)
    }

    fn out_of_range(&self, op: &'static str) -> TapeError {
        TapeError::OutOfRange {
            index: self.cursor,
            capacity: self.cells.len(),
            op,
        }
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tape_is_zeroed_at_origin() {
        let tape = Tape::new();
        assert_eq!(tape.capacity(), TAPE_CAPACITY);
        assert_eq!(tape.cursor(), 0);
        assert_eq!(tape.read(), Ok(0));
    }

    #[test]
    fn zero_capacity_is_clamped_to_one_cell() {
        let mut tape = Tape::with_capacity(0);
        assert_eq!(tape.capacity(), 1);
        assert_eq!(tape.advance(), 0);
        assert_eq!(tape.retreat(), 0);
    }

    #[test]
    fn full_lap_of_advances_returns_to_origin() {
        let mut tape = Tape::new();
        for _ in 0..TAPE_CAPACITY - 1 {
            tape.advance();
        }
        assert_eq!(tape.cursor(), TAPE_CAPACITY - 1);
        assert_eq!(tape.advance(), 0);
    }

    #[test]
    fn retreat_from_origin_wraps_to_last_cell() {
        let mut tape = Tape::with_capacity(8);
        assert_eq!(tape.retreat(), 7);
        assert_eq!(tape.advance(), 0);
    }

    #[test]
    fn mixed_motion_stays_in_range() {
        let mut tape = Tape::with_capacity(5);
        let moves = [true, false, false, false, true, false, false, false, false, false, true];
        for forward in moves {
            let index = if forward { tape.advance() } else { tape.retreat() };
            assert!(index < tape.capacity());
        }
        // 3 forward, 8 back: net -5 on a ring of 5
        assert_eq!(tape.cursor(), 0);
    }

    #[test]
    fn increment_wraps_after_255() {
        let mut tape = Tape::new();
        for expected in 1..=255u8 {
            assert_eq!(tape.increment(), Ok(expected));
        }
        assert_eq!(tape.increment(), Ok(0));
    }

    #[test]
    fn decrement_wraps_below_zero() {
        let mut tape = Tape::new();
        assert_eq!(tape.decrement(), Ok(255));
        assert_eq!(tape.decrement(), Ok(254));
    }

    #[test]
    fn cells_are_independent() {
        let mut tape = Tape::with_capacity(4);
        tape.write(42).unwrap();
        tape.advance();
        assert_eq!(tape.read(), Ok(0));
        tape.retreat();
        assert_eq!(tape.read(), Ok(42));
    }

    #[test]
    fn accessors_guard_a_corrupted_cursor() {
        let mut tape = Tape::with_capacity(4);
        tape.cursor = 4;

        assert!(matches!(tape.read(), Err(TapeError::OutOfRange { index: 4, capacity: 4, op: "getting" })));
        assert!(matches!(tape.write(1), Err(TapeError::OutOfRange { op: "setting", .. })));
        assert!(matches!(tape.increment(), Err(TapeError::OutOfRange { op: "incrementing", .. })));
        assert!(matches!(tape.decrement(), Err(TapeError::OutOfRange { op: "decrementing", .. })));
    }
}
