use bitvec::vec::BitVec;
use log::debug;

use crate::re::backtrack::instr::{Instr, InstrLoc, LoopId, Program, SplitId};
use crate::re::DEFAULT_MAX_VISITED_BITS;
use crate::Error;

/// Entries in the backtrack stack.
#[derive(Debug)]
enum Frame {
    /// Resume execution at instruction `ip` with subject offset `pos`. It
    /// is pushed by split instructions for their second alternative.
    Step { ip: InstrLoc, pos: usize },
    /// Restore a capture slot to the value it had before a save
    /// instruction overwrote it. Popping this frame undoes the save when
    /// the path that executed it is abandoned.
    RestoreSlot { slot: usize, offset: Option<usize> },
    /// Same as `RestoreSlot`, but for the offset where the current
    /// iteration of a loop started.
    RestoreIterStart { id: LoopId, offset: usize },
}

/// A backtracking VM that executes a [`Program`] produced by the
/// [compiler][`crate::re::backtrack::Compiler`] against a subject.
///
/// Alternatives are explored depth-first: a split instruction continues at
/// its first target and pushes the second one onto an explicit backtrack
/// stack. When a path fails the VM pops the stack and resumes from there,
/// which gives leftmost-first semantics. Capture slots are restored on
/// backtracking by means of an undo log kept in the same stack.
///
/// Loops whose body can match the empty string record the offset where
/// each iteration starts. An iteration that ends at that same offset leaves
/// the loop, so every path either consumes input before returning to a
/// split or moves forward in the program, and the VM always terminates.
///
/// The VM also remembers the states reached by split instructions. A state
/// is the split, the subject offset, and how many of the loops enclosing
/// the split are in an iteration that hasn't consumed input yet, which is
/// everything that decides whether the rest of the path can match. The
/// first time a state is reached it is explored completely, so reaching it
/// again means that it already failed, and the path is abandoned. This
/// bounds the work done for a subject by the number of states, although
/// each match found resets the states of the offsets it covered.
///
/// A VM is bound to a single subject. Failures recorded in the visited set
/// don't depend on the offset where the match started, so the set is kept
/// between calls to [`BacktrackVM::try_match_at`], which makes retrying at
/// successive offsets cheap. If the set would exceed its size limit, the
/// VM works without it.
pub(crate) struct BacktrackVM<'r, 's> {
    /// The code for the VM.
    program: &'r Program,
    /// The data being matched.
    subject: &'s [u8],
    /// The backtrack stack.
    stack: Vec<Frame>,
    /// Capture slots for the current attempt.
    slots: Vec<Option<usize>>,
    /// Offset where the current iteration of each loop started.
    iter_starts: Vec<usize>,
    /// One row of bits per subject offset, with one bit per split state.
    /// Allocated on first use.
    visited: BitVec,
    /// Maximum number of bits in `visited`.
    max_visited_bits: usize,
    /// False if the visited set is not used.
    memoize: bool,
    /// Farthest subject offset reached during the current attempt.
    max_pos: usize,
    /// Maximum number of instructions executed before aborting.
    step_limit: Option<u64>,
    /// Number of instructions executed since the last call to
    /// [`BacktrackVM::reset_steps`].
    steps: u64,
}

impl<'r, 's> BacktrackVM<'r, 's> {
    /// Creates a new [`BacktrackVM`] for executing `program` on `subject`.
    pub fn new(program: &'r Program, subject: &'s [u8]) -> Self {
        Self {
            program,
            subject,
            stack: Vec::new(),
            slots: vec![None; program.num_slots()],
            iter_starts: vec![0; program.loops() as usize],
            visited: BitVec::new(),
            max_visited_bits: DEFAULT_MAX_VISITED_BITS,
            memoize: true,
            max_pos: 0,
            step_limit: None,
            steps: 0,
        }
    }

    /// Specifies the maximum number of instructions that will be executed
    /// by the VM before aborting with [`Error::StepLimitExceeded`].
    ///
    /// By default there's no limit.
    pub fn step_limit(mut self, limit: Option<u64>) -> Self {
        self.step_limit = limit;
        self
    }

    /// Specifies the maximum size in bits of the set of visited states.
    pub fn max_visited_bits(mut self, max: usize) -> Self {
        self.max_visited_bits = max;
        self
    }

    /// Resets the counter of executed instructions.
    pub fn reset_steps(&mut self) {
        self.steps = 0;
    }

    /// Tries to match the program with the match starting exactly at
    /// `start`. On success returns the capture slots, where slots 0 and 1
    /// contain the start and end of the whole match. Slots for groups that
    /// didn't participate in the match are `None`.
    ///
    /// # Panics
    ///
    /// If `start` is greater than the length of the subject, or if the
    /// program jumps outside its own code.
    pub fn try_match_at(
        &mut self,
        start: usize,
    ) -> Result<Option<Vec<Option<usize>>>, Error> {
        assert!(start <= self.subject.len());

        self.slots.fill(None);
        self.stack.clear();
        self.max_pos = start;
        self.stack.push(Frame::Step { ip: 0, pos: start });

        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::RestoreSlot { slot, offset } => {
                    self.slots[slot] = offset;
                }
                Frame::RestoreIterStart { id, offset } => {
                    self.iter_starts[usize::from(id)] = offset;
                }
                Frame::Step { ip, pos } => {
                    if self.run(ip, pos)? {
                        self.forget_attempt(start);
                        return Ok(Some(self.slots.clone()));
                    }
                }
            }
        }

        Ok(None)
    }

    /// Executes instructions starting at `ip` with subject offset `pos`,
    /// until reaching a `MATCH` instruction (returns true) or some
    /// instruction that fails (returns false).
    fn run(
        &mut self,
        mut ip: InstrLoc,
        mut pos: usize,
    ) -> Result<bool, Error> {
        let program = self.program;
        let subject = self.subject;

        loop {
            self.tick()?;

            match &program.instrs[ip] {
                Instr::Match => return Ok(true),
                Instr::Char(byte) => match subject.get(pos) {
                    Some(b) if b == byte => {
                        ip += 1;
                        pos += 1;
                    }
                    _ => return Ok(false),
                },
                Instr::AnyByte => {
                    if pos >= subject.len() {
                        return Ok(false);
                    }
                    ip += 1;
                    pos += 1;
                }
                Instr::Class(class) => match subject.get(pos) {
                    Some(b) if class.contains(*b) => {
                        ip += 1;
                        pos += 1;
                    }
                    _ => return Ok(false),
                },
                Instr::Split { id, first, second } => {
                    if !self.visit(*id, pos) {
                        return Ok(false);
                    }
                    self.stack.push(Frame::Step { ip: *second, pos });
                    ip = *first;
                }
                Instr::Jump(target) => {
                    ip = *target;
                }
                Instr::Save(slot) => {
                    self.stack.push(Frame::RestoreSlot {
                        slot: *slot,
                        offset: self.slots[*slot],
                    });
                    self.slots[*slot] = Some(pos);
                    ip += 1;
                }
                Instr::Start => {
                    if pos != 0 {
                        return Ok(false);
                    }
                    ip += 1;
                }
                Instr::End => {
                    if pos != subject.len() {
                        return Ok(false);
                    }
                    ip += 1;
                }
                Instr::IterStart(id) => {
                    let iter_start = &mut self.iter_starts[usize::from(*id)];
                    self.stack.push(Frame::RestoreIterStart {
                        id: *id,
                        offset: *iter_start,
                    });
                    *iter_start = pos;
                    ip += 1;
                }
                Instr::IterEnd { id, exit } => {
                    if self.iter_starts[usize::from(*id)] == pos {
                        ip = *exit;
                    } else {
                        ip += 1;
                    }
                }
            }

            if pos > self.max_pos {
                self.max_pos = pos;
            }
        }
    }

    #[inline]
    fn tick(&mut self) -> Result<(), Error> {
        self.steps += 1;
        match self.step_limit {
            Some(limit) if self.steps > limit => {
                debug!("step limit of {} exhausted", limit);
                Err(Error::StepLimitExceeded { limit })
            }
            _ => Ok(()),
        }
    }

    /// Marks the state reached by split `id` at offset `pos` as visited.
    /// Returns false if it was already visited.
    #[inline]
    fn visit(&mut self, id: SplitId, pos: usize) -> bool {
        if !self.memoize {
            return true;
        }

        let cells = self.program.memo_cells();

        if self.visited.is_empty() {
            match cells.checked_mul(self.subject.len() + 1) {
                Some(bits) if bits <= self.max_visited_bits => {
                    self.visited = BitVec::repeat(false, bits);
                }
                _ => {
                    debug!(
                        "visited set for {} states per offset and {} \
                         bytes exceeds {} bits, not using it",
                        cells,
                        self.subject.len(),
                        self.max_visited_bits
                    );
                    self.memoize = false;
                    return true;
                }
            }
        }

        let cell = self.program.memo_bases[usize::from(id)]
            + self.empty_iterations(id, pos);

        !self.visited.replace(pos * cells + cell, true)
    }

    /// Counts the loops enclosing split `id` whose current iteration
    /// started at `pos`. An inner loop's iteration starts after the one
    /// of the loop that encloses it, so the count stops at the first loop
    /// whose iteration started earlier.
    fn empty_iterations(&self, id: SplitId, pos: usize) -> usize {
        let mut count = 0;
        let mut scope = self.program.split_scopes[usize::from(id)];
        while let Some(loop_id) = scope {
            if self.iter_starts[usize::from(loop_id)] != pos {
                break;
            }
            count += 1;
            scope = self.program.loop_parents[usize::from(loop_id)];
        }
        count
    }

    /// Clears the states that could have been visited by a successful
    /// attempt that started at `start`. States visited along the path that
    /// led to the match didn't fail, so they can't be reused by later
    /// attempts.
    fn forget_attempt(&mut self, start: usize) {
        if self.visited.is_empty() {
            return;
        }
        let cells = self.program.memo_cells();
        self.visited[start * cells..(self.max_pos + 1) * cells].fill(false);
    }
}
