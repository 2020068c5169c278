/*!
This module provides a compiler that takes a regexp's syntax tree and
produces a [`Program`] for the backtracking VM.

The compiler performs a depth-first traversal of the tree, emitting the code
for each node right after the code of the nodes that precede it. Jumps and
splits that point forward are emitted with placeholder targets, and patched
once the destination is known.

Loops whose body can match the empty string get an `ITER_START` at the
start of the body and an `ITER_END` at its end. If an iteration ends at the
offset where it started, `ITER_END` leaves the loop. Any other loop always
consumes some input before going back to its split.
*/

use std::collections::HashMap;

use crate::re::ast::{Node, Regexp};
use crate::re::backtrack::instr::{
    Instr, InstrLoc, LoopId, Program, SplitId,
};
use crate::re::DEFAULT_MAX_PROGRAM_SIZE;
use crate::Error;

/// Compiles a regular expression into a [`Program`].
///
/// The produced program always starts with `SAVE 0`, which records the
/// offset where the match starts, and ends with `SAVE 1` followed by
/// `MATCH`.
pub struct Compiler {
    /// The code emitted so far.
    code: Vec<Instr>,
    /// The ID that will identify the next split instruction.
    split_id: SplitId,
    /// The ID that will identify the next loop with an empty-matching
    /// body.
    loop_id: LoopId,
    /// Loops with empty-matching bodies that enclose the code being
    /// emitted, the innermost one last.
    loops: Vec<LoopId>,
    /// Innermost enclosing loop of each split emitted so far.
    split_scopes: Vec<Option<LoopId>>,
    /// Enclosing loop of each loop emitted so far.
    loop_parents: Vec<Option<LoopId>>,
    /// Maximum number of instructions in the program.
    max_size: usize,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Creates a new regexp compiler.
    pub fn new() -> Self {
        Self {
            code: Vec::new(),
            split_id: SplitId::default(),
            loop_id: LoopId::default(),
            loops: Vec::new(),
            split_scopes: Vec::new(),
            loop_parents: Vec::new(),
            max_size: DEFAULT_MAX_PROGRAM_SIZE,
        }
    }

    /// Sets the maximum number of instructions in the produced program.
    /// Compiling a regexp that needs more fails with [`Error::TooLarge`].
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Produces the code for the given regexp.
    pub fn compile(mut self, re: &Regexp) -> Result<Program, Error> {
        self.emit(Instr::Save(0))?;
        self.emit_node(re.root())?;
        self.emit(Instr::Save(1))?;
        self.emit(Instr::Match)?;

        Ok(Program::new(
            self.code,
            re.captures(),
            self.split_scopes,
            self.loop_parents,
        ))
    }
}

impl Compiler {
    /// Returns the location where the next instruction will be put.
    #[inline]
    fn location(&self) -> InstrLoc {
        self.code.len()
    }

    /// Adds some instruction at the end of the code and returns the
    /// location where the newly added instruction resides.
    fn emit(&mut self, instr: Instr) -> Result<InstrLoc, Error> {
        if self.code.len() >= self.max_size {
            return Err(Error::TooLarge { limit: self.max_size });
        }
        let location = self.location();
        self.code.push(instr);
        Ok(location)
    }

    /// Allocates an ID for a split enclosed by the loop `scope`.
    fn new_split_id(&mut self, scope: Option<LoopId>) -> SplitId {
        let id = self.split_id;
        self.split_id = SplitId(id.0 + 1);
        self.split_scopes.push(scope);
        id
    }

    /// Allocates an ID for a loop enclosed by the loop `parent`.
    fn new_loop_id(&mut self, parent: Option<LoopId>) -> LoopId {
        let id = self.loop_id;
        self.loop_id = LoopId(id.0 + 1);
        self.loop_parents.push(parent);
        id
    }

    /// Adds a split instruction with a fresh ID. Both targets must be set
    /// later with [`Compiler::patch_split`].
    fn emit_split(&mut self) -> Result<InstrLoc, Error> {
        let id = self.new_split_id(self.loops.last().copied());
        self.emit(Instr::Split { id, first: 0, second: 0 })
    }

    /// Sets the targets of the split at `location`. When `greedy` is true
    /// `prefer` is tried first and `other` is the fallback, otherwise the
    /// order is reversed.
    fn patch_split(
        &mut self,
        location: InstrLoc,
        prefer: InstrLoc,
        other: InstrLoc,
        greedy: bool,
    ) {
        match &mut self.code[location] {
            Instr::Split { first, second, .. } => {
                (*first, *second) =
                    if greedy { (prefer, other) } else { (other, prefer) };
            }
            instr => unreachable!("expecting split, found {:?}", instr),
        }
    }

    fn patch_jump(&mut self, location: InstrLoc, target: InstrLoc) {
        match &mut self.code[location] {
            Instr::Jump(dst) => *dst = target,
            instr => unreachable!("expecting jump, found {:?}", instr),
        }
    }

    /// Sets the exit of the `ITER_END` at `location`, if any.
    fn patch_iteration(
        &mut self,
        location: Option<InstrLoc>,
        exit: InstrLoc,
    ) {
        let Some(location) = location else { return };
        match &mut self.code[location] {
            Instr::IterEnd { exit: dst, .. } => *dst = exit,
            instr => unreachable!("expecting iter end, found {:?}", instr),
        }
    }

    fn emit_node(&mut self, node: &Node) -> Result<(), Error> {
        match node {
            Node::Literal(byte) => {
                self.emit(Instr::Char(*byte))?;
            }
            Node::AnyByte => {
                self.emit(Instr::AnyByte)?;
            }
            Node::Class(class) => {
                self.emit(Instr::Class(*class))?;
            }
            Node::Start => {
                self.emit(Instr::Start)?;
            }
            Node::End => {
                self.emit(Instr::End)?;
            }
            Node::Concat(nodes) => {
                for node in nodes {
                    self.emit_node(node)?;
                }
            }
            Node::Alternate(nodes) => self.emit_alternation(nodes)?,
            Node::Star { node, greedy } => self.emit_star(node, *greedy)?,
            Node::Plus { node, greedy } => self.emit_plus(node, *greedy)?,
            Node::Optional { node, greedy } => {
                self.emit_optional(node, *greedy)?
            }
            Node::Repeat { node, min, max, greedy } => {
                self.emit_repeat(node, *min, *max, *greedy)?
            }
            Node::Group { node, index: Some(index) } => {
                let index = *index as usize;
                self.emit(Instr::Save(2 * index))?;
                self.emit_node(node)?;
                self.emit(Instr::Save(2 * index + 1))?;
            }
            Node::Group { node, index: None } => self.emit_node(node)?,
        }
        Ok(())
    }

    // e1|e2|...|en
    //
    //     split l1, l2
    // l1: ... code for e1 ...
    //     jump end
    // l2: split l3, l4
    // l3: ... code for e2 ...
    //     jump end
    // l4: ... code for en ...
    // end:
    fn emit_alternation(&mut self, nodes: &[Node]) -> Result<(), Error> {
        let (last, rest) = match nodes.split_last() {
            Some(split) => split,
            None => return Ok(()),
        };

        let mut jumps = Vec::with_capacity(rest.len());

        for node in rest {
            let split = self.emit_split()?;
            self.emit_node(node)?;
            jumps.push(self.emit(Instr::Jump(0))?);
            let next = self.location();
            self.patch_split(split, split + 1, next, true);
        }

        self.emit_node(last)?;

        let end = self.location();
        for jump in jumps {
            self.patch_jump(jump, end);
        }

        Ok(())
    }

    /// Emits the body of a loop. If the body can match the empty string it
    /// is wrapped in `ITER_START` and `ITER_END`, and the location of the
    /// latter is returned so that its exit can be patched.
    //
    //     iter_start k
    //     ... code for e ...
    //     iter_end k, exit
    fn emit_iteration(
        &mut self,
        node: &Node,
    ) -> Result<Option<InstrLoc>, Error> {
        if !node.can_match_empty() {
            self.emit_node(node)?;
            return Ok(None);
        }

        let id = self.new_loop_id(self.loops.last().copied());

        self.emit(Instr::IterStart(id))?;
        self.loops.push(id);
        self.emit_node(node)?;
        self.loops.pop();

        self.emit(Instr::IterEnd { id, exit: 0 }).map(Some)
    }

    // e* and e*?
    //
    // l1: split l2, l3  ( split l3, l2 for the non-greedy e*? )
    // l2: ... code for e ...
    //     jump l1
    // l3:
    fn emit_star(&mut self, node: &Node, greedy: bool) -> Result<(), Error> {
        let l1 = self.emit_split()?;
        let iteration = self.emit_iteration(node)?;
        self.emit(Instr::Jump(l1))?;
        let l3 = self.location();
        self.patch_iteration(iteration, l3);
        self.patch_split(l1, l1 + 1, l3, greedy);
        Ok(())
    }

    // e+ and e+?
    //
    // l1: ... code for e ...
    //     split l1, l2  ( split l2, l1 for the non-greedy e+? )
    // l2:
    fn emit_plus(&mut self, node: &Node, greedy: bool) -> Result<(), Error> {
        let l1 = self.location();
        let iteration = self.emit_iteration(node)?;
        let split = self.emit_split()?;
        let l2 = self.location();
        self.patch_iteration(iteration, l2);
        self.patch_split(split, l1, l2, greedy);
        Ok(())
    }

    // e? and e??
    //
    //     split l1, l2  ( split l2, l1 for the non-greedy e?? )
    // l1: ... code for e ...
    // l2:
    fn emit_optional(
        &mut self,
        node: &Node,
        greedy: bool,
    ) -> Result<(), Error> {
        let split = self.emit_split()?;
        self.emit_node(node)?;
        let l2 = self.location();
        self.patch_split(split, split + 1, l2, greedy);
        Ok(())
    }

    // e{min,max}
    //
    //     ... code for e ... -+
    //     ... code for e ...  |  min times
    //     ... code for e ... -+
    //     split end          -+
    //     ... code for e ...  |  max-min times
    //     split end           |
    //     ... code for e ... -+
    // end:
    //
    // e{min,}
    //
    //     ... code for e repeated min - 1 times
    //     ... code for e+ ...
    //
    // The code for `e` is emitted once, the remaining copies are clones
    // of that first copy.
    fn emit_repeat(
        &mut self,
        node: &Node,
        min: u32,
        max: Option<u32>,
        greedy: bool,
    ) -> Result<(), Error> {
        let max = match (min, max) {
            (0, None) => return self.emit_star(node, greedy),
            (0, Some(0)) => return Ok(()),
            (1, None) => return self.emit_plus(node, greedy),
            (_, None) => {
                let start = self.location();
                self.emit_node(node)?;
                let end = self.location();
                for _ in 2..min {
                    self.emit_clone(start, end)?;
                }
                return self.emit_plus(node, greedy);
            }
            (_, Some(max)) => max,
        };

        // Location of the split preceding the first copy of `e` when the
        // first copy is optional, as in `e{0,n}`.
        let leading_split =
            if min == 0 { Some(self.emit_split()?) } else { None };

        // `start` and `end` are the locations where the first copy of `e`
        // starts and ends.
        let start = self.location();
        self.emit_node(node)?;
        let end = self.location();

        for _ in 1..min {
            self.emit_clone(start, end)?;
        }

        let mut splits: Vec<InstrLoc> = leading_split.into_iter().collect();

        // When `min` is zero the first copy is already optional and counts
        // as one of the `max - min` optional copies.
        for _ in min.max(1)..max {
            splits.push(self.emit_split()?);
            self.emit_clone(start, end)?;
        }

        let end = self.location();
        for split in splits {
            self.patch_split(split, split + 1, end, greedy);
        }

        Ok(())
    }

    /// Clones the code between `start` and `end` (not including `end`)
    /// and puts it at the end of the code. Returns the location where the
    /// cloned code starts.
    ///
    /// The cloned code is relocated, targets of jumps and splits are
    /// adjusted to point within the new copy, and each cloned split and
    /// loop gets a new ID. The code being cloned must be self-contained:
    /// jumps and splits can only point to locations in the `start..=end`
    /// range.
    fn emit_clone(
        &mut self,
        start: InstrLoc,
        end: InstrLoc,
    ) -> Result<InstrLoc, Error> {
        let location = self.location();

        let relocate = |target: InstrLoc| {
            debug_assert!((start..=end).contains(&target));
            target - start + location
        };

        // IDs of the loops in the original code, mapped to the IDs of
        // their copies. A loop's `ITER_START` comes before any instruction
        // that refers to the loop.
        let mut loops: HashMap<LoopId, LoopId> = HashMap::new();
        let renamed = |loops: &HashMap<LoopId, LoopId>, id: LoopId| {
            loops.get(&id).copied().unwrap_or(id)
        };

        for i in start..end {
            let instr = match self.code[i].clone() {
                Instr::Jump(target) => Instr::Jump(relocate(target)),
                Instr::Split { id, first, second } => {
                    let scope = self.split_scopes[usize::from(id)]
                        .map(|scope| renamed(&loops, scope));
                    Instr::Split {
                        id: self.new_split_id(scope),
                        first: relocate(first),
                        second: relocate(second),
                    }
                }
                Instr::IterStart(id) => {
                    let parent = self.loop_parents[usize::from(id)]
                        .map(|parent| renamed(&loops, parent));
                    let copy = self.new_loop_id(parent);
                    loops.insert(id, copy);
                    Instr::IterStart(copy)
                }
                Instr::IterEnd { id, exit } => Instr::IterEnd {
                    id: renamed(&loops, id),
                    exit: relocate(exit),
                },
                instr => instr,
            };
            self.emit(instr)?;
        }

        Ok(location)
    }
}

