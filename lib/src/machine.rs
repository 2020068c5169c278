use std::iter::FusedIterator;
use std::ops::Range;

use log::{debug, trace};

use crate::config::Config;
use crate::re::backtrack::{BacktrackVM, Compiler, Program};
use crate::re::parser::Parser;
use crate::Error;

/// A match found in a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Range within the subject where the match was found.
    pub range: Range<usize>,
    /// Ranges matched by capture groups `1..=n`, in order. The range for
    /// a group that didn't participate in the match is `None`.
    pub groups: Vec<Option<Range<usize>>>,
}

impl Match {
    /// Builds a match from the capture slots returned by the VM.
    fn from_slots(slots: &[Option<usize>]) -> Self {
        let range = match (slots[0], slots[1]) {
            (Some(begin), Some(end)) => begin..end,
            _ => unreachable!("match without start or end offsets"),
        };

        let groups = slots
            .chunks_exact(2)
            .skip(1)
            .map(|pair| match (pair[0], pair[1]) {
                (Some(begin), Some(end)) => Some(begin..end),
                _ => None,
            })
            .collect();

        Self { range, groups }
    }

    /// Offset where the match starts.
    #[inline]
    pub fn begin(&self) -> usize {
        self.range.start
    }

    /// Offset where the match ends (exclusive).
    #[inline]
    pub fn end(&self) -> usize {
        self.range.end
    }

    /// Returns true if the match is the empty string.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Returns the range matched by the given group. Group 0 is the whole
    /// match. Returns `None` if the group didn't participate in the match
    /// or doesn't exist.
    pub fn group(&self, index: usize) -> Option<Range<usize>> {
        match index {
            0 => Some(self.range.clone()),
            _ => self.groups.get(index - 1).cloned().flatten(),
        }
    }

    /// Returns the bytes of `subject` covered by the match. `subject` must
    /// be the same subject where the match was found.
    pub fn as_bytes<'s>(&self, subject: &'s [u8]) -> &'s [u8] {
        &subject[self.range.clone()]
    }

    /// Like [`Match::as_bytes`], but for the given group.
    pub fn group_bytes<'s>(
        &self,
        subject: &'s [u8],
        index: usize,
    ) -> Option<&'s [u8]> {
        self.group(index).map(|range| &subject[range])
    }
}

/// State kept between successive calls to [`Machine::search`].
///
/// It holds the last match found, and whether the subject has no more
/// matches. The same [`MatchResult`] must be used with the same subject
/// until the search is exhausted, or until [`MatchResult::reset`] is
/// called.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MatchResult {
    current: Option<Match>,
    exhausted: bool,
}

impl MatchResult {
    /// Creates a new [`MatchResult`] that doesn't hold any match.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last match found by [`Machine::search`], if any.
    pub fn get(&self) -> Option<&Match> {
        self.current.as_ref()
    }

    /// Offset where the last match starts.
    pub fn begin(&self) -> Option<usize> {
        self.current.as_ref().map(Match::begin)
    }

    /// Offset where the last match ends.
    pub fn end(&self) -> Option<usize> {
        self.current.as_ref().map(Match::end)
    }

    /// Forgets the last match, the next search will start from the
    /// beginning of the subject.
    pub fn reset(&mut self) {
        self.current = None;
        self.exhausted = false;
    }
}

/// A compiled regexp, ready for searching subjects.
///
/// The pattern is parsed and compiled once, when the machine is created. A
/// [`Machine`] is immutable afterwards, it can be shared between threads
/// and used for any number of searches. Each search runs in its own VM.
///
/// # Example
///
/// ```rust
/// # use retrack::Machine;
/// let machine = Machine::new(r"(\w+)@example\.com").unwrap();
/// let subject = b"mail alice@example.com or bob@example.com";
///
/// let users: Vec<&[u8]> = machine
///     .find_iter(subject)
///     .map(|m| m.unwrap().group_bytes(subject, 1).unwrap())
///     .collect();
///
/// assert_eq!(users, vec![&b"alice"[..], &b"bob"[..]]);
/// ```
#[derive(Debug, Clone)]
pub struct Machine {
    program: Program,
    config: Config,
}

impl Machine {
    /// Creates a machine for the given pattern, with the default
    /// configuration.
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Self::with_config(pattern, Config::default())
    }

    /// Creates a machine for the given pattern, using the limits in
    /// `config`.
    pub fn with_config(pattern: &str, config: Config) -> Result<Self, Error> {
        let re = Parser::new()
            .max_repetitions(config.max_repetitions)
            .max_nesting(config.max_nesting)
            .parse(pattern)?;

        let program =
            Compiler::new().max_size(config.max_program_size).compile(&re)?;

        debug!(
            "machine for `{}` built: {} instructions, {} capture groups",
            pattern,
            program.len(),
            program.captures()
        );

        Ok(Self { program, config })
    }

    /// Sets the maximum number of instructions that a single search can
    /// execute. When the limit is reached the search fails with
    /// [`Error::StepLimitExceeded`]. `None` removes the limit.
    pub fn step_limit(mut self, limit: Option<u64>) -> Self {
        self.config.step_limit = limit;
        self
    }

    /// The machine's configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of capture groups in the pattern, not counting group 0.
    #[inline]
    pub fn capture_count(&self) -> usize {
        self.program.captures() as usize
    }

    /// The compiled program.
    #[inline]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Returns the leftmost match that starts at `start` or later.
    /// Returns `None` if `start` is past the end of the subject.
    pub fn find_at<S>(
        &self,
        subject: &S,
        start: usize,
    ) -> Result<Option<Match>, Error>
    where
        S: AsRef<[u8]> + ?Sized,
    {
        let mut vm = self.vm(subject.as_ref());
        find_from(&mut vm, subject.as_ref().len(), start)
    }

    /// Returns the leftmost match in the subject.
    pub fn find<S>(&self, subject: &S) -> Result<Option<Match>, Error>
    where
        S: AsRef<[u8]> + ?Sized,
    {
        self.find_at(subject, 0)
    }

    /// Returns true if the regexp matches somewhere in the subject.
    pub fn is_match<S>(&self, subject: &S) -> Result<bool, Error>
    where
        S: AsRef<[u8]> + ?Sized,
    {
        Ok(self.find(subject)?.is_some())
    }

    /// Returns an iterator over the non-overlapping matches in the subject,
    /// from left to right.
    ///
    /// After a match the search resumes at its end, or one byte past its
    /// start if the match was empty, so the same match is never reported
    /// twice. The step limit, if any, applies to each call to `next`. The
    /// iterator ends after yielding an error.
    pub fn find_iter<'r, 's, S>(&'r self, subject: &'s S) -> Matches<'r, 's>
    where
        S: AsRef<[u8]> + ?Sized,
    {
        let subject = subject.as_ref();
        Matches {
            vm: self.vm(subject),
            subject_len: subject.len(),
            next_start: Some(0),
        }
    }

    /// Searches for the next match in the subject and stores it in
    /// `result`. Returns false when there are no more matches.
    ///
    /// With `global = true`, each call continues after the match stored
    /// in `result` by the previous call, which allows enumerating all the
    /// matches with a loop. With `global = false` only the first match of
    /// the subject is reported, a call with a `result` that already holds
    /// a match returns false.
    ///
    /// ```rust
    /// # use retrack::{Machine, MatchResult};
    /// let machine = Machine::new("(a+)b").unwrap();
    /// let mut result = MatchResult::new();
    /// let mut ranges = Vec::new();
    ///
    /// while machine.search("aabcdabe", &mut result, true).unwrap() {
    ///     ranges.push(result.get().unwrap().range.clone());
    /// }
    ///
    /// assert_eq!(ranges, vec![0..3, 5..7]);
    /// ```
    pub fn search<S>(
        &self,
        subject: &S,
        result: &mut MatchResult,
        global: bool,
    ) -> Result<bool, Error>
    where
        S: AsRef<[u8]> + ?Sized,
    {
        if result.exhausted || (!global && result.current.is_some()) {
            return Ok(false);
        }

        let start = match &result.current {
            Some(m) => next_start(m, subject.as_ref().len()),
            None => Some(0),
        };

        let found = match start {
            Some(start) => self.find_at(subject, start)?,
            None => None,
        };

        match found {
            Some(m) => {
                result.current = Some(m);
                Ok(true)
            }
            None => {
                result.current = None;
                result.exhausted = true;
                Ok(false)
            }
        }
    }

    fn vm<'r, 's>(&'r self, subject: &'s [u8]) -> BacktrackVM<'r, 's> {
        BacktrackVM::new(&self.program, subject)
            .step_limit(self.config.step_limit)
            .max_visited_bits(self.config.max_visited_bits)
    }
}

/// Iterator returned by [`Machine::find_iter`].
pub struct Matches<'r, 's> {
    vm: BacktrackVM<'r, 's>,
    subject_len: usize,
    /// Offset where the next search starts, `None` once the iterator is
    /// exhausted.
    next_start: Option<usize>,
}

impl Iterator for Matches<'_, '_> {
    type Item = Result<Match, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start?;

        self.vm.reset_steps();

        match find_from(&mut self.vm, self.subject_len, start) {
            Ok(Some(m)) => {
                self.next_start = next_start(&m, self.subject_len);
                Some(Ok(m))
            }
            Ok(None) => {
                self.next_start = None;
                None
            }
            Err(err) => {
                self.next_start = None;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for Matches<'_, '_> {}

/// Tries the VM at `start`, `start + 1`, and so on, until finding a match
/// or reaching the end of the subject.
fn find_from(
    vm: &mut BacktrackVM<'_, '_>,
    subject_len: usize,
    start: usize,
) -> Result<Option<Match>, Error> {
    for offset in start..=subject_len {
        if let Some(slots) = vm.try_match_at(offset)? {
            let m = Match::from_slots(&slots);
            trace!("match at {:?}", m.range);
            return Ok(Some(m));
        }
    }
    Ok(None)
}

/// Returns the offset where the search that follows `m` must start, or
/// `None` if it would start past the end of the subject.
fn next_start(m: &Match, subject_len: usize) -> Option<usize> {
    let start = m.end().max(m.begin() + 1);
    (start <= subject_len).then_some(start)
}
