/*! Replacement of matches with templates.

Templates are byte strings where `$k` stands for the bytes matched by group
`k`, `$0` being the whole match. All the digits that follow the `$` form
the group index, so `$12` is group 12, not group 1 followed by a `2`. `$$`
stands for a single `$`, and a `$` followed by anything else is copied
as is.
*/

use bstr::BString;
use thiserror::Error;

use crate::machine::{Machine, Match};
use crate::Error;

/// Error returned when a template references a group that doesn't exist
/// in the regexp.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "template references group ${group}, but the regexp has {captures} \
     capture groups"
)]
pub struct TemplateError {
    /// The group referenced by the template.
    pub group: usize,
    /// Number of capture groups in the regexp, not counting group 0.
    pub captures: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum Piece<'t> {
    Literal(&'t [u8]),
    Group(usize),
}

/// A parsed template.
#[derive(Debug)]
struct Template<'t> {
    pieces: Vec<Piece<'t>>,
}

impl<'t> Template<'t> {
    /// Parses the template, making sure that every group it references is
    /// lower or equal than `captures`.
    fn parse(
        template: &'t [u8],
        captures: usize,
    ) -> Result<Self, TemplateError> {
        let mut pieces = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;

        while i < template.len() {
            if template[i] != b'$' {
                i += 1;
                continue;
            }
            match template.get(i + 1) {
                // `$$` is a literal `$`. The literal piece includes the
                // first `$` and the second one is skipped.
                Some(b'$') => {
                    let literal = &template[literal_start..=i];
                    pieces.push(Piece::Literal(literal));
                    i += 2;
                    literal_start = i;
                }
                Some(byte) if byte.is_ascii_digit() => {
                    if literal_start < i {
                        let literal = &template[literal_start..i];
                        pieces.push(Piece::Literal(literal));
                    }
                    let mut j = i + 1;
                    let mut group: usize = 0;
                    while let Some(digit) =
                        template.get(j).filter(|b| b.is_ascii_digit())
                    {
                        group = group
                            .saturating_mul(10)
                            .saturating_add((digit - b'0') as usize);
                        j += 1;
                    }
                    if group > captures {
                        return Err(TemplateError { group, captures });
                    }
                    pieces.push(Piece::Group(group));
                    i = j;
                    literal_start = j;
                }
                _ => i += 1,
            }
        }

        if literal_start < template.len() {
            pieces.push(Piece::Literal(&template[literal_start..]));
        }

        Ok(Self { pieces })
    }

    /// Appends the expansion of the template for match `m` to `output`.
    fn expand(&self, subject: &[u8], m: &Match, output: &mut BString) {
        for piece in &self.pieces {
            match piece {
                Piece::Literal(bytes) => output.extend_from_slice(bytes),
                Piece::Group(index) => {
                    if let Some(bytes) = m.group_bytes(subject, *index) {
                        output.extend_from_slice(bytes)
                    }
                }
            }
        }
    }
}

impl Machine {
    /// Replaces matches in `subject` with the expansion of `template`.
    ///
    /// With `global = true` every non-overlapping match is replaced,
    /// otherwise only the first one. The bytes outside the matches are
    /// copied unchanged. Groups that didn't participate in a match expand
    /// to the empty string.
    ///
    /// The template is checked before searching: if it references a group
    /// that doesn't exist the result is [`Error::Template`], even if the
    /// subject doesn't match.
    ///
    /// ```rust
    /// # use retrack::Machine;
    /// let machine = Machine::new(r"(\w+)=(\w+)").unwrap();
    ///
    /// assert_eq!(
    ///     machine.replace("a=1, b=2", "$2=$1", true).unwrap(),
    ///     "1=a, 2=b"
    /// );
    /// ```
    pub fn replace<S, T>(
        &self,
        subject: &S,
        template: &T,
        global: bool,
    ) -> Result<BString, Error>
    where
        S: AsRef<[u8]> + ?Sized,
        T: AsRef<[u8]> + ?Sized,
    {
        let subject = subject.as_ref();
        let template =
            Template::parse(template.as_ref(), self.capture_count())?;

        let mut output = BString::from(Vec::with_capacity(subject.len()));
        let mut copied = 0;

        for m in self.find_iter(subject) {
            let m = m?;
            output.extend_from_slice(&subject[copied..m.begin()]);
            template.expand(subject, &m, &mut output);
            copied = m.end();
            if !global {
                break;
            }
        }

        output.extend_from_slice(&subject[copied..]);

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Piece, Template, TemplateError};

    #[test]
    fn parse_template() {
        assert_eq!(
            Template::parse(b"x$1y$$z$", 1).unwrap().pieces,
            vec![
                Piece::Literal(b"x"),
                Piece::Group(1),
                Piece::Literal(b"y$"),
                Piece::Literal(b"z$"),
            ]
        );

        assert_eq!(
            Template::parse(b"$0$12", 12).unwrap().pieces,
            vec![Piece::Group(0), Piece::Group(12)]
        );

        assert_eq!(
            Template::parse(b"$a $", 0).unwrap().pieces,
            vec![Piece::Literal(b"$a $")]
        );

        assert!(Template::parse(b"", 0).unwrap().pieces.is_empty());
    }

    #[test]
    fn invalid_group() {
        assert_eq!(
            Template::parse(b"$2", 1).unwrap_err(),
            TemplateError { group: 2, captures: 1 }
        );
        assert_eq!(
            Template::parse(b"$99999999999999999999999", 3).unwrap_err(),
            TemplateError { group: usize::MAX, captures: 3 }
        );
    }
}
