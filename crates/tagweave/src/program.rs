/*
 * program.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The compiled form of a document.
//!
//! A [`Program`] holds three views of the same compilation:
//!
//! - `instructions`: the tree the interpreter runs;
//! - `listing`: the generated program as readable statements, one per
//!   emission, each with its indentation depth;
//! - `line_map`: generated line number to document position and the markup
//!   that produced the statement.
//!
//! Generated lines are numbered from 1. A statement whose source contains
//! `n` line breaks occupies `n + 1` lines, and only its first line has an
//! entry in the line map.

use std::collections::BTreeMap;

use tagweave_source_map::SourceInfo;

use crate::fragment::{Expr, Stmt};

/// One node of the executable program. `line` is the first generated line
/// of the statement the node came from; fragment nodes add their own
/// relative line to it.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Print literal text.
    Text { text: String, line: usize },
    /// Print `str(expr)` with no separator.
    Echo { expr: Expr, line: usize },
    /// Run simple statements.
    Exec { body: Vec<Stmt>, line: usize },
    For {
        targets: Vec<String>,
        iter: Expr,
        body: Vec<Instruction>,
        line: usize,
    },
    While {
        cond: Expr,
        body: Vec<Instruction>,
        line: usize,
    },
    /// An `if` with its `elif` branches, then an optional `else` body.
    If {
        branches: Vec<Branch>,
        otherwise: Option<Vec<Instruction>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub cond: Expr,
    pub body: Vec<Instruction>,
    pub line: usize,
}

/// A statement of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Block depth at emission time
    pub indent: usize,
    pub source: String,
    /// First generated line
    pub line: usize,
}

/// Where a generated statement came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEntry {
    pub location: SourceInfo,
    /// The literal markup that produced the statement
    pub text: String,
}

/// Generated line to document position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMap {
    entries: BTreeMap<usize, LineEntry>,
}

impl LineMap {
    pub fn insert(&mut self, line: usize, entry: LineEntry) {
        self.entries.insert(line, entry);
    }

    /// The entry for `line`, or for the nearest lower line that has one.
    ///
    /// Errors inside a multi-line statement report a line past the one the
    /// statement was recorded at, so the walk goes backward.
    pub fn lookup(&self, line: usize) -> Option<(usize, &LineEntry)> {
        self.entries
            .range(..=line)
            .next_back()
            .map(|(line, entry)| (*line, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A compiled document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub listing: Vec<ListingEntry>,
    pub line_map: LineMap,
}

impl Program {
    /// The listing as text, four spaces per block level.
    pub fn source(&self) -> String {
        let mut out = String::new();
        for entry in &self.listing {
            out.push_str(&"    ".repeat(entry.indent));
            out.push_str(&entry.source);
            out.push('\n');
        }
        out
    }

    pub fn statement_count(&self) -> usize {
        self.listing.len()
    }
}

/// Kind of an open instruction body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FrameKind {
    Root,
    For { targets: Vec<String>, iter: Expr },
    While { cond: Expr },
    If { cond: Expr },
    Elif { cond: Expr },
    Else,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    line: usize,
    body: Vec<Instruction>,
}

/// Deepest block nesting a document may open.
pub(crate) const MAX_BLOCK_DEPTH: usize = 64;

/// Why a frame could not be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FrameError {
    /// `elif`/`else` that does not follow an `if` at the same depth
    DanglingBranch(&'static str),
    /// More than [`MAX_BLOCK_DEPTH`] blocks open at once
    TooDeep,
}

/// Incrementally builds a [`Program`].
///
/// Frames mirror the open blocks: instructions are appended to the innermost
/// one, and closing a frame folds it into its parent.
#[derive(Debug)]
pub(crate) struct ProgramBuilder {
    listing: Vec<ListingEntry>,
    line_map: LineMap,
    next_line: usize,
    frames: Vec<Frame>,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        ProgramBuilder {
            listing: Vec::new(),
            line_map: LineMap::default(),
            next_line: 1,
            frames: vec![Frame {
                kind: FrameKind::Root,
                line: 0,
                body: Vec::new(),
            }],
        }
    }
}

impl ProgramBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current block depth.
    pub(crate) fn indent(&self) -> usize {
        self.frames.len() - 1
    }

    pub(crate) fn in_loop(&self) -> bool {
        self.frames
            .iter()
            .any(|f| matches!(f.kind, FrameKind::For { .. } | FrameKind::While { .. }))
    }

    pub(crate) fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    /// Add a statement to the listing and record where it came from.
    /// Returns its first generated line.
    pub(crate) fn emit(&mut self, source: &str, location: SourceInfo, text: &str) -> usize {
        let line = self.next_line;
        self.listing.push(ListingEntry {
            indent: self.indent(),
            source: source.to_string(),
            line,
        });
        self.line_map.insert(
            line,
            LineEntry {
                location,
                text: text.to_string(),
            },
        );
        self.next_line += 1 + source.matches('\n').count();
        line
    }

    /// Append an instruction to the innermost frame.
    pub(crate) fn push(&mut self, instruction: Instruction) {
        if let Some(frame) = self.frames.last_mut() {
            frame.body.push(instruction);
        }
    }

    /// Open a block. `elif` and `else` must directly follow a closed `if`
    /// (or `elif`) at the same depth.
    pub(crate) fn open(&mut self, kind: FrameKind, line: usize) -> Result<(), FrameError> {
        let keyword = match kind {
            FrameKind::Elif { .. } => Some("elif"),
            FrameKind::Else => Some("else"),
            _ => None,
        };
        if let Some(keyword) = keyword {
            let follows_if = self.frames.last().is_some_and(|frame| {
                matches!(
                    frame.body.last(),
                    Some(Instruction::If {
                        otherwise: None,
                        ..
                    })
                )
            });
            if !follows_if {
                return Err(FrameError::DanglingBranch(keyword));
            }
        }
        if self.indent() >= MAX_BLOCK_DEPTH {
            return Err(FrameError::TooDeep);
        }
        self.frames.push(Frame {
            kind,
            line,
            body: Vec::new(),
        });
        Ok(())
    }

    /// Close the innermost block and fold it into its parent.
    pub(crate) fn close(&mut self) {
        if self.frames.len() < 2 {
            return;
        }
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let Frame { kind, line, body } = frame;
        let instruction = match kind {
            FrameKind::Root => return,
            FrameKind::For { targets, iter } => Instruction::For {
                targets,
                iter,
                body,
                line,
            },
            FrameKind::While { cond } => Instruction::While { cond, body, line },
            FrameKind::If { cond } => Instruction::If {
                branches: vec![Branch { cond, body, line }],
                otherwise: None,
            },
            FrameKind::Elif { cond } => {
                if let Some(Instruction::If { branches, .. }) = self.last_instruction_mut() {
                    branches.push(Branch { cond, body, line });
                }
                return;
            }
            FrameKind::Else => {
                if let Some(Instruction::If { otherwise, .. }) = self.last_instruction_mut() {
                    *otherwise = Some(body);
                }
                return;
            }
        };
        self.push(instruction);
    }

    fn last_instruction_mut(&mut self) -> Option<&mut Instruction> {
        self.frames.last_mut().and_then(|f| f.body.last_mut())
    }

    /// Finish the program. Any frame still open is closed first.
    pub(crate) fn finish(mut self) -> Program {
        while self.frames.len() > 1 {
            self.close();
        }
        let instructions = self
            .frames
            .pop()
            .map(|frame| frame.body)
            .unwrap_or_default();
        Program {
            instructions,
            listing: self.listing,
            line_map: self.line_map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::parse_expression;
    use tagweave_source_map::SourceContext;

    fn location(row: usize) -> SourceInfo {
        let mut ctx = SourceContext::new();
        let text = "a\nb\nc\nd\n";
        let id = ctx.add_file("doc.html", text);
        ctx.source_info(id, row * 2, row * 2 + 1).unwrap()
    }

    fn expr(source: &str) -> Expr {
        parse_expression(source).unwrap()
    }

    #[test]
    fn test_emit_counts_lines() {
        let mut builder = ProgramBuilder::new();
        assert_eq!(builder.emit("x = 1", location(0), "<py code=\"x = 1\"/>"), 1);
        assert_eq!(builder.emit("y = [\n1,\n2]", location(1), "<py/>"), 2);
        assert_eq!(builder.emit("print(y)", location(2), "<py/>"), 5);

        let map = builder.line_map();
        assert_eq!(map.len(), 3);
        assert_eq!(map.lookup(3).unwrap().0, 2);
        assert_eq!(map.lookup(4).unwrap().1.location.start_line(), 2);
        assert_eq!(map.lookup(5).unwrap().1.location.start_line(), 3);
        assert!(map.lookup(0).is_none());
    }

    #[test]
    fn test_lookup_past_the_end_uses_last_entry() {
        let mut builder = ProgramBuilder::new();
        builder.emit("a", location(0), "a");
        builder.emit("b", location(3), "b");
        let (line, entry) = builder.line_map().lookup(99).unwrap();
        assert_eq!(line, 2);
        assert_eq!(entry.text, "b");
    }

    #[test]
    fn test_source_indents_by_depth() {
        let mut builder = ProgramBuilder::new();
        builder.emit("for i in range(2):", location(0), "");
        builder
            .open(
                FrameKind::For {
                    targets: vec!["i".to_string()],
                    iter: expr("range(2)"),
                },
                1,
            )
            .unwrap();
        builder.emit("print(i, end=\"\")", location(1), "");
        builder.close();
        builder.emit("print(\"\"\"done\"\"\", end=\"\")", location(2), "");

        let program = builder.finish();
        assert_eq!(
            program.source(),
            "for i in range(2):\n    print(i, end=\"\")\nprint(\"\"\"done\"\"\", end=\"\")\n"
        );
        assert_eq!(program.statement_count(), 3);
        assert!(matches!(program.instructions[0], Instruction::For { .. }));
    }

    #[test]
    fn test_block_depth_limit() {
        let mut builder = ProgramBuilder::new();
        for line in 0..MAX_BLOCK_DEPTH {
            builder.open(FrameKind::If { cond: expr("True") }, line).unwrap();
        }
        assert_eq!(builder.indent(), MAX_BLOCK_DEPTH);
        assert_eq!(
            builder.open(FrameKind::While { cond: expr("True") }, 99),
            Err(FrameError::TooDeep)
        );
        builder.close();
        assert!(builder.open(FrameKind::Else, 100).is_ok());
    }

    #[test]
    fn test_if_elif_else_fold_into_one_instruction() {
        let mut builder = ProgramBuilder::new();
        builder.open(FrameKind::If { cond: expr("a") }, 1).unwrap();
        builder.push(Instruction::Text {
            text: "A".to_string(),
            line: 2,
        });
        builder.close();
        builder.open(FrameKind::Elif { cond: expr("b") }, 3).unwrap();
        builder.close();
        builder.open(FrameKind::Else, 4).unwrap();
        builder.push(Instruction::Text {
            text: "C".to_string(),
            line: 5,
        });
        builder.close();

        let program = builder.finish();
        assert_eq!(program.instructions.len(), 1);
        let Instruction::If {
            branches,
            otherwise,
        } = &program.instructions[0]
        else {
            panic!("expected if");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[1].line, 3);
        assert_eq!(otherwise.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_dangling_branches() {
        let mut builder = ProgramBuilder::new();
        assert_eq!(
            builder.open(FrameKind::Else, 1),
            Err(FrameError::DanglingBranch("else"))
        );

        builder.open(FrameKind::If { cond: expr("a") }, 1).unwrap();
        builder.close();
        builder.push(Instruction::Text {
            text: "between".to_string(),
            line: 2,
        });
        assert_eq!(
            builder.open(FrameKind::Elif { cond: expr("b") }, 3),
            Err(FrameError::DanglingBranch("elif"))
        );
    }

    #[test]
    fn test_no_elif_after_else() {
        let mut builder = ProgramBuilder::new();
        builder.open(FrameKind::If { cond: expr("a") }, 1).unwrap();
        builder.close();
        builder.open(FrameKind::Else, 2).unwrap();
        builder.close();
        assert!(builder.open(FrameKind::Elif { cond: expr("b") }, 3).is_err());
    }

    #[test]
    fn test_in_loop() {
        let mut builder = ProgramBuilder::new();
        assert!(!builder.in_loop());
        builder.open(FrameKind::While { cond: expr("x") }, 1).unwrap();
        builder.open(FrameKind::If { cond: expr("y") }, 2).unwrap();
        assert!(builder.in_loop());
        assert_eq!(builder.indent(), 2);
    }
}
