//! The branch tree: a binary tree of instruction blocks recording every demonstrated execution
//! path. Arena-backed (`Vec<TreeNode>` indexed by [`NodeId`]) rather than linked by `Box`/`Rc`, so
//! the whole tree — and therefore the demonstration and façade that own it — stays plainly
//! `Clone`, which the transactional-rollback snapshot in `state.rs` depends on.

use smallvec::SmallVec;

use crate::error::Error;

/// One step on a path from the tree's root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    True,
    False,
}

/// A sequence of steps identifying a node in the branch tree. Eight inline slots comfortably
/// covers realistic demonstrations without heap allocation.
pub type Path = SmallVec<[Step; 8]>;

/// A single recorded instruction. The naming form binds a function application's result to a
/// fresh temporary; the two control forms end a block by branching or returning.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `(temp, expr)` where `expr = [function_name, arg_name_1, ..., arg_name_k]`.
    Apply { temp: String, expr: Vec<String> },
    /// `(none, ["branch", cond_name])`.
    Branch { cond: String },
    /// `(none, ["ret", name])`.
    Ret { name: String },
}

/// An index into a [`Tree`]'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
struct TreeNode {
    path: Path,
    block: Vec<Instruction>,
    true_child: Option<NodeId>,
    false_child: Option<NodeId>,
}

/// Binary tree of instruction blocks. Node invariant: if a node's block ends with a `Branch`
/// instruction, the node has both a `true_child` and a `false_child` only once both outcomes have
/// been demonstrated — `remaining_examples` reports the ones that have not.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<TreeNode>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: vec![TreeNode { path: Path::new(), block: Vec::new(), true_child: None, false_child: None }] }
    }

    #[must_use]
    pub fn root() -> NodeId {
        NodeId(0)
    }

    /// # Errors
    /// `Error::IndexOutOfRange` if `pos` is not a valid instruction index in this node's block.
    pub fn get_instruction(&self, node: NodeId, pos: usize) -> Result<&Instruction, Error> {
        self.nodes[node.0]
            .block
            .get(pos)
            .ok_or(Error::IndexOutOfRange { index: pos, len: self.nodes[node.0].block.len() })
    }

    pub fn append_instruction(&mut self, node: NodeId, instr: Instruction) {
        self.nodes[node.0].block.push(instr);
    }

    /// Append `arg_name` to the argument list of the `Apply` instruction at `(node, pos)`. Used
    /// when a new input is introduced after a recursive call was already recorded: the call must
    /// be widened to pass the new input along, or the synthesized function would not forward
    /// enough arguments to itself.
    ///
    /// # Errors
    /// `Error::IndexOutOfRange` if `pos` is not a valid instruction index. `Error::InvariantMismatch`
    /// if the instruction at that position is not an `Apply`.
    pub fn push_arg(&mut self, node: NodeId, pos: usize, arg_name: String) -> Result<(), Error> {
        let block = &mut self.nodes[node.0].block;
        let len = block.len();
        match block.get_mut(pos) {
            Some(Instruction::Apply { expr, .. }) => {
                expr.push(arg_name);
                Ok(())
            }
            Some(other) => Err(Error::InvariantMismatch {
                expected: "Apply".to_string(),
                found: format!("{other:?}"),
            }),
            None => Err(Error::IndexOutOfRange { index: pos, len }),
        }
    }

    /// Depth-first walk collecting the paths of every branch outcome not yet demonstrated.
    #[must_use]
    pub fn remaining_examples(&self, node: NodeId) -> Vec<Path> {
        let n = &self.nodes[node.0];
        match (n.true_child, n.false_child) {
            (Some(t), Some(f)) => {
                let mut result = self.remaining_examples(t);
                result.extend(self.remaining_examples(f));
                result
            }
            (None, Some(f)) => {
                let mut missing_true = n.path.clone();
                missing_true.push(Step::True);
                let mut result = vec![missing_true];
                result.extend(self.remaining_examples(f));
                result
            }
            (Some(t), None) => {
                let mut result = self.remaining_examples(t);
                let mut missing_false = n.path.clone();
                missing_false.push(Step::False);
                result.push(missing_false);
                result
            }
            (None, None) => Vec::new(),
        }
    }

    /// Return the "true" child of `node`, creating it (with `modify = true`) if absent.
    ///
    /// # Errors
    /// `Error::IndexOutOfRange` if the child does not exist and `modify` is `false`.
    pub fn get_true(&mut self, node: NodeId, modify: bool) -> Result<NodeId, Error> {
        self.get_child(node, modify, true)
    }

    /// Return the "false" child of `node`, creating it (with `modify = true`) if absent.
    ///
    /// # Errors
    /// `Error::IndexOutOfRange` if the child does not exist and `modify` is `false`.
    pub fn get_false(&mut self, node: NodeId, modify: bool) -> Result<NodeId, Error> {
        self.get_child(node, modify, false)
    }

    /// Read-only lookup of `node`'s child on `true_branch`, without creating it. Used by the
    /// custom-function interpreter, which only ever walks an already-recorded tree and must not
    /// mutate it (the tree's own `Clone` is what backs transactional rollback).
    ///
    /// # Errors
    /// `Error::IndexOutOfRange` if the child does not exist.
    pub fn existing_child(&self, node: NodeId, true_branch: bool) -> Result<NodeId, Error> {
        let n = &self.nodes[node.0];
        let existing = if true_branch { n.true_child } else { n.false_child };
        existing.ok_or(Error::IndexOutOfRange { index: 0, len: 0 })
    }

    fn get_child(&mut self, node: NodeId, modify: bool, true_branch: bool) -> Result<NodeId, Error> {
        let existing = if true_branch { self.nodes[node.0].true_child } else { self.nodes[node.0].false_child };
        if let Some(child) = existing {
            return Ok(child);
        }
        if !modify {
            return Err(Error::IndexOutOfRange { index: 0, len: 0 });
        }
        let mut child_path = self.nodes[node.0].path.clone();
        child_path.push(if true_branch { Step::True } else { Step::False });
        let child_id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode { path: child_path, block: Vec::new(), true_child: None, false_child: None });
        if true_branch {
            self.nodes[node.0].true_child = Some(child_id);
        } else {
            self.nodes[node.0].false_child = Some(child_id);
        }
        Ok(child_id)
    }
}
