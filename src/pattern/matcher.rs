use crate::pattern::compiler::Op;
use crate::ts::Node;

/// A value bound by a `$name` capture.
#[derive(Debug, Clone, PartialEq)]
pub enum Capture<'t> {
    Node(Node<'t>),
    /// Bound by `$name:...`; possibly empty.
    Nodes(Vec<Node<'t>>),
}

/// Named sub-matches from one successful pattern match, in binding order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Captures<'t> {
    bindings: Vec<(String, Capture<'t>)>,
}

impl<'t> Captures<'t> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Capture<'t>> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, capture)| capture)
    }

    /// The single node bound to `name`.
    pub fn node(&self, name: &str) -> Option<Node<'t>> {
        match self.get(name)? {
            Capture::Node(node) => Some(*node),
            Capture::Nodes(_) => None,
        }
    }

    pub fn nodes(&self, name: &str) -> Option<&[Node<'t>]> {
        match self.get(name)? {
            Capture::Node(node) => Some(std::slice::from_ref(node)),
            Capture::Nodes(nodes) => Some(nodes),
        }
    }

    /// Source text covered by the capture. A node list covers everything from
    /// its first node to its last, including separators.
    pub fn text(&self, name: &str) -> Option<&'t str> {
        match self.get(name)? {
            Capture::Node(node) => Some(node.text()),
            Capture::Nodes(nodes) => match (nodes.first(), nodes.last()) {
                (Some(first), Some(last)) => first
                    .source()
                    .get(first.range().start..last.range().end),
                _ => Some(""),
            },
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn mark(&self) -> usize {
        self.bindings.len()
    }

    fn rollback(&mut self, mark: usize) {
        self.bindings.truncate(mark);
    }

    fn bind(&mut self, name: &str, capture: Capture<'t>) {
        self.bindings.push((name.to_string(), capture));
    }
}

/// Match `op` against the node at one position, `None` meaning no node there.
/// On failure, bindings made during the attempt are rolled back.
pub(crate) fn match_op<'t>(op: &Op, node: Option<Node<'t>>, caps: &mut Captures<'t>) -> bool {
    let mark = caps.mark();
    let matched = match_inner(op, node, caps);
    if !matched {
        caps.rollback(mark);
    }
    matched
}

fn match_inner<'t>(op: &Op, node: Option<Node<'t>>, caps: &mut Captures<'t>) -> bool {
    match op {
        Op::Nil => node.is_none(),
        // Rest only has meaning inside `match_children`.
        Op::Rest => false,
        Op::Any => node.is_some(),
        Op::Kind(kind) => node.is_some_and(|n| n.kind() == kind),
        Op::Text(text) => node.is_some_and(|n| n.text() == text),
        Op::Union(members) => members.iter().any(|member| match_op(member, node, caps)),
        Op::All(members) => members.iter().all(|member| match_op(member, node, caps)),
        Op::Not(inner) => {
            let Some(n) = node else {
                return false;
            };
            let mut scratch = Captures::new();
            !match_op(inner, Some(n), &mut scratch)
        }
        Op::Capture { name, inner } => {
            if !match_op(inner, node, caps) {
                return false;
            }
            if let Some(n) = node {
                caps.bind(name, Capture::Node(n));
            }
            true
        }
        Op::Seq { head, children } => {
            let Some(n) = node else {
                return false;
            };
            if !match_op(head, Some(n), caps) {
                return false;
            }
            let kids = n.children();
            match_children(children, &kids, caps)
        }
    }
}

/// Match sequence children left to right. Rest markers are greedy and give
/// back one node at a time until the remainder matches.
fn match_children<'t>(ops: &[Op], nodes: &[Node<'t>], caps: &mut Captures<'t>) -> bool {
    let Some((op, rest_ops)) = ops.split_first() else {
        return nodes.is_empty();
    };

    if op.is_rest() {
        for take in (0..=nodes.len()).rev() {
            let mark = caps.mark();
            if let Op::Capture { name, .. } = op {
                caps.bind(name, Capture::Nodes(nodes[..take].to_vec()));
            }
            if match_children(rest_ops, &nodes[take..], caps) {
                return true;
            }
            caps.rollback(mark);
        }
        return false;
    }

    let mark = caps.mark();
    let current = nodes.first().copied();
    if !match_op(op, current, caps) {
        return false;
    }
    let remaining = if current.is_some() { &nodes[1..] } else { nodes };
    if match_children(rest_ops, remaining, caps) {
        return true;
    }
    caps.rollback(mark);
    false
}
