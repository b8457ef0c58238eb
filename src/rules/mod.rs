//! Rules shipped with the engine.

mod file_open;
mod fold_to_collect;
mod fold_to_vec;
mod iter_count;
mod len_zero;

pub use file_open::FileOpen;
pub use fold_to_collect::FoldToCollect;
pub use fold_to_vec::FoldToVec;
pub use iter_count::IterCount;
pub use len_zero::LenZero;

use crate::rule::Rule;
use crate::ts::Node;

/// Every bundled rule, in registration order.
pub fn bundled() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(FileOpen),
        Box::new(FoldToCollect),
        Box::new(FoldToVec),
        Box::new(LenZero),
        Box::new(IterCount),
    ]
}

/// Whether `node` or anything under it is the identifier `name`.
fn mentions(node: Node<'_>, name: &str) -> bool {
    std::iter::once(node)
        .chain(node.descendants())
        .any(|n| n.kind() == "identifier" && n.text() == name)
}
