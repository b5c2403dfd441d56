// Shared fixtures for integration tests
//
// Trees are described as nested `Node`s whose steps run in order, so a test
// reads like the traced program:
//
//     node(RUN, vec![op(0), call(node(LOAD, vec![op(0)])), op(1)])

#![allow(dead_code)]

use rastro::call_graph::CallGraph;
use rastro::invocation::{Invocation, InvocationId, InvocationKind, InvocationTree, ValueDescriptor};
use rastro::syntax::{ChangeKind, SyntaxChange, SyntaxChanges};

pub const CHECKOUT: &str = "shop.Shop.checkout()V";
pub const TOTAL: &str = "shop.Cart.total()I";
pub const PRICE: &str = "shop.Item.price()I";
pub const DISCOUNT: &str = "promo.Coupon.discount(I)I";
pub const LOG: &str = "util.Log.write(Ljava/lang/String;)V";

pub enum Step {
    Op(u32),
    Call(Node),
}

pub struct Node {
    pub invocation: Invocation,
    pub steps: Vec<Step>,
}

pub fn method(name: &str) -> Invocation {
    let class = name.rsplit_once('.').map_or(name, |(class, _)| class);
    Invocation::new(name, class, InvocationKind::Method)
}

pub fn int(value: i64) -> ValueDescriptor {
    ValueDescriptor::new("int", value.to_string(), 0)
}

pub fn node(name: &str, steps: Vec<Step>) -> Node {
    Node {
        invocation: method(name),
        steps,
    }
}

pub fn returning(name: &str, value: i64, steps: Vec<Step>) -> Node {
    Node {
        invocation: method(name).with_return(int(value)),
        steps,
    }
}

pub fn op(index: u32) -> Step {
    Step::Op(index)
}

pub fn call(node: Node) -> Step {
    Step::Call(node)
}

pub fn build_tree(version: &str, root: Node) -> InvocationTree {
    let mut tree = InvocationTree::new(version, root.invocation);
    let root_id = tree.root_id();
    fill(&mut tree, root_id, root.steps);
    tree
}

fn fill(tree: &mut InvocationTree, parent: InvocationId, steps: Vec<Step>) {
    for step in steps {
        match step {
            Step::Op(index) => tree.push_instruction(parent, index, "op"),
            Step::Call(child) => {
                let id = tree.push_call(parent, child.invocation);
                fill(tree, id, child.steps);
            }
        }
    }
}

/// checkout() { total() { price(); [discount()] }; log() }
pub fn checkout_tree(version: &str, price: i64, with_discount: bool) -> InvocationTree {
    let mut total_steps = vec![op(0), call(returning(PRICE, price, vec![op(0), op(1)]))];
    if with_discount {
        total_steps.push(call(returning(DISCOUNT, price / 10, vec![op(0)])));
    }
    total_steps.push(op(1));

    build_tree(
        version,
        node(
            CHECKOUT,
            vec![
                op(0),
                call(returning(TOTAL, price, total_steps)),
                op(1),
                call(node(LOG, vec![op(0)])),
                op(2),
            ],
        ),
    )
}

pub fn shop_graph() -> CallGraph {
    CallGraph::from_edges([
        (CHECKOUT, TOTAL),
        (CHECKOUT, LOG),
        (TOTAL, PRICE),
        (TOTAL, DISCOUNT),
    ])
}

/// total() gained the discount call; Coupon is a new class.
pub fn shop_changes() -> SyntaxChanges {
    let mut changes = SyntaxChanges::new();
    changes.add_method_change(TOTAL, SyntaxChange::new(ChangeKind::Insert, "discount call"));
    changes.mark_new_class("promo.Coupon");
    changes
}
