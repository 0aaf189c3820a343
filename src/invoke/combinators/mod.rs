//! Functions that build new handles out of existing ones.
//!
//! Every combinator validates its inputs and computes the result signature
//! before any handle is created; invalid positions, counts and mismatched
//! kinds are reported at construction, never at invocation.

pub(crate) mod arrays;
pub(crate) mod cast;
pub(crate) mod constant;
pub(crate) mod drop;
pub(crate) mod filter;
pub(crate) mod fold;
pub(crate) mod guard;
pub(crate) mod insert;
pub(crate) mod invokers;
pub(crate) mod loops;
pub(crate) mod permute;
pub(crate) mod protect;
pub(crate) mod spread;

pub use arrays::{array_constructor, array_element_getter, array_element_setter, array_length};
pub use cast::{as_type, explicit_cast_arguments};
pub use constant::{constant, empty, identity, zero};
pub use drop::{drop_arguments, drop_arguments_to_match, drop_return};
pub use filter::{collect_arguments, filter_arguments, filter_return_value};
pub use fold::fold_arguments;
pub use guard::{guard_with_test, table_switch};
pub use insert::{bind_to, insert_arguments};
pub use invokers::{exact_invoker, invoker, spread_invoker};
pub use loops::{
    LoopClause, clause_loop, counted_loop, counted_loop_to, do_while_loop, iterated_loop,
    while_loop,
};
pub use permute::permute_arguments;
pub use protect::{catch_exception, throw_exception, try_finally};
pub use spread::{as_collector, as_spreader};
