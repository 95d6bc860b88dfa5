//! Macros for declaring transition tables.

/// Build a [`Transitions`](crate::machine::Transitions) table from nested
/// `state => { event => target }` blocks.
///
/// Targets are anything convertible into a
/// [`Target`](crate::machine::Target): a state key, or a
/// `Target::resolver(..)`.
///
/// # Example
///
/// ```
/// use tagstate::transitions;
/// use tagstate::machine::{Resolution, Target};
///
/// let table = transitions! {
///     "Idle" => { "execute" => "Pending" },
///     "Pending" => {
///         "resolve" => "Resolved",
///         "reject" => Target::resolver(|_| Resolution::key("Rejected")),
///     },
/// };
///
/// assert!(table.has("Pending", "reject"));
/// assert_eq!(table.events_for("Idle"), vec!["execute"]);
/// ```
#[macro_export]
macro_rules! transitions {
    (
        $(
            $from:expr => { $( $event:expr => $target:expr ),* $(,)? }
        ),* $(,)?
    ) => {{
        #[allow(unused_mut)]
        let mut table = $crate::machine::Transitions::new();
        $(
            $(
                table.insert($from, $event, $target);
            )*
        )*
        table
    }};
}
