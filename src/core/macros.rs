//! Macros for ergonomic argument construction.

/// Build an [`Arguments`](crate::core::Arguments) bag from `keyword: value`
/// pairs. Values may be anything `serde_json::json!` accepts.
///
/// # Example
///
/// ```
/// use statefield::arguments;
///
/// let args = arguments! { amount: 5, note: "rush" };
/// assert_eq!(args.len(), 2);
///
/// let empty = arguments! {};
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! arguments {
    () => {
        $crate::core::Arguments::new()
    };
    (
        $($keyword:ident : $value:expr),+ $(,)?
    ) => {
        $crate::core::Arguments::new()
            $(.with(stringify!($keyword), ::serde_json::json!($value)))+
    };
}
