/// Lazily compiled, process-wide regex for a literal pattern.
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Parameter-type list for `param_types`, with `_` as a wildcard position.
///
/// ```
/// use memberfind::{ParamType, TypeName, params};
///
/// let types = params![TypeName::STRING, _, "int"];
/// assert_eq!(types, vec![ParamType::from(TypeName::STRING), ParamType::Any, ParamType::from("int")]);
/// ```
#[macro_export]
macro_rules! params {
    (@acc [$($out:expr),*]) => {
        ::std::vec![$($out),*]
    };
    (@acc [$($out:expr),*] _ $(, $($rest:tt)*)?) => {
        $crate::params!(@acc [$($out,)* $crate::ParamType::Any] $($($rest)*)?)
    };
    (@acc [$($out:expr),*] $ty:expr $(, $($rest:tt)*)?) => {
        $crate::params!(@acc [$($out,)* $crate::ParamType::from($ty)] $($($rest)*)?)
    };
    ($($items:tt)*) => {
        $crate::params!(@acc [] $($items)*)
    };
}
